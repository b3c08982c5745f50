mod server;

pub mod models;
pub mod routes;
pub mod state;
pub mod ws;

// Public API for starting/stopping the webserver
pub use server::{ shutdown, start_server };
