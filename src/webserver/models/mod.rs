/// Model exports

pub mod requests;
pub mod responses;

pub use requests::*;
pub use responses::*;
