/// Model exports

pub mod room;

pub use room::*;
