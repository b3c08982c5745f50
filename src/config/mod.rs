/// Configuration system
///
/// `config_struct!` declares schema structs with embedded defaults,
/// `schemas` defines the actual configuration tree, and `utils` owns
/// loading and thread-safe access.

pub mod macros;
mod schemas;
mod utils;

pub use schemas::*;
pub use utils::*;
