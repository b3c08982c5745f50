/// SQLite-backed persistence
///
/// Split by concern: `connection` owns the handle and schema setup,
/// `rooms` implements the storage operations on top of it.

pub mod connection;
pub mod rooms;

pub use connection::Database;
