/// Real-time sync engine
///
/// One persistent WebSocket per editing session, multiplexed through a
/// central hub:
///
/// - `hub`: room membership and ordered fan-out, one sequential actor
/// - `connection`: per-socket read/write loops, keep-alive, backpressure
/// - `protocol`: envelope decode and event dispatch against storage
/// - `message`: wire envelope schemas

pub mod connection;
pub mod hub;
pub mod message;
pub mod protocol;

pub use hub::{ ConnectionId, Hub, HubHandle, Subscriber };
pub use message::{ MessageResponse, RoomMessage };
pub use protocol::EventProtocol;
