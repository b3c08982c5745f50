/// Room membership and broadcast fan-out
///
/// The hub is the single authority over the room -> subscriber mapping. One
/// sequential task drains three request channels (join, leave, publish), so
/// every membership change and broadcast is applied in a total order
/// without any locking. Nothing else ever touches the room map.
///
/// Each subscriber hands the hub the sender half of its bounded outbound
/// queue. Fan-out uses a non-blocking send: a subscriber whose queue is
/// full is evicted on the spot instead of stalling delivery to the rest of
/// the room. Eviction drops the sender, which closes the queue and signals
/// the subscriber's write loop to shut down.
use std::collections::HashMap;
use std::sync::atomic::{ AtomicU64, Ordering };
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::arguments::is_debug_hub_enabled;
use crate::logger::{ self, LogTag };

/// Connection ID (unique per WebSocket connection)
pub type ConnectionId = u64;

/// Sender half of a subscriber's bounded outbound queue
pub type OutboundSender = mpsc::Sender<String>;

/// A connection as the hub sees it
#[derive(Debug, Clone)]
pub struct Subscriber {
    pub id: ConnectionId,
    pub queue: OutboundSender,
}

/// A routed broadcast produced by the protocol layer
///
/// `include_sender` mirrors the client's sendResponse flag;
/// `include_other_clients` is cleared for sender-only error responses.
#[derive(Debug, Clone)]
pub struct Message {
    pub room: String,
    pub include_sender: bool,
    pub include_other_clients: bool,
    pub sender: ConnectionId,
    pub payload: String,
}

enum Request {
    Join { room: String, subscriber: Subscriber },
    Leave { room: String, id: ConnectionId },
    Publish(Message),
}

/// Cloneable handle used by connections to talk to the hub task
///
/// All operations are fire-and-forget sends onto the hub's request
/// channels; the hub loop applies them in the order it receives them.
#[derive(Clone)]
pub struct HubHandle {
    join_tx: mpsc::UnboundedSender<Request>,
    leave_tx: mpsc::UnboundedSender<Request>,
    publish_tx: mpsc::UnboundedSender<Request>,
    next_id: Arc<AtomicU64>,
}

impl HubHandle {
    /// Allocate a fresh connection id
    pub fn next_connection_id(&self) -> ConnectionId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Add a connection to a room, creating the room entry on first join
    pub fn join(&self, room: &str, subscriber: Subscriber) {
        let _ = self.join_tx.send(Request::Join { room: room.to_string(), subscriber });
    }

    /// Remove a connection from a room
    ///
    /// Safe to call for connections the hub already evicted.
    pub fn leave(&self, room: &str, id: ConnectionId) {
        let _ = self.leave_tx.send(Request::Leave { room: room.to_string(), id });
    }

    /// Fan a payload out to a room's current subscribers
    pub fn publish(&self, message: Message) {
        let _ = self.publish_tx.send(Request::Publish(message));
    }
}

/// The hub state itself, owned by a single task
pub struct Hub {
    rooms: HashMap<String, HashMap<ConnectionId, OutboundSender>>,
    join_rx: mpsc::UnboundedReceiver<Request>,
    leave_rx: mpsc::UnboundedReceiver<Request>,
    publish_rx: mpsc::UnboundedReceiver<Request>,
}

impl Hub {
    /// Create a hub and the handle used to reach it
    pub fn new() -> (Self, HubHandle) {
        let (join_tx, join_rx) = mpsc::unbounded_channel();
        let (leave_tx, leave_rx) = mpsc::unbounded_channel();
        let (publish_tx, publish_rx) = mpsc::unbounded_channel();

        let hub = Self { rooms: HashMap::new(), join_rx, leave_rx, publish_rx };
        let handle = HubHandle {
            join_tx,
            leave_tx,
            publish_tx,
            next_id: Arc::new(AtomicU64::new(1)),
        };
        (hub, handle)
    }

    /// Spawn the hub task and return its handle
    pub fn spawn() -> HubHandle {
        let (hub, handle) = Self::new();
        tokio::spawn(hub.run());
        handle
    }

    /// Drain requests until every handle is gone
    pub async fn run(mut self) {
        loop {
            let request = tokio::select! {
                Some(request) = self.join_rx.recv() => request,
                Some(request) = self.leave_rx.recv() => request,
                Some(request) = self.publish_rx.recv() => request,
                else => break,
            };
            match request {
                Request::Join { room, subscriber } => self.add_subscriber(&room, subscriber),
                Request::Leave { room, id } => self.remove_subscriber(&room, id),
                Request::Publish(message) => self.fan_out(message),
            }
        }
        logger::debug(LogTag::Hub, "Hub loop stopped, all handles dropped");
    }

    fn add_subscriber(&mut self, room: &str, subscriber: Subscriber) {
        let subscribers = self.rooms.entry(room.to_string()).or_default();
        let id = subscriber.id;
        subscribers.insert(id, subscriber.queue);

        if is_debug_hub_enabled() {
            logger::debug(
                LogTag::Hub,
                &format!(
                    "Connection {} joined room {} ({} subscribed)",
                    id,
                    room,
                    subscribers.len()
                ),
            );
        }
    }

    fn remove_subscriber(&mut self, room: &str, id: ConnectionId) {
        let Some(subscribers) = self.rooms.get_mut(room) else {
            return;
        };

        // Dropping the sender closes the subscriber's queue, which tells
        // its write loop to terminate.
        if subscribers.remove(&id).is_some() && is_debug_hub_enabled() {
            logger::debug(LogTag::Hub, &format!("Connection {} left room {}", id, room));
        }

        if subscribers.is_empty() {
            self.rooms.remove(room);
            if is_debug_hub_enabled() {
                logger::debug(LogTag::Hub, &format!("Discarded empty room {}", room));
            }
        }
    }

    fn fan_out(&mut self, message: Message) {
        let Some(subscribers) = self.rooms.get(&message.room) else {
            return;
        };

        let mut evicted = Vec::new();
        for (id, queue) in subscribers.iter() {
            if *id == message.sender {
                if !message.include_sender {
                    continue;
                }
            } else if !message.include_other_clients {
                continue;
            }

            if queue.try_send(message.payload.clone()).is_err() {
                // Full or closed queue: this subscriber can't keep up, cut
                // it loose rather than holding up the rest of the room.
                evicted.push(*id);
            }
        }

        for id in evicted {
            logger::warning(
                LogTag::Hub,
                &format!(
                    "Evicting connection {} from room {} (outbound queue saturated)",
                    id,
                    message.room
                ),
            );
            self.remove_subscriber(&message.room, id);
        }
    }
}
