/// WebSocket connection lifecycle
///
/// Adapts one physical connection to the hub's model with two
/// independently scheduled loops:
///
/// - the read loop pulls one frame at a time under a read-idle deadline,
///   runs it through the protocol and forwards the result (broadcasts go
///   to the hub, envelope failures onto this connection's local reply
///   channel)
/// - the write loop drains the bounded outbound queue into the socket and
///   pings the peer often enough to keep a healthy connection inside the
///   read deadline
///
/// Teardown always funnels through `HubHandle::leave`, which is a no-op
/// when the hub already evicted the connection.
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{ Message, WebSocket };
use futures_util::stream::{ SplitSink, SplitStream };
use futures_util::{ SinkExt, StreamExt };
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{ interval_at, timeout, Instant };

use crate::arguments::is_debug_webserver_enabled;
use crate::config::with_config;
use crate::logger::{ self, LogTag };
use crate::webserver::state::AppState;
use crate::webserver::ws::hub::{ ConnectionId, Subscriber };
use crate::webserver::ws::protocol::{ EventProtocol, Translation };

/// Time allowed for a single write to the peer
const WRITE_WAIT: Duration = Duration::from_secs(10);

/// Tunables resolved from the config once per connection
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    /// Capacity of the bounded outbound queue
    pub queue_capacity: usize,
    /// Maximum size of a single inbound frame
    pub max_frame_bytes: usize,
    /// Close the connection when nothing arrives for this long
    pub read_idle_timeout: Duration,
}

impl ConnectionSettings {
    pub fn from_config() -> Self {
        with_config(|cfg| Self {
            queue_capacity: cfg.sync.outbound_queue_capacity,
            max_frame_bytes: cfg.sync.max_frame_bytes,
            read_idle_timeout: Duration::from_secs(cfg.sync.read_idle_timeout_secs),
        })
    }

    /// Ping period, kept below the read deadline so healthy peers always
    /// produce traffic in time
    pub fn ping_period(&self) -> Duration {
        self.read_idle_timeout * 9 / 10
    }
}

enum ReadExit {
    /// The socket ended (close, error or idle deadline)
    Socket,
    /// The write loop finished first (eviction or write error)
    WriterDead,
}

/// Drive one accepted WebSocket until either side gives up
pub async fn handle_socket(socket: WebSocket, state: Arc<AppState>, room: String) {
    let settings = ConnectionSettings::from_config();
    let conn_id = state.hub.next_connection_id();
    let protocol = EventProtocol::new(state.storage.clone());

    // The hub owns the only sender of the outbound queue: dropping it on
    // leave or eviction is what closes the queue and stops the write loop.
    // Local replies (envelope failures) ride their own small channel so
    // they never mask that close signal.
    let (queue_tx, queue_rx) = mpsc::channel::<String>(settings.queue_capacity);
    let (reply_tx, reply_rx) = mpsc::channel::<String>(8);
    state.hub.join(&room, Subscriber { id: conn_id, queue: queue_tx });

    if is_debug_webserver_enabled() {
        logger::debug(
            LogTag::Webserver,
            &format!("Connection {} opened for room {}", conn_id, room),
        );
    }

    let (ws_tx, ws_rx) = socket.split();
    let mut writer =
        tokio::spawn(write_loop(ws_tx, queue_rx, reply_rx, settings.ping_period(), conn_id));

    let exit = read_loop(
        ws_rx,
        &state,
        &protocol,
        conn_id,
        &reply_tx,
        settings.read_idle_timeout,
        &mut writer,
    )
    .await;

    state.hub.leave(&room, conn_id);

    // Once the hub processes the leave, the queue closes and the write
    // loop drains out on its own.
    if matches!(exit, ReadExit::Socket) {
        let _ = writer.await;
    }
    drop(reply_tx);

    if is_debug_webserver_enabled() {
        logger::debug(
            LogTag::Webserver,
            &format!("Connection {} closed for room {}", conn_id, room),
        );
    }
}

async fn read_loop(
    mut stream: SplitStream<WebSocket>,
    state: &Arc<AppState>,
    protocol: &EventProtocol,
    conn_id: ConnectionId,
    reply_tx: &mpsc::Sender<String>,
    idle_timeout: Duration,
    writer: &mut JoinHandle<()>,
) -> ReadExit {
    loop {
        tokio::select! {
            _ = &mut *writer => return ReadExit::WriterDead,

            next = timeout(idle_timeout, stream.next()) => match next {
                Err(_) => {
                    logger::warning(
                        LogTag::Webserver,
                        &format!("Connection {}: no traffic for {:?}, closing", conn_id, idle_timeout),
                    );
                    return ReadExit::Socket;
                }
                Ok(None) => return ReadExit::Socket,
                Ok(Some(Err(e))) => {
                    logger::warning(
                        LogTag::Webserver,
                        &format!("Connection {}: read failed: {}", conn_id, e),
                    );
                    return ReadExit::Socket;
                }
                Ok(Some(Ok(Message::Text(text)))) => {
                    handle_frame(state, protocol, conn_id, reply_tx, &text).await;
                }
                Ok(Some(Ok(Message::Close(_)))) => return ReadExit::Socket,
                // Pings and pongs count as traffic and reset the deadline
                // simply by arriving.
                Ok(Some(Ok(_))) => {}
            }
        }
    }
}

async fn handle_frame(
    state: &Arc<AppState>,
    protocol: &EventProtocol,
    conn_id: ConnectionId,
    reply_tx: &mpsc::Sender<String>,
    text: &str,
) {
    match protocol.translate(text, conn_id).await {
        Translation::Broadcast(message) => state.hub.publish(message),
        Translation::Reply(response) => match response.to_json() {
            Ok(json) => {
                // A peer hammering us with garbage can fill the reply
                // channel; dropping the oldest complaint is fine.
                if reply_tx.try_send(json).is_err() {
                    logger::warning(
                        LogTag::Webserver,
                        &format!("Connection {}: reply channel full, reply dropped", conn_id),
                    );
                }
            }
            Err(e) => {
                logger::error(
                    LogTag::Webserver,
                    &format!("Connection {}: failed to encode reply: {}", conn_id, e),
                );
            }
        },
    }
}

async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut queue_rx: mpsc::Receiver<String>,
    mut reply_rx: mpsc::Receiver<String>,
    ping_period: Duration,
    conn_id: ConnectionId,
) {
    let mut ticker = interval_at(Instant::now() + ping_period, ping_period);

    loop {
        tokio::select! {
            queued = queue_rx.recv() => match queued {
                Some(payload) => {
                    if write(&mut sink, Message::Text(payload), conn_id).await.is_err() {
                        return;
                    }
                    // Flush whatever else is already queued before
                    // selecting again.
                    while let Ok(extra) = queue_rx.try_recv() {
                        if write(&mut sink, Message::Text(extra), conn_id).await.is_err() {
                            return;
                        }
                    }
                }
                None => {
                    // The hub closed our queue (leave or eviction).
                    let _ = timeout(WRITE_WAIT, sink.send(Message::Close(None))).await;
                    return;
                }
            },

            reply = reply_rx.recv() => match reply {
                Some(payload) => {
                    if write(&mut sink, Message::Text(payload), conn_id).await.is_err() {
                        return;
                    }
                }
                None => return,
            },

            _ = ticker.tick() => {
                if write(&mut sink, Message::Ping(Vec::new()), conn_id).await.is_err() {
                    return;
                }
            }
        }
    }
}

async fn write(
    sink: &mut SplitSink<WebSocket, Message>,
    message: Message,
    conn_id: ConnectionId,
) -> Result<(), ()> {
    match timeout(WRITE_WAIT, sink.send(message)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            logger::warning(
                LogTag::Webserver,
                &format!("Connection {}: write failed: {}", conn_id, e),
            );
            Err(())
        }
        Err(_) => {
            logger::warning(
                LogTag::Webserver,
                &format!("Connection {}: write timed out", conn_id),
            );
            Err(())
        }
    }
}
