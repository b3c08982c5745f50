/// WebSocket Debug Tool - sync endpoint testing
///
/// Connects to a running roomsync server, joins a room and optionally
/// fires a sample command, printing every frame that comes back. Useful
/// for eyeballing broadcast routing without a browser client.
///
/// Usage:
///   cargo run --bin debug_ws_client -- --room <room id>
///   cargo run --bin debug_ws_client -- --room <room id> --add-item Chair
///   cargo run --bin debug_ws_client -- --url ws://127.0.0.1:8080 --duration 60
use futures_util::{ SinkExt, StreamExt };
use serde_json::json;
use tokio::time::{ timeout, Duration };
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

fn print_header(title: &str) {
    println!("\n{}", "=".repeat(72));
    println!("  {}", title);
    println!("{}\n", "=".repeat(72));
}

fn print_step(step: &str, status: &str) {
    let symbol = match status {
        "SUCCESS" => "✅",
        "RUNNING" => "🔄",
        "ERROR" => "❌",
        _ => "▪️",
    };
    println!("{} {}", symbol, step);
}

#[tokio::main]
async fn main() {
    print_header("🔍 ROOMSYNC WEBSOCKET DEBUG TOOL");

    let args: Vec<String> = std::env::args().collect();
    let mut url = "ws://127.0.0.1:8080".to_string();
    let mut room = "debug-room".to_string();
    let mut duration_secs: u64 = 30;
    let mut add_item: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--url" if i + 1 < args.len() => {
                url = args[i + 1].clone();
                i += 1;
            }
            "--room" if i + 1 < args.len() => {
                room = args[i + 1].clone();
                i += 1;
            }
            "--duration" if i + 1 < args.len() => {
                duration_secs = args[i + 1].parse().unwrap_or(30);
                i += 1;
            }
            "--add-item" if i + 1 < args.len() => {
                add_item = Some(args[i + 1].clone());
                i += 1;
            }
            other => {
                println!("Unknown argument: {}", other);
            }
        }
        i += 1;
    }

    let endpoint = format!("{}/ws?id={}", url, room);
    print_step(&format!("Connecting to {}", endpoint), "RUNNING");

    let (mut socket, _response) = match connect_async(&endpoint).await {
        Ok(pair) => pair,
        Err(e) => {
            print_step(&format!("Connection failed: {}", e), "ERROR");
            std::process::exit(1);
        }
    };
    print_step("Connected", "SUCCESS");

    if let Some(name) = add_item {
        let frame = json!({
            "room": room,
            "event": "addItem",
            "sendResponse": true,
            "data": { "name": name, "quantity": 1 },
        });
        match socket.send(Message::Text(frame.to_string())).await {
            Ok(()) => print_step("Sent addItem command", "SUCCESS"),
            Err(e) => print_step(&format!("Send failed: {}", e), "ERROR"),
        }
    }

    print_step(&format!("Listening for {}s...", duration_secs), "RUNNING");
    let deadline = Duration::from_secs(duration_secs);
    let start = std::time::Instant::now();

    while start.elapsed() < deadline {
        let remaining = deadline.saturating_sub(start.elapsed());
        match timeout(remaining, socket.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => {
                println!("📨 {}", text);
            }
            Ok(Some(Ok(Message::Ping(payload)))) => {
                let _ = socket.send(Message::Pong(payload)).await;
                println!("🏓 ping -> pong");
            }
            Ok(Some(Ok(Message::Close(_)))) | Ok(None) => {
                print_step("Server closed the connection", "ERROR");
                break;
            }
            Ok(Some(Ok(_))) => {}
            Ok(Some(Err(e))) => {
                print_step(&format!("Read error: {}", e), "ERROR");
                break;
            }
            Err(_) => break,
        }
    }

    let _ = socket.send(Message::Close(None)).await;
    print_step("Done", "SUCCESS");
}
