//! idobata room/presence chat server.
//!
//! Tracks authenticated identities across rooms over persistent WebSocket
//! connections.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin idobata-server
//! cargo run --bin idobata-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;
use tokio::sync::Mutex;

use idobata_server::{
    domain::RoomRegistry,
    infrastructure::{
        identity_gate::JwtIdentityGate, message_pusher::WebSocketMessagePusher,
        repository::InMemoryRoomDirectory,
    },
    ui::{AppState, Server},
    usecase::{
        ConnectSessionUseCase, CreateRoomUseCase, DisconnectSessionUseCase,
        JoinByInviteCodeUseCase, JoinRoomUseCase, LeaveRoomUseCase, ListRoomsUseCase,
        SendMessageUseCase, TypingUseCase,
    },
};
use idobata_shared::logger::setup_logger;

/// 開発用のデフォルトシークレット（運用では JWT_SECRET を設定すること）
const DEV_JWT_SECRET: &str = "idobata-dev-secret";

#[derive(Parser, Debug)]
#[command(name = "idobata-server")]
#[command(about = "WebSocket room/presence chat server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
        tracing::warn!("JWT_SECRET not set, using development secret");
        DEV_JWT_SECRET.to_string()
    });

    // Initialize dependencies in order:
    // 1. Registry (live room state)
    // 2. Directory (durable store)
    // 3. MessagePusher
    // 4. IdentityGate
    // 5. UseCases
    // 6. AppState + Server

    // 1. Create the Room Registry (single serialized owner of live state)
    let registry = Arc::new(Mutex::new(RoomRegistry::new()));

    // 2. Create the Room Directory (in-memory reference store)
    let directory = Arc::new(InMemoryRoomDirectory::new());

    // 3. Create MessagePusher (WebSocket implementation)
    let message_pusher = Arc::new(WebSocketMessagePusher::new());

    // 4. Create IdentityGate (HS256 JWT)
    let identity_gate = Arc::new(JwtIdentityGate::new(jwt_secret));

    // 5. Create UseCases
    let connect_session_usecase = Arc::new(ConnectSessionUseCase::new(
        registry.clone(),
        message_pusher.clone(),
    ));
    let disconnect_session_usecase = Arc::new(DisconnectSessionUseCase::new(
        registry.clone(),
        message_pusher.clone(),
    ));
    let join_room_usecase = Arc::new(JoinRoomUseCase::new(
        registry.clone(),
        directory.clone(),
        message_pusher.clone(),
    ));
    let leave_room_usecase = Arc::new(LeaveRoomUseCase::new(
        registry.clone(),
        message_pusher.clone(),
    ));
    let create_room_usecase = Arc::new(CreateRoomUseCase::new(
        registry.clone(),
        directory.clone(),
        message_pusher.clone(),
    ));
    let join_by_invite_usecase = Arc::new(JoinByInviteCodeUseCase::new(
        registry.clone(),
        directory.clone(),
        message_pusher.clone(),
    ));
    let list_rooms_usecase = Arc::new(ListRoomsUseCase::new(registry.clone(), directory.clone()));
    let send_message_usecase = Arc::new(SendMessageUseCase::new(
        registry.clone(),
        directory.clone(),
        message_pusher.clone(),
    ));
    let typing_usecase = Arc::new(TypingUseCase::new(
        registry.clone(),
        message_pusher.clone(),
    ));

    // 6. Create and run the server
    let server = Server::new(AppState {
        identity_gate,
        message_pusher,
        connect_session_usecase,
        disconnect_session_usecase,
        join_room_usecase,
        leave_room_usecase,
        create_room_usecase,
        join_by_invite_usecase,
        list_rooms_usecase,
        send_message_usecase,
        typing_usecase,
    });
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
