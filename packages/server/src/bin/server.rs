//! WebRTC signaling relay server.
//!
//! Relays offer / answer / candidate messages between peers and keeps track of
//! room membership.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kakehashi-server
//! cargo run --bin kakehashi-server -- --host 0.0.0.0 --port 3000 --on-duplicate reject
//! ```

use std::sync::Arc;

use clap::Parser;
use kakehashi_server::{
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryConnectionRegistry, InMemoryRoomRepository},
    },
    ui::Server,
    usecase::{
        CheckOnlineUseCase, ConnectClientUseCase, DisconnectClientUseCase,
        DuplicateIdentityPolicy, GetRoomDetailUseCase, GetRoomsUseCase, JoinRoomUseCase,
        QuitRoomUseCase, RelaySignalUseCase, RouteMessageUseCase, new_membership_lock,
    },
};
use kakehashi_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "kakehashi-server")]
#[command(about = "WebRTC signaling relay server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8888")]
    port: u16,

    /// What to do when a client ID that is already connected connects again
    #[arg(long, value_enum, default_value_t = DuplicateIdentityPolicy::Replace)]
    on_duplicate: DuplicateIdentityPolicy,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, default_value = "debug")]
    log_level: String,

    /// Allow cross-origin requests from any origin
    #[arg(long)]
    cors: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    // Initialize dependencies in order:
    // 1. Repository
    // 2. MessagePusher
    // 3. UseCases
    // 4. Server

    // 1. Create Repositories (in-memory)
    let registry = Arc::new(InMemoryConnectionRegistry::new());
    let rooms = Arc::new(InMemoryRoomRepository::new(Arc::new(SystemClock)));

    // 2. Create MessagePusher (WebSocket implementation)
    let message_pusher = Arc::new(WebSocketMessagePusher::new(registry.clone()));

    // 3. Create UseCases
    let lock = new_membership_lock();
    let connect_client_usecase = Arc::new(ConnectClientUseCase::new(
        registry.clone(),
        rooms.clone(),
        message_pusher.clone(),
        lock.clone(),
        args.on_duplicate,
    ));
    let disconnect_client_usecase = Arc::new(DisconnectClientUseCase::new(
        registry.clone(),
        rooms.clone(),
        message_pusher.clone(),
        lock.clone(),
    ));
    let relay_signal_usecase = Arc::new(RelaySignalUseCase::new(
        registry.clone(),
        rooms.clone(),
        message_pusher.clone(),
        lock.clone(),
    ));
    let check_online_usecase = Arc::new(CheckOnlineUseCase::new(
        registry.clone(),
        message_pusher.clone(),
    ));
    let join_room_usecase = Arc::new(JoinRoomUseCase::new(
        registry.clone(),
        rooms.clone(),
        message_pusher.clone(),
        lock.clone(),
    ));
    let quit_room_usecase = Arc::new(QuitRoomUseCase::new(
        registry.clone(),
        rooms.clone(),
        message_pusher.clone(),
        lock,
    ));
    let route_message_usecase = Arc::new(RouteMessageUseCase::new(
        registry,
        message_pusher,
        relay_signal_usecase,
        check_online_usecase,
        join_room_usecase,
        quit_room_usecase,
    ));
    let get_rooms_usecase = Arc::new(GetRoomsUseCase::new(rooms.clone()));
    let get_room_detail_usecase = Arc::new(GetRoomDetailUseCase::new(rooms));

    tracing::info!("Duplicate client ID policy: {:?}", args.on_duplicate);

    // 4. Create and run the server
    let server = Server::new(
        connect_client_usecase,
        disconnect_client_usecase,
        route_message_usecase,
        get_rooms_usecase,
        get_room_detail_usecase,
    )
    .with_cors(args.cors);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
