//! Yonmoku session server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin yonmoku-server
//! cargo run --bin yonmoku-server -- --host 0.0.0.0 --port 3000 --play-again-strategy new-room
//! ```

use std::sync::Arc;

use clap::Parser;
use yonmoku_server::{
    config::{Args, ServerConfig},
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryPlayerRepository, InMemoryRoomRepository},
    },
    ui::{GameGateway, GameUseCases, Server},
    usecase::{
        CreateRoomUseCase, DisconnectPlayerUseCase, GetRoomDetailUseCase, GetRoomsUseCase,
        JoinRoomUseCase, LeaveRoomUseCase, MakeMoveUseCase, PlayAgainUseCase,
        ReconnectPlayerUseCase, StartGameUseCase,
    },
};
use yonmoku_shared::{logger::setup_logger, time::SystemClock};

#[tokio::main]
async fn main() {
    let config = ServerConfig::from(Args::parse());

    // Initialize tracing
    setup_logger(
        env!("CARGO_BIN_NAME"),
        &["yonmoku-server", "tower-http"],
        &config.log_level,
    );

    // Initialize dependencies in order:
    // 1. Repositories
    // 2. MessagePusher
    // 3. UseCases
    // 4. Gateway
    // 5. Server

    // 1. Create Repositories (in-memory database)
    let clock = Arc::new(SystemClock);
    let player_repository = Arc::new(InMemoryPlayerRepository::new());
    let room_repository = Arc::new(InMemoryRoomRepository::new(
        clock.clone(),
        config.play_again_timeout,
    ));

    // 2. Create MessagePusher (WebSocket implementation)
    let message_pusher = Arc::new(WebSocketMessagePusher::new());

    // 3. Create UseCases
    let leave_room = Arc::new(LeaveRoomUseCase::new(
        player_repository.clone(),
        room_repository.clone(),
    ));
    let usecases = GameUseCases {
        create_room: Arc::new(CreateRoomUseCase::new(
            player_repository.clone(),
            room_repository.clone(),
        )),
        join_room: Arc::new(JoinRoomUseCase::new(
            player_repository.clone(),
            room_repository.clone(),
        )),
        start_game: Arc::new(StartGameUseCase::new(room_repository.clone())),
        make_move: Arc::new(MakeMoveUseCase::new(room_repository.clone())),
        leave_room: leave_room.clone(),
        reconnect: Arc::new(ReconnectPlayerUseCase::new(
            player_repository.clone(),
            room_repository.clone(),
        )),
        disconnect: Arc::new(DisconnectPlayerUseCase::new(
            player_repository.clone(),
            leave_room,
        )),
        play_again: Arc::new(PlayAgainUseCase::new(
            player_repository.clone(),
            room_repository.clone(),
            clock,
            config.play_again_strategy,
        )),
    };
    let get_rooms_usecase = Arc::new(GetRoomsUseCase::new(room_repository.clone()));
    let get_room_detail_usecase = Arc::new(GetRoomDetailUseCase::new(room_repository));

    // 4. Create Gateway
    let gateway = Arc::new(GameGateway::new(
        usecases,
        player_repository,
        message_pusher,
        config.play_again_timeout,
    ));
    tracing::info!(
        "Play again: timeout {:?}, strategy {:?}",
        config.play_again_timeout,
        config.play_again_strategy
    );

    // 5. Create and run the server
    let server = Server::new(gateway, get_rooms_usecase, get_room_detail_usecase);
    if let Err(e) = server.run(config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
