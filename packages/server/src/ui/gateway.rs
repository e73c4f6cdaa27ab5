//! Connection Gateway
//!
//! クライアントイベントを受け取り、ユースケースに委譲し、結果をルームの参加者へ通知します。
//!
//! - イベントは 1 件ずつ処理する（`dispatch_lock`）。再戦タイマーの発火も同じロックを取る
//! - すべてのクライアントイベントに `ack` を返す（フレームの `id` をそのまま返す）
//! - ユースケースのエラーは `error` イベント + 失敗の `ack` としてクライアントに返す
//! - イベント処理中の panic はここで捕捉し、接続は維持する

use std::{fmt::Display, panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures_util::FutureExt;
use tokio::sync::Mutex;

use crate::{
    domain::{
        ConnectionId, MessagePusher, PlayerId, PlayerRepository, PusherChannel, Room, RoomId,
        Timestamp,
    },
    infrastructure::dto::websocket::{
        AckPayload, ClientEvent, CreateRoomPayload, GameOverPayload, GameStartedPayload,
        InboundFrame, JoinRoomPayload, LastMoveDto, LeaveRoomResponsePayload, MakeMovePayload,
        PlayAgainResponsePayload, PlayAgainStatusPayload, PlayAgainTimeoutPayload, PlayerDto,
        PlayerDisconnectedPayload, PlayerJoinedPayload, ReconnectPayload, RoomDto,
        RoomEnteredPayload, RoomPlayerPayload, ServerEvent, UpdateGamePayload,
    },
    usecase::{
        CreateRoomUseCase, DisconnectPlayerUseCase, JoinRoomUseCase, LeaveRoomUseCase,
        MakeMoveUseCase, MoveKind, PlayAgainResolution, PlayAgainUseCase, ReconnectPlayerUseCase,
        RoomDeparture, StartGameUseCase,
    },
};

use super::play_again_timer::PlayAgainTimers;

const ROOM_NOT_FOUND: &str = "Room not found";
const PLAYER_NOT_FOUND: &str = "Player not found";
const INVALID_MESSAGE: &str = "Invalid message format";
const INTERNAL_ERROR: &str = "Internal server error";
const PLAY_AGAIN_TIMED_OUT: &str = "Play again request timed out";
const PLAY_AGAIN_DECLINED: &str = "A player declined to play again";
const PLAYERS_MOVED: &str = "Players moved to a new room";

/// Gateway が使うユースケース一式
pub struct GameUseCases {
    pub create_room: Arc<CreateRoomUseCase>,
    pub join_room: Arc<JoinRoomUseCase>,
    pub start_game: Arc<StartGameUseCase>,
    pub make_move: Arc<MakeMoveUseCase>,
    pub leave_room: Arc<LeaveRoomUseCase>,
    pub reconnect: Arc<ReconnectPlayerUseCase>,
    pub disconnect: Arc<DisconnectPlayerUseCase>,
    pub play_again: Arc<PlayAgainUseCase>,
}

/// クライアントに返すイベント処理の失敗
#[derive(Debug)]
struct EventError {
    message: String,
    critical: bool,
}

impl EventError {
    fn new(message: impl Display) -> Self {
        Self {
            message: message.to_string(),
            critical: false,
        }
    }

    fn critical(message: impl Display) -> Self {
        Self {
            message: message.to_string(),
            critical: true,
        }
    }
}

type EventResult = Result<AckPayload, EventError>;

fn parse_room_id(value: &str) -> Result<RoomId, EventError> {
    RoomId::new(value.to_string()).map_err(|_| EventError::new(ROOM_NOT_FOUND))
}

fn parse_player_id(value: &str) -> Result<PlayerId, EventError> {
    PlayerId::try_from(value).map_err(|_| EventError::new(PLAYER_NOT_FOUND))
}

pub struct GameGateway {
    usecases: GameUseCases,
    player_repository: Arc<dyn PlayerRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    timers: PlayAgainTimers,
    play_again_timeout: Duration,
    dispatch_lock: Mutex<()>,
}

impl GameGateway {
    pub fn new(
        usecases: GameUseCases,
        player_repository: Arc<dyn PlayerRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        play_again_timeout: Duration,
    ) -> Self {
        Self {
            usecases,
            player_repository,
            message_pusher,
            timers: PlayAgainTimers::new(),
            play_again_timeout,
            dispatch_lock: Mutex::new(()),
        }
    }

    /// 新しい接続を登録
    pub async fn connect(&self, connection_id: ConnectionId, sender: PusherChannel) {
        self.message_pusher
            .register_client(connection_id, sender)
            .await;
        tracing::info!("Connection {} opened", connection_id);
    }

    /// 接続断の処理
    pub async fn disconnect(&self, connection_id: &ConnectionId) {
        let _guard = self.dispatch_lock.lock().await;
        self.message_pusher.unregister_client(connection_id).await;

        if let Some(departure) = self.usecases.disconnect.execute(connection_id).await {
            self.notify_departure(&departure).await;
        }
        tracing::info!("Connection {} closed", connection_id);
    }

    /// 受信したテキストフレームを処理
    pub async fn dispatch(self: &Arc<Self>, connection_id: ConnectionId, text: &str) {
        let frame = InboundFrame::parse(text);
        let event = match frame.event {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("Malformed frame from {}: {}", connection_id, e);
                self.reply_error(&connection_id, frame.id, EventError::new(INVALID_MESSAGE))
                    .await;
                return;
            }
        };

        let _guard = self.dispatch_lock.lock().await;
        let name = event.name();
        tracing::debug!("Handling '{}' from {}", name, connection_id);

        let result = AssertUnwindSafe(self.handle_event(connection_id, event))
            .catch_unwind()
            .await;
        match result {
            Ok(Ok(ack)) => {
                self.push(&connection_id, ServerEvent::Ack(ack.with_id(frame.id)))
                    .await;
            }
            Ok(Err(e)) => {
                tracing::warn!("'{}' from {} rejected: {}", name, connection_id, e.message);
                self.reply_error(&connection_id, frame.id, e).await;
            }
            Err(_) => {
                tracing::error!("Panic while handling '{}' from {}", name, connection_id);
                self.reply_error(&connection_id, frame.id, EventError::new(INTERNAL_ERROR))
                    .await;
            }
        }
    }

    async fn handle_event(
        self: &Arc<Self>,
        connection_id: ConnectionId,
        event: ClientEvent,
    ) -> EventResult {
        match event {
            ClientEvent::CreateRoom(payload) => self.on_create_room(connection_id, payload).await,
            ClientEvent::JoinRoom(payload) => self.on_join_room(connection_id, payload).await,
            ClientEvent::StartGame(payload) => self.on_start_game(payload).await,
            ClientEvent::MakeMove(payload) => self.on_make_move(payload).await,
            ClientEvent::LeaveRoom(payload) => self.on_leave_room(connection_id, payload).await,
            ClientEvent::Reconnect(payload) => self.on_reconnect(connection_id, payload).await,
            ClientEvent::PlayAgainRequest(payload) => self.on_play_again_request(payload).await,
            ClientEvent::PlayAgainResponse(payload) => self.on_play_again_response(payload).await,
        }
    }

    // ========================================
    // イベントごとの処理
    // ========================================

    async fn on_create_room(
        &self,
        connection_id: ConnectionId,
        payload: CreateRoomPayload,
    ) -> EventResult {
        let output = self
            .usecases
            .create_room
            .execute(connection_id, &payload.player.nickname, payload.player.avatar)
            .await
            .map_err(EventError::new)?;

        let room_id = output.room.id.to_string();
        let player_id = output.player.id.to_string();
        self.push(
            &connection_id,
            ServerEvent::RoomCreated(RoomEnteredPayload {
                room_id: room_id.clone(),
                player_id: player_id.clone(),
                room: RoomDto::from(&output.room),
            }),
        )
        .await;

        Ok(AckPayload::ok()
            .with_room_id(room_id)
            .with_player_id(player_id))
    }

    async fn on_join_room(
        &self,
        connection_id: ConnectionId,
        payload: JoinRoomPayload,
    ) -> EventResult {
        let room_id = parse_room_id(&payload.room_id)?;
        let output = self
            .usecases
            .join_room
            .execute(
                connection_id,
                &room_id,
                &payload.player.nickname,
                payload.player.avatar,
            )
            .await
            .map_err(|e| {
                if e.is_critical() {
                    EventError::critical(e)
                } else {
                    EventError::new(e)
                }
            })?;

        if let Some(previous) = &output.previous_room {
            self.notify_departure(previous).await;
        }

        let others = self.room_connections_except(&output.room, &output.player.id).await;
        self.broadcast(
            others,
            ServerEvent::PlayerJoined(PlayerJoinedPayload {
                player: PlayerDto::from(&output.player),
            }),
        )
        .await;
        self.push(
            &connection_id,
            ServerEvent::RoomJoined(RoomEnteredPayload {
                room_id: room_id.to_string(),
                player_id: output.player.id.to_string(),
                room: RoomDto::from(&output.room),
            }),
        )
        .await;

        if output.became_ready {
            self.broadcast_to_room(
                &output.room,
                ServerEvent::UpdateGame(UpdateGamePayload {
                    room: RoomDto::from(&output.room),
                    last_move: None,
                }),
            )
            .await;
        }

        Ok(AckPayload::ok()
            .with_room_id(room_id.to_string())
            .with_player_id(output.player.id.to_string()))
    }

    async fn on_start_game(&self, payload: RoomPlayerPayload) -> EventResult {
        let room_id = parse_room_id(&payload.room_id)?;
        let player_id = parse_player_id(&payload.player_id)?;
        let room = self
            .usecases
            .start_game
            .execute(&room_id, &player_id)
            .await
            .map_err(EventError::new)?;

        self.broadcast_game_started(&room).await;
        Ok(AckPayload::ok())
    }

    async fn on_make_move(&self, payload: MakeMovePayload) -> EventResult {
        let room_id = parse_room_id(&payload.room_id)?;
        let player_id = parse_player_id(&payload.player_id)?;
        let outcome = self
            .usecases
            .make_move
            .execute(&room_id, &player_id, payload.column)
            .await
            .map_err(EventError::new)?;

        let room = RoomDto::from(&outcome.room);
        self.broadcast_to_room(
            &outcome.room,
            ServerEvent::UpdateGame(UpdateGamePayload {
                room: room.clone(),
                last_move: Some(LastMoveDto {
                    column: outcome.column,
                    row: outcome.row,
                    player_id: player_id.to_string(),
                }),
            }),
        )
        .await;

        if outcome.is_game_over() {
            let (is_draw, winner_id, winning_cells) = match &outcome.kind {
                MoveKind::Win { winning_cells } => {
                    (false, Some(player_id.to_string()), winning_cells.clone())
                }
                _ => (true, None, Vec::new()),
            };
            self.broadcast_to_room(
                &outcome.room,
                ServerEvent::GameOver(GameOverPayload {
                    room,
                    is_draw,
                    winner_id,
                    winning_cells,
                }),
            )
            .await;
        }

        Ok(AckPayload::ok())
    }

    async fn on_leave_room(
        &self,
        connection_id: ConnectionId,
        payload: RoomPlayerPayload,
    ) -> EventResult {
        let room_id = parse_room_id(&payload.room_id)?;
        let player_id = parse_player_id(&payload.player_id)?;
        let departure = self.usecases.leave_room.execute(&room_id, &player_id).await;

        self.notify_departure(&departure).await;
        self.push(
            &connection_id,
            ServerEvent::LeaveRoomResponse(LeaveRoomResponsePayload {
                success: true,
                room_id: room_id.to_string(),
            }),
        )
        .await;

        Ok(AckPayload::ok().with_room_id(room_id.to_string()))
    }

    async fn on_reconnect(
        &self,
        connection_id: ConnectionId,
        payload: ReconnectPayload,
    ) -> EventResult {
        let player_id = parse_player_id(&payload.player_id)?;
        let output = self
            .usecases
            .reconnect
            .execute(&player_id, connection_id)
            .await
            .map_err(EventError::new)?;

        match output.room {
            Some(room) => {
                let dto = RoomDto::from(&room);
                self.push(
                    &connection_id,
                    ServerEvent::UpdateGame(UpdateGamePayload {
                        room: dto.clone(),
                        last_move: None,
                    }),
                )
                .await;
                Ok(AckPayload::ok().with_room(dto))
            }
            None => Ok(AckPayload::ok().with_player(PlayerDto::from(&output.player))),
        }
    }

    async fn on_play_again_request(self: &Arc<Self>, payload: RoomPlayerPayload) -> EventResult {
        let room_id = parse_room_id(&payload.room_id)?;
        let player_id = parse_player_id(&payload.player_id)?;
        let room = self
            .usecases
            .play_again
            .request(&room_id, &player_id)
            .await
            .map_err(EventError::new)?;

        if let Some(vote) = room.play_again_vote() {
            self.arm_play_again_timer(room_id.clone(), vote.deadline).await;
        }
        self.broadcast_to_room(
            &room,
            ServerEvent::PlayAgainStatus(PlayAgainStatusPayload {
                room: RoomDto::from(&room),
                respondent: Some(player_id.to_string()),
                accepted: Some(true),
                time_remaining: Some(self.usecases.play_again.time_remaining_secs(&room)),
                message: None,
            }),
        )
        .await;

        Ok(AckPayload::ok().with_room_id(room_id.to_string()))
    }

    async fn on_play_again_response(&self, payload: PlayAgainResponsePayload) -> EventResult {
        let room_id = parse_room_id(&payload.room_id)?;
        let player_id = parse_player_id(&payload.player_id)?;
        let outcome = self
            .usecases
            .play_again
            .respond(&room_id, &player_id, payload.accepted)
            .await
            .map_err(EventError::new)?;

        self.broadcast_to_room(
            &outcome.recorded,
            ServerEvent::PlayAgainStatus(PlayAgainStatusPayload {
                room: RoomDto::from(&outcome.recorded),
                respondent: Some(player_id.to_string()),
                accepted: Some(payload.accepted),
                time_remaining: Some(
                    self.usecases
                        .play_again
                        .time_remaining_secs(&outcome.recorded),
                ),
                message: None,
            }),
        )
        .await;

        match outcome.resolution {
            PlayAgainResolution::Pending => {}
            PlayAgainResolution::Declined { room } => {
                self.timers.cancel(&room_id).await;
                self.broadcast_to_room(
                    &room,
                    ServerEvent::PlayAgainTimeout(PlayAgainTimeoutPayload {
                        message: PLAY_AGAIN_DECLINED.to_string(),
                        room: RoomDto::from(&room),
                    }),
                )
                .await;
            }
            PlayAgainResolution::Restarted { room } => {
                self.timers.cancel(&room_id).await;
                self.broadcast_game_started(&room).await;
            }
            PlayAgainResolution::MovedToNewRoom { old_room_id, room } => {
                self.timers.cancel(&old_room_id).await;
                self.broadcast_to_room(
                    &room,
                    ServerEvent::PlayAgainStatus(PlayAgainStatusPayload {
                        room: RoomDto::from(&room),
                        respondent: None,
                        accepted: None,
                        time_remaining: None,
                        message: Some(PLAYERS_MOVED.to_string()),
                    }),
                )
                .await;
                self.broadcast_game_started(&room).await;
                return Ok(AckPayload::ok().with_room_id(room.id.to_string()));
            }
        }

        Ok(AckPayload::ok())
    }

    // ========================================
    // 再戦タイマー
    // ========================================

    async fn arm_play_again_timer(self: &Arc<Self>, room_id: RoomId, deadline: Timestamp) {
        let gateway = Arc::clone(self);
        let timeout = self.play_again_timeout;
        let target = room_id.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            gateway.on_play_again_timeout(&target, deadline).await;
        });
        self.timers.arm(room_id, handle).await;
    }

    /// 再戦タイマーの発火。`deadline` はセットした時点の投票の期限
    async fn on_play_again_timeout(&self, room_id: &RoomId, deadline: Timestamp) {
        let _guard = self.dispatch_lock.lock().await;
        let expired = self.usecases.play_again.expire(room_id, deadline).await;
        self.timers.forget(room_id).await;
        let Some(room) = expired else {
            tracing::debug!("Stale play again timer of room {} ignored", room_id);
            return;
        };

        self.broadcast_to_room(
            &room,
            ServerEvent::PlayAgainTimeout(PlayAgainTimeoutPayload {
                message: PLAY_AGAIN_TIMED_OUT.to_string(),
                room: RoomDto::from(&room),
            }),
        )
        .await;
    }

    // ========================================
    // 通知
    // ========================================

    async fn notify_departure(&self, departure: &RoomDeparture) {
        if departure.left_play_again_pending() {
            self.timers.cancel(&departure.room_id).await;
        }
        if !departure.should_notify() {
            return;
        }
        let Some(remaining) = &departure.remaining else {
            return;
        };
        self.broadcast_to_room(
            remaining,
            ServerEvent::PlayerDisconnected(PlayerDisconnectedPayload {
                player_id: departure.player_id.to_string(),
                nickname: departure.nickname.as_ref().map(|n| n.to_string()),
            }),
        )
        .await;
    }

    async fn broadcast_game_started(&self, room: &Room) {
        self.broadcast_to_room(
            room,
            ServerEvent::GameStarted(GameStartedPayload {
                room: RoomDto::from(room),
                current_turn: room.current_turn().map(|id| id.to_string()),
            }),
        )
        .await;
    }

    /// ルームの参加者の現在の接続
    async fn room_connections(&self, room: &Room) -> Vec<ConnectionId> {
        let mut connections = Vec::with_capacity(room.players().len());
        for member in room.players() {
            match self.player_repository.find_by_id(&member.id).await {
                Some(player) => connections.push(player.connection_id),
                None => tracing::warn!("Member {} of room {} is not registered", member.id, room.id),
            }
        }
        connections
    }

    async fn room_connections_except(
        &self,
        room: &Room,
        excluded: &PlayerId,
    ) -> Vec<ConnectionId> {
        let mut connections = Vec::new();
        for member in room.players().iter().filter(|m| &m.id != excluded) {
            if let Some(player) = self.player_repository.find_by_id(&member.id).await {
                connections.push(player.connection_id);
            }
        }
        connections
    }

    async fn broadcast_to_room(&self, room: &Room, event: ServerEvent) {
        let targets = self.room_connections(room).await;
        self.broadcast(targets, event).await;
    }

    async fn broadcast(&self, targets: Vec<ConnectionId>, event: ServerEvent) {
        if targets.is_empty() {
            return;
        }
        let json = match event.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize event: {}", e);
                return;
            }
        };
        if let Err(e) = self.message_pusher.broadcast(targets, &json).await {
            tracing::warn!("Failed to broadcast event: {}", e);
        }
    }

    async fn push(&self, connection_id: &ConnectionId, event: ServerEvent) {
        let json = match event.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize event: {}", e);
                return;
            }
        };
        if let Err(e) = self.message_pusher.push_to(connection_id, &json).await {
            tracing::warn!("Failed to push event to {}: {}", connection_id, e);
        }
    }

    async fn reply_error(&self, connection_id: &ConnectionId, id: Option<u64>, error: EventError) {
        let event = if error.critical {
            ServerEvent::critical_error(&error.message)
        } else {
            ServerEvent::error(&error.message)
        };
        self.push(connection_id, event).await;
        self.push(
            connection_id,
            ServerEvent::Ack(AckPayload::failed(error.message).with_id(id)),
        )
        .await;
    }
}
