//! WebSocket message DTOs.
//!
//! Every frame is a JSON text message of the shape
//! `{"event": "<name>", "data": {...}, "id": <optional u64>}`.
//! Payload fields are camelCase on the wire.

use serde::{Deserialize, Serialize};

use crate::domain::{Board, CellPosition, RoomStatus};

// ========================================
// Client → Server
// ========================================

/// Player profile sent with `create_room` / `join_room`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlayerProfile {
    pub nickname: String,
    #[serde(default)]
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateRoomPayload {
    pub player: PlayerProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomPayload {
    pub room_id: String,
    pub player: PlayerProfile,
}

/// Payload for events addressed to a room on behalf of a player
/// (`start_game`, `leave_room`, `play_again_request`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPlayerPayload {
    pub room_id: String,
    pub player_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MakeMovePayload {
    pub room_id: String,
    pub player_id: String,
    pub column: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconnectPayload {
    pub player_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayAgainResponsePayload {
    pub room_id: String,
    pub player_id: String,
    pub accepted: bool,
}

/// Client → Server events
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    CreateRoom(CreateRoomPayload),
    JoinRoom(JoinRoomPayload),
    StartGame(RoomPlayerPayload),
    MakeMove(MakeMovePayload),
    LeaveRoom(RoomPlayerPayload),
    Reconnect(ReconnectPayload),
    PlayAgainRequest(RoomPlayerPayload),
    PlayAgainResponse(PlayAgainResponsePayload),
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::CreateRoom(_) => "create_room",
            ClientEvent::JoinRoom(_) => "join_room",
            ClientEvent::StartGame(_) => "start_game",
            ClientEvent::MakeMove(_) => "make_move",
            ClientEvent::LeaveRoom(_) => "leave_room",
            ClientEvent::Reconnect(_) => "reconnect",
            ClientEvent::PlayAgainRequest(_) => "play_again_request",
            ClientEvent::PlayAgainResponse(_) => "play_again_response",
        }
    }
}

#[derive(Deserialize)]
struct FrameHeader {
    #[serde(default)]
    id: Option<u64>,
}

/// A parsed inbound frame. The ack id is recovered even when the event itself is malformed.
#[derive(Debug)]
pub struct InboundFrame {
    pub id: Option<u64>,
    pub event: Result<ClientEvent, serde_json::Error>,
}

impl InboundFrame {
    pub fn parse(text: &str) -> Self {
        let id = serde_json::from_str::<FrameHeader>(text)
            .ok()
            .and_then(|header| header.id);
        Self {
            id,
            event: serde_json::from_str(text),
        }
    }
}

// ========================================
// Server → Client
// ========================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerDto {
    pub id: String,
    pub nickname: String,
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMoveDto {
    pub column: usize,
    pub row: usize,
    pub player_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayAgainResponseDto {
    pub player_id: String,
    pub accepted: bool,
    pub timestamp: i64,
}

/// Room snapshot as seen by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDto {
    pub id: String,
    pub players: Vec<PlayerDto>,
    pub status: RoomStatus,
    pub host_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_turn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_state: Option<Board>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winning_cells: Option<Vec<CellPosition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_move: Option<LastMoveDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub play_again_responses: Option<Vec<PlayAgainResponseDto>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub play_again_timeout_end: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub play_again_initiator: Option<String>,
    pub created_at: i64,
}

/// `room_created` / `room_joined`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomEnteredPayload {
    pub room_id: String,
    pub player_id: String,
    pub room: RoomDto,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerJoinedPayload {
    pub player: PlayerDto,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStartedPayload {
    pub room: RoomDto,
    pub current_turn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGamePayload {
    pub room: RoomDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_move: Option<LastMoveDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOverPayload {
    pub room: RoomDto,
    pub is_draw: bool,
    pub winner_id: Option<String>,
    pub winning_cells: Vec<CellPosition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDisconnectedPayload {
    pub player_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

/// `play_again_status`: either a vote update (respondent / accepted / timeRemaining)
/// or an informational message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayAgainStatusPayload {
    pub room: RoomDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub respondent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_remaining: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayAgainTimeoutPayload {
    pub message: String,
    pub room: RoomDto,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRoomResponsePayload {
    pub success: bool,
    pub room_id: String,
}

/// Acknowledgement of a client event, echoing the frame id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AckPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<RoomDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<PlayerDto>,
}

impl AckPayload {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: Option<u64>) -> Self {
        self.id = id;
        self
    }

    pub fn with_room_id(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = Some(room_id.into());
        self
    }

    pub fn with_player_id(mut self, player_id: impl Into<String>) -> Self {
        self.player_id = Some(player_id.into());
        self
    }

    pub fn with_room(mut self, room: RoomDto) -> Self {
        self.room = Some(room);
        self
    }

    pub fn with_player(mut self, player: PlayerDto) -> Self {
        self.player = Some(player);
        self
    }
}

/// Server → Client events
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    RoomCreated(RoomEnteredPayload),
    RoomJoined(RoomEnteredPayload),
    PlayerJoined(PlayerJoinedPayload),
    GameStarted(GameStartedPayload),
    UpdateGame(UpdateGamePayload),
    GameOver(GameOverPayload),
    Error(ErrorPayload),
    PlayerDisconnected(PlayerDisconnectedPayload),
    PlayAgainStatus(PlayAgainStatusPayload),
    PlayAgainTimeout(PlayAgainTimeoutPayload),
    LeaveRoomResponse(LeaveRoomResponsePayload),
    Ack(AckPayload),
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error(ErrorPayload {
            message: message.into(),
            critical: None,
        })
    }

    pub fn critical_error(message: impl Into<String>) -> Self {
        ServerEvent::Error(ErrorPayload {
            message: message.into(),
            critical: Some(true),
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_make_move_frame_with_id() {
        // テスト項目: camelCase のペイロードと ack 用 id を読み取れる
        // given (前提条件):
        let text = r#"{"event":"make_move","data":{"roomId":"123456","playerId":"p1","column":3},"id":7}"#;

        // when (操作):
        let frame = InboundFrame::parse(text);

        // then (期待する結果):
        assert_eq!(frame.id, Some(7));
        assert_eq!(
            frame.event.unwrap(),
            ClientEvent::MakeMove(MakeMovePayload {
                room_id: "123456".to_string(),
                player_id: "p1".to_string(),
                column: 3,
            })
        );
    }

    #[test]
    fn test_parse_frame_without_id() {
        // テスト項目: id のないフレームも受理される
        // given (前提条件):
        let text = r#"{"event":"create_room","data":{"player":{"nickname":"alice","avatar":"a.svg"}}}"#;

        // when (操作):
        let frame = InboundFrame::parse(text);

        // then (期待する結果):
        assert_eq!(frame.id, None);
        let ClientEvent::CreateRoom(payload) = frame.event.unwrap() else {
            panic!("expected create_room");
        };
        assert_eq!(payload.player.nickname, "alice");
        assert_eq!(payload.player.avatar, "a.svg");
    }

    #[test]
    fn test_parse_unknown_event_keeps_id() {
        // テスト項目: 未知のイベントは失敗するが、id は取り出せる
        // given (前提条件):
        let text = r#"{"event":"dance","data":{},"id":3}"#;

        // when (操作):
        let frame = InboundFrame::parse(text);

        // then (期待する結果):
        assert_eq!(frame.id, Some(3));
        assert!(frame.event.is_err());
    }

    #[test]
    fn test_parse_garbage_frame() {
        // テスト項目: JSON でないフレームは id なしのエラーになる
        // given (前提条件):
        let text = "not json";

        // when (操作):
        let frame = InboundFrame::parse(text);

        // then (期待する結果):
        assert_eq!(frame.id, None);
        assert!(frame.event.is_err());
    }

    #[test]
    fn test_server_event_wire_shape() {
        // テスト項目: サーバーイベントは event / data 形式でシリアライズされる
        // given (前提条件):
        let event = ServerEvent::critical_error("Room is not accepting players");

        // when (操作):
        let value: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();

        // then (期待する結果):
        assert_eq!(
            value,
            json!({
                "event": "error",
                "data": {"message": "Room is not accepting players", "critical": true}
            })
        );
    }

    #[test]
    fn test_ack_omits_absent_fields() {
        // テスト項目: ack は値のあるフィールドのみを含む
        // given (前提条件):
        let ack = AckPayload::failed("Room not found").with_id(Some(1));

        // when (操作):
        let value = serde_json::to_value(ServerEvent::Ack(ack)).unwrap();

        // then (期待する結果):
        assert_eq!(
            value,
            json!({
                "event": "ack",
                "data": {"id": 1, "success": false, "error": "Room not found"}
            })
        );
    }

    #[test]
    fn test_game_over_draw_has_null_winner() {
        // テスト項目: 引き分けの game_over は winnerId が null
        // given (前提条件):
        let room = RoomDto {
            id: "123456".to_string(),
            players: vec![],
            status: RoomStatus::Finished,
            host_id: "h".to_string(),
            current_turn: None,
            game_state: None,
            winner: None,
            winning_cells: None,
            last_move: None,
            play_again_responses: None,
            play_again_timeout_end: None,
            play_again_initiator: None,
            created_at: 0,
        };
        let event = ServerEvent::GameOver(GameOverPayload {
            room,
            is_draw: true,
            winner_id: None,
            winning_cells: vec![],
        });

        // when (操作):
        let value = serde_json::to_value(event).unwrap();

        // then (期待する結果):
        assert_eq!(value["event"], "game_over");
        assert_eq!(value["data"]["isDraw"], true);
        assert!(value["data"]["winnerId"].is_null());
        assert_eq!(value["data"]["room"]["status"], "finished");
        assert_eq!(value["data"]["room"]["hostId"], "h");
    }
}
