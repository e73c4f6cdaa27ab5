//! Conversion logic from domain entities to DTOs.

use yonmoku_shared::time::timestamp_to_jst_rfc3339;

use crate::domain::{LastMove, PlayAgainResponse, Player, Room, RoomMember};
use crate::infrastructure::dto::{http, websocket as dto};

impl From<&RoomMember> for dto::PlayerDto {
    fn from(member: &RoomMember) -> Self {
        Self {
            id: member.id.to_string(),
            nickname: member.nickname.to_string(),
            avatar: member.avatar.clone(),
        }
    }
}

impl From<&Player> for dto::PlayerDto {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id.to_string(),
            nickname: player.nickname.to_string(),
            avatar: player.avatar.clone(),
        }
    }
}

impl From<&LastMove> for dto::LastMoveDto {
    fn from(last_move: &LastMove) -> Self {
        Self {
            column: last_move.column,
            row: last_move.row,
            player_id: last_move.player_id.to_string(),
        }
    }
}

impl From<&PlayAgainResponse> for dto::PlayAgainResponseDto {
    fn from(response: &PlayAgainResponse) -> Self {
        Self {
            player_id: response.player_id.to_string(),
            accepted: response.accepted,
            timestamp: response.timestamp.value(),
        }
    }
}

impl From<&Room> for dto::RoomDto {
    fn from(room: &Room) -> Self {
        let vote = room.play_again_vote();
        let winning_cells = room.winning_cells();

        Self {
            id: room.id.to_string(),
            players: room.players().iter().map(dto::PlayerDto::from).collect(),
            status: room.status(),
            host_id: room.host_id.to_string(),
            current_turn: room.current_turn().map(|id| id.to_string()),
            game_state: room.board().copied(),
            winner: room.winner().map(|id| id.to_string()),
            winning_cells: (!winning_cells.is_empty()).then(|| winning_cells.to_vec()),
            last_move: room.last_move().map(dto::LastMoveDto::from),
            play_again_responses: vote.map(|v| {
                v.responses
                    .iter()
                    .map(dto::PlayAgainResponseDto::from)
                    .collect()
            }),
            play_again_timeout_end: vote.map(|v| v.deadline.value()),
            play_again_initiator: vote.map(|v| v.initiator.to_string()),
            created_at: room.created_at.value(),
        }
    }
}

impl From<&Room> for http::RoomSummaryDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.to_string(),
            status: room.status(),
            players: room.players().iter().map(dto::PlayerDto::from).collect(),
            host_id: room.host_id.to_string(),
            created_at: timestamp_to_jst_rfc3339(room.created_at.value()),
        }
    }
}

impl From<&Room> for http::RoomDetailDto {
    fn from(room: &Room) -> Self {
        Self {
            room: dto::RoomDto::from(room),
            created_at: timestamp_to_jst_rfc3339(room.created_at.value()),
            play_again_deadline: room
                .play_again_vote()
                .and_then(|v| timestamp_to_jst_rfc3339(v.deadline.value())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        CellPosition, GameOutcome, Nickname, PlayerId, RoomId, RoomStatus, Timestamp,
    };

    fn member(name: &str) -> RoomMember {
        RoomMember {
            id: PlayerId::generate(),
            nickname: Nickname::new(name).unwrap(),
            avatar: format!("{}.svg", name),
        }
    }

    fn room_with_two_players() -> (Room, RoomMember, RoomMember) {
        let alice = member("alice");
        let bob = member("bob");
        let mut room = Room::new(
            RoomId::new("123456".to_string()).unwrap(),
            alice.clone(),
            Timestamp::new(0),
        );
        room.add_player(bob.clone()).unwrap();
        (room, alice, bob)
    }

    #[test]
    fn test_waiting_room_has_no_game_fields() {
        // テスト項目: WAITING のルームはゲーム関連フィールドを含まない
        // given (前提条件):
        let (room, alice, _bob) = room_with_two_players();

        // when (操作):
        let dto = dto::RoomDto::from(&room);
        let value = serde_json::to_value(&dto).unwrap();

        // then (期待する結果):
        assert_eq!(dto.status, RoomStatus::Waiting);
        assert_eq!(dto.host_id, alice.id.to_string());
        assert_eq!(dto.players.len(), 2);
        assert_eq!(dto.players[0].nickname, "alice");
        assert!(value.get("gameState").is_none());
        assert!(value.get("currentTurn").is_none());
        assert!(value.get("winner").is_none());
    }

    #[test]
    fn test_playing_room_exposes_board_and_turn() {
        // テスト項目: PLAYING のルームは盤面と手番を含む
        // given (前提条件):
        let (mut room, alice, _bob) = room_with_two_players();
        room.set_ready().unwrap();
        room.start_game(0).unwrap();

        // when (操作):
        let value = serde_json::to_value(dto::RoomDto::from(&room)).unwrap();

        // then (期待する結果):
        assert_eq!(value["status"], "playing");
        assert_eq!(value["currentTurn"], alice.id.to_string());
        assert_eq!(value["gameState"].as_array().unwrap().len(), 6);
        assert_eq!(value["gameState"][0].as_array().unwrap().len(), 7);
    }

    #[test]
    fn test_pending_room_exposes_vote() {
        // テスト項目: 再戦投票中のルームは回答・期限・発起人を含む
        // given (前提条件):
        let (mut room, alice, _bob) = room_with_two_players();
        room.set_ready().unwrap();
        room.start_game(0).unwrap();
        room.end_game(GameOutcome::Win {
            winner: alice.id,
            winning_cells: vec![CellPosition::new(5, 0), CellPosition::new(4, 0)],
        })
        .unwrap();
        room.initiate_play_again(alice.id, Timestamp::new(10), Timestamp::new(30_010))
            .unwrap();

        // when (操作):
        let dto = dto::RoomDto::from(&room);

        // then (期待する結果):
        assert_eq!(dto.status, RoomStatus::PlayAgainPending);
        assert_eq!(dto.winner, Some(alice.id.to_string()));
        assert_eq!(dto.winning_cells.as_ref().map(Vec::len), Some(2));
        assert_eq!(dto.play_again_timeout_end, Some(30_010));
        assert_eq!(dto.play_again_initiator, Some(alice.id.to_string()));
        assert_eq!(dto.play_again_responses.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_room_detail_formats_created_at_in_jst() {
        // テスト項目: HTTP 用の詳細 DTO は作成時刻を JST の RFC 3339 で返す
        // given (前提条件):
        let (room, _alice, _bob) = room_with_two_players();

        // when (操作):
        let detail = http::RoomDetailDto::from(&room);

        // then (期待する結果):
        assert_eq!(
            detail.created_at.as_deref(),
            Some("1970-01-01T09:00:00+09:00")
        );
        assert!(detail.play_again_deadline.is_none());
    }
}
