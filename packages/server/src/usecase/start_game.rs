//! UseCase: 対局開始（ホストのみ）

use std::sync::Arc;

use crate::domain::{MAX_PLAYERS_PER_ROOM, PlayerId, Room, RoomId, RoomRepository, RoomStatus};

use super::error::StartGameError;

/// 対局開始のユースケース
///
/// ホスト権限と READY 状態のチェックはここで行い、Room Registry 側は人数のみを検証する。
pub struct StartGameUseCase {
    room_repository: Arc<dyn RoomRepository>,
}

impl StartGameUseCase {
    pub fn new(room_repository: Arc<dyn RoomRepository>) -> Self {
        Self { room_repository }
    }

    pub async fn execute(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
    ) -> Result<Room, StartGameError> {
        let room = self
            .room_repository
            .find_by_id(room_id)
            .await
            .ok_or(StartGameError::RoomNotFound)?;

        if &room.host_id != player_id {
            return Err(StartGameError::NotHost);
        }
        if room.players().len() != MAX_PLAYERS_PER_ROOM || room.status() != RoomStatus::Ready {
            return Err(StartGameError::NotReady);
        }

        let room = self.room_repository.start_game(room_id).await?;
        tracing::info!(
            "Game started in room {} (first turn: {:?})",
            room_id,
            room.current_turn()
        );
        Ok(room)
    }
}
