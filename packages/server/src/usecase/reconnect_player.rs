//! UseCase: プレイヤー ID による再接続

use std::sync::Arc;

use crate::domain::{ConnectionId, Player, PlayerId, PlayerRepository, Room, RoomRepository};

use super::error::ReconnectError;

/// 再接続の結果
#[derive(Debug, Clone)]
pub struct ReconnectOutput {
    pub player: Player,
    /// プレイヤーがまだルームに着席している場合、そのルーム
    pub room: Option<Room>,
}

pub struct ReconnectPlayerUseCase {
    player_repository: Arc<dyn PlayerRepository>,
    room_repository: Arc<dyn RoomRepository>,
}

impl ReconnectPlayerUseCase {
    pub fn new(
        player_repository: Arc<dyn PlayerRepository>,
        room_repository: Arc<dyn RoomRepository>,
    ) -> Self {
        Self {
            player_repository,
            room_repository,
        }
    }

    pub async fn execute(
        &self,
        player_id: &PlayerId,
        connection_id: ConnectionId,
    ) -> Result<ReconnectOutput, ReconnectError> {
        let player = self
            .player_repository
            .update_connection_id(player_id, connection_id)
            .await
            .map_err(|_| ReconnectError::PlayerNotFound)?;

        let room = match &player.room_id {
            Some(room_id) => self
                .room_repository
                .find_by_id(room_id)
                .await
                .filter(|room| room.is_member(&player.id)),
            None => None,
        };

        tracing::info!(
            "Player '{}' ({}) reconnected on {}",
            player.nickname,
            player.id,
            connection_id
        );
        Ok(ReconnectOutput { player, room })
    }
}
