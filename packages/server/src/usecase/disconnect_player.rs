//! UseCase: 接続断の処理
//!
//! 切断された接続に紐付くプレイヤーがルームにいれば退出させます。
//! プレイヤー自体は残るため、後から `reconnect` で同じ ID を使えます。

use std::sync::Arc;

use crate::domain::{ConnectionId, PlayerRepository};

use super::leave_room::{LeaveRoomUseCase, RoomDeparture};

pub struct DisconnectPlayerUseCase {
    player_repository: Arc<dyn PlayerRepository>,
    leave_room: Arc<LeaveRoomUseCase>,
}

impl DisconnectPlayerUseCase {
    pub fn new(
        player_repository: Arc<dyn PlayerRepository>,
        leave_room: Arc<LeaveRoomUseCase>,
    ) -> Self {
        Self {
            player_repository,
            leave_room,
        }
    }

    /// 切断処理を実行
    ///
    /// # Returns
    ///
    /// ルームから退出した場合はその結果。プレイヤーが見つからない、
    /// またはどのルームにも属していない場合は `None`。
    pub async fn execute(&self, connection_id: &ConnectionId) -> Option<RoomDeparture> {
        let player = self
            .player_repository
            .find_by_connection_id(connection_id)
            .await?;
        let room_id = player.room_id?;

        tracing::info!(
            "Player '{}' ({}) disconnected from room {}",
            player.nickname,
            player.id,
            room_id
        );
        Some(self.leave_room.execute(&room_id, &player.id).await)
    }
}
