//! UseCase: ルーム作成
//!
//! 新しいプレイヤーを登録し、そのプレイヤーをホストとするルームを作成します。

use std::sync::Arc;

use crate::domain::{ConnectionId, Nickname, Player, PlayerRepository, Room, RoomRepository};

use super::error::CreateRoomError;

/// ルーム作成の結果
#[derive(Debug, Clone)]
pub struct CreateRoomOutput {
    pub player: Player,
    pub room: Room,
}

/// ルーム作成のユースケース
pub struct CreateRoomUseCase {
    player_repository: Arc<dyn PlayerRepository>,
    room_repository: Arc<dyn RoomRepository>,
}

impl CreateRoomUseCase {
    pub fn new(
        player_repository: Arc<dyn PlayerRepository>,
        room_repository: Arc<dyn RoomRepository>,
    ) -> Self {
        Self {
            player_repository,
            room_repository,
        }
    }

    /// ルーム作成を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - リクエスト元の接続
    /// * `nickname` - 表示名（前後の空白は除去される）
    /// * `avatar` - アバター参照（そのまま保持）
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        nickname: &str,
        avatar: String,
    ) -> Result<CreateRoomOutput, CreateRoomError> {
        let nickname = Nickname::new(nickname)?;

        // 1. プレイヤーを登録
        let player = self
            .player_repository
            .create_player(nickname, avatar, connection_id)
            .await;

        // 2. ルームを作成（作成者がホスト）
        let room = self.room_repository.create_room(player.as_member()).await;

        // 3. プレイヤーをルームに紐付け
        let player = self
            .player_repository
            .assign_room(&player.id, room.id.clone())
            .await
            .unwrap_or(player);

        Ok(CreateRoomOutput { player, room })
    }
}
