//! UseCase: ルームへの参加
//!
//! ## ニックネームによる再接続
//!
//! 同じニックネームの既存プレイヤーがいて、そのプレイヤーが
//! 「どのルームにも属していない」か「別のルームに属している」場合は、
//! 新しいプレイヤーを作らずに同一人物として扱い、接続 ID を付け替えます。
//! 別のルームに属していた場合はそのルームから退出させます（1 人が同時に属するルームは 1 つまで）。
//!
//! 異なる人物が同じニックネームを選んだ場合に取り違えが起こり得ることは既知の問題です。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, Nickname, Player, PlayerRepository, RepositoryError, Room, RoomError, RoomId,
    RoomRepository, RoomStatus,
};

use super::{error::JoinRoomError, leave_room::RoomDeparture};

/// ルーム参加の結果
#[derive(Debug, Clone)]
pub struct JoinRoomOutput {
    pub player: Player,
    /// 参加後のルーム（2 人揃った場合は READY）
    pub room: Room,
    /// 今回の参加で 2 人揃い READY になったか
    pub became_ready: bool,
    /// ニックネーム再接続で以前のルームから退出した場合、その結果
    pub previous_room: Option<RoomDeparture>,
}

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    player_repository: Arc<dyn PlayerRepository>,
    room_repository: Arc<dyn RoomRepository>,
}

impl JoinRoomUseCase {
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
        connection_id: ConnectionId,
        room_id: &RoomId,
        nickname: &str,
        avatar: String,
    ) -> Result<JoinRoomOutput, JoinRoomError> {
        // 1. ルームの存在・空き・状態を確認
        let room = self
            .room_repository
            .find_by_id(room_id)
            .await
            .ok_or(JoinRoomError::RoomNotFound)?;
        if room.is_full() {
            return Err(JoinRoomError::RoomFull);
        }
        if room.status() != RoomStatus::Waiting {
            tracing::error!(
                "Room {} has a free seat but status is {}",
                room_id,
                room.status()
            );
            return Err(JoinRoomError::NotJoinable(room.status()));
        }

        let nickname = Nickname::new(nickname)?;

        // 2. プレイヤーを用意（ニックネーム再接続 or 新規作成）
        let (player, previous_room) = self
            .resolve_player(connection_id, room_id, nickname, avatar)
            .await?;

        // 3. ルームに追加
        let room = self
            .room_repository
            .add_player_to_room(room_id, player.as_member())
            .await
            .map_err(|e| match e {
                RepositoryError::RoomNotFound(_) => JoinRoomError::RoomNotFound,
                RepositoryError::Room(RoomError::RoomFull) => JoinRoomError::RoomFull,
                RepositoryError::Room(RoomError::InvalidStatus { actual, .. }) => {
                    JoinRoomError::NotJoinable(actual)
                }
                other => JoinRoomError::Repository(other),
            })?;

        let player = self
            .player_repository
            .assign_room(&player.id, room_id.clone())
            .await
            .map_err(JoinRoomError::Repository)?;

        // 4. 2 人揃ったら READY
        let (room, became_ready) = if room.is_full() {
            let ready = self
                .room_repository
                .set_room_ready(room_id)
                .await
                .map_err(JoinRoomError::Repository)?;
            (ready, true)
        } else {
            (room, false)
        };

        tracing::info!("Player '{}' joined room {}", player.nickname, room_id);
        Ok(JoinRoomOutput {
            player,
            room,
            became_ready,
            previous_room,
        })
    }

    async fn resolve_player(
        &self,
        connection_id: ConnectionId,
        room_id: &RoomId,
        nickname: Nickname,
        avatar: String,
    ) -> Result<(Player, Option<RoomDeparture>), JoinRoomError> {
        let existing = self
            .player_repository
            .find_by_nickname(&nickname)
            .await
            .filter(|p| p.room_id.as_ref() != Some(room_id));

        let Some(existing) = existing else {
            let player = self
                .player_repository
                .create_player(nickname, avatar, connection_id)
                .await;
            return Ok((player, None));
        };

        tracing::info!(
            "Reusing player '{}' ({}) by nickname",
            existing.nickname,
            existing.id
        );

        let previous_room = match &existing.room_id {
            Some(previous_id) => Some(self.leave_previous_room(previous_id, &existing).await),
            None => None,
        };

        let player = self
            .player_repository
            .update_connection_id(&existing.id, connection_id)
            .await
            .map_err(JoinRoomError::Repository)?;
        Ok((player, previous_room))
    }

    async fn leave_previous_room(&self, previous_id: &RoomId, player: &Player) -> RoomDeparture {
        let remaining = self
            .room_repository
            .remove_player_from_room(previous_id, &player.id)
            .await
            .ok()
            .flatten();
        if let Err(e) = self.player_repository.clear_room(&player.id).await {
            tracing::warn!("Failed to clear room of player {}: {}", player.id, e);
        }
        RoomDeparture {
            room_id: previous_id.clone(),
            player_id: player.id,
            nickname: Some(player.nickname.clone()),
            was_member: true,
            remaining,
        }
    }
}
