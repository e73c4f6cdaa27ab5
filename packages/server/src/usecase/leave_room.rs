//! UseCase: ルームからの退出
//!
//! 退出は冪等です。ルームが存在しない、あるいはすでに退出済みでもエラーにはなりません。

use std::sync::Arc;

use crate::domain::{
    Nickname, PlayerId, PlayerRepository, RepositoryError, Room, RoomId, RoomRepository,
    RoomStatus,
};

/// ルームから 1 人が抜けた結果
#[derive(Debug, Clone)]
pub struct RoomDeparture {
    pub room_id: RoomId,
    pub player_id: PlayerId,
    pub nickname: Option<Nickname>,
    /// 退出前にルームの参加者だったか
    pub was_member: bool,
    /// 退出後のルーム。最後の 1 人が抜けて削除された場合は `None`
    pub remaining: Option<Room>,
}

impl RoomDeparture {
    /// 残った参加者に通知すべきか
    pub fn should_notify(&self) -> bool {
        self.was_member && self.remaining.is_some()
    }

    /// 退出によってルームが再戦投票中ではなくなったか（削除も含む）
    pub fn left_play_again_pending(&self) -> bool {
        self.remaining
            .as_ref()
            .is_none_or(|room| room.status() != RoomStatus::PlayAgainPending)
    }
}

/// 退出のユースケース
pub struct LeaveRoomUseCase {
    player_repository: Arc<dyn PlayerRepository>,
    room_repository: Arc<dyn RoomRepository>,
}

impl LeaveRoomUseCase {
    pub fn new(
        player_repository: Arc<dyn PlayerRepository>,
        room_repository: Arc<dyn RoomRepository>,
    ) -> Self {
        Self {
            player_repository,
            room_repository,
        }
    }

    pub async fn execute(&self, room_id: &RoomId, player_id: &PlayerId) -> RoomDeparture {
        let room = self.room_repository.find_by_id(room_id).await;
        let was_member = room.as_ref().is_some_and(|r| r.is_member(player_id));

        let remaining = match self
            .room_repository
            .remove_player_from_room(room_id, player_id)
            .await
        {
            Ok(remaining) => remaining,
            Err(RepositoryError::RoomNotFound(_)) => None,
            Err(e) => {
                tracing::warn!("Failed to remove player {} from room {}: {}", player_id, room_id, e);
                room
            }
        };

        // ルームへの紐付けは、退出したルームを指している場合のみ解除する
        let player = self.player_repository.find_by_id(player_id).await;
        if let Some(player) = &player
            && player.room_id.as_ref() == Some(room_id)
        {
            if let Err(e) = self.player_repository.clear_room(player_id).await {
                tracing::warn!("Failed to clear room of player {}: {}", player_id, e);
            }
        }

        if was_member {
            tracing::info!("Player {} left room {}", player_id, room_id);
        }

        RoomDeparture {
            room_id: room_id.clone(),
            player_id: *player_id,
            nickname: player.map(|p| p.nickname),
            was_member,
            remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::test_support::TestContext;

    fn usecase(ctx: &TestContext) -> LeaveRoomUseCase {
        LeaveRoomUseCase::new(ctx.players.clone(), ctx.rooms.clone())
    }

    #[tokio::test]
    async fn test_leave_during_game_downgrades_room() {
        // テスト項目: 対局中に 1 人が退出すると残った 1 人のルームは WAITING に戻る
        // given (前提条件):
        let ctx = TestContext::new();
        let (first, second, room) = ctx.playing_room().await;

        // when (操作):
        let departure = usecase(&ctx).execute(&room.id, &second.id).await;

        // then (期待する結果):
        assert!(departure.was_member);
        assert!(departure.should_notify());
        assert_eq!(departure.nickname, Some(second.nickname.clone()));
        let remaining = departure.remaining.unwrap();
        assert_eq!(remaining.status(), RoomStatus::Waiting);
        assert_eq!(remaining.players()[0].id, first.id);
        assert!(
            ctx.players
                .find_by_id(&second.id)
                .await
                .unwrap()
                .room_id
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_last_player_leaving_deletes_room() {
        // テスト項目: 最後の 1 人が退出するとルームが削除される
        // given (前提条件):
        let ctx = TestContext::new();
        let (alice, room) = ctx.host_room("alice").await;

        // when (操作):
        let departure = usecase(&ctx).execute(&room.id, &alice.id).await;

        // then (期待する結果):
        assert!(departure.remaining.is_none());
        assert!(!departure.should_notify());
        assert!(departure.left_play_again_pending());
        assert!(ctx.rooms.find_by_id(&room.id).await.is_none());
    }

    #[tokio::test]
    async fn test_leave_is_idempotent() {
        // テスト項目: 退出済み・存在しないルームからの退出もエラーにならない
        // given (前提条件):
        let ctx = TestContext::new();
        let (first, second, room) = ctx.playing_room().await;
        usecase(&ctx).execute(&room.id, &second.id).await;

        // when (操作):
        let again = usecase(&ctx).execute(&room.id, &second.id).await;
        let missing = usecase(&ctx)
            .execute(&RoomId::new("999999".to_string()).unwrap(), &first.id)
            .await;

        // then (期待する結果):
        assert!(!again.was_member);
        assert_eq!(again.remaining.map(|r| r.players().len()), Some(1));
        assert!(!missing.was_member);
        assert!(missing.remaining.is_none());
        // 別のルームを指定しても現在の紐付けは解除されない
        assert_eq!(
            ctx.players.find_by_id(&first.id).await.unwrap().room_id,
            Some(room.id)
        );
    }
}
