//! UseCase: 再戦投票（Play-Again Coordinator）
//!
//! 終局後に一方が再戦を申し込み、全員が承諾したら新しい対局を始めます。
//! 拒否またはタイムアウトの場合は FINISHED に戻ります。
//!
//! タイマー自体は UI 層が持ち、期限が来たら [`PlayAgainUseCase::expire`] を呼びます。
//! `expire` はタイマーをセットしたときの期限で投票を照合するため、すでに解決済みの投票や
//! 別の投票には何もしません。

use std::sync::Arc;

use yonmoku_shared::time::Clock;

use crate::domain::{
    PlayerId, PlayerRepository, RepositoryError, Room, RoomError, RoomId, RoomRepository,
    RoomStatus, Timestamp,
};

use super::error::PlayAgainError;

/// 全員が承諾したときの再戦の始め方
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlayAgainStrategy {
    /// 同じルームで盤面をリセットする
    #[default]
    ResetRoom,
    /// 新しいルームコードのルームに 2 人を移す（古いルームは削除）
    NewRoom,
}

/// 再戦回答の処理結果
#[derive(Debug, Clone)]
pub enum PlayAgainResolution {
    /// まだ全員の回答が揃っていない
    Pending,
    /// 拒否があり、FINISHED に戻った
    Declined { room: Room },
    /// 同じルームで新しい対局が始まった
    Restarted { room: Room },
    /// 新しいルームで対局が始まった
    MovedToNewRoom { old_room_id: RoomId, room: Room },
}

#[derive(Debug, Clone)]
pub struct PlayAgainResponseOutcome {
    /// 回答を記録した直後のルーム（投票状況の通知に使う）
    pub recorded: Room,
    pub resolution: PlayAgainResolution,
}

pub struct PlayAgainUseCase {
    player_repository: Arc<dyn PlayerRepository>,
    room_repository: Arc<dyn RoomRepository>,
    clock: Arc<dyn Clock>,
    strategy: PlayAgainStrategy,
}

impl PlayAgainUseCase {
    pub fn new(
        player_repository: Arc<dyn PlayerRepository>,
        room_repository: Arc<dyn RoomRepository>,
        clock: Arc<dyn Clock>,
        strategy: PlayAgainStrategy,
    ) -> Self {
        Self {
            player_repository,
            room_repository,
            clock,
            strategy,
        }
    }

    /// 再戦を申し込む（申し込んだ本人は承諾済みとして記録される）
    pub async fn request(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
    ) -> Result<Room, PlayAgainError> {
        let room = self
            .room_repository
            .find_by_id(room_id)
            .await
            .filter(|room| room.status() == RoomStatus::Finished)
            .ok_or(PlayAgainError::NotFinished)?;
        if !room.is_member(player_id) {
            return Err(PlayAgainError::NotAMember);
        }

        let room = self
            .room_repository
            .initiate_play_again(room_id, player_id)
            .await
            .map_err(map_repository_error)?;
        tracing::info!("Player {} requested play again in room {}", player_id, room_id);
        Ok(room)
    }

    /// 再戦の申し込みに回答する
    pub async fn respond(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
        accepted: bool,
    ) -> Result<PlayAgainResponseOutcome, PlayAgainError> {
        let room = self
            .room_repository
            .find_by_id(room_id)
            .await
            .filter(|room| room.status() == RoomStatus::PlayAgainPending)
            .ok_or(PlayAgainError::NotPending)?;
        if !room.is_member(player_id) {
            return Err(PlayAgainError::NotAMember);
        }

        let recorded = self
            .room_repository
            .record_play_again_response(room_id, player_id, accepted)
            .await
            .map_err(map_repository_error)?;
        tracing::info!(
            "Player {} {} play again in room {}",
            player_id,
            if accepted { "accepted" } else { "declined" },
            room_id
        );

        let resolution = if !accepted {
            let room = self.room_repository.cancel_play_again(room_id).await?;
            PlayAgainResolution::Declined { room }
        } else if self.room_repository.all_players_accepted(room_id).await? {
            self.start_rematch(room_id).await?
        } else {
            PlayAgainResolution::Pending
        };

        Ok(PlayAgainResponseOutcome {
            recorded,
            resolution,
        })
    }

    async fn start_rematch(&self, room_id: &RoomId) -> Result<PlayAgainResolution, PlayAgainError> {
        match self.strategy {
            PlayAgainStrategy::ResetRoom => {
                let room = self.room_repository.reset_game(room_id).await?;
                tracing::info!("Room {} restarted", room_id);
                Ok(PlayAgainResolution::Restarted { room })
            }
            PlayAgainStrategy::NewRoom => {
                let room = self
                    .room_repository
                    .create_new_room_from_existing(room_id)
                    .await?;
                for member in room.players() {
                    self.player_repository
                        .assign_room(&member.id, room.id.clone())
                        .await?;
                }
                let room = self.room_repository.start_game(&room.id).await?;
                tracing::info!("Players of room {} moved to room {}", room_id, room.id);
                Ok(PlayAgainResolution::MovedToNewRoom {
                    old_room_id: room_id.clone(),
                    room,
                })
            }
        }
    }

    /// タイマーが発火した投票を打ち切る
    ///
    /// `deadline` はタイマーをセットした時点の投票の期限。ルームが存在しない、投票中でない、
    /// 別の投票に置き換わっている場合は `None`。時計が戻っていて期限前に見えても打ち切る。
    pub async fn expire(&self, room_id: &RoomId, deadline: Timestamp) -> Option<Room> {
        let room = self.room_repository.find_by_id(room_id).await?;
        if room
            .play_again_vote()
            .is_none_or(|vote| vote.deadline != deadline)
        {
            return None;
        }
        match self.room_repository.has_play_again_timed_out(room_id).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!(
                "Play again timer of room {} fired before the clock reached the deadline",
                room_id
            ),
            Err(e) => {
                tracing::warn!("Failed to check play again timeout of room {}: {}", room_id, e);
                return None;
            }
        }

        match self.room_repository.cancel_play_again(room_id).await {
            Ok(room) => {
                tracing::info!("Play again vote in room {} timed out", room_id);
                Some(room)
            }
            Err(e) => {
                tracing::warn!("Failed to cancel play again in room {}: {}", room_id, e);
                None
            }
        }
    }

    /// 投票の残り時間（秒、切り捨て）
    pub fn time_remaining_secs(&self, room: &Room) -> i64 {
        room.play_again_vote()
            .map(|vote| (vote.deadline.value() - self.clock.now_millis()).max(0) / 1000)
            .unwrap_or(0)
    }
}

fn map_repository_error(e: RepositoryError) -> PlayAgainError {
    match e {
        RepositoryError::Room(RoomError::NotAMember(_)) => PlayAgainError::NotAMember,
        other => PlayAgainError::Repository(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::GameOutcome,
        usecase::test_support::{PLAY_AGAIN_TIMEOUT, TestContext},
    };

    fn usecase(ctx: &TestContext, strategy: PlayAgainStrategy) -> PlayAgainUseCase {
        PlayAgainUseCase::new(
            ctx.players.clone(),
            ctx.rooms.clone(),
            ctx.clock.clone(),
            strategy,
        )
    }

    async fn finished_room(ctx: &TestContext) -> (PlayerId, PlayerId, Room) {
        let (first, second, room) = ctx.playing_room().await;
        let room = ctx.rooms.end_game(&room.id, GameOutcome::Draw).await.unwrap();
        (first.id, second.id, room)
    }

    #[tokio::test]
    async fn test_request_opens_vote() {
        // テスト項目: 再戦の申し込みで投票が始まり、申し込んだ本人は承諾扱い
        // given (前提条件):
        let ctx = TestContext::new();
        let (first, _second, room) = finished_room(&ctx).await;
        let usecase = usecase(&ctx, PlayAgainStrategy::ResetRoom);

        // when (操作):
        let room = usecase.request(&room.id, &first).await.unwrap();

        // then (期待する結果):
        assert_eq!(room.status(), RoomStatus::PlayAgainPending);
        let vote = room.play_again_vote().unwrap();
        assert_eq!(vote.initiator, first);
        assert_eq!(vote.responses.len(), 1);
        assert!(vote.responses[0].accepted);
        assert_eq!(
            usecase.time_remaining_secs(&room),
            PLAY_AGAIN_TIMEOUT.as_secs() as i64
        );
    }

    #[tokio::test]
    async fn test_request_requires_finished_room() {
        // テスト項目: 対局中・存在しないルームへの申し込みは NotFinished
        // given (前提条件):
        let ctx = TestContext::new();
        let (first, _second, room) = ctx.playing_room().await;
        let usecase = usecase(&ctx, PlayAgainStrategy::ResetRoom);

        // when (操作):
        let playing = usecase.request(&room.id, &first.id).await;
        let missing = usecase
            .request(&RoomId::new("000001".to_string()).unwrap(), &first.id)
            .await;

        // then (期待する結果):
        assert_eq!(playing.unwrap_err(), PlayAgainError::NotFinished);
        assert_eq!(missing.unwrap_err(), PlayAgainError::NotFinished);
    }

    #[tokio::test]
    async fn test_request_from_outsider_is_rejected() {
        // テスト項目: 参加者以外の申し込みは NotAMember
        // given (前提条件):
        let ctx = TestContext::new();
        let (_first, _second, room) = finished_room(&ctx).await;
        let usecase = usecase(&ctx, PlayAgainStrategy::ResetRoom);

        // when (操作):
        let result = usecase.request(&room.id, &PlayerId::generate()).await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), PlayAgainError::NotAMember);
    }

    #[tokio::test]
    async fn test_both_accept_resets_room() {
        // テスト項目: 両者が承諾すると同じルームで新しい対局が始まる
        // given (前提条件):
        let ctx = TestContext::new();
        let (first, second, room) = finished_room(&ctx).await;
        let usecase = usecase(&ctx, PlayAgainStrategy::ResetRoom);
        usecase.request(&room.id, &first).await.unwrap();

        // when (操作):
        let outcome = usecase.respond(&room.id, &second, true).await.unwrap();

        // then (期待する結果):
        assert_eq!(outcome.recorded.play_again_vote().unwrap().responses.len(), 2);
        let PlayAgainResolution::Restarted { room: restarted } = outcome.resolution else {
            panic!("expected a restart, got {:?}", outcome.resolution);
        };
        assert_eq!(restarted.id, room.id);
        assert_eq!(restarted.status(), RoomStatus::Playing);
        assert!(restarted.board().unwrap().is_empty());
        assert!(restarted.winner().is_none());
        assert!(restarted.play_again_vote().is_none());
    }

    #[tokio::test]
    async fn test_both_accept_moves_to_new_room() {
        // テスト項目: NewRoom 戦略では新しいルームに移り、古いルームは削除される
        // given (前提条件):
        let ctx = TestContext::new();
        let (first, second, room) = finished_room(&ctx).await;
        let usecase = usecase(&ctx, PlayAgainStrategy::NewRoom);
        usecase.request(&room.id, &first).await.unwrap();

        // when (操作):
        let outcome = usecase.respond(&room.id, &second, true).await.unwrap();

        // then (期待する結果):
        let PlayAgainResolution::MovedToNewRoom {
            old_room_id,
            room: new_room,
        } = outcome.resolution
        else {
            panic!("expected a new room, got {:?}", outcome.resolution);
        };
        assert_eq!(old_room_id, room.id);
        assert_ne!(new_room.id, room.id);
        assert_eq!(new_room.status(), RoomStatus::Playing);
        assert_eq!(new_room.host_id, room.host_id);
        assert!(ctx.rooms.find_by_id(&room.id).await.is_none());
        for player in [first, second] {
            assert_eq!(
                ctx.players.find_by_id(&player).await.unwrap().room_id,
                Some(new_room.id.clone())
            );
        }
    }

    #[tokio::test]
    async fn test_decline_returns_to_finished() {
        // テスト項目: 拒否すると FINISHED に戻り、前回の結果が残る
        // given (前提条件):
        let ctx = TestContext::new();
        let (first, second, room) = finished_room(&ctx).await;
        let usecase = usecase(&ctx, PlayAgainStrategy::ResetRoom);
        usecase.request(&room.id, &first).await.unwrap();

        // when (操作):
        let outcome = usecase.respond(&room.id, &second, false).await.unwrap();

        // then (期待する結果):
        let PlayAgainResolution::Declined { room: declined } = outcome.resolution else {
            panic!("expected a decline, got {:?}", outcome.resolution);
        };
        assert_eq!(declined.status(), RoomStatus::Finished);
        assert_eq!(declined.outcome(), Some(&GameOutcome::Draw));
        let vote = outcome.recorded.play_again_vote().unwrap();
        assert!(vote.responses.iter().any(|r| r.player_id == second && !r.accepted));
    }

    #[tokio::test]
    async fn test_respond_without_vote_is_rejected() {
        // テスト項目: 投票中でないルームへの回答は NotPending
        // given (前提条件):
        let ctx = TestContext::new();
        let (_first, second, room) = finished_room(&ctx).await;
        let usecase = usecase(&ctx, PlayAgainStrategy::ResetRoom);

        // when (操作):
        let result = usecase.respond(&room.id, &second, true).await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), PlayAgainError::NotPending);
    }

    #[tokio::test]
    async fn test_initiator_reaccepting_keeps_vote_pending() {
        // テスト項目: 申し込んだ本人が再度承諾しても、相手の回答待ちのまま
        // given (前提条件):
        let ctx = TestContext::new();
        let (first, _second, room) = finished_room(&ctx).await;
        let usecase = usecase(&ctx, PlayAgainStrategy::ResetRoom);
        usecase.request(&room.id, &first).await.unwrap();

        // when (操作):
        let outcome = usecase.respond(&room.id, &first, true).await.unwrap();

        // then (期待する結果):
        assert!(matches!(outcome.resolution, PlayAgainResolution::Pending));
        assert_eq!(outcome.recorded.play_again_vote().unwrap().responses.len(), 1);
        assert_eq!(
            ctx.rooms.find_by_id(&room.id).await.unwrap().status(),
            RoomStatus::PlayAgainPending
        );
    }

    fn deadline_of(room: &Room) -> Timestamp {
        room.play_again_vote().unwrap().deadline
    }

    #[tokio::test]
    async fn test_expire_after_deadline() {
        // テスト項目: 期限を過ぎた投票は打ち切られ FINISHED に戻る
        // given (前提条件):
        let ctx = TestContext::new();
        let (first, _second, room) = finished_room(&ctx).await;
        let usecase = usecase(&ctx, PlayAgainStrategy::ResetRoom);
        let pending = usecase.request(&room.id, &first).await.unwrap();
        ctx.clock.advance(PLAY_AGAIN_TIMEOUT.as_millis() as i64);

        // when (操作):
        let expired = usecase.expire(&room.id, deadline_of(&pending)).await;

        // then (期待する結果):
        assert_eq!(expired.map(|r| r.status()), Some(RoomStatus::Finished));
        assert_eq!(usecase.time_remaining_secs(&pending), 0);
    }

    #[tokio::test]
    async fn test_expire_before_clock_reaches_deadline() {
        // テスト項目: 時計が期限に届いていなくても、同じ投票のタイマーが発火したら打ち切る
        // given (前提条件):
        let ctx = TestContext::new();
        let (first, _second, room) = finished_room(&ctx).await;
        let usecase = usecase(&ctx, PlayAgainStrategy::ResetRoom);
        let pending = usecase.request(&room.id, &first).await.unwrap();
        ctx.clock.advance(-5_000);

        // when (操作):
        let expired = usecase.expire(&room.id, deadline_of(&pending)).await;

        // then (期待する結果):
        assert_eq!(expired.map(|r| r.status()), Some(RoomStatus::Finished));
        assert_eq!(
            ctx.rooms.find_by_id(&room.id).await.unwrap().status(),
            RoomStatus::Finished
        );
    }

    #[tokio::test]
    async fn test_expire_ignores_other_vote() {
        // テスト項目: 別の投票の期限で呼ばれても、現在の投票は打ち切らない
        // given (前提条件):
        let ctx = TestContext::new();
        let (first, second, room) = finished_room(&ctx).await;
        let usecase = usecase(&ctx, PlayAgainStrategy::ResetRoom);
        let old_vote = usecase.request(&room.id, &first).await.unwrap();
        usecase.respond(&room.id, &second, false).await.unwrap();
        ctx.clock.advance(1_000);
        usecase.request(&room.id, &second).await.unwrap();

        // when (操作):
        let expired = usecase.expire(&room.id, deadline_of(&old_vote)).await;

        // then (期待する結果):
        assert!(expired.is_none());
        assert_eq!(
            ctx.rooms.find_by_id(&room.id).await.unwrap().status(),
            RoomStatus::PlayAgainPending
        );
    }

    #[tokio::test]
    async fn test_expire_ignores_resolved_vote() {
        // テスト項目: すでに再戦が始まったルームの期限切れは何もしない
        // given (前提条件):
        let ctx = TestContext::new();
        let (first, second, room) = finished_room(&ctx).await;
        let usecase = usecase(&ctx, PlayAgainStrategy::ResetRoom);
        let pending = usecase.request(&room.id, &first).await.unwrap();
        usecase.respond(&room.id, &second, true).await.unwrap();
        ctx.clock.advance(PLAY_AGAIN_TIMEOUT.as_millis() as i64 + 1);

        // when (操作):
        let expired = usecase.expire(&room.id, deadline_of(&pending)).await;

        // then (期待する結果):
        assert!(expired.is_none());
        assert_eq!(
            ctx.rooms.find_by_id(&room.id).await.unwrap().status(),
            RoomStatus::Playing
        );
    }

    #[tokio::test]
    async fn test_time_remaining_rounds_down() {
        // テスト項目: 残り時間は秒単位で切り捨て
        // given (前提条件):
        let ctx = TestContext::new();
        let (first, _second, room) = finished_room(&ctx).await;
        let usecase = usecase(&ctx, PlayAgainStrategy::ResetRoom);
        let pending = usecase.request(&room.id, &first).await.unwrap();

        // when (操作):
        ctx.clock.advance(1_500);

        // then (期待する結果):
        assert_eq!(
            usecase.time_remaining_secs(&pending),
            PLAY_AGAIN_TIMEOUT.as_secs() as i64 - 2
        );
    }
}
