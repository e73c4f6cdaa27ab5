//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用し、状態遷移のルールは `Room` エンティティに委譲します。
//!
//! 現在時刻は `Clock` から取得するため、テストでは `FixedClock` / `ManualClock` を差し込めます。

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::Mutex;
use yonmoku_shared::time::Clock;

use crate::domain::{
    Board, GameOutcome, LastMove, MAX_PLAYERS_PER_ROOM, PlayerId, RepositoryError, Room,
    RoomError, RoomId, RoomIdFactory, RoomMember, RoomRepository, Timestamp,
};

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    rooms: Arc<Mutex<HashMap<RoomId, Room>>>,
    clock: Arc<dyn Clock>,
    play_again_timeout: Duration,
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成
    ///
    /// `play_again_timeout` は再戦投票の期限（開始時刻からの経過時間）。
    pub fn new(clock: Arc<dyn Clock>, play_again_timeout: Duration) -> Self {
        Self {
            rooms: Arc::new(Mutex::new(HashMap::new())),
            clock,
            play_again_timeout,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    fn timeout_millis(&self) -> i64 {
        i64::try_from(self.play_again_timeout.as_millis()).unwrap_or(i64::MAX)
    }
}

fn random_first_turn() -> usize {
    rand::rng().random_range(0..MAX_PLAYERS_PER_ROOM)
}

fn not_found(room_id: &RoomId) -> RepositoryError {
    RepositoryError::RoomNotFound(room_id.to_string())
}

/// ルームを 1 つ取り出して `f` を適用し、変更後のスナップショットを返す
fn mutate<F>(
    rooms: &mut HashMap<RoomId, Room>,
    room_id: &RoomId,
    f: F,
) -> Result<Room, RepositoryError>
where
    F: FnOnce(&mut Room) -> Result<(), RoomError>,
{
    let room = rooms.get_mut(room_id).ok_or_else(|| not_found(room_id))?;
    f(room)?;
    Ok(room.clone())
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn create_room(&self, host: RoomMember) -> Room {
        let created_at = self.now();
        let mut rooms = self.rooms.lock().await;
        let room_id = RoomIdFactory::generate_unique(|candidate| rooms.contains_key(candidate));
        let room = Room::new(room_id.clone(), host, created_at);
        rooms.insert(room_id.clone(), room.clone());
        tracing::info!("Room {} created by '{}'", room_id, room.players()[0].nickname);
        room
    }

    async fn find_by_id(&self, room_id: &RoomId) -> Option<Room> {
        self.rooms.lock().await.get(room_id).cloned()
    }

    async fn list_all(&self) -> Vec<Room> {
        let rooms = self.rooms.lock().await;
        let mut all: Vec<Room> = rooms.values().cloned().collect();
        all.sort_by_key(|room| room.created_at);
        all
    }

    async fn add_player_to_room(
        &self,
        room_id: &RoomId,
        member: RoomMember,
    ) -> Result<Room, RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let nickname = member.nickname.clone();
        let result = mutate(&mut rooms, room_id, |room| room.add_player(member));
        match &result {
            Ok(_) => tracing::info!("Player '{}' added to room {}", nickname, room_id),
            Err(e) => tracing::info!("Cannot add player '{}' to room {}: {}", nickname, room_id, e),
        }
        result
    }

    async fn set_room_ready(&self, room_id: &RoomId) -> Result<Room, RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        mutate(&mut rooms, room_id, |room| room.set_ready())
    }

    async fn start_game(&self, room_id: &RoomId) -> Result<Room, RepositoryError> {
        let first_turn = random_first_turn();
        let mut rooms = self.rooms.lock().await;
        mutate(&mut rooms, room_id, |room| room.start_game(first_turn))
    }

    async fn update_board(
        &self,
        room_id: &RoomId,
        board: Board,
        last_move: LastMove,
    ) -> Result<Room, RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        mutate(&mut rooms, room_id, |room| room.update_board(board, last_move))
    }

    async fn switch_turn(&self, room_id: &RoomId) -> Result<Room, RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        mutate(&mut rooms, room_id, |room| room.switch_turn())
    }

    async fn end_game(
        &self,
        room_id: &RoomId,
        outcome: GameOutcome,
    ) -> Result<Room, RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        mutate(&mut rooms, room_id, |room| room.end_game(outcome))
    }

    async fn remove_player_from_room(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
    ) -> Result<Option<Room>, RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(room_id).ok_or_else(|| not_found(room_id))?;
        room.remove_player(player_id);

        if room.is_empty() {
            rooms.remove(room_id);
            tracing::info!("Room {} deleted (no players left)", room_id);
            return Ok(None);
        }
        Ok(Some(room.clone()))
    }

    async fn initiate_play_again(
        &self,
        room_id: &RoomId,
        initiator: &PlayerId,
    ) -> Result<Room, RepositoryError> {
        let now = self.now();
        let deadline = now.plus_millis(self.timeout_millis());
        let mut rooms = self.rooms.lock().await;
        mutate(&mut rooms, room_id, |room| {
            room.initiate_play_again(*initiator, now, deadline)
        })
    }

    async fn record_play_again_response(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
        accepted: bool,
    ) -> Result<Room, RepositoryError> {
        let now = self.now();
        let mut rooms = self.rooms.lock().await;
        mutate(&mut rooms, room_id, |room| {
            room.record_play_again_response(*player_id, accepted, now)
        })
    }

    async fn all_players_accepted(&self, room_id: &RoomId) -> Result<bool, RepositoryError> {
        let rooms = self.rooms.lock().await;
        let room = rooms.get(room_id).ok_or_else(|| not_found(room_id))?;
        Ok(room.all_players_accepted())
    }

    async fn reset_game(&self, room_id: &RoomId) -> Result<Room, RepositoryError> {
        let first_turn = random_first_turn();
        let mut rooms = self.rooms.lock().await;
        mutate(&mut rooms, room_id, |room| room.reset_game(first_turn))
    }

    async fn cancel_play_again(&self, room_id: &RoomId) -> Result<Room, RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        mutate(&mut rooms, room_id, |room| room.cancel_play_again())
    }

    async fn create_new_room_from_existing(
        &self,
        old_room_id: &RoomId,
    ) -> Result<Room, RepositoryError> {
        let created_at = self.now();
        let mut rooms = self.rooms.lock().await;
        let old_room = rooms.get(old_room_id).ok_or_else(|| not_found(old_room_id))?;
        let new_id = RoomIdFactory::generate_unique(|candidate| rooms.contains_key(candidate));
        let new_room = old_room.rematch_in(new_id.clone(), created_at)?;

        rooms.remove(old_room_id);
        rooms.insert(new_id.clone(), new_room.clone());
        tracing::info!("Room {} replaced by new room {}", old_room_id, new_id);
        Ok(new_room)
    }

    async fn has_play_again_timed_out(&self, room_id: &RoomId) -> Result<bool, RepositoryError> {
        let now = self.now();
        let rooms = self.rooms.lock().await;
        let room = rooms.get(room_id).ok_or_else(|| not_found(room_id))?;
        Ok(room.has_play_again_timed_out(now))
    }
}
