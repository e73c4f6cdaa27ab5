//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! Room Registry はあくまで状態遷移の「置き場」であり、タイマーのスケジュールや
//! ホスト権限のチェックは行いません（UseCase 層 / UI 層の責務）。

use async_trait::async_trait;

use super::{
    Board, ConnectionId, GameOutcome, LastMove, Nickname, Player, PlayerId, RepositoryError, Room,
    RoomId, RoomMember,
};

/// Player Registry
///
/// 接続 ID → プレイヤーの対応と、プレイヤーの所属ルームを管理する。
#[async_trait]
pub trait PlayerRepository: Send + Sync {
    /// 新しい ID を払い出してプレイヤーを登録
    async fn create_player(
        &self,
        nickname: Nickname,
        avatar: String,
        connection_id: ConnectionId,
    ) -> Player;

    async fn find_by_id(&self, player_id: &PlayerId) -> Option<Player>;

    async fn find_by_connection_id(&self, connection_id: &ConnectionId) -> Option<Player>;

    /// 同じニックネームのプレイヤーを検索（最初に登録されたもの）
    async fn find_by_nickname(&self, nickname: &Nickname) -> Option<Player>;

    /// 再接続時に接続 ID を差し替える
    async fn update_connection_id(
        &self,
        player_id: &PlayerId,
        connection_id: ConnectionId,
    ) -> Result<Player, RepositoryError>;

    async fn assign_room(
        &self,
        player_id: &PlayerId,
        room_id: RoomId,
    ) -> Result<Player, RepositoryError>;

    async fn clear_room(&self, player_id: &PlayerId) -> Result<Player, RepositoryError>;

    async fn list_all(&self) -> Vec<Player>;
}

/// Room Registry
///
/// すべての操作は変更後の Room のスナップショットを返す。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// 未使用のルームコードで WAITING のルームを作成し、`host` を唯一の参加者にする
    async fn create_room(&self, host: RoomMember) -> Room;

    async fn find_by_id(&self, room_id: &RoomId) -> Option<Room>;

    async fn list_all(&self) -> Vec<Room>;

    async fn add_player_to_room(
        &self,
        room_id: &RoomId,
        member: RoomMember,
    ) -> Result<Room, RepositoryError>;

    async fn set_room_ready(&self, room_id: &RoomId) -> Result<Room, RepositoryError>;

    /// 対局開始（先手はランダム）
    async fn start_game(&self, room_id: &RoomId) -> Result<Room, RepositoryError>;

    async fn update_board(
        &self,
        room_id: &RoomId,
        board: Board,
        last_move: LastMove,
    ) -> Result<Room, RepositoryError>;

    async fn switch_turn(&self, room_id: &RoomId) -> Result<Room, RepositoryError>;

    async fn end_game(
        &self,
        room_id: &RoomId,
        outcome: GameOutcome,
    ) -> Result<Room, RepositoryError>;

    /// 参加者を削除する。最後の 1 人だった場合はルームごと削除され `None` を返す。
    async fn remove_player_from_room(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
    ) -> Result<Option<Room>, RepositoryError>;

    /// 再戦投票を開始する。期限は現在時刻 + 再戦タイムアウト。
    async fn initiate_play_again(
        &self,
        room_id: &RoomId,
        initiator: &PlayerId,
    ) -> Result<Room, RepositoryError>;

    async fn record_play_again_response(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
        accepted: bool,
    ) -> Result<Room, RepositoryError>;

    async fn all_players_accepted(&self, room_id: &RoomId) -> Result<bool, RepositoryError>;

    /// 同じルームで新しい対局を始める（先手はランダム）
    async fn reset_game(&self, room_id: &RoomId) -> Result<Room, RepositoryError>;

    async fn cancel_play_again(&self, room_id: &RoomId) -> Result<Room, RepositoryError>;

    /// 同じ参加者で新しいルームを作り、元のルームを削除する
    async fn create_new_room_from_existing(
        &self,
        old_room_id: &RoomId,
    ) -> Result<Room, RepositoryError>;

    async fn has_play_again_timed_out(&self, room_id: &RoomId) -> Result<bool, RepositoryError>;
}
