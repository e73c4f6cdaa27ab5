//! MessagePusher trait 定義
//!
//! クライアントへの通知（送信）を抽象化します。
//! WebSocket の生成は UI 層、送信先の管理と送信は Infrastructure 層が担当します。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError};

/// 接続ごとの送信チャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// MessagePusher trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続を登録
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続を登録解除
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// 特定の接続にメッセージを送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// 複数の接続にメッセージを送信（一部の失敗は許容）
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        content: &str,
    ) -> Result<(), MessagePushError>;
}
