//! 再戦投票のタイマー管理
//!
//! ルームごとに 1 つのタイマータスクを保持します。同じルームに再度セットすると古いタスクは中断されます。

use std::collections::HashMap;

use tokio::{sync::Mutex, task::JoinHandle};

use crate::domain::RoomId;

#[derive(Default)]
pub struct PlayAgainTimers {
    handles: Mutex<HashMap<RoomId, JoinHandle<()>>>,
}

impl PlayAgainTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// タイマーをセット（既存のタイマーは中断）
    pub async fn arm(&self, room_id: RoomId, handle: JoinHandle<()>) {
        let mut handles = self.handles.lock().await;
        if let Some(previous) = handles.insert(room_id.clone(), handle) {
            previous.abort();
            tracing::debug!("Replaced play again timer of room {}", room_id);
        }
    }

    /// タイマーを中断して破棄
    pub async fn cancel(&self, room_id: &RoomId) {
        if let Some(handle) = self.handles.lock().await.remove(room_id) {
            handle.abort();
            tracing::debug!("Cancelled play again timer of room {}", room_id);
        }
    }

    /// 発火済みのタイマーを中断せずに破棄（タイマータスク自身から呼ぶ）
    pub async fn forget(&self, room_id: &RoomId) {
        self.handles.lock().await.remove(room_id);
    }

    #[cfg(test)]
    pub async fn is_armed(&self, room_id: &RoomId) -> bool {
        self.handles.lock().await.contains_key(room_id)
    }
}
