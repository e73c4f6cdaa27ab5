//! Repository 実装
//!
//! - `inmemory`: プロセス内の HashMap / Vec を使った実装（永続化なし）

pub mod inmemory;

pub use inmemory::{InMemoryPlayerRepository, InMemoryRoomRepository};
