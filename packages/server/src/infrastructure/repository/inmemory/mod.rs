//! InMemory Repository 実装

pub mod player;
pub mod room;

pub use player::InMemoryPlayerRepository;
pub use room::InMemoryRoomRepository;
