//! Utilities shared by the Yonmoku packages.

pub mod logger;
pub mod time;
