//! Time-related utilities with clock abstraction for testability.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{FixedOffset, TimeZone, Utc};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Get current Unix timestamp (milliseconds)
    fn now_millis(&self) -> i64;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        get_timestamp_millis()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: i64,
}

impl FixedClock {
    /// Create a new fixed clock with the given timestamp
    pub fn new(fixed_time_millis: i64) -> Self {
        Self {
            fixed_time: fixed_time_millis,
        }
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.fixed_time
    }
}

/// Manually driven clock for tests that need time to pass (deadlines, timeouts).
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(start_millis),
        }
    }

    /// Move the clock forward by `millis`.
    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Get current Unix timestamp (milliseconds)
pub fn get_timestamp_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert Unix timestamp (milliseconds) to JST RFC 3339 format
///
/// Returns `None` when the timestamp is outside chrono's representable range.
pub fn timestamp_to_jst_rfc3339(timestamp_millis: i64) -> Option<String> {
    let jst_offset = FixedOffset::east_opt(9 * 3600)?; // JST is UTC+9
    jst_offset
        .timestamp_millis_opt(timestamp_millis)
        .single()
        .map(|dt| dt.to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_returns_non_zero_timestamp() {
        // テスト項目: SystemClock が 0 以外のタイムスタンプを返す
        // given (前提条件):
        let clock = SystemClock;

        // when (操作):
        let timestamp = clock.now_millis();

        // then (期待する結果):
        assert!(timestamp > 0);
    }

    #[test]
    fn test_fixed_clock_returns_fixed_timestamp() {
        // テスト項目: FixedClock が固定されたタイムスタンプを返す
        // given (前提条件):
        let fixed_time = 1234567890123;
        let clock = FixedClock::new(fixed_time);

        // when (操作):
        let timestamp1 = clock.now_millis();
        let timestamp2 = clock.now_millis();

        // then (期待する結果):
        assert_eq!(timestamp1, fixed_time);
        assert_eq!(timestamp2, fixed_time);
    }

    #[test]
    fn test_manual_clock_advances() {
        // テスト項目: ManualClock は advance した分だけ時刻が進む
        // given (前提条件):
        let clock = ManualClock::new(1_000);

        // when (操作):
        clock.advance(30_000);

        // then (期待する結果):
        assert_eq!(clock.now_millis(), 31_000);

        clock.set(5);
        assert_eq!(clock.now_millis(), 5);
    }

    #[test]
    fn test_timestamp_to_jst_rfc3339_format() {
        // テスト項目: タイムスタンプが正しく RFC 3339 形式に変換される
        // given (前提条件):
        // 2023-01-01 00:00:00 JST in milliseconds
        let timestamp = 1672498800123;

        // when (操作):
        let result = timestamp_to_jst_rfc3339(timestamp).unwrap();

        // then (期待する結果):
        assert!(result.starts_with("2023-01-01T00:00:00"));
        assert!(result.contains("+09:00"));
    }
}
