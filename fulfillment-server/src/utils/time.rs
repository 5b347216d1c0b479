//! Time helpers
//!
//! All timestamps in storage are `i64` Unix millis; conversion happens at
//! the edges.

/// Current time as Unix millis
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
