// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timestamp formatting shared by error envelopes, events, and CLI output.

use std::time::SystemTime;

/// Format a `SystemTime` as RFC3339 (used for `ErrorResponse.timestamp` and
/// event `createdAt` fields).
pub fn to_rfc3339(t: SystemTime) -> String {
    chrono::DateTime::<chrono::Utc>::from(t).to_rfc3339()
}

/// Format milliseconds-since-epoch as RFC3339.
pub fn epoch_ms_to_rfc3339(epoch_ms: u64) -> String {
    chrono::DateTime::from_timestamp_millis(epoch_ms as i64)
        .unwrap_or_else(|| chrono::DateTime::from_timestamp(0, 0).expect("epoch is valid"))
        .to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_zero_formats_as_unix_epoch() {
        let s = epoch_ms_to_rfc3339(0);
        assert!(s.starts_with("1970-01-01"));
    }

    #[test]
    fn system_time_now_round_trips_through_chrono() {
        let s = to_rfc3339(SystemTime::now());
        assert!(chrono::DateTime::parse_from_rfc3339(&s).is_ok());
    }
}
