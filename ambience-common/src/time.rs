//! Timestamp utilities

use chrono::{DateTime, SecondsFormat, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp as ISO-8601 with millisecond precision
pub fn to_iso8601(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_iso8601_format() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 18, 30, 5).unwrap();
        assert_eq!(to_iso8601(&ts), "2024-03-09T18:30:05.000Z");
    }

    #[test]
    fn test_iso8601_keeps_milliseconds() {
        let ts = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert!(to_iso8601(&ts).ends_with(".123Z"));
    }

    #[tokio::test]
    async fn test_now_successive_calls_advance() {
        let time1 = now();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let time2 = now();
        assert!(time2 > time1);
    }
}
