//! Player error log sink
//!
//! Each report becomes one WARN line under the `player_errors` target:
//! `player_error {json}`, with null fields dropped, keys sorted and a
//! server-side `logged_at` timestamp added.

use ambience_common::time::{now, to_iso8601};
use ambience_common::PlayerErrorReport;
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct PlayerErrorLog;

impl PlayerErrorLog {
    /// Build the record that gets logged for `report`
    pub fn record(&self, report: &PlayerErrorReport) -> ambience_common::Result<Value> {
        let mut value = report.to_compact_json()?;
        if let Value::Object(map) = &mut value {
            map.insert("logged_at".to_string(), Value::String(to_iso8601(&now())));
        }
        Ok(value)
    }

    /// Emit one structured log entry for `report` and return it
    pub fn log(&self, report: &PlayerErrorReport) -> ambience_common::Result<Value> {
        let record = self.record(report)?;
        // serde_json maps are ordered by key, so the line is stable
        warn!(target: "player_errors", "player_error {}", record);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_drops_nulls_and_adds_timestamp() {
        let mut report = PlayerErrorReport::new(150);
        report.video_id = Some("abc123".to_string());
        report.last_query = Some("ночной лес".to_string());

        let record = PlayerErrorLog.record(&report).unwrap();
        let map = record.as_object().unwrap();

        assert_eq!(map["errorCode"], 150);
        assert_eq!(map["videoId"], "abc123");
        assert_eq!(map["lastQuery"], "ночной лес");
        assert!(!map.contains_key("playlistIndex"));
        assert!(map["logged_at"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_record_keys_sorted() {
        let mut report = PlayerErrorReport::new(5);
        report.video_id = Some("v".to_string());
        report.consecutive_errors = Some(2);

        let line = PlayerErrorLog.record(&report).unwrap().to_string();
        let consecutive = line.find("consecutiveErrors").unwrap();
        let error_code = line.find("errorCode").unwrap();
        let logged_at = line.find("logged_at").unwrap();
        let video_id = line.find("videoId").unwrap();
        assert!(consecutive < error_code);
        assert!(error_code < logged_at);
        assert!(logged_at < video_id);
    }
}
