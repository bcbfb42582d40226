//! Telemetry transport that keeps every delivered body

use ambience_player::{ReportTransport, Result};
use std::sync::{Arc, Mutex};

pub type SharedReports = Arc<Mutex<Vec<serde_json::Value>>>;

#[derive(Clone, Default)]
pub struct RecordingTransport {
    pub reports: SharedReports,
}

impl ReportTransport for RecordingTransport {
    fn send_beacon(&self, _endpoint: &str, body: &str) -> bool {
        let value = serde_json::from_str(body).unwrap();
        self.reports.lock().unwrap().push(value);
        true
    }

    fn send_request(&self, _endpoint: &str, _body: &str) -> Result<()> {
        Ok(())
    }
}
