//! Telemetry reporter
//!
//! Posts player error reports to the collector without flooding it. A report
//! whose signature (error code, failing item, query text) was already sent
//! within the dedupe window is dropped. Delivery goes through a
//! [`ReportTransport`]: a fire-and-forget "beacon" first, then a best-effort
//! request if no beacon is available. Nothing here returns an error to the
//! controller; failures are logged.

use crate::config::TelemetrySettings;
use crate::error::{Error, Result};
use ambience_common::PlayerErrorReport;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Outbound delivery for serialized reports
pub trait ReportTransport: Send {
    /// Queue a non-blocking delivery that outlives the caller
    ///
    /// Returns false when no such transport is available.
    fn send_beacon(&self, endpoint: &str, body: &str) -> bool;

    /// Best-effort network call used when the beacon is unavailable
    fn send_request(&self, endpoint: &str, body: &str) -> Result<()>;
}

/// What happened to one report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    Sent,
    /// Identical signature inside the dedupe window
    Duplicate,
    Disabled,
    Failed,
}

/// Dedupe key for a report
pub fn signature(error_code: i32, video_id: Option<&str>, query: &str) -> String {
    format!("{}|{}|{}", error_code, video_id.unwrap_or("none"), query)
}

pub struct TelemetryReporter {
    transport: Box<dyn ReportTransport>,
    endpoint: String,
    window: Duration,
    enabled: bool,
    /// Signature -> controller time it was last sent
    recent: HashMap<String, Duration>,
}

impl TelemetryReporter {
    pub fn new(settings: &TelemetrySettings, transport: Box<dyn ReportTransport>) -> Self {
        Self {
            transport,
            endpoint: settings.endpoint.clone(),
            window: Duration::from_millis(settings.dedupe_window_ms),
            enabled: settings.enabled,
            recent: HashMap::new(),
        }
    }

    /// Deliver `report` unless an identical one went out recently
    ///
    /// `query` is the effective search text used in the signature.
    pub fn report(&mut self, report: &PlayerErrorReport, query: &str, now: Duration) -> ReportOutcome {
        if !self.enabled {
            return ReportOutcome::Disabled;
        }

        let window = self.window;
        self.recent
            .retain(|_, sent_at| now.saturating_sub(*sent_at) < window);

        let key = signature(report.error_code, report.video_id.as_deref(), query);
        if self.recent.contains_key(&key) {
            debug!(signature = %key, "Dropping duplicate player error report");
            return ReportOutcome::Duplicate;
        }
        self.recent.insert(key, now);

        let body = match serde_json::to_string(report) {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to serialize player error report: {}", e);
                return ReportOutcome::Failed;
            }
        };

        if self.transport.send_beacon(&self.endpoint, &body) {
            return ReportOutcome::Sent;
        }

        match self.transport.send_request(&self.endpoint, &body) {
            Ok(()) => ReportOutcome::Sent,
            Err(e) => {
                warn!(endpoint = %self.endpoint, "Player error report not delivered: {}", e);
                ReportOutcome::Failed
            }
        }
    }

    /// Number of signatures still inside the window
    pub fn tracked_signatures(&self) -> usize {
        self.recent.len()
    }
}

/// reqwest-backed transport posting JSON to the collector
pub struct HttpReportTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpReportTransport {
    pub fn new(settings: &TelemetrySettings) -> Result<Self> {
        let timeout = Duration::from_millis(settings.request_timeout_ms);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Telemetry(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, timeout })
    }
}

impl ReportTransport for HttpReportTransport {
    fn send_beacon(&self, endpoint: &str, body: &str) -> bool {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return false;
        };

        let request = self
            .client
            .post(endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string());
        let endpoint = endpoint.to_string();

        handle.spawn(async move {
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(status = %response.status(), "Player error report delivered");
                }
                Ok(response) => {
                    warn!(%endpoint, status = %response.status(), "Collector rejected player error report");
                }
                Err(e) => warn!(%endpoint, "Player error report delivery failed: {}", e),
            }
        });
        true
    }

    fn send_request(&self, endpoint: &str, body: &str) -> Result<()> {
        let endpoint = endpoint.to_string();
        let body = body.to_string();
        let timeout = self.timeout;

        // Blocking client must not run on an async worker thread
        std::thread::Builder::new()
            .name("player-error-report".to_string())
            .spawn(move || {
                let client = match reqwest::blocking::Client::builder().timeout(timeout).build() {
                    Ok(client) => client,
                    Err(e) => {
                        warn!("Failed to build blocking HTTP client: {}", e);
                        return;
                    }
                };
                let result = client
                    .post(&endpoint)
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(body)
                    .send();
                if let Err(e) = result {
                    warn!(%endpoint, "Player error report delivery failed: {}", e);
                }
            })
            .map(|_| ())
            .map_err(|e| Error::Telemetry(format!("Failed to spawn report thread: {}", e)))
    }
}
