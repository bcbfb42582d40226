//! Error classifier and recovery policy
//!
//! Maps one external error callback, plus the playlist shape the player
//! reports at that moment, to exactly one [`RecoveryAction`]. The first
//! matching rule wins:
//!
//! 1. Host switch / hard rebuild on rejected load parameters
//! 2. Degrade the explicit item list
//! 3. Retry the last request when the playlist is empty or exhausted
//! 4. Skip to the next item
//! 5. Give up
//!
//! Classification is pure; the controller schedules and executes the action.

use crate::config::RecoverySettings;
use crate::player::{DeliveryHost, PlayerErrorCode};
use serde::Serialize;

/// What the controller does about one error callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum RecoveryAction {
    /// Recreate the player; `hard` reseeds it with the original request
    /// instead of the last attempted one
    Rebuild { hard: bool },
    /// Remove the failing entry from the explicit list and reload
    DegradeManualList,
    /// Re-issue the last attempted request unchanged
    RetryRequest,
    SkipToNext,
    /// Terminal failure for this request
    GiveUp,
}

impl RecoveryAction {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RecoveryAction::GiveUp)
    }
}

impl std::fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoveryAction::Rebuild { hard: false } => write!(f, "rebuild"),
            RecoveryAction::Rebuild { hard: true } => write!(f, "hard-rebuild"),
            RecoveryAction::DegradeManualList => write!(f, "degrade-manual-list"),
            RecoveryAction::RetryRequest => write!(f, "retry"),
            RecoveryAction::SkipToNext => write!(f, "skip"),
            RecoveryAction::GiveUp => write!(f, "give-up"),
        }
    }
}

/// Everything the classifier looks at, captured when the error arrived
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub code: PlayerErrorCode,
    pub host: DeliveryHost,
    /// A hard rebuild already ran for the current failure streak
    pub hard_rebuild_used: bool,
    /// A request was attempted and can be retried
    pub has_request: bool,
    /// The attempted request still carries explicit items
    pub manual_list_active: bool,
    pub playlist_length: usize,
    pub playlist_index: Option<usize>,
    /// Error count including this error
    pub consecutive_errors: u32,
}

impl ErrorContext {
    /// Reported playlist is empty, the index is invalid, or it points at the last item
    fn playlist_exhausted(&self) -> bool {
        match self.playlist_index {
            _ if self.playlist_length == 0 => true,
            None => true,
            Some(index) => index + 1 >= self.playlist_length,
        }
    }
}

/// Error budgets applied by [`RecoveryPolicy::classify`]
#[derive(Debug, Clone, Copy)]
pub struct RecoveryPolicy {
    pub retry_error_budget: u32,
    pub skip_error_budget: u32,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self::from(&RecoverySettings::default())
    }
}

impl From<&RecoverySettings> for RecoveryPolicy {
    fn from(settings: &RecoverySettings) -> Self {
        Self {
            retry_error_budget: settings.retry_error_budget,
            skip_error_budget: settings.skip_error_budget,
        }
    }
}

impl RecoveryPolicy {
    pub fn classify(&self, ctx: &ErrorContext) -> RecoveryAction {
        if ctx.code.is_invalid_parameter() && ctx.has_request {
            match ctx.host {
                DeliveryHost::Standard => return RecoveryAction::Rebuild { hard: false },
                DeliveryHost::PrivacyRestricted if !ctx.hard_rebuild_used => {
                    return RecoveryAction::Rebuild { hard: true }
                }
                DeliveryHost::PrivacyRestricted => {}
            }
        }

        if ctx.manual_list_active {
            return RecoveryAction::DegradeManualList;
        }

        if ctx.has_request
            && ctx.playlist_exhausted()
            && ctx.consecutive_errors <= self.retry_error_budget
        {
            return RecoveryAction::RetryRequest;
        }

        if ctx.consecutive_errors <= self.skip_error_budget {
            return RecoveryAction::SkipToNext;
        }

        RecoveryAction::GiveUp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(code: i32) -> ErrorContext {
        ErrorContext {
            code: PlayerErrorCode(code),
            host: DeliveryHost::Standard,
            hard_rebuild_used: false,
            has_request: true,
            manual_list_active: false,
            playlist_length: 10,
            playlist_index: Some(3),
            consecutive_errors: 1,
        }
    }

    #[test]
    fn test_invalid_parameter_switches_host() {
        let policy = RecoveryPolicy::default();
        let c = ctx(2);
        assert_eq!(policy.classify(&c), RecoveryAction::Rebuild { hard: false });
    }

    #[test]
    fn test_invalid_parameter_on_restricted_host_hard_rebuilds_once() {
        let policy = RecoveryPolicy::default();
        let mut c = ctx(2);
        c.host = DeliveryHost::PrivacyRestricted;
        assert_eq!(policy.classify(&c), RecoveryAction::Rebuild { hard: true });

        c.hard_rebuild_used = true;
        assert_eq!(policy.classify(&c), RecoveryAction::SkipToNext);
    }

    #[test]
    fn test_invalid_parameter_without_request_is_ordinary() {
        let policy = RecoveryPolicy::default();
        let mut c = ctx(2);
        c.has_request = false;
        assert_eq!(policy.classify(&c), RecoveryAction::SkipToNext);
    }

    #[test]
    fn test_manual_list_degrades_before_retry() {
        let policy = RecoveryPolicy::default();
        let mut c = ctx(150);
        c.manual_list_active = true;
        c.playlist_length = 0;
        c.playlist_index = None;
        assert_eq!(policy.classify(&c), RecoveryAction::DegradeManualList);
    }

    #[test]
    fn test_exhausted_playlist_retries_within_budget() {
        let policy = RecoveryPolicy::default();

        let mut c = ctx(100);
        c.playlist_length = 0;
        assert_eq!(policy.classify(&c), RecoveryAction::RetryRequest);

        let mut c = ctx(100);
        c.playlist_index = Some(9);
        assert_eq!(policy.classify(&c), RecoveryAction::RetryRequest);

        let mut c = ctx(100);
        c.playlist_index = Some(12);
        c.consecutive_errors = 4;
        assert_eq!(policy.classify(&c), RecoveryAction::RetryRequest);

        c.consecutive_errors = 5;
        assert_eq!(policy.classify(&c), RecoveryAction::SkipToNext);
    }

    #[test]
    fn test_skip_then_give_up() {
        let policy = RecoveryPolicy::default();
        let mut c = ctx(101);
        for errors in 1..=5 {
            c.consecutive_errors = errors;
            assert_eq!(policy.classify(&c), RecoveryAction::SkipToNext);
        }
        c.consecutive_errors = 6;
        let action = policy.classify(&c);
        assert_eq!(action, RecoveryAction::GiveUp);
        assert!(action.is_terminal());
    }

    #[test]
    fn test_custom_budgets() {
        let policy = RecoveryPolicy {
            retry_error_budget: 1,
            skip_error_budget: 2,
        };
        let mut c = ctx(5);
        c.playlist_length = 0;
        c.consecutive_errors = 2;
        assert_eq!(policy.classify(&c), RecoveryAction::SkipToNext);
        c.consecutive_errors = 3;
        assert_eq!(policy.classify(&c), RecoveryAction::GiveUp);
    }
}
