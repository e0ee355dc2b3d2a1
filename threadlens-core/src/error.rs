//! Error types for threadlens-core
//!
//! Schedule validation failures are values handed back to the UI layer,
//! never panics. The transcript reducer has no error type at all: it
//! degrades inconsistent input to silent drops (see
//! [`transcript`](crate::transcript)).

use serde::Serialize;
use thiserror::Error;

/// Why a cron expression was rejected by
/// [`validate_cron_expression`](crate::schedule::validate_cron_expression).
///
/// Serialized kebab-case; the front end switches on these codes.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScheduleError {
    /// Not parseable as a 5-field cron expression.
    #[error("invalid cron syntax")]
    InvalidSyntax,

    /// Syntactically valid, but outside the subset the schedule editor
    /// can represent.
    #[error("unsupported cron pattern")]
    UnsupportedPattern,

    /// Multi-hour schedules require a pro workspace.
    #[error("multiple run hours require a pro plan")]
    ProOnly,
}

/// Result type alias for schedule validation
pub type Result<T> = std::result::Result<T, ScheduleError>;
