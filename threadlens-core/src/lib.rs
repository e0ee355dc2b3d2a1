//! # threadlens-core
//!
//! Core library for threadlens - the conversation and scheduling engine
//! behind a chat-based coding-agent front end.
//!
//! This library provides:
//! - Domain types for thread message logs and their rendered view
//! - The transcript reducer that folds a log into display messages
//! - The automation schedule DSL (restricted cron ↔ editor state)
//!
//! ## Architecture
//!
//! Both subsystems are pure and synchronous. The storage layer feeds
//! [`transcript::to_ui_messages`] ever-growing prefixes of a thread's
//! append-only log; the automation layer stores cron strings validated
//! and interpreted by [`schedule`]. Neither module performs I/O.
//!
//! ## Example
//!
//! ```rust
//! use threadlens_core::{to_ui_messages, DbMessage, MessagePart};
//! use chrono::Utc;
//!
//! let log = vec![DbMessage::User {
//!     parts: vec![MessagePart::Text { text: "hello".into() }],
//!     timestamp: Utc::now(),
//!     model: None,
//! }];
//! let view = to_ui_messages(&log, "claude", None);
//! assert_eq!(view.len(), 1);
//! ```

// Re-export commonly used items at the crate root
pub use error::ScheduleError;
pub use schedule::{
    cron_description, generate_cron, generate_cron_with, is_supported_cron_expression,
    is_valid_cron_expression, next_run_time, parse_cron_to_state, validate_cron_expression,
    AccessTier, Frequency, NextRunQuery, ScheduleState, MAX_HOURS_PER_SCHEDULE,
};
pub use transcript::{to_ui_messages, INTERRUPTED_TOOL_RESULT};
pub use types::*;

// Public modules
pub mod error;
pub mod logging;
pub mod schedule;
pub mod transcript;
pub mod types;
