//! Core domain types for threadlens
//!
//! These types describe the two sides of the transcript pipeline: the
//! persisted event log a thread accumulates (`DbMessage`) and the
//! coalesced, rendering-ready view derived from it (`UiMessage`).
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Thread** | One conversation between a human and a coding agent |
//! | **DbMessage** | A single persisted event in a thread's append-only log |
//! | **UiMessage** | A rendering-ready entry grouping one or more parts under a role |
//! | **Part** | A unit of content within a message (text, image, tool call, ...) |
//! | **Tool part** | The view of one tool invocation, including nested sub-agent activity |
//!
//! All unions are serde-tagged enums. Downstream code pattern-matches on
//! the serialized `type`/`role` tags, so variant names here are wire
//! names: adding a variant is a format change, and every `match` over
//! these enums is exhaustive on purpose.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Input log records
// ============================================

/// Subtype of a `meta` log record.
///
/// Only two subtypes carry reducer semantics; everything else a producer
/// may emit deserializes to [`MetaKind::Other`] and is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetaKind {
    /// The agent loop finished a turn normally.
    ResultSuccess,
    /// The agent loop was cut off by the max-turns limit.
    ResultErrorMaxTurns,
    /// Any other producer-side bookkeeping record.
    #[serde(other)]
    Other,
}

/// Line/file counts attached to a git diff record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub files_changed: u32,
    pub additions: u32,
    pub deletions: u32,
}

/// A content part as stored in the log (user prompts, agent narration).
///
/// Tool invocations are separate log records, not parts; see
/// [`DbMessage::ToolCall`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MessagePart {
    /// Plain text content.
    Text { text: String },
    /// Extended-thinking output from the model.
    Thinking { thinking: String },
    /// An uploaded or referenced image.
    Image { url: String },
}

/// One persisted event in a thread's append-only message log.
///
/// Produced externally (by the agent runtime and its storage layer) and
/// consumed in strict arrival order by
/// [`to_ui_messages`](crate::transcript::to_ui_messages).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DbMessage {
    /// A human turn. Consecutive user records coalesce into one bubble.
    User {
        parts: Vec<MessagePart>,
        timestamp: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
    },
    /// Agent narration. When `parent_tool_use_id` is set the text belongs
    /// inside that tool invocation (sub-agent activity), not the top level.
    Agent {
        parts: Vec<MessagePart>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_tool_use_id: Option<String>,
    },
    /// The agent invoked a tool.
    ToolCall {
        id: String,
        name: String,
        #[serde(default)]
        parameters: serde_json::Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_tool_use_id: Option<String>,
    },
    /// A tool finished. `id` refers back to the originating tool call.
    ToolResult {
        id: String,
        #[serde(default)]
        result: serde_json::Value,
        #[serde(default)]
        is_error: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_tool_use_id: Option<String>,
    },
    /// A system notice rendered verbatim (environment setup, limits, ...).
    System {
        message_type: String,
        #[serde(default)]
        parts: Vec<MessagePart>,
    },
    /// A snapshot of the working tree's diff at this point in the thread.
    GitDiff {
        diff: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        diff_stats: Option<DiffStats>,
        timestamp: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// The user stopped the agent.
    Stop,
    /// The agent runtime reported an error. Invisible in the transcript;
    /// only its interruption side effect is observable.
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Producer bookkeeping; see [`MetaKind`].
    Meta { meta_type: MetaKind },
}

// ============================================
// Thread status
// ============================================

/// Lifecycle state of a thread, as reported by the agent runtime.
///
/// The reducer only cares whether the thread is still making progress:
/// at end of stream, tools left pending in a non-working thread are
/// force-completed with the interruption sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThreadStatus {
    Queued,
    QueuedTasksConcurrency,
    QueuedSandboxCreationRateLimit,
    QueuedAgentRateLimit,
    Booting,
    Working,
    Stopping,
    Checkpointing,
    Completed,
    Stopped,
    Errored,
}

impl ThreadStatus {
    /// True while the agent process may still deliver tool results.
    pub fn is_working(&self) -> bool {
        matches!(
            self,
            ThreadStatus::Queued
                | ThreadStatus::QueuedTasksConcurrency
                | ThreadStatus::QueuedSandboxCreationRateLimit
                | ThreadStatus::QueuedAgentRateLimit
                | ThreadStatus::Booting
                | ThreadStatus::Working
                | ThreadStatus::Stopping
                | ThreadStatus::Checkpointing
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThreadStatus::Queued => "queued",
            ThreadStatus::QueuedTasksConcurrency => "queued-tasks-concurrency",
            ThreadStatus::QueuedSandboxCreationRateLimit => {
                "queued-sandbox-creation-rate-limit"
            }
            ThreadStatus::QueuedAgentRateLimit => "queued-agent-rate-limit",
            ThreadStatus::Booting => "booting",
            ThreadStatus::Working => "working",
            ThreadStatus::Stopping => "stopping",
            ThreadStatus::Checkpointing => "checkpointing",
            ThreadStatus::Completed => "completed",
            ThreadStatus::Stopped => "stopped",
            ThreadStatus::Errored => "errored",
        }
    }
}

impl std::fmt::Display for ThreadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ThreadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(ThreadStatus::Queued),
            "queued-tasks-concurrency" => Ok(ThreadStatus::QueuedTasksConcurrency),
            "queued-sandbox-creation-rate-limit" => {
                Ok(ThreadStatus::QueuedSandboxCreationRateLimit)
            }
            "queued-agent-rate-limit" => Ok(ThreadStatus::QueuedAgentRateLimit),
            "booting" => Ok(ThreadStatus::Booting),
            "working" => Ok(ThreadStatus::Working),
            "stopping" => Ok(ThreadStatus::Stopping),
            "checkpointing" => Ok(ThreadStatus::Checkpointing),
            "completed" => Ok(ThreadStatus::Completed),
            "stopped" => Ok(ThreadStatus::Stopped),
            "errored" => Ok(ThreadStatus::Errored),
            _ => Err(format!("unknown thread status: {}", s)),
        }
    }
}

// ============================================
// Output view
// ============================================

/// Completion state of a rendered tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolStatus {
    /// Awaiting a result.
    Pending,
    /// Finished (including force-completed interruptions).
    Completed,
    /// Finished with an error result.
    Error,
}

impl ToolStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolStatus::Pending => "pending",
            ToolStatus::Completed => "completed",
            ToolStatus::Error => "error",
        }
    }
}

impl std::str::FromStr for ToolStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ToolStatus::Pending),
            "completed" => Ok(ToolStatus::Completed),
            "error" => Ok(ToolStatus::Error),
            _ => Err(format!("unknown tool status: {}", s)),
        }
    }
}

/// The rendering view of one tool invocation.
///
/// `parts` holds agent activity that happened inside this invocation:
/// sub-agent narration and nested tool calls attributed to it via
/// `parent_tool_use_id`. `result` is present iff `status` is not pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiToolPart {
    pub id: String,
    pub name: String,
    pub parameters: serde_json::Value,
    pub status: ToolStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    pub parts: Vec<UiPart>,
}

/// A content part within a [`UiMessage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum UiPart {
    Text { text: String },
    Thinking { thinking: String },
    Image { url: String },
    Tool(UiToolPart),
    /// The single part of a `stop` system message.
    Stop,
    GitDiff {
        diff: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        diff_stats: Option<DiffStats>,
        timestamp: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl From<MessagePart> for UiPart {
    fn from(part: MessagePart) -> Self {
        match part {
            MessagePart::Text { text } => UiPart::Text { text },
            MessagePart::Thinking { thinking } => UiPart::Thinking { thinking },
            MessagePart::Image { url } => UiPart::Image { url },
        }
    }
}

/// A rendering-ready conversation entry.
///
/// Built incrementally by the reducer; once produced, the list is in
/// final display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "kebab-case")]
pub enum UiMessage {
    /// One or more coalesced human turns.
    User {
        parts: Vec<UiPart>,
        timestamp: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
    },
    /// An agent turn: narration interleaved with tool invocations.
    Agent { agent: String, parts: Vec<UiPart> },
    /// A standalone system entry (notice, stop marker, git diff).
    System {
        message_type: String,
        parts: Vec<UiPart>,
    },
}

impl UiMessage {
    /// The parts list of this message, regardless of role.
    pub fn parts(&self) -> &[UiPart] {
        match self {
            UiMessage::User { parts, .. }
            | UiMessage::Agent { parts, .. }
            | UiMessage::System { parts, .. } => parts,
        }
    }
}
