//! Transcript assembly
//!
//! Folds a thread's flat, time-ordered message log into the coalesced
//! view a chat renderer consumes: agent narration grouped into turns,
//! tool invocations nested under their parents, interruptions made
//! explicit.
//!
//! ## Streaming safety
//!
//! Production calls [`to_ui_messages`] on every growing prefix of the log
//! as new records arrive, so the fold must yield a valid partial result
//! at any prefix. Nothing here looks ahead: each record's effect depends
//! only on state accumulated so far, and tools still pending at the end
//! of the input stay pending unless the caller says the thread is no
//! longer working.
//!
//! ## Error handling
//!
//! Upstream data is eventually consistent, and a transcript must never
//! hard-fail a render. Inconsistencies degrade to silent drops:
//!
//! - A `tool-result` with no matching prior `tool-call` is ignored.
//! - A record addressed to an unknown `parent_tool_use_id` is ignored.
//! - Empty text parts are suppressed everywhere.
//!
//! Each drop emits a `tracing::debug!` event and nothing else.

use crate::types::{
    DbMessage, MessagePart, MetaKind, ThreadStatus, ToolStatus, UiMessage, UiPart, UiToolPart,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Result text assigned to a tool call that never received a real result
/// before the conversation moved on.
pub const INTERRUPTED_TOOL_RESULT: &str = "[Tool execution was interrupted]";

/// Tool whose consecutive invocations collapse to the latest one.
const TODO_WRITE: &str = "TodoWrite";

/// Fold a message log into rendering-ready messages.
///
/// Pure function of its inputs: calling it twice on the same log yields
/// structurally identical output, and it may run concurrently from any
/// number of threads. `agent` labels agent-role output messages.
///
/// `thread_status`, when supplied and non-working, force-completes any
/// tools still pending at end of stream; this covers an agent process
/// that died without emitting a terminal record.
pub fn to_ui_messages(
    messages: &[DbMessage],
    agent: &str,
    thread_status: Option<ThreadStatus>,
) -> Vec<UiMessage> {
    let mut reducer = Reducer::new(agent);
    for message in messages {
        reducer.apply(message);
    }
    reducer.finish(thread_status)
}

// ============================================
// Internal state
// ============================================

/// A slot in an in-progress parts list: either a concrete part or a
/// reference into the tool arena. Tool parts stay addressable (and
/// mutable) by id until the whole fold is materialized, even after the
/// message owning them has been flushed.
#[derive(Debug)]
enum Slot {
    Part(UiPart),
    Tool(usize),
}

/// Arena entry for one tool invocation.
#[derive(Debug)]
struct ToolNode {
    id: String,
    name: String,
    parameters: serde_json::Value,
    status: ToolStatus,
    result: Option<serde_json::Value>,
    parts: Vec<Slot>,
}

/// An output message whose tool slots are not yet resolved.
#[derive(Debug)]
enum Draft {
    User {
        parts: Vec<Slot>,
        timestamp: DateTime<Utc>,
        model: Option<String>,
    },
    Agent {
        parts: Vec<Slot>,
    },
    System {
        message_type: String,
        parts: Vec<Slot>,
    },
}

/// Where a new tool part is appended.
enum ToolTarget {
    /// Top level of the current agent turn.
    AgentTurn,
    /// Nested under an open ancestor tool part.
    Node(usize),
}

struct UserDraft {
    parts: Vec<Slot>,
    timestamp: DateTime<Utc>,
    model: Option<String>,
}

struct Reducer<'a> {
    agent: &'a str,
    out: Vec<Draft>,
    current_agent: Option<Vec<Slot>>,
    current_user: Option<UserDraft>,
    arena: Vec<ToolNode>,
    /// Every tool node ever created in this fold, by tool-call id.
    /// Ids are assumed unique within one thread; duplicates overwrite.
    tools_by_id: HashMap<String, usize>,
}

impl<'a> Reducer<'a> {
    fn new(agent: &'a str) -> Self {
        Self {
            agent,
            out: Vec::new(),
            current_agent: None,
            current_user: None,
            arena: Vec::new(),
            tools_by_id: HashMap::new(),
        }
    }

    // --- per-record transitions ---

    fn apply(&mut self, message: &DbMessage) {
        match message {
            DbMessage::User {
                parts,
                timestamp,
                model,
            } => self.on_user(parts, *timestamp, model.clone()),
            DbMessage::Agent {
                parts,
                parent_tool_use_id,
            } => self.on_agent(parts, parent_tool_use_id.as_deref()),
            DbMessage::ToolCall {
                id,
                name,
                parameters,
                parent_tool_use_id,
            } => self.on_tool_call(id, name, parameters, parent_tool_use_id.as_deref()),
            DbMessage::ToolResult {
                id,
                result,
                is_error,
                ..
            } => self.on_tool_result(id, result, *is_error),
            DbMessage::System {
                message_type,
                parts,
            } => self.on_system(message_type, parts),
            DbMessage::GitDiff {
                diff,
                diff_stats,
                timestamp,
                description,
            } => self.on_git_diff(diff, diff_stats.clone(), *timestamp, description.clone()),
            DbMessage::Stop => self.on_stop(),
            DbMessage::Error { .. } => self.on_error(),
            DbMessage::Meta { meta_type } => self.on_meta(*meta_type),
        }
    }

    /// A user record interrupts whatever the agent was doing.
    fn on_user(&mut self, parts: &[MessagePart], timestamp: DateTime<Utc>, model: Option<String>) {
        self.force_complete_pending_tools();
        self.flush_agent();

        let draft = self.current_user.get_or_insert_with(|| UserDraft {
            parts: Vec::new(),
            timestamp,
            model: None,
        });
        for part in parts {
            push_part(&mut draft.parts, part.clone().into());
        }
        // Last write wins, so coalesced bubbles show the latest send time.
        draft.timestamp = timestamp;
        draft.model = model;
    }

    fn on_agent(&mut self, parts: &[MessagePart], parent_tool_use_id: Option<&str>) {
        self.flush_user();

        match parent_tool_use_id {
            None => {
                let turn = self.current_agent.get_or_insert_with(Vec::new);
                for part in parts {
                    push_part(turn, part.clone().into());
                }
            }
            Some(parent_id) => match self.tools_by_id.get(parent_id).copied() {
                Some(node_idx) => {
                    for part in parts {
                        push_part(&mut self.arena[node_idx].parts, part.clone().into());
                    }
                }
                None => {
                    tracing::debug!(parent_id, "dropping agent message with unknown parent tool");
                }
            },
        }
    }

    fn on_tool_call(
        &mut self,
        id: &str,
        name: &str,
        parameters: &serde_json::Value,
        parent_tool_use_id: Option<&str>,
    ) {
        self.flush_user();

        let target = match parent_tool_use_id {
            None => ToolTarget::AgentTurn,
            Some(parent_id) => match self.tools_by_id.get(parent_id).copied() {
                Some(node_idx) => ToolTarget::Node(node_idx),
                None => {
                    tracing::debug!(id, parent_id, "dropping tool call with unknown parent tool");
                    return;
                }
            },
        };

        let node_idx = self.arena.len();
        self.arena.push(ToolNode {
            id: id.to_string(),
            name: name.to_string(),
            parameters: parameters.clone(),
            status: ToolStatus::Pending,
            result: None,
            parts: Vec::new(),
        });
        self.tools_by_id.insert(id.to_string(), node_idx);
        self.place_tool(target, node_idx, name);
    }

    /// Append a tool slot to its target list, collapsing a strictly
    /// adjacent pair of TodoWrite invocations down to the latest one.
    fn place_tool(&mut self, target: ToolTarget, node_idx: usize, name: &str) {
        let last_tool = {
            let parts = match &target {
                ToolTarget::AgentTurn => self.current_agent.as_deref().unwrap_or(&[]),
                ToolTarget::Node(ancestor) => &self.arena[*ancestor].parts,
            };
            match parts.last() {
                Some(Slot::Tool(prev)) => Some(*prev),
                _ => None,
            }
        };
        let collapse = name == TODO_WRITE
            && last_tool.is_some_and(|prev| self.arena[prev].name == TODO_WRITE);

        let parts = match target {
            ToolTarget::AgentTurn => self.current_agent.get_or_insert_with(Vec::new),
            ToolTarget::Node(ancestor) => &mut self.arena[ancestor].parts,
        };
        if collapse {
            *parts.last_mut().expect("collapse implies a last slot") = Slot::Tool(node_idx);
        } else {
            parts.push(Slot::Tool(node_idx));
        }
    }

    fn on_tool_result(&mut self, id: &str, result: &serde_json::Value, is_error: bool) {
        match self.tools_by_id.get(id).copied() {
            Some(node_idx) => {
                let node = &mut self.arena[node_idx];
                node.status = if is_error {
                    ToolStatus::Error
                } else {
                    ToolStatus::Completed
                };
                node.result = Some(result.clone());
            }
            None => {
                tracing::debug!(id, "dropping orphaned tool result");
            }
        }
    }

    fn on_system(&mut self, message_type: &str, parts: &[MessagePart]) {
        self.flush_both();
        let mut slots = Vec::new();
        for part in parts {
            push_part(&mut slots, part.clone().into());
        }
        self.out.push(Draft::System {
            message_type: message_type.to_string(),
            parts: slots,
        });
    }

    fn on_git_diff(
        &mut self,
        diff: &str,
        diff_stats: Option<crate::types::DiffStats>,
        timestamp: DateTime<Utc>,
        description: Option<String>,
    ) {
        self.force_complete_pending_tools();
        self.flush_both();
        self.out.push(Draft::System {
            message_type: "git-diff".to_string(),
            parts: vec![Slot::Part(UiPart::GitDiff {
                diff: diff.to_string(),
                diff_stats,
                timestamp,
                description,
            })],
        });
    }

    fn on_stop(&mut self) {
        self.force_complete_pending_tools();
        self.flush_both();
        self.out.push(Draft::System {
            message_type: "stop".to_string(),
            parts: vec![Slot::Part(UiPart::Stop)],
        });
    }

    fn on_error(&mut self) {
        // Errors are invisible in the transcript; only the interruption
        // of pending tools is observable.
        self.force_complete_pending_tools();
        self.flush_both();
    }

    fn on_meta(&mut self, meta_type: MetaKind) {
        match meta_type {
            // Hard turn boundary.
            MetaKind::ResultSuccess => self.flush_both(),
            // The turn was cut off; current messages stay open.
            MetaKind::ResultErrorMaxTurns => self.force_complete_pending_tools(),
            MetaKind::Other => {}
        }
    }

    // --- shared helpers ---

    fn flush_user(&mut self) {
        if let Some(draft) = self.current_user.take() {
            self.out.push(Draft::User {
                parts: draft.parts,
                timestamp: draft.timestamp,
                model: draft.model,
            });
        }
    }

    fn flush_agent(&mut self) {
        if let Some(parts) = self.current_agent.take() {
            self.out.push(Draft::Agent { parts });
        }
    }

    /// User before agent; see the finalization ordering note below.
    fn flush_both(&mut self) {
        self.flush_user();
        self.flush_agent();
    }

    fn force_complete_pending_tools(&mut self) {
        for node in &mut self.arena {
            if node.status == ToolStatus::Pending {
                node.status = ToolStatus::Completed;
                node.result = Some(serde_json::Value::String(
                    INTERRUPTED_TOOL_RESULT.to_string(),
                ));
            }
        }
    }

    /// End-of-stream finalization. The user draft is flushed before the
    /// agent draft; existing renderers depend on this order, so it is
    /// preserved even though at most one draft is non-empty in practice.
    fn finish(mut self, thread_status: Option<ThreadStatus>) -> Vec<UiMessage> {
        self.flush_user();
        self.flush_agent();

        if let Some(status) = thread_status {
            if !status.is_working() {
                self.force_complete_pending_tools();
            }
        }

        let mut arena: Vec<Option<ToolNode>> = self.arena.into_iter().map(Some).collect();
        let agent = self.agent;
        self.out
            .into_iter()
            .map(|draft| match draft {
                Draft::User {
                    parts,
                    timestamp,
                    model,
                } => UiMessage::User {
                    parts: resolve_slots(&mut arena, parts),
                    timestamp,
                    model,
                },
                Draft::Agent { parts } => UiMessage::Agent {
                    agent: agent.to_string(),
                    parts: resolve_slots(&mut arena, parts),
                },
                Draft::System {
                    message_type,
                    parts,
                } => UiMessage::System {
                    message_type,
                    parts: resolve_slots(&mut arena, parts),
                },
            })
            .collect()
    }
}

/// Append a part unless it is empty text. Empty text parts are
/// unconditionally suppressed, everywhere.
fn push_part(parts: &mut Vec<Slot>, part: UiPart) {
    if let UiPart::Text { text } = &part {
        if text.trim().is_empty() {
            return;
        }
    }
    parts.push(Slot::Part(part));
}

/// Materialize slot lists into owned parts, moving each tool node out of
/// the arena. Nodes displaced by TodoWrite collapsing are never
/// referenced and simply drop.
fn resolve_slots(arena: &mut Vec<Option<ToolNode>>, slots: Vec<Slot>) -> Vec<UiPart> {
    slots
        .into_iter()
        .filter_map(|slot| match slot {
            Slot::Part(part) => Some(part),
            Slot::Tool(idx) => arena[idx].take().map(|node| {
                let parts = resolve_slots(arena, node.parts);
                UiPart::Tool(UiToolPart {
                    id: node.id,
                    name: node.name,
                    parameters: node.parameters,
                    status: node.status,
                    result: node.result,
                    parts,
                })
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn user(text: &str) -> DbMessage {
        DbMessage::User {
            parts: vec![MessagePart::Text {
                text: text.to_string(),
            }],
            timestamp: ts(1_700_000_000),
            model: None,
        }
    }

    fn agent_text(text: &str) -> DbMessage {
        DbMessage::Agent {
            parts: vec![MessagePart::Text {
                text: text.to_string(),
            }],
            parent_tool_use_id: None,
        }
    }

    fn tool_call(id: &str, name: &str) -> DbMessage {
        DbMessage::ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            parameters: serde_json::json!({}),
            parent_tool_use_id: None,
        }
    }

    fn tool_result(id: &str, result: &str) -> DbMessage {
        DbMessage::ToolResult {
            id: id.to_string(),
            result: serde_json::json!(result),
            is_error: false,
            parent_tool_use_id: None,
        }
    }

    fn reduce(log: &[DbMessage]) -> Vec<UiMessage> {
        to_ui_messages(log, "claude", None)
    }

    fn tool_parts(message: &UiMessage) -> Vec<&UiToolPart> {
        message
            .parts()
            .iter()
            .filter_map(|p| match p {
                UiPart::Tool(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_simple_turn_with_tool() {
        let log = vec![
            user("hi"),
            agent_text("hello"),
            tool_call("1", "search"),
            tool_result("1", "found"),
            agent_text("done"),
        ];
        let out = reduce(&log);

        assert_eq!(out.len(), 2);
        assert!(matches!(&out[0], UiMessage::User { parts, .. }
            if parts == &[UiPart::Text { text: "hi".to_string() }]));

        let UiMessage::Agent { agent, parts } = &out[1] else {
            panic!("expected agent message");
        };
        assert_eq!(agent, "claude");
        assert_eq!(parts.len(), 3);
        assert!(matches!(&parts[0], UiPart::Text { text } if text == "hello"));
        let UiPart::Tool(tool) = &parts[1] else {
            panic!("expected tool part");
        };
        assert_eq!(tool.name, "search");
        assert_eq!(tool.status, ToolStatus::Completed);
        assert_eq!(tool.result, Some(serde_json::json!("found")));
        assert!(matches!(&parts[2], UiPart::Text { text } if text == "done"));
    }

    #[test]
    fn test_empty_text_parts_suppressed() {
        let log = vec![
            DbMessage::Agent {
                parts: vec![
                    MessagePart::Text {
                        text: "  \n ".to_string(),
                    },
                    MessagePart::Text {
                        text: "real".to_string(),
                    },
                ],
                parent_tool_use_id: None,
            },
        ];
        let out = reduce(&log);
        assert_eq!(out[0].parts().len(), 1);
    }

    #[test]
    fn test_consecutive_user_messages_coalesce() {
        let log = vec![
            DbMessage::User {
                parts: vec![MessagePart::Text {
                    text: "first".to_string(),
                }],
                timestamp: ts(100),
                model: Some("opus".to_string()),
            },
            DbMessage::User {
                parts: vec![MessagePart::Text {
                    text: "second".to_string(),
                }],
                timestamp: ts(200),
                model: Some("sonnet".to_string()),
            },
        ];
        let out = reduce(&log);

        assert_eq!(out.len(), 1);
        let UiMessage::User {
            parts,
            timestamp,
            model,
        } = &out[0]
        else {
            panic!("expected user message");
        };
        assert_eq!(parts.len(), 2);
        assert_eq!(*timestamp, ts(200));
        assert_eq!(model.as_deref(), Some("sonnet"));
    }

    #[test]
    fn test_orphaned_tool_result_is_dropped() {
        let log = vec![agent_text("hello"), tool_result("ghost", "boo")];
        let out = reduce(&log);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].parts().len(), 1);
    }

    #[test]
    fn test_user_message_interrupts_pending_tool() {
        let log = vec![tool_call("1", "Bash"), user("never mind")];
        let out = reduce(&log);

        let tools = tool_parts(&out[0]);
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].status, ToolStatus::Completed);
        assert_eq!(
            tools[0].result,
            Some(serde_json::json!(INTERRUPTED_TOOL_RESULT))
        );
    }

    #[test]
    fn test_stop_interrupts_and_emits_marker() {
        let log = vec![tool_call("1", "Bash"), DbMessage::Stop];
        let out = reduce(&log);

        assert_eq!(out.len(), 2);
        assert_eq!(tool_parts(&out[0])[0].status, ToolStatus::Completed);
        let UiMessage::System {
            message_type,
            parts,
        } = &out[1]
        else {
            panic!("expected system message");
        };
        assert_eq!(message_type, "stop");
        assert_eq!(parts, &[UiPart::Stop]);
    }

    #[test]
    fn test_error_is_invisible_but_interrupts() {
        let log = vec![
            agent_text("working"),
            tool_call("1", "Bash"),
            DbMessage::Error {
                message: Some("sandbox died".to_string()),
            },
        ];
        let out = reduce(&log);

        // The error itself never appears in the transcript.
        assert_eq!(out.len(), 1);
        assert_eq!(
            tool_parts(&out[0])[0].result,
            Some(serde_json::json!(INTERRUPTED_TOOL_RESULT))
        );
    }

    #[test]
    fn test_git_diff_interrupts_and_emits_system_entry() {
        let log = vec![
            tool_call("1", "Edit"),
            DbMessage::GitDiff {
                diff: "--- a\n+++ b\n".to_string(),
                diff_stats: None,
                timestamp: ts(300),
                description: Some("checkpoint".to_string()),
            },
        ];
        let out = reduce(&log);

        assert_eq!(tool_parts(&out[0])[0].status, ToolStatus::Completed);
        let UiMessage::System {
            message_type,
            parts,
        } = &out[1]
        else {
            panic!("expected system message");
        };
        assert_eq!(message_type, "git-diff");
        assert!(matches!(&parts[0], UiPart::GitDiff { description, .. }
            if description.as_deref() == Some("checkpoint")));
    }

    #[test]
    fn test_max_turns_meta_interrupts_without_flushing() {
        let log = vec![
            agent_text("thinking"),
            tool_call("1", "Bash"),
            DbMessage::Meta {
                meta_type: MetaKind::ResultErrorMaxTurns,
            },
            agent_text("more"),
        ];
        let out = reduce(&log);

        // The agent turn stays open across the max-turns signal.
        assert_eq!(out.len(), 1);
        assert_eq!(tool_parts(&out[0])[0].status, ToolStatus::Completed);
        assert_eq!(out[0].parts().len(), 3);
    }

    #[test]
    fn test_result_success_is_a_turn_boundary() {
        let log = vec![
            agent_text("turn one"),
            DbMessage::Meta {
                meta_type: MetaKind::ResultSuccess,
            },
            agent_text("turn two"),
        ];
        let out = reduce(&log);

        assert_eq!(out.len(), 2);
        assert!(matches!(&out[0], UiMessage::Agent { parts, .. } if parts.len() == 1));
        assert!(matches!(&out[1], UiMessage::Agent { parts, .. } if parts.len() == 1));
    }

    #[test]
    fn test_result_success_does_not_interrupt_tools() {
        let log = vec![
            tool_call("1", "Bash"),
            DbMessage::Meta {
                meta_type: MetaKind::ResultSuccess,
            },
            tool_result("1", "late but fine"),
        ];
        let out = reduce(&log);

        let tools = tool_parts(&out[0]);
        assert_eq!(tools[0].status, ToolStatus::Completed);
        assert_eq!(tools[0].result, Some(serde_json::json!("late but fine")));
    }

    #[test]
    fn test_unknown_meta_is_ignored() {
        let log = vec![
            agent_text("hello"),
            DbMessage::Meta {
                meta_type: MetaKind::Other,
            },
            agent_text("world"),
        ];
        let out = reduce(&log);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].parts().len(), 2);
    }

    #[test]
    fn test_error_result_sets_error_status() {
        let log = vec![
            tool_call("1", "Bash"),
            DbMessage::ToolResult {
                id: "1".to_string(),
                result: serde_json::json!("command not found"),
                is_error: true,
                parent_tool_use_id: None,
            },
        ];
        let out = reduce(&log);
        assert_eq!(tool_parts(&out[0])[0].status, ToolStatus::Error);
    }

    #[test]
    fn test_nested_tool_calls_and_narration() {
        let log = vec![
            DbMessage::ToolCall {
                id: "task".to_string(),
                name: "Task".to_string(),
                parameters: serde_json::json!({"prompt": "explore"}),
                parent_tool_use_id: None,
            },
            DbMessage::Agent {
                parts: vec![MessagePart::Text {
                    text: "sub-agent narrating".to_string(),
                }],
                parent_tool_use_id: Some("task".to_string()),
            },
            DbMessage::ToolCall {
                id: "inner".to_string(),
                name: "Read".to_string(),
                parameters: serde_json::json!({}),
                parent_tool_use_id: Some("task".to_string()),
            },
            tool_result("inner", "file contents"),
            tool_result("task", "summary"),
        ];
        let out = reduce(&log);

        assert_eq!(out.len(), 1);
        let tools = tool_parts(&out[0]);
        assert_eq!(tools.len(), 1);
        let task = tools[0];
        assert_eq!(task.status, ToolStatus::Completed);
        assert_eq!(task.parts.len(), 2);
        assert!(matches!(&task.parts[0], UiPart::Text { text }
            if text == "sub-agent narrating"));
        let UiPart::Tool(inner) = &task.parts[1] else {
            panic!("expected nested tool part");
        };
        assert_eq!(inner.name, "Read");
        assert_eq!(inner.status, ToolStatus::Completed);
    }

    #[test]
    fn test_records_with_unknown_ancestor_are_dropped() {
        let log = vec![
            agent_text("hello"),
            DbMessage::Agent {
                parts: vec![MessagePart::Text {
                    text: "lost".to_string(),
                }],
                parent_tool_use_id: Some("ghost".to_string()),
            },
            DbMessage::ToolCall {
                id: "1".to_string(),
                name: "Read".to_string(),
                parameters: serde_json::json!({}),
                parent_tool_use_id: Some("ghost".to_string()),
            },
        ];
        let out = reduce(&log);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].parts().len(), 1);
        // The dropped tool call is also unreachable for results.
        let out2 = reduce(&[log.as_slice(), &[tool_result("1", "x")]].concat());
        assert_eq!(out2[0].parts().len(), 1);
    }

    #[test]
    fn test_todo_write_collapses_when_adjacent() {
        let log = vec![
            DbMessage::ToolCall {
                id: "t1".to_string(),
                name: TODO_WRITE.to_string(),
                parameters: serde_json::json!({"todos": ["a"]}),
                parent_tool_use_id: None,
            },
            tool_result("t1", "ok"),
            DbMessage::ToolCall {
                id: "t2".to_string(),
                name: TODO_WRITE.to_string(),
                parameters: serde_json::json!({"todos": ["a", "b"]}),
                parent_tool_use_id: None,
            },
            tool_result("t2", "ok"),
        ];
        let out = reduce(&log);

        assert_eq!(out.len(), 1);
        let tools = tool_parts(&out[0]);
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].id, "t2");
    }

    #[test]
    fn test_todo_write_kept_when_another_tool_interposes() {
        let log = vec![
            tool_call("t1", TODO_WRITE),
            tool_call("x", "Bash"),
            tool_call("t2", TODO_WRITE),
        ];
        let out = reduce(&log);

        let names: Vec<_> = tool_parts(&out[0]).iter().map(|t| t.name.clone()).collect();
        assert_eq!(names, vec![TODO_WRITE, "Bash", TODO_WRITE]);
    }

    #[test]
    fn test_todo_write_kept_when_text_interposes() {
        let log = vec![
            tool_call("t1", TODO_WRITE),
            agent_text("progress update"),
            tool_call("t2", TODO_WRITE),
        ];
        let out = reduce(&log);
        assert_eq!(tool_parts(&out[0]).len(), 2);
    }

    #[test]
    fn test_pending_tool_stays_pending_while_working() {
        let log = vec![tool_call("1", "Bash")];

        for status in [None, Some(ThreadStatus::Working), Some(ThreadStatus::Booting)] {
            let out = to_ui_messages(&log, "claude", status);
            assert_eq!(tool_parts(&out[0])[0].status, ToolStatus::Pending);
        }
    }

    #[test]
    fn test_pending_tool_interrupted_when_thread_not_working() {
        let log = vec![tool_call("1", "Bash")];
        let out = to_ui_messages(&log, "claude", Some(ThreadStatus::Stopped));

        let tools = tool_parts(&out[0]);
        assert_eq!(tools[0].status, ToolStatus::Completed);
        assert_eq!(
            tools[0].result,
            Some(serde_json::json!(INTERRUPTED_TOOL_RESULT))
        );
    }

    #[test]
    fn test_system_message_passes_through() {
        let log = vec![
            agent_text("hello"),
            DbMessage::System {
                message_type: "notice".to_string(),
                parts: vec![MessagePart::Text {
                    text: "usage limit approaching".to_string(),
                }],
            },
        ];
        let out = reduce(&log);

        assert_eq!(out.len(), 2);
        assert!(matches!(&out[1], UiMessage::System { message_type, .. }
            if message_type == "notice"));
    }

    #[test]
    fn test_deterministic() {
        let log = vec![
            user("hi"),
            agent_text("hello"),
            tool_call("1", "Bash"),
            DbMessage::Stop,
        ];
        assert_eq!(reduce(&log), reduce(&log));
    }

    #[test]
    fn test_prefix_consistency_while_working() {
        // Running on a prefix must agree with the full run up to that
        // prefix: a tool pending at the boundary is reported pending.
        let log = vec![
            user("hi"),
            agent_text("hello"),
            tool_call("1", "Bash"),
            tool_result("1", "done"),
        ];
        let prefix = to_ui_messages(&log[..3], "claude", Some(ThreadStatus::Working));
        assert_eq!(tool_parts(&prefix[1])[0].status, ToolStatus::Pending);

        let full = to_ui_messages(&log, "claude", Some(ThreadStatus::Working));
        assert_eq!(tool_parts(&full[1])[0].status, ToolStatus::Completed);

        // Everything before the boundary is unchanged between runs.
        assert_eq!(prefix[0], full[0]);
    }

    #[test]
    fn test_empty_log() {
        assert!(reduce(&[]).is_empty());
    }
}
