// crates/core/src/event.rs
//! Wire shape of decoded query-stream events.
//!
//! Events are transient: each one flows through the board, report, and
//! artifact passes once and is dropped. Every field is optional because the
//! backend's agents disagree about which ones they send.

use serde::Deserialize;
use std::collections::BTreeMap;

/// Completion-reason codes recognized as terminal for a stage.
///
/// The observed enumeration is incomplete; codes outside this set are
/// deliberately treated as non-terminal rather than guessed at.
pub const TERMINAL_REASONS: &[&str] = &["STOP", "DONE", "MAX_TOKENS"];

/// One decoded `data: ` frame from the query stream.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamEvent {
    pub author: Option<String>,
    pub finish_reason: Option<String>,
    pub content: Option<EventContent>,
    pub actions: Option<EventActions>,
    /// Injected by the backend when its upstream orchestrator fails.
    pub error: Option<String>,
}

impl StreamEvent {
    /// True when `finishReason` carries one of the recognized terminal codes.
    pub fn is_terminal(&self) -> bool {
        self.finish_reason
            .as_deref()
            .is_some_and(|reason| TERMINAL_REASONS.contains(&reason))
    }
}

/// The accepted content shapes: a bare string, an ordered part list, or a
/// single nested text field. Anything else is carried opaquely and yields
/// no fragments.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EventContent {
    Text(String),
    Parts { parts: Vec<ContentPart> },
    Single { text: String },
    Other(serde_json::Value),
}

impl EventContent {
    /// Text fragments in encounter order.
    pub fn text_fragments(&self) -> Vec<&str> {
        match self {
            EventContent::Text(text) => vec![text.as_str()],
            EventContent::Parts { parts } => {
                parts.iter().filter_map(|p| p.text.as_deref()).collect()
            }
            EventContent::Single { text } => vec![text.as_str()],
            EventContent::Other(_) => Vec::new(),
        }
    }
}

/// One entry of a part-list content payload. Non-text parts (inline data
/// echoes and the like) deserialize with `text: None` and are skipped.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentPart {
    #[serde(default)]
    pub text: Option<String>,
}

/// Nested action records: tool invocations and artifact announcements.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventActions {
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    /// Mapping of artifact filename to whatever the backend attached to it.
    /// Sorted map so multi-entry deltas are processed deterministically.
    #[serde(default)]
    pub artifact_delta: BTreeMap<String, serde_json::Value>,
}

/// A tool invocation surfaced in the stream. The response is untyped; the
/// tools worth inspecting put a `file_path` string in it.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub response: Option<serde_json::Value>,
}
