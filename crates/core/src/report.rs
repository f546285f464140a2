// crates/core/src/report.rs
//! Append-only accumulation of report text across a run.

use crate::event::StreamEvent;

/// Collects every text fragment the stream produces, in arrival order.
///
/// Rendering happens once at stream end; partial markdown is never shown,
/// so half-streamed `**` markers cannot flicker through the display.
#[derive(Debug, Clone, Default)]
pub struct ReportBuffer {
    buf: String,
}

impl ReportBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append all fragments carried by `event`, in encounter order.
    pub fn absorb(&mut self, event: &StreamEvent) {
        let Some(content) = &event.content else { return };
        for fragment in content.text_fragments() {
            self.buf.push_str(fragment);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Consume the buffer, yielding the raw accumulated markdown.
    pub fn into_text(self) -> String {
        self.buf
    }
}
