// crates/core/src/artifact.rs
//! Locates the generated report document in the event stream.
//!
//! Two announcement channels exist: `actions.artifactDelta` entries keyed by
//! filename, and report-tool responses carrying a `file_path`. Either may
//! fire multiple times per run (the verification loop regenerates the
//! document); the pointer is last-write-wins with no further ordering
//! guarantee.

use crate::event::StreamEvent;

const DOC_EXT: &str = ".pdf";

/// Tracks the most recently announced document path for one run.
#[derive(Debug, Clone, Default)]
pub struct ArtifactLocator {
    path: Option<String>,
}

impl ArtifactLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect one event for document announcements.
    pub fn observe(&mut self, event: &StreamEvent) {
        let Some(actions) = &event.actions else { return };

        for (name, value) in &actions.artifact_delta {
            if !has_doc_ext(name) {
                continue;
            }
            // The delta value carries a filePath when the backend knows the
            // absolute location; the key alone still identifies the file.
            let path = value
                .get("filePath")
                .and_then(|v| v.as_str())
                .unwrap_or(name.as_str());
            tracing::debug!(path, "artifact delta announced document");
            self.path = Some(path.to_string());
        }

        for call in &actions.tool_calls {
            let Some(response) = &call.response else { continue };
            let Some(path) = response.get("file_path").and_then(|v| v.as_str()) else {
                continue;
            };
            if has_doc_ext(path) {
                tracing::debug!(path, tool = %call.name, "tool response announced document");
                self.path = Some(path.to_string());
            }
        }
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn into_path(self) -> Option<String> {
        self.path
    }
}

fn has_doc_ext(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(DOC_EXT)
}
