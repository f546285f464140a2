// crates/client/src/run.rs
//! One full analysis run: session, stream, board, report, artifact.
//!
//! [`run_analysis`] owns all per-run state and reports progress through a
//! caller-supplied observer, so two runs never share buffers. [`Runner`]
//! enforces the one-open-stream rule by cancelling the previous run's token
//! whenever a new one begins.

use std::path::PathBuf;

use threatflow_core::markdown::{self, Document};
use threatflow_core::{ArtifactLocator, ReportBuffer, StageBoard, StageChange, StageId, StageStatus};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::error::Error;
use crate::message::{MessagePart, QueryRequest};

/// Progress notifications emitted while a run is in flight.
#[derive(Debug, Clone)]
pub enum RunUpdate {
    /// The backend issued a correlation id; streaming starts next.
    SessionReady { session_id: String },
    /// A stage moved forward on the board.
    Stage(StageChange),
}

/// Parameters for one analysis run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub user_id: String,
    pub message: String,
    /// Image files to attach; encoded and validated before any network call.
    pub attachments: Vec<PathBuf>,
    /// Speculative successor activation on stage completion.
    pub lookahead: bool,
}

impl RunRequest {
    pub fn new(user_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            message: message.into(),
            attachments: Vec::new(),
            lookahead: true,
        }
    }
}

/// Everything a completed run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub session_id: String,
    /// Final board, after end-of-stream promotion.
    pub board: StageBoard,
    /// Raw accumulated report text, markdown source form.
    pub report_markdown: String,
    /// The same report parsed for display.
    pub report: Document,
    /// Server-side path of a generated document, when one was announced.
    pub artifact_path: Option<String>,
}

/// Execute one run to completion. The observer sees every stage change as
/// it happens, including the end-of-stream promotions. On any error the
/// partially-updated display state the observer built stays as last
/// observed; no outcome is returned.
pub async fn run_analysis(
    client: &ApiClient,
    request: &RunRequest,
    cancel: CancellationToken,
    mut on_update: impl FnMut(RunUpdate),
) -> Result<RunOutcome, Error> {
    // Attachment validation happens before the first network call so a bad
    // file never burns a session.
    let mut message_parts = vec![MessagePart::text(request.message.clone())];
    for path in &request.attachments {
        message_parts.push(MessagePart::attach_image(path)?);
    }

    let session_id = client.create_session().await?;
    info!(%session_id, "session created");
    on_update(RunUpdate::SessionReady { session_id: session_id.clone() });

    let query = QueryRequest {
        user_id: request.user_id.clone(),
        session_id: session_id.clone(),
        message_parts,
    };
    let mut stream = client.open_query_stream(&query, cancel).await?;

    let mut board = if request.lookahead {
        StageBoard::new()
    } else {
        StageBoard::new().without_lookahead()
    };
    let mut report = ReportBuffer::new();
    let mut artifact = ArtifactLocator::new();

    let mut event_count = 0usize;
    while let Some(event) = stream.next().await? {
        event_count += 1;
        for change in board.apply(&event) {
            on_update(RunUpdate::Stage(change));
        }
        report.absorb(&event);
        artifact.observe(&event);
    }

    for change in board.finalize() {
        on_update(RunUpdate::Stage(change));
    }
    debug!(event_count, report_bytes = report.as_str().len(), "stream complete");

    let report_markdown = report.into_text();
    let document = markdown::render(&report_markdown);
    Ok(RunOutcome {
        session_id,
        board,
        report_markdown,
        report: document,
        artifact_path: artifact.into_path(),
    })
}

impl RunOutcome {
    /// Stage statuses in pipeline order, for rendering a summary line.
    pub fn stages(&self) -> [(StageId, StageStatus); 5] {
        self.board.snapshot()
    }
}

/// Tracks the cancellation token of the in-flight run. At most one run is
/// active at a time; beginning a new one aborts the previous stream first.
#[derive(Debug, Default)]
pub struct Runner {
    active: Option<CancellationToken>,
}

impl Runner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for a new run. Any previous run's token is cancelled before
    /// the new one is handed out.
    pub fn begin(&mut self) -> CancellationToken {
        if let Some(prev) = self.active.take() {
            prev.cancel();
        }
        let token = CancellationToken::new();
        self.active = Some(token.clone());
        token
    }

    /// Cancel the in-flight run, if any.
    pub fn cancel_active(&mut self) {
        if let Some(token) = self.active.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_cancels_previous_run() {
        let mut runner = Runner::new();
        let first = runner.begin();
        assert!(!first.is_cancelled());

        let second = runner.begin();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
    }

    #[test]
    fn test_cancel_active() {
        let mut runner = Runner::new();
        let token = runner.begin();
        runner.cancel_active();
        assert!(token.is_cancelled());

        // Idempotent with nothing in flight.
        runner.cancel_active();
    }

    #[test]
    fn test_request_defaults() {
        let request = RunRequest::new("tester", "analyze the diagram");
        assert!(request.attachments.is_empty());
        assert!(request.lookahead);
    }
}
