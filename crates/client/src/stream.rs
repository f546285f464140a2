// crates/client/src/stream.rs
//! Pull-based reader over an open query stream.
//!
//! Wraps the HTTP response body with the frame decoder and a cancellation
//! token. Callers loop on [`QueryStream::next`] until it yields `Ok(None)`;
//! cancellation and transport failures surface as errors from the same call.

use std::collections::VecDeque;

use threatflow_core::{EventDecoder, StreamEvent};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::Error;

const STREAM_CONTENT_TYPE: &str = "text/event-stream";

/// Live event stream for one query. Dropping it closes the connection.
#[derive(Debug)]
pub struct QueryStream {
    response: reqwest::Response,
    decoder: EventDecoder,
    queued: VecDeque<StreamEvent>,
    cancel: CancellationToken,
    done: bool,
}

impl QueryStream {
    /// Wrap an accepted `/api/query` response. Rejects responses whose
    /// content type is not `text/event-stream`; a proxy that buffers the
    /// whole body into JSON or HTML would otherwise stall the board until
    /// the run finished.
    pub(crate) fn from_response(
        response: reqwest::Response,
        cancel: CancellationToken,
    ) -> Result<Self, Error> {
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if !content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with(STREAM_CONTENT_TYPE))
        {
            return Err(Error::StreamUnsupported { content_type });
        }

        Ok(Self {
            response,
            decoder: EventDecoder::new(),
            queued: VecDeque::new(),
            cancel,
            done: false,
        })
    }

    /// Next decoded event, or `Ok(None)` once the backend closes the
    /// stream. An `error` frame from the backend ends the stream with
    /// [`Error::Stream`], as does a mid-body transport failure.
    pub async fn next(&mut self) -> Result<Option<StreamEvent>, Error> {
        loop {
            if let Some(event) = self.queued.pop_front() {
                if let Some(message) = event.error {
                    // The backend emits an error frame as its last act.
                    self.queued.clear();
                    self.done = true;
                    return Err(Error::Stream(message));
                }
                return Ok(Some(event));
            }
            if self.done {
                return Ok(None);
            }

            let chunk = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(Error::Cancelled),
                chunk = self.response.chunk() => chunk,
            };
            match chunk {
                Ok(Some(bytes)) => self.queued.extend(self.decoder.push(&bytes)),
                Ok(None) => {
                    self.done = true;
                    // A final frame without a trailing newline still counts.
                    if let Some(event) = self.decoder.finish() {
                        self.queued.push_back(event);
                    }
                    debug!(pending = self.decoder.pending_bytes(), "query stream closed");
                }
                Err(err) => {
                    self.done = true;
                    return Err(Error::Stream(err.to_string()));
                }
            }
        }
    }
}
