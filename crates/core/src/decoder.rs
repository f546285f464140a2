// crates/core/src/decoder.rs
//! Incremental decoder for the `data: `-framed query stream.
//!
//! Transport chunks carry no alignment guarantee: a frame can be split at
//! any byte, including inside the prefix or a multi-byte character. The
//! decoder buffers raw bytes, cuts only complete (newline-terminated)
//! lines, and parses each `data: ` payload as one JSON object. A line that
//! fails to parse is dropped silently; mid-stream garbage must never kill
//! the run.

use crate::event::StreamEvent;

const DATA_PREFIX: &str = "data: ";

/// Reassembles stream events from an unaligned chunk sequence.
///
/// Feed chunks with [`push`](EventDecoder::push); call
/// [`finish`](EventDecoder::finish) once at end of stream to drain a
/// trailing unterminated line.
#[derive(Debug, Default)]
pub struct EventDecoder {
    buf: Vec<u8>,
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one chunk and decode every line it completes, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buf.extend_from_slice(chunk);

        // Only lines up to the last newline are complete; the remainder is
        // a partial line that the next chunk will extend.
        let Some(last_newline) = self.buf.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };
        let complete: Vec<u8> = self.buf.drain(..=last_newline).collect();

        complete
            .split(|&b| b == b'\n')
            .filter_map(decode_line)
            .collect()
    }

    /// Drain a trailing line that never got its newline. Chunked transports
    /// may end the stream without one, and the final frame is still real.
    pub fn finish(&mut self) -> Option<StreamEvent> {
        let rest = std::mem::take(&mut self.buf);
        decode_line(&rest)
    }

    /// Bytes currently held back as a partial line.
    pub fn pending_bytes(&self) -> usize {
        self.buf.len()
    }
}

/// Decode one complete line. Blank lines, non-`data: ` lines, and payloads
/// that fail to parse all yield `None`.
fn decode_line(line: &[u8]) -> Option<StreamEvent> {
    let line = std::str::from_utf8(line).ok()?;
    let line = line.strip_suffix('\r').unwrap_or(line);
    let payload = line.strip_prefix(DATA_PREFIX)?;
    match serde_json::from_str::<StreamEvent>(payload) {
        Ok(event) => Some(event),
        Err(err) => {
            // Most often a frame boundary misdetection, not real data loss.
            tracing::debug!(%err, len = payload.len(), "skipping undecodable frame");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Decode an entire byte stream in one call plus a finish.
    fn decode_whole(bytes: &[u8]) -> Vec<StreamEvent> {
        let mut decoder = EventDecoder::new();
        let mut events = decoder.push(bytes);
        events.extend(decoder.finish());
        events
    }

    /// Decode the same stream split into the given chunk sizes.
    fn decode_chunked(bytes: &[u8], sizes: &[usize]) -> Vec<StreamEvent> {
        let mut decoder = EventDecoder::new();
        let mut events = Vec::new();
        let mut rest = bytes;
        for &size in sizes {
            let take = size.min(rest.len());
            let (chunk, tail) = rest.split_at(take);
            events.extend(decoder.push(chunk));
            rest = tail;
        }
        if !rest.is_empty() {
            events.extend(decoder.push(rest));
        }
        events.extend(decoder.finish());
        events
    }

    fn authors(events: &[StreamEvent]) -> Vec<String> {
        events.iter().filter_map(|e| e.author.clone()).collect()
    }

    const STREAM: &[u8] = b"data: {\"author\":\"architecture_parser_agent\"}\n\ndata: {\"author\":\"threat_modeler_agent\",\"finishReason\":\"STOP\"}\n\ndata: {\"author\":\"report_builder_agent\"}\n";

    #[test]
    fn test_whole_stream_decodes_in_order() {
        let events = decode_whole(STREAM);
        assert_eq!(
            authors(&events),
            vec![
                "architecture_parser_agent",
                "threat_modeler_agent",
                "report_builder_agent"
            ]
        );
    }

    #[test]
    fn test_blank_lines_ignored() {
        let events = decode_whole(b"\n\ndata: {\"author\":\"x\"}\n\n\n");
        assert_eq!(authors(&events), vec!["x"]);
    }

    #[test]
    fn test_non_data_lines_ignored() {
        let events = decode_whole(b"event: ping\ndata: {\"author\":\"x\"}\nretry: 500\n");
        assert_eq!(authors(&events), vec!["x"]);
    }

    #[test]
    fn test_split_mid_frame() {
        let events = decode_chunked(STREAM, &[7]);
        assert_eq!(authors(&events).len(), 3);
    }

    #[test]
    fn test_split_inside_prefix() {
        // "dat" / "a: {...}": the prefix itself straddles the boundary.
        let events = decode_chunked(b"data: {\"author\":\"x\"}\n", &[3]);
        assert_eq!(authors(&events), vec!["x"]);
    }

    #[test]
    fn test_every_split_point_equals_whole() {
        let whole = authors(&decode_whole(STREAM));
        for split in 0..STREAM.len() {
            let parts = authors(&decode_chunked(STREAM, &[split]));
            assert_eq!(parts, whole, "split at byte {split} diverged");
        }
    }

    #[test]
    fn test_multibyte_utf8_split_across_chunks() {
        let stream = "data: {\"author\":\"modélisation\"}\n".as_bytes();
        let whole = authors(&decode_whole(stream));
        for split in 0..stream.len() {
            assert_eq!(authors(&decode_chunked(stream, &[split])), whole);
        }
    }

    #[test]
    fn test_malformed_interior_frame_skipped() {
        let stream = b"data: {\"author\":\"a\"}\ndata: {not json}\ndata: {\"author\":\"b\"}\n";
        let events = decode_whole(stream);
        assert_eq!(authors(&events), vec!["a", "b"]);
    }

    #[test]
    fn test_trailing_frame_without_newline() {
        let mut decoder = EventDecoder::new();
        let events = decoder.push(b"data: {\"author\":\"a\"}\ndata: {\"author\":\"b\"}");
        assert_eq!(authors(&events), vec!["a"]);
        assert!(decoder.pending_bytes() > 0);

        let last = decoder.finish().expect("trailing frame");
        assert_eq!(last.author.as_deref(), Some("b"));
        assert_eq!(decoder.pending_bytes(), 0);
    }

    #[test]
    fn test_finish_on_clean_stream_is_empty() {
        let mut decoder = EventDecoder::new();
        decoder.push(b"data: {\"author\":\"a\"}\n");
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn test_crlf_framing() {
        let events = decode_whole(b"data: {\"author\":\"a\"}\r\ndata: {\"author\":\"b\"}\r\n");
        assert_eq!(authors(&events), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_push() {
        let mut decoder = EventDecoder::new();
        assert!(decoder.push(b"").is_empty());
        assert!(decoder.finish().is_none());
    }

    mod chunking_property {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Arbitrary chunk sizes must never change the decoded sequence.
            #[test]
            fn arbitrary_chunking_matches_whole(sizes in proptest::collection::vec(1usize..16, 1..64)) {
                let whole = authors(&decode_whole(STREAM));
                let chunked = authors(&decode_chunked(STREAM, &sizes));
                prop_assert_eq!(chunked, whole);
            }
        }
    }
}
