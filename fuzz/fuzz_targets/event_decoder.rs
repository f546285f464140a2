// fuzz/fuzz_targets/event_decoder.rs
//! Chunk-boundary independence: splitting a byte stream at arbitrary
//! offsets must decode the same event sequence as feeding it whole, and
//! must never panic on garbage.
#![no_main]

use libfuzzer_sys::fuzz_target;
use threatflow_core::EventDecoder;

fuzz_target!(|input: (Vec<u8>, Vec<u8>)| {
    let (stream, splits) = input;

    let mut whole = EventDecoder::new();
    let mut expected: Vec<String> = whole
        .push(&stream)
        .iter()
        .map(|event| format!("{event:?}"))
        .collect();
    if let Some(event) = whole.finish() {
        expected.push(format!("{event:?}"));
    }

    let mut chunked = EventDecoder::new();
    let mut produced: Vec<String> = Vec::new();
    let mut start = 0usize;
    for split in splits {
        if start >= stream.len() {
            break;
        }
        let remaining = stream.len() - start;
        let take = (split as usize % remaining) + 1;
        produced.extend(
            chunked
                .push(&stream[start..start + take])
                .iter()
                .map(|event| format!("{event:?}")),
        );
        start += take;
    }
    if start < stream.len() {
        produced.extend(
            chunked
                .push(&stream[start..])
                .iter()
                .map(|event| format!("{event:?}")),
        );
    }
    if let Some(event) = chunked.finish() {
        produced.push(format!("{event:?}"));
    }

    assert_eq!(produced, expected);
});
