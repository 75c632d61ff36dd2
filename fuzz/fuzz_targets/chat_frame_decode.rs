//! Fuzz target for chat frame decoding
//!
//! The room channel delivers arbitrary text frames from the network; a
//! malformed frame must be droppable without taking the session down.
//!
//! # Strategy
//!
//! - Raw bytes: arbitrary input through the UTF-8 and JSON decode path
//! - Round trip: anything that decodes must re-encode to an equal frame
//!
//! # Invariants
//!
//! - Decoding NEVER panics, whatever the input
//! - decode → encode → decode is the identity

#![no_main]

use auxroom_proto::ChatFrame;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(frame) = ChatFrame::parse(raw) {
        let json = frame.to_json().expect("decoded frame must re-encode");
        let reparsed = ChatFrame::parse(&json).expect("re-encoded frame must decode");
        assert_eq!(frame, reparsed);
    }
});
