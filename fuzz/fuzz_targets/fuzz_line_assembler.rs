//! Fuzz target: `LineAssembler::feed`
//!
//! Drives arbitrary bytes into the console line assembler and asserts it
//! never panics and never yields an empty, oversized or
//! terminator-containing line.
//!
//! cargo fuzz run fuzz_line_assembler

#![no_main]

use libfuzzer_sys::fuzz_target;
use lightloop::cli::{LINE_BUFFER_SIZE, LineAssembler};

fuzz_target!(|data: &[u8]| {
    let mut asm = LineAssembler::<LINE_BUFFER_SIZE>::new();

    for &b in data {
        if let Some(line) = asm.feed(b) {
            let bytes = line.bytes();
            assert!(!bytes.is_empty(), "empty line yielded");
            assert!(bytes.len() <= LINE_BUFFER_SIZE - 2, "line exceeds buffer");
            assert!(!bytes.iter().any(|&c| c == b'\r' || c == b'\n'));
        }
    }
});
