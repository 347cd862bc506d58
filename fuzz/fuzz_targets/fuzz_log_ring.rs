//! Fuzz target: `RingBuffer` push / drain
//!
//! Interprets the input as a sequence of push and consume operations and
//! checks the occupancy bookkeeping after each one.
//!
//! cargo fuzz run fuzz_log_ring

#![no_main]

use libfuzzer_sys::fuzz_target;
use lightloop::logging::RingBuffer;

fuzz_target!(|data: &[u8]| {
    let mut ring = RingBuffer::<64>::new();
    let mut queued = 0usize;

    for chunk in data.chunks(8) {
        let (op, payload) = chunk.split_first().unwrap_or((&0, &[]));
        if op & 1 == 0 {
            let free = ring.free();
            let stored = ring.push_slice(payload);
            assert_eq!(stored, payload.len().min(free));
            queued += stored;
        } else {
            let want = usize::from(op >> 1);
            let run = ring.contiguous(want).len();
            assert!(run <= want);
            assert_eq!(ring.advance_tail(run), run);
            queued -= run;
        }
        assert_eq!(ring.len(), queued);
        assert!(ring.len() <= ring.capacity());
        assert_eq!(ring.is_empty(), queued == 0);
    }
});
