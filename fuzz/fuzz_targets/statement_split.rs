//! Fuzz target for the statement splitter.
//!
//! Both modes must never panic, and every fragment must be a trimmed,
//! non-empty slice of the input.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_statement_split
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use strata_migrate::{SplitMode, split_statements};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        for mode in [SplitMode::Naive, SplitMode::Aware] {
            for fragment in split_statements(input, mode) {
                assert!(!fragment.is_empty());
                assert_eq!(fragment, fragment.trim());
                assert!(input.contains(fragment));
            }
        }
    }
});
