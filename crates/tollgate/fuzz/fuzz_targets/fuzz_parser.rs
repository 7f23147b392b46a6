//! Fuzz target for the delimited-text loader.
//!
//! The loader must never panic on malformed input, whatever the delimiter
//! detection decides.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tollgate::{Parser, ParserConfig};

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    let _ = Parser::new().parse_bytes(data);

    let dated = Parser::with_config(ParserConfig {
        infer_dates: true,
        ..ParserConfig::default()
    });
    let _ = dated.parse_bytes(data);
});
