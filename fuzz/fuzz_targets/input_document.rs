#![no_main]

use causeway::{reconstruct, InputDocument};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Any document that parses must reconstruct without panicking
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(input) = InputDocument::from_json(text) {
            let result = reconstruct(&input);
            let _ = result.output.to_json(false);
        }
    }
});
