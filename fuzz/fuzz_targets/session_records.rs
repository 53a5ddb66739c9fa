#![no_main]

use libfuzzer_sys::fuzz_target;
use trimcase_core::SessionState;
use trimcase_core::lines::{parse_lines, render_lines};
use trimcase_core::session_log::parse_log;

// Persisted artifacts are read back after crashes and manual edits; decoding
// must reject garbage with an error, never a panic.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(state) = SessionState::decode(text) {
        assert_eq!(SessionState::decode(&state.encode()).ok(), Some(state));
    }

    if let Ok(entries) = parse_log(text) {
        let rendered: String = entries.iter().map(|e| format!("{e}\n")).collect();
        assert_eq!(parse_log(&rendered).ok(), Some(entries));
    }

    let lines = parse_lines(text);
    assert_eq!(parse_lines(&render_lines(&lines)), lines);
});
