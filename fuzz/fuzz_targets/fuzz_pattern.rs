#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (&str, &str)| {
    // Malformed patterns must be rejected, never panic
    let (pattern, text) = data;
    let Ok(nfa) = trigrep::regex::compile(pattern) else {
        return;
    };
    let _ = trigrep::query::compile(pattern);
    let text: String = text.chars().take(256).collect();
    let _ = trigrep::regex::find_all(&nfa, &text);
});
