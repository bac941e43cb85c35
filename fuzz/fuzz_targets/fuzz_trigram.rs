#![no_main]

use libfuzzer_sys::fuzz_target;
use trigrep::index::TrigramIndex;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes through binary detection, extraction, and indexing
    let _ = trigrep::utils::is_binary(data);
    let text = String::from_utf8_lossy(data);
    let _ = trigrep::utils::extract_trigrams(&text);

    let index = TrigramIndex::from_documents([("fuzz", text.as_ref())]);
    for (_, list) in index.iter() {
        assert_eq!(list, &[0]);
    }
});
