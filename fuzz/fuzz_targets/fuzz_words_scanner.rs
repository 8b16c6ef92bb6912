#![no_main]

use arbitrary::Arbitrary;
use idindex::index::{FileContent, FileIdMapper, IndexConfig};
use idindex::scanner::simple::MAX_WORD_LENGTH;
use idindex::scanner::SimpleWordsScanner;
use libfuzzer_sys::fuzz_target;
use std::path::Path;

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    text: &'a str,
    extension: u8,
    escapes: bool,
}

const EXTENSIONS: &[&str] = &["rs", "py", "js", "html", "sql", "hs", "lua", "txt", "md"];

fuzz_target!(|input: Input<'_>| {
    let scanner = if input.escapes {
        SimpleWordsScanner::with_escapes()
    } else {
        SimpleWordsScanner::new()
    };
    for (start, end) in scanner.spans(input.text, 0, input.text.len()) {
        assert!(start < end && end <= input.text.len());
        assert!(input.text[start..end].chars().count() <= MAX_WORD_LENGTH);
    }

    let ext = EXTENSIONS[input.extension as usize % EXTENSIONS.len()];
    let path = format!("fuzz.{}", ext);
    let mapper = FileIdMapper::with_config(&IndexConfig::default());
    let _ = mapper.map_file(&FileContent::new(Path::new(&path), input.text));
});
