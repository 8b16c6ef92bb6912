//! Comment and string aware word scanner.
//!
//! Splits text into code, comment and string-literal regions using a small
//! per-language [`CommentSyntax`] table, then runs the default word scanner
//! over each region and tags the words with the region's kind. This is not a
//! parser: nested comments, raw strings and heredocs are not recognised.

use crate::index::types::Language;
use crate::scanner::simple::SimpleWordsScanner;
use crate::scanner::{OccurrenceKind, ScanError, WordOccurrence, WordsScanner};
use memchr::{memchr, memmem};

/// Comment and string delimiters of one language family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentSyntax {
    pub line_comments: &'static [&'static str],
    pub block_comment: Option<(&'static str, &'static str)>,
    /// ASCII quote characters opening a string literal
    pub quotes: &'static [u8],
    /// `'x'` and `'\n'` are char literals; any other `'` is plain code
    pub char_literals: bool,
    /// Elements whose body is another language, as `(tag, closing tag prefix)`
    pub embedded_blocks: &'static [(&'static str, &'static str)],
}

impl CommentSyntax {
    pub const C_LIKE: Self = Self {
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        quotes: b"\"'",
        char_literals: false,
        embedded_blocks: &[],
    };
    /// Like C, but `'` starts lifetimes as well as char literals
    pub const RUST: Self = Self {
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        quotes: b"\"",
        char_literals: true,
        embedded_blocks: &[],
    };
    pub const GO: Self = Self {
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        quotes: b"\"'`",
        char_literals: false,
        embedded_blocks: &[],
    };
    pub const JS: Self = Self {
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        quotes: b"\"'`",
        char_literals: false,
        embedded_blocks: &[],
    };
    pub const HASH: Self = Self {
        line_comments: &["#"],
        block_comment: None,
        quotes: b"\"'",
        char_literals: false,
        embedded_blocks: &[],
    };
    pub const PHP: Self = Self {
        line_comments: &["//", "#"],
        block_comment: Some(("/*", "*/")),
        quotes: b"\"'",
        char_literals: false,
        embedded_blocks: &[],
    };
    pub const SQL: Self = Self {
        line_comments: &["--"],
        block_comment: Some(("/*", "*/")),
        quotes: b"'\"",
        char_literals: false,
        embedded_blocks: &[],
    };
    pub const HASKELL: Self = Self {
        line_comments: &["--"],
        block_comment: Some(("{-", "-}")),
        quotes: b"\"",
        char_literals: false,
        embedded_blocks: &[],
    };
    pub const LUA: Self = Self {
        line_comments: &["--"],
        block_comment: Some(("--[[", "]]")),
        quotes: b"\"'",
        char_literals: false,
        embedded_blocks: &[],
    };
    pub const CSS: Self = Self {
        line_comments: &[],
        block_comment: Some(("/*", "*/")),
        quotes: b"\"'",
        char_literals: false,
        embedded_blocks: &[],
    };
    /// HTML and XML. Apostrophes in text content are not quotes, and
    /// `<script>` and `<style>` bodies are foreign-language regions.
    pub const MARKUP: Self = Self {
        line_comments: &[],
        block_comment: Some(("<!--", "-->")),
        quotes: b"\"",
        char_literals: false,
        embedded_blocks: &[("script", "</script"), ("style", "</style")],
    };
    pub const JSON: Self = Self {
        line_comments: &[],
        block_comment: None,
        quotes: b"\"",
        char_literals: false,
        embedded_blocks: &[],
    };
}

/// Language-aware scanner reporting code, comment and literal occurrences
#[derive(Debug, Clone, Copy)]
pub struct LexerWordsScanner {
    name: &'static str,
    syntax: CommentSyntax,
}

impl LexerWordsScanner {
    pub const fn new(name: &'static str, syntax: CommentSyntax) -> Self {
        Self { name, syntax }
    }

    pub fn syntax(&self) -> &CommentSyntax {
        &self.syntax
    }

    fn emit(
        &self,
        text: &str,
        start: usize,
        end: usize,
        kind: OccurrenceKind,
        consumer: &mut dyn FnMut(WordOccurrence<'_>) -> bool,
    ) -> bool {
        if start >= end {
            return true;
        }
        let words = if kind == OccurrenceKind::Literals {
            SimpleWordsScanner::with_escapes()
        } else {
            SimpleWordsScanner::new()
        };
        words.scan(text, start, end, |text, start, end| {
            consumer(WordOccurrence {
                text,
                start,
                end,
                kind: Some(kind),
            })
        })
    }

    /// If an embedded element opens at `pos`, the offset just past its
    /// opening tag and the prefix of its closing tag (`None` when self-closing)
    fn embedded_block_at(&self, bytes: &[u8], pos: usize) -> Option<(usize, Option<&'static str>)> {
        if bytes[pos] != b'<' {
            return None;
        }
        let &(tag, close_prefix) = self.syntax.embedded_blocks.iter().find(|(tag, _)| {
            let name_end = pos + 1 + tag.len();
            bytes
                .get(pos + 1..name_end)
                .is_some_and(|name| name.eq_ignore_ascii_case(tag.as_bytes()))
                && matches!(bytes.get(name_end), Some(b'>' | b'/' | b' ' | b'\t' | b'\n' | b'\r'))
        })?;
        let after_name = pos + 1 + tag.len();
        match memchr(b'>', &bytes[after_name..]) {
            Some(i) if i > 0 && bytes[after_name + i - 1] == b'/' => Some((after_name + i + 1, None)),
            Some(i) => Some((after_name + i + 1, Some(close_prefix))),
            None => Some((bytes.len(), None)),
        }
    }
}

impl WordsScanner for LexerWordsScanner {
    fn name(&self) -> &'static str {
        self.name
    }

    fn process_words(
        &self,
        text: &str,
        consumer: &mut dyn FnMut(WordOccurrence<'_>) -> bool,
    ) -> Result<(), ScanError> {
        let bytes = text.as_bytes();
        let len = bytes.len();
        let mut pos = 0;
        let mut code_start = 0;

        while pos < len {
            let rest = &text[pos..];

            if let Some((tag_end, close_prefix)) = self.embedded_block_at(bytes, pos) {
                if !self.emit(text, code_start, tag_end, OccurrenceKind::Code, consumer) {
                    return Ok(());
                }
                let body_end = close_prefix.map_or(tag_end, |close| find_closing_tag(bytes, tag_end, close));
                if !self.emit(text, tag_end, body_end, OccurrenceKind::ForeignLanguage, consumer) {
                    return Ok(());
                }
                pos = body_end;
                code_start = body_end;
                continue;
            }

            if let Some((open, close)) = self.syntax.block_comment {
                if rest.starts_with(open) {
                    if !self.emit(text, code_start, pos, OccurrenceKind::Code, consumer) {
                        return Ok(());
                    }
                    let body = pos + open.len();
                    let (body_end, next) = match memmem::find(&bytes[body..], close.as_bytes()) {
                        Some(i) => (body + i, body + i + close.len()),
                        None => (len, len),
                    };
                    if !self.emit(text, body, body_end, OccurrenceKind::Comments, consumer) {
                        return Ok(());
                    }
                    pos = next;
                    code_start = next;
                    continue;
                }
            }

            if let Some(prefix) = self.syntax.line_comments.iter().find(|p| rest.starts_with(**p)) {
                if !self.emit(text, code_start, pos, OccurrenceKind::Code, consumer) {
                    return Ok(());
                }
                let body = pos + prefix.len();
                let body_end = memchr(b'\n', &bytes[body..]).map_or(len, |i| body + i);
                if !self.emit(text, body, body_end, OccurrenceKind::Comments, consumer) {
                    return Ok(());
                }
                pos = body_end;
                code_start = body_end;
                continue;
            }

            let byte = bytes[pos];
            if byte == b'\'' && self.syntax.char_literals {
                if let Some(close) = char_literal_end(text, pos) {
                    if !self.emit(text, code_start, pos, OccurrenceKind::Code, consumer) {
                        return Ok(());
                    }
                    if !self.emit(text, pos + 1, close, OccurrenceKind::Literals, consumer) {
                        return Ok(());
                    }
                    pos = close + 1;
                    code_start = pos;
                    continue;
                }
            }

            if self.syntax.quotes.contains(&byte) {
                if !self.emit(text, code_start, pos, OccurrenceKind::Code, consumer) {
                    return Ok(());
                }
                let body = pos + 1;
                let body_end = find_closing_quote(bytes, body, byte);
                if !self.emit(text, body, body_end, OccurrenceKind::Literals, consumer) {
                    return Ok(());
                }
                pos = (body_end + 1).min(len);
                code_start = pos;
                continue;
            }

            pos += rest.chars().next().map_or(1, char::len_utf8);
        }

        self.emit(text, code_start, len, OccurrenceKind::Code, consumer);
        Ok(())
    }
}

/// Offset of the closing quote of a char literal opening at `pos`, or `None`
/// when the `'` starts a lifetime or label
fn char_literal_end(text: &str, pos: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let body = pos + 1;
    if *bytes.get(body)? == b'\\' {
        // '\n', '\'', '\x7f', '\u{1F600}'
        let search = bytes.get(body + 2..(body + 12).min(bytes.len()))?;
        return memchr(b'\'', search).map(|i| body + 2 + i);
    }
    let c = text.get(body..)?.chars().next()?;
    let close = body + c.len_utf8();
    (bytes.get(close) == Some(&b'\'')).then_some(close)
}

/// Offset of `close` (ASCII case-insensitive) at or after `from`, or the end of input
fn find_closing_tag(bytes: &[u8], from: usize, close: &str) -> usize {
    let mut i = from;
    while let Some(offset) = memchr(b'<', &bytes[i..]) {
        let at = i + offset;
        if bytes
            .get(at..at + close.len())
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(close.as_bytes()))
        {
            return at;
        }
        i = at + 1;
    }
    bytes.len()
}

/// Offset of the unescaped closing `quote`, or the end of input
fn find_closing_quote(bytes: &[u8], from: usize, quote: u8) -> usize {
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Lexer scanner for a language, or `None` when plain-text scanning applies
pub fn scanner_for_language(language: Language) -> Option<LexerWordsScanner> {
    let (name, syntax) = match language {
        Language::Rust => ("rust", CommentSyntax::RUST),
        Language::C => ("c", CommentSyntax::C_LIKE),
        Language::Cpp => ("cpp", CommentSyntax::C_LIKE),
        Language::Java => ("java", CommentSyntax::C_LIKE),
        Language::Kotlin => ("kotlin", CommentSyntax::C_LIKE),
        Language::Scala => ("scala", CommentSyntax::C_LIKE),
        Language::Swift => ("swift", CommentSyntax::C_LIKE),
        Language::CSharp => ("csharp", CommentSyntax::C_LIKE),
        Language::Zig => ("zig", CommentSyntax::C_LIKE),
        Language::Go => ("go", CommentSyntax::GO),
        Language::JavaScript => ("javascript", CommentSyntax::JS),
        Language::TypeScript => ("typescript", CommentSyntax::JS),
        Language::Php => ("php", CommentSyntax::PHP),
        Language::Python => ("python", CommentSyntax::HASH),
        Language::Ruby => ("ruby", CommentSyntax::HASH),
        Language::Shell => ("shell", CommentSyntax::HASH),
        Language::Yaml => ("yaml", CommentSyntax::HASH),
        Language::Toml => ("toml", CommentSyntax::HASH),
        Language::Perl => ("perl", CommentSyntax::HASH),
        Language::R => ("r", CommentSyntax::HASH),
        Language::Elixir => ("elixir", CommentSyntax::HASH),
        Language::Sql => ("sql", CommentSyntax::SQL),
        Language::Haskell => ("haskell", CommentSyntax::HASKELL),
        Language::Lua => ("lua", CommentSyntax::LUA),
        Language::Css => ("css", CommentSyntax::CSS),
        Language::Html => ("html", CommentSyntax::MARKUP),
        Language::Json => ("json", CommentSyntax::JSON),
        Language::Markdown | Language::Unknown => return None,
    };
    Some(LexerWordsScanner::new(name, syntax))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(scanner: &LexerWordsScanner, text: &str) -> Vec<(String, OccurrenceKind)> {
        let mut out = Vec::new();
        scanner
            .process_words(text, &mut |occurrence| {
                out.push((occurrence.word().to_string(), occurrence.kind.unwrap()));
                true
            })
            .unwrap();
        out
    }

    fn kind_of(words: &[(String, OccurrenceKind)], word: &str) -> Vec<OccurrenceKind> {
        words
            .iter()
            .filter(|(w, _)| w == word)
            .map(|(_, k)| *k)
            .collect()
    }

    #[test]
    fn test_c_like_regions() {
        let scanner = scanner_for_language(Language::Java).unwrap();
        let text = "class Foo { // helper note\n  String x = \"qwerty\"; /* block words */ int y; }";
        let words = classify(&scanner, text);

        assert_eq!(kind_of(&words, "Foo"), vec![OccurrenceKind::Code]);
        assert_eq!(kind_of(&words, "helper"), vec![OccurrenceKind::Comments]);
        assert_eq!(kind_of(&words, "qwerty"), vec![OccurrenceKind::Literals]);
        assert_eq!(kind_of(&words, "block"), vec![OccurrenceKind::Comments]);
        assert_eq!(kind_of(&words, "int"), vec![OccurrenceKind::Code]);
    }

    #[test]
    fn test_escaped_quote_stays_in_literal() {
        let scanner = LexerWordsScanner::new("c", CommentSyntax::C_LIKE);
        let words = classify(&scanner, r#"s = "say \"hi\" there"; done"#);
        assert_eq!(kind_of(&words, "hi"), vec![OccurrenceKind::Literals]);
        assert_eq!(kind_of(&words, "there"), vec![OccurrenceKind::Literals]);
        assert_eq!(kind_of(&words, "done"), vec![OccurrenceKind::Code]);
    }

    #[test]
    fn test_unterminated_regions_run_to_end() {
        let scanner = LexerWordsScanner::new("c", CommentSyntax::C_LIKE);
        let words = classify(&scanner, "code /* never closed");
        assert_eq!(kind_of(&words, "closed"), vec![OccurrenceKind::Comments]);

        let words = classify(&scanner, "x = \"open string");
        assert_eq!(kind_of(&words, "string"), vec![OccurrenceKind::Literals]);
    }

    #[test]
    fn test_hash_comments() {
        let scanner = scanner_for_language(Language::Python).unwrap();
        let words = classify(&scanner, "def run():  # start here\n    return 'done'\n");
        assert_eq!(kind_of(&words, "def"), vec![OccurrenceKind::Code]);
        assert_eq!(kind_of(&words, "start"), vec![OccurrenceKind::Comments]);
        assert_eq!(kind_of(&words, "return"), vec![OccurrenceKind::Code]);
        assert_eq!(kind_of(&words, "done"), vec![OccurrenceKind::Literals]);
    }

    #[test]
    fn test_rust_lifetimes_are_code() {
        let scanner = scanner_for_language(Language::Rust).unwrap();
        let words = classify(&scanner, "fn get<'a>(s: &'a str) -> &'a str { s }");
        assert_eq!(kind_of(&words, "str"), vec![OccurrenceKind::Code, OccurrenceKind::Code]);
    }

    #[test]
    fn test_rust_char_literals_do_not_open_strings() {
        let scanner = scanner_for_language(Language::Rust).unwrap();
        let text = "let q = '\"'; let esc = '\\''; let name = value; let s = \"inner\";";
        let words = classify(&scanner, text);
        assert_eq!(kind_of(&words, "name"), vec![OccurrenceKind::Code]);
        assert_eq!(kind_of(&words, "value"), vec![OccurrenceKind::Code]);
        assert_eq!(kind_of(&words, "inner"), vec![OccurrenceKind::Literals]);

        let words = classify(&scanner, "match c { 'x' => tag, 'label: loop {} }");
        assert_eq!(kind_of(&words, "x"), vec![OccurrenceKind::Literals]);
        assert_eq!(kind_of(&words, "tag"), vec![OccurrenceKind::Code]);
        assert_eq!(kind_of(&words, "label"), vec![OccurrenceKind::Code]);
    }

    #[test]
    fn test_markup_apostrophes_are_text() {
        let scanner = scanner_for_language(Language::Html).unwrap();
        let words = classify(&scanner, "<p>don't stop</p> <a href=\"target\">here</a>");
        assert_eq!(kind_of(&words, "stop"), vec![OccurrenceKind::Code]);
        assert_eq!(kind_of(&words, "here"), vec![OccurrenceKind::Code]);
        assert_eq!(kind_of(&words, "target"), vec![OccurrenceKind::Literals]);
    }

    #[test]
    fn test_markup_script_and_style_are_foreign() {
        let scanner = scanner_for_language(Language::Html).unwrap();
        let text = "<div>intro</div><SCRIPT type=\"module\">let widget = 1;</SCRIPT>\
                    <style>.banner { color: red }</style><script src=\"a.js\"/><p>outro</p>";
        let words = classify(&scanner, text);
        assert_eq!(kind_of(&words, "intro"), vec![OccurrenceKind::Code]);
        // Opening tags are scanned as code, attributes included
        assert_eq!(kind_of(&words, "module"), vec![OccurrenceKind::Code]);
        assert_eq!(kind_of(&words, "widget"), vec![OccurrenceKind::ForeignLanguage]);
        assert_eq!(kind_of(&words, "banner"), vec![OccurrenceKind::ForeignLanguage]);
        assert_eq!(kind_of(&words, "outro"), vec![OccurrenceKind::Code]);
        assert!(kind_of(&words, "script").iter().all(|k| *k == OccurrenceKind::Code));
    }

    #[test]
    fn test_consumer_can_stop() {
        let scanner = LexerWordsScanner::new("c", CommentSyntax::C_LIKE);
        let mut seen = 0;
        scanner
            .process_words("a b // c d\n e", &mut |_| {
                seen += 1;
                seen < 3
            })
            .unwrap();
        assert_eq!(seen, 3);
    }

    #[test]
    fn test_plain_text_languages_have_no_lexer() {
        assert!(scanner_for_language(Language::Markdown).is_none());
        assert!(scanner_for_language(Language::Unknown).is_none());
    }
}
