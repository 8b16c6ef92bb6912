use crate::scanner::{ScanError, WordOccurrence, WordsScanner};

/// Longer runs of identifier characters are not treated as words.
/// They are usually base64, hex dumps or other generated content.
pub const MAX_WORD_LENGTH: usize = 100;

/// Default scanner: splits text on character classes only.
///
/// A word starts at an ASCII letter or digit, or any other identifier-start
/// character except `$`, and continues over ASCII letters, digits and
/// identifier-part characters (again except `$`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleWordsScanner {
    /// A backslash between words also skips the character after it
    pub may_have_escapes: bool,
}

impl SimpleWordsScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_escapes() -> Self {
        Self {
            may_have_escapes: true,
        }
    }

    /// Lazily iterate word spans in `text[start..end]`.
    ///
    /// `start` and `end` must lie on char boundaries. Each call starts a
    /// fresh scan.
    pub fn spans<'a>(&self, text: &'a str, start: usize, end: usize) -> WordSpans<'a> {
        WordSpans {
            text,
            pos: start,
            end: end.min(text.len()),
            may_have_escapes: self.may_have_escapes,
        }
    }

    /// Report every word span to `processor(text, start, end)` until it returns `false`
    pub fn scan<F>(&self, text: &str, start: usize, end: usize, mut processor: F) -> bool
    where
        F: FnMut(&str, usize, usize) -> bool,
    {
        for (word_start, word_end) in self.spans(text, start, end) {
            if !processor(text, word_start, word_end) {
                return false;
            }
        }
        true
    }
}

impl WordsScanner for SimpleWordsScanner {
    fn name(&self) -> &'static str {
        "simple"
    }

    fn process_words(
        &self,
        text: &str,
        consumer: &mut dyn FnMut(WordOccurrence<'_>) -> bool,
    ) -> Result<(), ScanError> {
        self.scan(text, 0, text.len(), |text, start, end| {
            consumer(WordOccurrence {
                text,
                start,
                end,
                kind: None,
            })
        });
        Ok(())
    }
}

/// Iterator over `(start, end)` byte ranges of words
#[derive(Debug, Clone)]
pub struct WordSpans<'a> {
    text: &'a str,
    pos: usize,
    end: usize,
    may_have_escapes: bool,
}

impl WordSpans<'_> {
    #[inline]
    fn peek(&self) -> Option<char> {
        if self.pos >= self.end {
            return None;
        }
        self.text[self.pos..self.end].chars().next()
    }
}

impl Iterator for WordSpans<'_> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // Skip to the next word start
            loop {
                let c = self.peek()?;
                if is_word_start(c) {
                    break;
                }
                self.pos += c.len_utf8();
                if self.may_have_escapes && c == '\\' {
                    if let Some(escaped) = self.peek() {
                        self.pos += escaped.len_utf8();
                    }
                }
            }

            let start = self.pos;
            let mut len = 0usize;
            while let Some(c) = self.peek() {
                if len > 0 && !is_word_part(c) {
                    break;
                }
                self.pos += c.len_utf8();
                len += 1;
            }

            if len <= MAX_WORD_LENGTH {
                return Some((start, self.pos));
            }
        }
    }
}

#[inline]
fn is_word_start(c: char) -> bool {
    c.is_ascii_alphanumeric() || (is_identifier_start(c) && c != '$')
}

#[inline]
fn is_word_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || (is_identifier_part(c) && c != '$')
}

/// Generic identifier-start class (letters, `_`, `$`)
#[inline]
pub fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

/// Generic identifier-part class (letters, digits, `_`, `$`)
#[inline]
pub fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(scanner: SimpleWordsScanner, text: &str) -> Vec<&str> {
        scanner
            .spans(text, 0, text.len())
            .map(|(s, e)| &text[s..e])
            .collect()
    }

    #[test]
    fn test_splits_on_punctuation() {
        let text = "fn get_user(id: u32) -> User { $x }";
        assert_eq!(
            words(SimpleWordsScanner::new(), text),
            vec!["fn", "get_user", "id", "u32", "User", "x"]
        );
    }

    #[test]
    fn test_unicode_identifiers() {
        let text = "größe=Straße";
        assert_eq!(words(SimpleWordsScanner::new(), text), vec!["größe", "Straße"]);
    }

    #[test]
    fn test_word_length_bound() {
        let long = "a".repeat(150);
        assert!(words(SimpleWordsScanner::new(), &long).is_empty());

        let exact = "b".repeat(MAX_WORD_LENGTH);
        let found = words(SimpleWordsScanner::new(), &exact);
        assert_eq!(found, vec![exact.as_str()]);

        let mixed = format!("{} ok", long);
        assert_eq!(words(SimpleWordsScanner::new(), &mixed), vec!["ok"]);
    }

    #[test]
    fn test_escapes_skip_next_char() {
        let text = r"a\nb";
        assert_eq!(words(SimpleWordsScanner::new(), text), vec!["a", "nb"]);

        let text = r"\nfoo \tbar";
        assert_eq!(words(SimpleWordsScanner::with_escapes(), text), vec!["foo", "bar"]);
    }

    #[test]
    fn test_sub_range() {
        let text = "alpha beta gamma";
        let spans: Vec<_> = SimpleWordsScanner::new().spans(text, 6, 10).collect();
        assert_eq!(spans, vec![(6, 10)]);
    }

    #[test]
    fn test_iterator_is_restartable() {
        let scanner = SimpleWordsScanner::new();
        let text = "one two";
        assert_eq!(scanner.spans(text, 0, text.len()).count(), 2);
        assert_eq!(scanner.spans(text, 0, text.len()).count(), 2);
    }

    #[test]
    fn test_scan_stops_when_processor_declines() {
        let mut seen = 0;
        let completed = SimpleWordsScanner::new().scan("a b c d", 0, 7, |_, _, _| {
            seen += 1;
            seen < 2
        });
        assert!(!completed);
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_process_words_reports_unknown_kind() {
        let mut kinds = Vec::new();
        SimpleWordsScanner::new()
            .process_words("x y", &mut |occurrence| {
                kinds.push(occurrence.kind);
                true
            })
            .unwrap();
        assert_eq!(kinds, vec![None, None]);
    }
}
