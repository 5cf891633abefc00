//! Minimal tokenizer for unformatted text.
//!
//! Splits a buffer into word runs, whitespace runs and newline tokens. It
//! knows nothing about markup; command tokens have to be pushed explicitly.

use crate::source::{SourceRef, StringSpan};
use crate::token::{is_non_breaking_space, ParserOptions, Token, TokenStream};

#[derive(Clone, Copy, PartialEq, Eq)]
enum RunClass {
    Word,
    Space,
}

/// Tokenize `source` into a [`TokenStream`] of plain text tokens.
///
/// Each non-breaking space is its own token so a wrapper can tell it apart
/// from breakable whitespace. `\r\n` yields a single newline token. When
/// `options.ignore_new_lines` is set, line terminators become ordinary
/// whitespace.
pub fn tokenize_plain_text(source: impl Into<SourceRef>, options: ParserOptions) -> TokenStream {
    let source = source.into();
    let mut stream = TokenStream::new(source.clone(), options);
    let ranges = source.with_str(|text| split_ranges(text, options.ignore_new_lines));
    for (start, len) in ranges {
        let mut token = Token::from_text_span(StringSpan::new(source.clone(), start, len));
        if options.ignore_new_lines {
            token.is_new_line = false;
        }
        stream.push(token);
    }
    log::trace!(
        "tokenized {} bytes into {} plain text tokens",
        source.len(),
        stream.len()
    );
    stream
}

fn split_ranges(text: &str, ignore_new_lines: bool) -> Vec<(usize, usize)> {
    let mut ranges = Vec::with_capacity(text.len() / 4 + 1);
    let mut run: Option<(usize, RunClass)> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        let newline = (ch == '\n' || ch == '\r') && !ignore_new_lines;
        if newline || is_non_breaking_space(ch) {
            if let Some((start, _)) = run.take() {
                ranges.push((start, idx - start));
            }
            let mut len = ch.len_utf8();
            if ch == '\r' && !ignore_new_lines && matches!(chars.peek(), Some((_, '\n'))) {
                chars.next();
                len += 1;
            }
            ranges.push((idx, len));
            continue;
        }

        let class = if ch.is_whitespace() {
            RunClass::Space
        } else {
            RunClass::Word
        };
        match run {
            Some((_, current)) if current == class => {}
            Some((start, _)) => {
                ranges.push((start, idx - start));
                run = Some((idx, class));
            }
            None => run = Some((idx, class)),
        }
    }
    if let Some((start, _)) = run {
        ranges.push((start, text.len() - start));
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SourceString, SourceStringBuilder};

    fn texts(stream: &TokenStream) -> Vec<String> {
        stream.iter().map(|t| t.text.to_string()).collect()
    }

    #[test]
    fn splits_words_spaces_and_newlines() {
        let stream = tokenize_plain_text(
            SourceString::from("Hello  world\r\nnext"),
            ParserOptions::default(),
        );
        assert_eq!(texts(&stream), ["Hello", "  ", "world", "\r\n", "next"]);
        assert!(stream[1].is_white_space);
        assert!(stream[3].is_new_line);
        assert_eq!(stream[3].source_length, 2);
    }

    #[test]
    fn non_breaking_space_is_its_own_token() {
        let stream = tokenize_plain_text(
            SourceString::from("10\u{00A0}\u{00A0}km away"),
            ParserOptions::default(),
        );
        assert_eq!(
            texts(&stream),
            ["10", "\u{00A0}", "\u{00A0}", "km", " ", "away"]
        );
        assert!(stream[1].is_non_breaking_space);
        assert!(!stream[4].is_non_breaking_space);
    }

    #[test]
    fn ignore_new_lines_folds_terminators_into_whitespace() {
        let options = ParserOptions {
            ignore_new_lines: true,
            ..ParserOptions::default()
        };
        let stream = tokenize_plain_text(SourceString::from("a \nb\nc"), options);
        assert_eq!(texts(&stream), ["a", " \n", "b", "\n", "c"]);
        assert!(stream.iter().all(|t| !t.is_new_line));
        assert_eq!(stream.parser_options(), options);
    }

    #[test]
    fn tokenizes_builder_sources() {
        let builder = SourceStringBuilder::from("x y");
        let stream = tokenize_plain_text(builder.clone(), ParserOptions::default());
        assert_eq!(stream.len(), 3);
        assert!(stream[0].text.source().is_builder());
        assert!(stream
            .source_text()
            .is_some_and(|s| s.same_buffer(&SourceRef::from(builder))));
    }

    #[test]
    fn empty_source_yields_no_tokens() {
        let stream = tokenize_plain_text(SourceString::from(""), ParserOptions::default());
        assert!(stream.is_empty());
    }
}
