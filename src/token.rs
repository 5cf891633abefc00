//! Parser token model consumed by the layout engine.

use core::borrow::Borrow;
use core::hash::{Hash, Hasher};
use core::ops::Index;
use std::collections::HashSet;

use crate::source::{SourceRef, SourceString, StringSpan};

/// Kind of a parsed token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Run of plain text, whitespace, or a newline.
    Text,
    /// Inline icon reference; the token text names the icon.
    Icon,
    /// Flip the bold flag.
    ToggleBold,
    /// Flip the italic flag.
    ToggleItalic,
    /// Push a named font.
    PushFont,
    /// Push an `AARRGGBB` color.
    PushColor,
    /// Push a named style.
    PushStyle,
    /// Push a named glyph shader.
    PushGlyphShader,
    /// Pop the current font.
    PopFont,
    /// Pop the current color.
    PopColor,
    /// Pop the current style.
    PopStyle,
    /// Pop the current glyph shader.
    PopGlyphShader,
    /// Application-defined command; the token text is an optional integer payload.
    Custom(u16),
}

impl TokenKind {
    /// True for tokens that only change formatting state.
    pub fn is_command(self) -> bool {
        !matches!(self, Self::Text | Self::Icon)
    }
}

/// One parsed token.
#[derive(Clone, Debug)]
pub struct Token {
    /// Token kind.
    pub kind: TokenKind,
    /// Spanned text (plain text, or the command argument).
    pub text: StringSpan,
    /// Length of the token in the original markup, including any syntax.
    pub source_length: usize,
    /// True for a literal newline.
    pub is_new_line: bool,
    /// True when every character is whitespace.
    pub is_white_space: bool,
    /// True when every character is a non-breaking space.
    pub is_non_breaking_space: bool,
}

impl Token {
    /// Build a text token, deriving its whitespace/newline flags from the span.
    pub fn from_text_span(text: StringSpan) -> Self {
        let (is_new_line, is_white_space, is_non_breaking_space) = text.with_str(|s| {
            let newline = matches!(s, "\n" | "\r" | "\r\n");
            let whitespace = !s.is_empty() && s.chars().all(char::is_whitespace);
            let nbsp = !s.is_empty() && s.chars().all(is_non_breaking_space);
            (newline, whitespace, nbsp)
        });
        Self {
            kind: TokenKind::Text,
            source_length: text.len(),
            text,
            is_new_line,
            is_white_space,
            is_non_breaking_space,
        }
    }

    /// Build a command or icon token with the given argument text.
    pub fn command(kind: TokenKind, argument: StringSpan, source_length: usize) -> Self {
        Self {
            kind,
            text: argument,
            source_length,
            is_new_line: false,
            is_white_space: false,
            is_non_breaking_space: false,
        }
    }

    /// True for a plain text token that is not a newline.
    pub fn is_plain_text(&self) -> bool {
        self.kind == TokenKind::Text && !self.is_new_line
    }
}

/// Returns true for the no-break space family.
pub fn is_non_breaking_space(ch: char) -> bool {
    matches!(ch, '\u{00A0}' | '\u{2007}' | '\u{202F}')
}

/// Options the parser ran with; carried through to layout output untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ParserOptions {
    /// Command codes were treated as literal text.
    pub ignore_command_codes: bool,
    /// Newlines were treated as ordinary whitespace.
    pub ignore_new_lines: bool,
}

/// Command argument buffer keyed by its contents.
#[derive(Clone, Debug)]
struct Argument(SourceString);

impl PartialEq for Argument {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

impl Eq for Argument {}

impl Hash for Argument {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.as_str().hash(state);
    }
}

impl Borrow<str> for Argument {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}

/// Random-access token sequence plus the source it was parsed from.
#[derive(Clone, Debug)]
pub struct TokenStream {
    tokens: Vec<Token>,
    source_text: Option<SourceRef>,
    parser_options: ParserOptions,
    /// Command argument buffers, shared by tokens with equal arguments.
    arguments: HashSet<Argument>,
}

impl TokenStream {
    /// Create an empty stream over `source_text`.
    pub fn new(source_text: impl Into<SourceRef>, parser_options: ParserOptions) -> Self {
        Self {
            tokens: Vec::with_capacity(16),
            source_text: Some(source_text.into()),
            parser_options,
            arguments: HashSet::new(),
        }
    }

    /// Create an empty stream with no primary source.
    pub fn detached(parser_options: ParserOptions) -> Self {
        Self {
            tokens: Vec::new(),
            source_text: None,
            parser_options,
            arguments: HashSet::new(),
        }
    }

    /// Primary source the parser read from.
    pub fn source_text(&self) -> Option<&SourceRef> {
        self.source_text.as_ref()
    }

    /// Parser options.
    pub fn parser_options(&self) -> ParserOptions {
        self.parser_options
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True when there are no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Token at `index`.
    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Iterate tokens in order.
    pub fn iter(&self) -> core::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    /// Append a token.
    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// Append a text token spanning `start..start + len` of the primary source.
    ///
    /// Does nothing when the stream has no primary source.
    pub fn push_text(&mut self, start: usize, len: usize) {
        match self.source_text.clone() {
            Some(source) => self.push(Token::from_text_span(StringSpan::new(source, start, len))),
            None => log::warn!(
                "dropping text token {}..{}: stream has no source",
                start,
                start + len
            ),
        }
    }

    /// Append a command or icon token whose argument lives in its own buffer.
    ///
    /// Repeated arguments reuse the buffer of their first occurrence.
    pub fn push_command(&mut self, kind: TokenKind, argument: &str) {
        let buffer = match self.arguments.get(argument) {
            Some(known) => known.0.clone(),
            None => {
                let buffer = SourceString::from(argument);
                self.arguments.insert(Argument(buffer.clone()));
                buffer
            }
        };
        let span = SourceRef::from(buffer).full_span();
        let source_length = argument.len() + 2;
        self.push(Token::command(kind, span, source_length));
    }

    /// Remove all tokens, keeping the source, options and argument buffers.
    pub fn clear(&mut self) {
        self.tokens.clear();
    }
}

impl Index<usize> for TokenStream {
    type Output = Token;

    fn index(&self, index: usize) -> &Self::Output {
        &self.tokens[index]
    }
}

impl<'a> IntoIterator for &'a TokenStream {
    type Item = &'a Token;
    type IntoIter = core::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str) -> StringSpan {
        SourceRef::from(SourceString::from(text)).full_span()
    }

    #[test]
    fn text_token_flags_follow_span_contents() {
        let word = Token::from_text_span(span("word"));
        assert!(word.is_plain_text());
        assert!(!word.is_white_space);

        let space = Token::from_text_span(span("  "));
        assert!(space.is_white_space);
        assert!(!space.is_non_breaking_space);

        let nbsp = Token::from_text_span(span("\u{00A0}"));
        assert!(nbsp.is_white_space);
        assert!(nbsp.is_non_breaking_space);

        let crlf = Token::from_text_span(span("\r\n"));
        assert!(crlf.is_new_line);
        assert!(crlf.is_white_space);
        assert_eq!(crlf.source_length, 2);
        assert!(!crlf.is_plain_text());
    }

    #[test]
    fn push_text_spans_primary_source() {
        let mut stream = TokenStream::new(SourceString::from("ab cd"), ParserOptions::default());
        stream.push_text(0, 2);
        stream.push_text(2, 1);
        stream.push_command(TokenKind::PushColor, "FFFF0000");
        assert_eq!(stream.len(), 3);
        assert_eq!(stream[0].text.to_string(), "ab");
        assert!(stream[1].is_white_space);
        assert_eq!(stream[2].kind, TokenKind::PushColor);
        assert_eq!(stream[2].text.to_string(), "FFFF0000");
        let primary = stream.source_text().cloned().unwrap_or_else(|| unreachable!());
        assert!(stream[0].text.source().same_buffer(&primary));
        assert!(!stream[2].text.source().same_buffer(&primary));
    }

    #[test]
    fn repeated_command_arguments_share_a_buffer() {
        let mut stream = TokenStream::detached(ParserOptions::default());
        stream.push_command(TokenKind::PushStyle, "quote");
        stream.push_command(TokenKind::PopStyle, "");
        stream.push_command(TokenKind::PushStyle, "quote");
        stream.push_command(TokenKind::Icon, "quote");
        stream.push_command(TokenKind::PushStyle, "title");

        let quote = stream[0].text.source();
        assert!(stream[2].text.source().same_buffer(quote));
        assert!(stream[3].text.source().same_buffer(quote));
        assert!(!stream[4].text.source().same_buffer(quote));
        assert_eq!(stream[4].text.to_string(), "title");

        let kinds: Vec<bool> = stream.iter().map(|t| t.kind.is_command()).collect();
        assert_eq!(kinds, vec![true, true, true, false, true]);
    }

    #[test]
    fn detached_stream_ignores_push_text() {
        let mut stream = TokenStream::detached(ParserOptions::default());
        stream.push_text(0, 4);
        assert!(stream.is_empty());
    }
}
