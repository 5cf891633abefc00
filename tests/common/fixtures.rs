use std::path::{Path, PathBuf};
use std::sync::Arc;

use richtext_stream::{ParserOptions, SourceString, TokenKind, TokenStream};
use richtext_stream_layout::{
    FixedAdvanceFace, Font, TextLayoutEngine, TextLayoutSettings, TextStyle,
};

pub const DISPLAY_WIDTH: i32 = 480;
pub const DISPLAY_HEIGHT: i32 = 800;

const WORDS: &[&str] = &[
    "a", "of", "the", "and", "layout", "stream", "command", "wraps", "lines", "into",
    "positioned", "glyphs", "kerning", "hyphen", "paragraph", "icons", "scroll",
    "notwithstanding", "incomprehensibilities", "\u{00A0}", "naïve", "façade",
];

/// Small xorshift so corpora are stable across runs.
pub struct CorpusRng(u64);

impl CorpusRng {
    pub fn new(seed: u64) -> Self {
        Self(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1)
    }

    pub fn below(&mut self, bound: usize) -> usize {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        (self.0 % bound as u64) as usize
    }
}

/// Plain prose: words, single and double spaces, paragraph breaks.
pub fn corpus_text(seed: u64, words: usize) -> String {
    let mut rng = CorpusRng::new(seed);
    let mut out = String::with_capacity(words * 8);
    for i in 0..words {
        if i > 0 {
            match rng.below(24) {
                0 => out.push('\n'),
                1 => out.push_str("\r\n"),
                2 => out.push_str("  "),
                _ => out.push(' '),
            }
        }
        out.push_str(WORDS[rng.below(WORDS.len())]);
    }
    out
}

/// Token stream mixing the text of [`corpus_text`] with formatting commands
/// that reference the names registered by [`standard_engine`].
pub fn marked_up_tokens(seed: u64, words: usize) -> TokenStream {
    let text = corpus_text(seed, words);
    let plain = richtext_stream::tokenize_plain_text(
        SourceString::from(text.as_str()),
        ParserOptions::default(),
    );
    let mut rng = CorpusRng::new(seed ^ 0xA5A5);
    let mut tokens = TokenStream::new(SourceString::from(text.as_str()), ParserOptions::default());
    let mut open_styles = 0usize;
    for token in plain.iter() {
        match rng.below(40) {
            0 => {
                tokens.push_command(TokenKind::PushStyle, "emphasis");
                open_styles += 1;
            }
            1 if open_styles > 0 => {
                tokens.push_command(TokenKind::PopStyle, "");
                open_styles -= 1;
            }
            2 => tokens.push_command(TokenKind::ToggleBold, ""),
            3 => tokens.push_command(TokenKind::Icon, "bullet"),
            4 => tokens.push_command(TokenKind::PushColor, "FF336699"),
            5 => tokens.push_command(TokenKind::PopColor, ""),
            6 => tokens.push_command(TokenKind::Custom(1), "3"),
            _ => {}
        }
        tokens.push(token.clone());
    }
    tokens
}

pub fn body_font() -> Font {
    let regular = Arc::new(
        FixedAdvanceFace::new(9, 16)
            .with_glyph('i', 4)
            .with_glyph('l', 4)
            .with_glyph('m', 14)
            .with_kerning('a', 'v', -1)
            .with_line_spacing(18),
    );
    let bold = Arc::new(FixedAdvanceFace::new(10, 16).with_line_spacing(18));
    Font::new(regular.clone(), bold.clone(), regular, bold)
}

/// Engine with the names [`marked_up_tokens`] refers to.
pub fn standard_engine() -> TextLayoutEngine {
    let mut engine = TextLayoutEngine::new();
    let heading = Font::uniform(Arc::new(FixedAdvanceFace::new(13, 24)));
    engine
        .register_style(
            "emphasis",
            TextStyle {
                italic: Some(true),
                ..TextStyle::with_font(heading)
            },
        )
        .unwrap_or_else(|e| panic!("register emphasis: {}", e));
    engine
        .register_icon(
            "bullet",
            richtext_stream_layout::IconInfo::new(Arc::new(richtext_stream_layout::Size2::new(
                12, 12,
            ))),
        )
        .unwrap_or_else(|e| panic!("register bullet: {}", e));
    engine
}

pub fn display_settings() -> TextLayoutSettings {
    TextLayoutSettings::new(body_font(), Some(DISPLAY_WIDTH), Some(DISPLAY_HEIGHT))
        .with_hyphenation(true)
}

/// Optional UTF-8 text samples dropped under `tests/fixtures/text`.
pub fn discover_optional_corpus() -> Vec<PathBuf> {
    let root = Path::new("tests/fixtures/text");
    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };
    let mut out: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
        })
        .collect();
    out.sort();
    out
}
