use std::collections::HashMap;
use std::sync::Arc;

/// Integer pixel size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size2 {
    /// Width in px.
    pub width: i32,
    /// Height in px.
    pub height: i32,
}

impl Size2 {
    /// Zero size.
    pub const ZERO: Self = Self {
        width: 0,
        height: 0,
    };

    /// Create a size.
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Face selector within a [`Font`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontStyle {
    /// Upright, normal weight.
    #[default]
    Regular,
    /// Bold weight.
    Bold,
    /// Italic.
    Italic,
    /// Bold italic.
    BoldItalic,
}

impl FontStyle {
    /// Combine bold/italic flags into a face selector.
    pub fn from_flags(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (false, false) => Self::Regular,
            (true, false) => Self::Bold,
            (false, true) => Self::Italic,
            (true, true) => Self::BoldItalic,
        }
    }

    /// True for the bold faces.
    pub fn is_bold(self) -> bool {
        matches!(self, Self::Bold | Self::BoldItalic)
    }

    /// True for the italic faces.
    pub fn is_italic(self) -> bool {
        matches!(self, Self::Italic | Self::BoldItalic)
    }
}

/// Glyph measurement for one font face.
pub trait FontFace: Send + Sync {
    /// Measure a run of text, including kerning between its own glyphs.
    fn measure_string(&self, text: &str) -> Size2;

    /// Measure a single glyph.
    fn measure_glyph(&self, glyph: char) -> Size2;

    /// Kerning adjustment in px between two adjacent glyphs.
    ///
    /// Default is no kerning.
    fn kerning(&self, _first: char, _second: char) -> i32 {
        0
    }

    /// Advance of `glyph` when followed by `next`.
    ///
    /// Default is the glyph width plus [`kerning`](Self::kerning).
    fn measure_glyph_pair(&self, glyph: char, next: char) -> Size2 {
        let size = self.measure_glyph(glyph);
        Size2::new(size.width + self.kerning(glyph, next), size.height)
    }

    /// Distance between baselines of consecutive lines.
    fn line_spacing(&self) -> i32;
}

struct FontFaces {
    regular: Arc<dyn FontFace>,
    bold: Arc<dyn FontFace>,
    italic: Arc<dyn FontFace>,
    bold_italic: Arc<dyn FontFace>,
}

/// Shared handle to a font family with four faces.
///
/// Cloning is cheap. Two handles are the same font only if
/// [`ptr_eq`](Self::ptr_eq) says so.
#[derive(Clone)]
pub struct Font(Arc<FontFaces>);

impl Font {
    /// Create a font from its four faces.
    pub fn new(
        regular: Arc<dyn FontFace>,
        bold: Arc<dyn FontFace>,
        italic: Arc<dyn FontFace>,
        bold_italic: Arc<dyn FontFace>,
    ) -> Self {
        Self(Arc::new(FontFaces {
            regular,
            bold,
            italic,
            bold_italic,
        }))
    }

    /// Create a font that uses one face for every style.
    pub fn uniform(face: Arc<dyn FontFace>) -> Self {
        Self::new(face.clone(), face.clone(), face.clone(), face)
    }

    /// Face for `style`.
    pub fn face(&self, style: FontStyle) -> &dyn FontFace {
        match style {
            FontStyle::Regular => self.0.regular.as_ref(),
            FontStyle::Bold => self.0.bold.as_ref(),
            FontStyle::Italic => self.0.italic.as_ref(),
            FontStyle::BoldItalic => self.0.bold_italic.as_ref(),
        }
    }

    /// Line spacing of the regular face.
    pub fn line_spacing(&self) -> i32 {
        self.0.regular.line_spacing()
    }

    /// True when both handles refer to the same font.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl core::fmt::Debug for Font {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Font")
            .field("line_spacing", &self.line_spacing())
            .finish()
    }
}

/// Deterministic face where every glyph has a fixed advance unless overridden.
///
/// Handy as a stand-in when no rasterizer is available.
#[derive(Clone, Debug)]
pub struct FixedAdvanceFace {
    advance: i32,
    glyph_height: i32,
    line_spacing: i32,
    glyphs: HashMap<char, i32>,
    kerning: HashMap<(char, char), i32>,
}

impl FixedAdvanceFace {
    /// Face with `advance` px per glyph and `glyph_height` px tall glyphs.
    pub fn new(advance: i32, glyph_height: i32) -> Self {
        Self {
            advance,
            glyph_height,
            line_spacing: glyph_height,
            glyphs: HashMap::new(),
            kerning: HashMap::new(),
        }
    }

    /// Override the advance of one glyph.
    pub fn with_glyph(mut self, glyph: char, advance: i32) -> Self {
        self.glyphs.insert(glyph, advance);
        self
    }

    /// Add a kerning pair.
    pub fn with_kerning(mut self, first: char, second: char, adjustment: i32) -> Self {
        self.kerning.insert((first, second), adjustment);
        self
    }

    /// Override the line spacing (defaults to the glyph height).
    pub fn with_line_spacing(mut self, line_spacing: i32) -> Self {
        self.line_spacing = line_spacing;
        self
    }

    fn advance_of(&self, glyph: char) -> i32 {
        self.glyphs.get(&glyph).copied().unwrap_or(self.advance)
    }
}

impl FontFace for FixedAdvanceFace {
    fn measure_string(&self, text: &str) -> Size2 {
        let mut width = 0i32;
        let mut prev: Option<char> = None;
        for ch in text.chars() {
            if let Some(p) = prev {
                width = width.saturating_add(self.kerning(p, ch));
            }
            width = width.saturating_add(self.advance_of(ch));
            prev = Some(ch);
        }
        if prev.is_none() {
            return Size2::ZERO;
        }
        Size2::new(width, self.glyph_height)
    }

    fn measure_glyph(&self, glyph: char) -> Size2 {
        Size2::new(self.advance_of(glyph), self.glyph_height)
    }

    fn kerning(&self, first: char, second: char) -> i32 {
        self.kerning.get(&(first, second)).copied().unwrap_or(0)
    }

    fn line_spacing(&self) -> i32 {
        self.line_spacing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_face_measures_with_overrides_and_kerning() {
        let face = FixedAdvanceFace::new(10, 16)
            .with_glyph('i', 4)
            .with_kerning('A', 'V', -3);
        assert_eq!(face.measure_string("AVi"), Size2::new(10 + 10 - 3 + 4, 16));
        assert_eq!(face.measure_string(""), Size2::ZERO);
        assert_eq!(face.measure_glyph_pair('A', 'V'), Size2::new(7, 16));
        assert_eq!(face.measure_glyph_pair('V', 'A'), Size2::new(10, 16));
        assert_eq!(face.line_spacing(), 16);
    }

    #[test]
    fn font_selects_face_by_style() {
        let regular: Arc<dyn FontFace> = Arc::new(FixedAdvanceFace::new(8, 12));
        let bold: Arc<dyn FontFace> = Arc::new(FixedAdvanceFace::new(9, 12));
        let font = Font::new(regular.clone(), bold, regular.clone(), regular);
        assert_eq!(font.face(FontStyle::Regular).measure_glyph('x').width, 8);
        assert_eq!(
            font.face(FontStyle::from_flags(true, false))
                .measure_glyph('x')
                .width,
            9
        );
        assert!(font.ptr_eq(&font.clone()));
        let other = Font::uniform(Arc::new(FixedAdvanceFace::new(8, 12)));
        assert!(!font.ptr_eq(&other));
    }

    #[test]
    fn font_style_flags_round_trip() {
        for style in [
            FontStyle::Regular,
            FontStyle::Bold,
            FontStyle::Italic,
            FontStyle::BoldItalic,
        ] {
            assert_eq!(FontStyle::from_flags(style.is_bold(), style.is_italic()), style);
        }
    }
}
