use std::sync::Arc;

use crate::color::Color;
use crate::font::{Font, Size2};

/// Named formatting bundle pushed with a `PushStyle` token.
///
/// Unset fields inherit from the enclosing scope.
#[derive(Clone, Debug, Default)]
pub struct TextStyle {
    /// Font to switch to for the style's scope.
    pub font: Option<Font>,
    /// Force bold on or off.
    pub bold: Option<bool>,
    /// Force italic on or off.
    pub italic: Option<bool>,
    /// Text color.
    pub color: Option<Color>,
    /// Glyph shader applied while drawing.
    pub glyph_shader: Option<GlyphShaderRef>,
}

impl TextStyle {
    /// Style with only a font.
    pub fn with_font(font: Font) -> Self {
        Self {
            font: Some(font),
            ..Self::default()
        }
    }
}

/// Source of an icon's natural size.
pub trait IconAnimation: Send + Sync {
    /// Size of one animation frame.
    fn frame_size(&self) -> Size2;
}

impl IconAnimation for Size2 {
    fn frame_size(&self) -> Size2 {
        *self
    }
}

/// Registered inline icon.
#[derive(Clone)]
pub struct IconInfo {
    /// Animation drawn for the icon.
    pub animation: Arc<dyn IconAnimation>,
    /// Explicit width; falls back to the frame width.
    pub width: Option<i32>,
    /// Explicit height; falls back to the frame height.
    pub height: Option<i32>,
}

impl IconInfo {
    /// Icon at its natural size.
    pub fn new(animation: Arc<dyn IconAnimation>) -> Self {
        Self {
            animation,
            width: None,
            height: None,
        }
    }

    /// Icon scaled to an explicit size.
    pub fn with_size(animation: Arc<dyn IconAnimation>, width: i32, height: i32) -> Self {
        Self {
            animation,
            width: Some(width),
            height: Some(height),
        }
    }

    /// Layout size.
    pub fn size(&self) -> Size2 {
        let frame = self.animation.frame_size();
        Size2::new(
            self.width.unwrap_or(frame.width),
            self.height.unwrap_or(frame.height),
        )
    }
}

impl core::fmt::Debug for IconInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IconInfo")
            .field("size", &self.size())
            .finish()
    }
}

/// Per-glyph state a renderer hands to a [`GlyphShader`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphShaderContext {
    /// Glyph being drawn.
    pub glyph: char,
    /// Glyph origin x.
    pub x: i32,
    /// Glyph origin y.
    pub y: i32,
    /// Draw color.
    pub color: Color,
    /// Index of the glyph within its text run.
    pub index: usize,
}

/// Per-glyph post-processing hook applied by renderers.
pub trait GlyphShader: Send + Sync {
    /// Adjust the glyph in place.
    fn shade(&self, context: &mut GlyphShaderContext);
}

/// Shared glyph shader handle.
pub type GlyphShaderRef = Arc<dyn GlyphShader>;

impl core::fmt::Debug for dyn GlyphShader {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("GlyphShader")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Lift(i32);

    impl GlyphShader for Lift {
        fn shade(&self, context: &mut GlyphShaderContext) {
            context.y -= self.0 * context.index as i32;
        }
    }

    #[test]
    fn icon_size_prefers_explicit_dimensions() {
        let natural = IconInfo::new(Arc::new(Size2::new(24, 18)));
        assert_eq!(natural.size(), Size2::new(24, 18));

        let scaled = IconInfo::with_size(Arc::new(Size2::new(24, 18)), 12, 9);
        assert_eq!(scaled.size(), Size2::new(12, 9));

        let mut partial = IconInfo::new(Arc::new(Size2::new(24, 18)));
        partial.height = Some(30);
        assert_eq!(partial.size(), Size2::new(24, 30));
    }

    #[test]
    fn glyph_shader_mutates_context() {
        let shader: GlyphShaderRef = Arc::new(Lift(2));
        let mut ctx = GlyphShaderContext {
            glyph: 'a',
            x: 0,
            y: 10,
            color: Color::WHITE,
            index: 3,
        };
        shader.shade(&mut ctx);
        assert_eq!(ctx.y, 4);
    }
}
