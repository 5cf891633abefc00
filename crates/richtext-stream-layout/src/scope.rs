//! Per-pass formatting stacks.

use smallvec::SmallVec;

use crate::font::{Font, FontStyle};
use crate::style::TextStyle;

/// Flags saved when a style is pushed, restored when it pops.
#[derive(Clone, Copy, Debug)]
struct SavedFlags {
    bold: bool,
    italic: bool,
}

/// Font tagged with the style depth it was pushed at.
#[derive(Clone, Debug)]
struct ScopedFont {
    font: Font,
    scope: usize,
}

/// Style and font stacks of one layout pass, plus color and glyph-shader
/// nesting depth.
///
/// A font pushed while `n` styles are open belongs to scope `n`. Popping a
/// style pops every font of its scope; an explicit font pop only pops a font
/// of the current scope. Colors and glyph shaders are tracked by depth only.
#[derive(Debug, Default)]
pub(crate) struct ScopeStacks {
    pub(crate) bold: bool,
    pub(crate) italic: bool,
    styles: SmallVec<[SavedFlags; 8]>,
    fonts: SmallVec<[ScopedFont; 4]>,
    color_depth: usize,
    glyph_shader_depth: usize,
}

impl ScopeStacks {
    pub(crate) fn new(style: FontStyle) -> Self {
        Self {
            bold: style.is_bold(),
            italic: style.is_italic(),
            ..Self::default()
        }
    }

    pub(crate) fn face_style(&self) -> FontStyle {
        FontStyle::from_flags(self.bold, self.italic)
    }

    pub(crate) fn current_font(&self) -> Option<&Font> {
        self.fonts.last().map(|entry| &entry.font)
    }

    pub(crate) fn push_style(&mut self, style: &TextStyle) {
        self.styles.push(SavedFlags {
            bold: self.bold,
            italic: self.italic,
        });
        if let Some(font) = &style.font {
            self.push_font(font.clone());
        }
        if let Some(bold) = style.bold {
            self.bold = bold;
        }
        if let Some(italic) = style.italic {
            self.italic = italic;
        }
    }

    /// Returns false when no style was open.
    pub(crate) fn pop_style(&mut self) -> bool {
        let scope = self.styles.len();
        if scope == 0 {
            return false;
        }
        while self.fonts.last().is_some_and(|entry| entry.scope == scope) {
            self.fonts.pop();
        }
        let Some(saved) = self.styles.pop() else {
            return false;
        };
        self.bold = saved.bold;
        self.italic = saved.italic;
        true
    }

    pub(crate) fn push_font(&mut self, font: Font) {
        let scope = self.styles.len();
        self.fonts.push(ScopedFont { font, scope });
    }

    /// Returns false when the top font belongs to an enclosing scope or none is open.
    pub(crate) fn pop_font(&mut self) -> bool {
        let scope = self.styles.len();
        if !self.fonts.last().is_some_and(|entry| entry.scope == scope) {
            return false;
        }
        self.fonts.pop();
        true
    }

    pub(crate) fn push_color(&mut self) {
        self.color_depth += 1;
    }

    /// Returns false when no color was open.
    pub(crate) fn pop_color(&mut self) -> bool {
        pop_depth(&mut self.color_depth)
    }

    pub(crate) fn push_glyph_shader(&mut self) {
        self.glyph_shader_depth += 1;
    }

    /// Returns false when no glyph shader was open.
    pub(crate) fn pop_glyph_shader(&mut self) -> bool {
        pop_depth(&mut self.glyph_shader_depth)
    }

    pub(crate) fn style_depth(&self) -> usize {
        self.styles.len()
    }

    pub(crate) fn font_depth(&self) -> usize {
        self.fonts.len()
    }

    pub(crate) fn color_depth(&self) -> usize {
        self.color_depth
    }

    pub(crate) fn glyph_shader_depth(&self) -> usize {
        self.glyph_shader_depth
    }
}

fn pop_depth(depth: &mut usize) -> bool {
    match depth.checked_sub(1) {
        Some(next) => {
            *depth = next;
            true
        }
        None => false,
    }
}
