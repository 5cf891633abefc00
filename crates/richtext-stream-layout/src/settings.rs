use crate::error::LayoutError;
use crate::font::{Font, FontStyle};

/// Horizontal placement of each line within the layout width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
}

impl HorizontalAlignment {
    pub(crate) fn offset(self, available: i32, used: i32) -> i32 {
        let slack = (available - used).max(0);
        match self {
            Self::Left => 0,
            Self::Center => slack / 2,
            Self::Right => slack,
        }
    }
}

/// Vertical placement of the block within the layout height.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VerticalAlignment {
    #[default]
    Top,
    Middle,
    Bottom,
}

impl VerticalAlignment {
    pub(crate) fn offset(self, available: i32, used: i32) -> i32 {
        let slack = (available - used).max(0);
        match self {
            Self::Top => 0,
            Self::Middle => slack / 2,
            Self::Bottom => slack,
        }
    }
}

/// Layout behavior switches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextLayoutOptions {
    /// Append a hyphen when a word is split across lines.
    pub hyphenate: bool,
}

/// Settings for one layout pass.
#[derive(Clone, Debug, Default)]
pub struct TextLayoutSettings {
    /// Base font. Required.
    pub font: Option<Font>,
    /// Maximum line width; unbounded when `None`.
    pub width: Option<i32>,
    /// Maximum block height; unbounded when `None`.
    pub height: Option<i32>,
    /// Initial face; seeds the bold/italic flags.
    pub style: FontStyle,
    /// Behavior switches.
    pub options: TextLayoutOptions,
    /// Line placement.
    pub horizontal_alignment: HorizontalAlignment,
    /// Block placement.
    pub vertical_alignment: VerticalAlignment,
    /// Extra px between consecutive lines.
    pub line_spacing: i32,
    /// Registered style pushed before the first token.
    pub initial_style: Option<String>,
}

impl TextLayoutSettings {
    /// Convenience for a font and bounds with defaults elsewhere.
    pub fn new(font: Font, width: Option<i32>, height: Option<i32>) -> Self {
        Self {
            font: Some(font),
            width,
            height,
            ..Self::default()
        }
    }

    /// Enable or disable hyphenation.
    pub fn with_hyphenation(mut self, hyphenate: bool) -> Self {
        self.options.hyphenate = hyphenate;
        self
    }

    pub(crate) fn available_width(&self) -> i32 {
        self.width.unwrap_or(i32::MAX)
    }

    pub(crate) fn available_height(&self) -> i32 {
        self.height.unwrap_or(i32::MAX)
    }

    /// Base font, or why these settings cannot drive a pass.
    pub(crate) fn validated_font(&self) -> Result<&Font, LayoutError> {
        let font = self.font.as_ref().ok_or(LayoutError::InvalidSettings {
            reason: "font is required",
        })?;
        if self.width.is_some_and(|w| w < 0) {
            return Err(LayoutError::InvalidSettings {
                reason: "width must not be negative",
            });
        }
        if self.height.is_some_and(|h| h < 0) {
            return Err(LayoutError::InvalidSettings {
                reason: "height must not be negative",
            });
        }
        if self.line_spacing < 0 {
            return Err(LayoutError::InvalidSettings {
                reason: "line spacing must not be negative",
            });
        }
        Ok(font)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FixedAdvanceFace;
    use std::sync::Arc;

    #[test]
    fn missing_font_is_invalid() {
        let settings = TextLayoutSettings::default();
        assert!(matches!(
            settings.validated_font(),
            Err(LayoutError::InvalidSettings { .. })
        ));
    }

    #[test]
    fn negative_bounds_are_invalid() {
        let font = Font::uniform(Arc::new(FixedAdvanceFace::new(8, 10)));
        let settings = TextLayoutSettings::new(font, Some(-1), None);
        assert!(settings.validated_font().is_err());
    }

    #[test]
    fn alignment_offsets_split_slack() {
        assert_eq!(HorizontalAlignment::Center.offset(100, 40), 30);
        assert_eq!(HorizontalAlignment::Right.offset(100, 40), 60);
        assert_eq!(HorizontalAlignment::Right.offset(100, 140), 0);
        assert_eq!(VerticalAlignment::Middle.offset(50, 20), 15);
        assert_eq!(VerticalAlignment::Top.offset(50, 20), 0);
    }
}
