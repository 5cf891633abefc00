//! Fixed-layout command records emitted by a layout pass.

use serde::{Deserialize, Serialize};

/// Largest extent a width/height field can carry.
pub const MAX_COMMAND_EXTENT: i32 = i16::MAX as i32;

/// Header of the whole laid-out block. Always the first command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfoCommand {
    /// Vertical alignment offset of the block.
    pub offset: i32,
    /// Width of the widest line.
    pub width: i32,
    /// Total height including inter-line spacing.
    pub height: i32,
    /// Number of lines.
    pub line_count: u32,
    /// Text length across all lines.
    pub length_in_text: u32,
}

/// Header of one line. The first one is always the second command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineInfoCommand {
    /// Horizontal alignment offset of the line.
    pub offset: i32,
    /// Sum of advances on the line.
    pub width: i32,
    /// Tallest command on the line.
    pub height: i32,
    /// Commands belonging to the line, this header excluded.
    pub length_in_commands: u32,
    /// Text bytes, icons and line breaks on the line.
    pub length_in_text: u32,
}

/// Positioned run of text from the active source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextCommand {
    /// Byte offset into the active source.
    pub source_start: u32,
    /// Length in bytes.
    pub length: u32,
    /// X relative to the line origin.
    pub x: i32,
    /// Y relative to the block origin.
    pub y: i32,
    /// Measured width.
    pub width: i16,
    /// Measured height.
    pub height: i16,
}

/// Positioned inline icon.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconCommand {
    /// Index into the stream's icon table.
    pub icon_index: i16,
    /// X relative to the line origin.
    pub x: i32,
    /// Y relative to the block origin.
    pub y: i32,
    /// Layout width.
    pub width: i16,
    /// Layout height.
    pub height: i16,
}

/// Explicit break ending a line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineBreakCommand {
    /// Source bytes consumed by the break.
    pub length: u32,
}

/// Font push referencing the stream's font table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontCommand {
    pub font_index: i16,
}

/// Color push carrying a packed `0xAARRGGBB` value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorCommand {
    pub argb: u32,
}

/// Style push referencing the stream's style table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleCommand {
    pub style_index: i16,
}

/// Glyph shader push referencing the stream's shader table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlyphShaderCommand {
    pub glyph_shader_index: i16,
}

/// Source switch referencing the stream's source table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCommand {
    pub source_index: i16,
}

/// Application-defined command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCommand {
    pub id: u16,
    pub value: i32,
}

/// One record of a command stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutCommand {
    BlockInfo(BlockInfoCommand),
    LineInfo(LineInfoCommand),
    Text(TextCommand),
    Icon(IconCommand),
    LineBreak(LineBreakCommand),
    Hyphen,
    ToggleBold,
    ToggleItalic,
    PushFont(FontCommand),
    PopFont,
    PushColor(ColorCommand),
    PopColor,
    PushStyle(StyleCommand),
    PopStyle,
    PushGlyphShader(GlyphShaderCommand),
    PopGlyphShader,
    ChangeSourceString(SourceCommand),
    ChangeSourceStringBuilder(SourceCommand),
    Custom(CustomCommand),
}

/// Discriminant of a [`LayoutCommand`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayoutCommandType {
    BlockInfo,
    LineInfo,
    Text,
    Icon,
    LineBreak,
    Hyphen,
    ToggleBold,
    ToggleItalic,
    PushFont,
    PopFont,
    PushColor,
    PopColor,
    PushStyle,
    PopStyle,
    PushGlyphShader,
    PopGlyphShader,
    ChangeSourceString,
    ChangeSourceStringBuilder,
    Custom,
}

impl LayoutCommand {
    /// Discriminant of this command.
    pub fn command_type(&self) -> LayoutCommandType {
        match self {
            Self::BlockInfo(_) => LayoutCommandType::BlockInfo,
            Self::LineInfo(_) => LayoutCommandType::LineInfo,
            Self::Text(_) => LayoutCommandType::Text,
            Self::Icon(_) => LayoutCommandType::Icon,
            Self::LineBreak(_) => LayoutCommandType::LineBreak,
            Self::Hyphen => LayoutCommandType::Hyphen,
            Self::ToggleBold => LayoutCommandType::ToggleBold,
            Self::ToggleItalic => LayoutCommandType::ToggleItalic,
            Self::PushFont(_) => LayoutCommandType::PushFont,
            Self::PopFont => LayoutCommandType::PopFont,
            Self::PushColor(_) => LayoutCommandType::PushColor,
            Self::PopColor => LayoutCommandType::PopColor,
            Self::PushStyle(_) => LayoutCommandType::PushStyle,
            Self::PopStyle => LayoutCommandType::PopStyle,
            Self::PushGlyphShader(_) => LayoutCommandType::PushGlyphShader,
            Self::PopGlyphShader => LayoutCommandType::PopGlyphShader,
            Self::ChangeSourceString(_) => LayoutCommandType::ChangeSourceString,
            Self::ChangeSourceStringBuilder(_) => LayoutCommandType::ChangeSourceStringBuilder,
            Self::Custom(_) => LayoutCommandType::Custom,
        }
    }

    /// Horizontal advance contributed to the cursor.
    pub fn advance(&self) -> i32 {
        match self {
            Self::Text(text) => i32::from(text.width),
            Self::Icon(icon) => i32::from(icon.width),
            _ => 0,
        }
    }

    /// Text length contributed to the line.
    pub fn text_length(&self) -> u32 {
        match self {
            Self::Text(text) => text.length,
            Self::Icon(_) => 1,
            Self::LineBreak(brk) => brk.length,
            _ => 0,
        }
    }

    /// Height contributed to the line.
    pub fn height(&self) -> i32 {
        match self {
            Self::Text(text) => i32::from(text.height),
            Self::Icon(icon) => i32::from(icon.height),
            _ => 0,
        }
    }
}

/// Clamp a px extent into a command width/height field.
pub(crate) fn clamp_extent(value: i32) -> i16 {
    value.clamp(0, MAX_COMMAND_EXTENT) as i16
}

/// Clamp a byte offset or length into a command field.
pub(crate) fn clamp_offset(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_command_contributions() {
        let text = LayoutCommand::Text(TextCommand {
            source_start: 3,
            length: 5,
            x: 0,
            y: 0,
            width: 40,
            height: 12,
        });
        assert_eq!(text.command_type(), LayoutCommandType::Text);
        assert_eq!((text.advance(), text.height(), text.text_length()), (40, 12, 5));

        let brk = LayoutCommand::LineBreak(LineBreakCommand { length: 2 });
        assert_eq!((brk.advance(), brk.text_length()), (0, 2));

        let icon = LayoutCommand::Icon(IconCommand {
            icon_index: 0,
            x: 0,
            y: 0,
            width: 16,
            height: 20,
        });
        assert_eq!((icon.advance(), icon.height(), icon.text_length()), (16, 20, 1));
        assert_eq!(LayoutCommand::PopFont.text_length(), 0);
    }

    #[test]
    fn extents_clamp_into_i16() {
        assert_eq!(clamp_extent(-4), 0);
        assert_eq!(clamp_extent(40_000), i16::MAX);
        assert_eq!(clamp_extent(12), 12);
    }
}
