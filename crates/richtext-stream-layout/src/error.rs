use core::fmt;

/// Class of named item a registry or side table holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// Text style.
    Style,
    /// Font.
    Font,
    /// Inline icon.
    Icon,
    /// Glyph shader.
    GlyphShader,
    /// Source buffer.
    Source,
}

impl ItemKind {
    /// Human-readable name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Style => "style",
            Self::Font => "font",
            Self::Icon => "icon",
            Self::GlyphShader => "glyph shader",
            Self::Source => "source",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layout and registration error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayoutError {
    /// Settings cannot drive a layout pass.
    InvalidSettings { reason: &'static str },
    /// A registry name was empty.
    EmptyName { kind: ItemKind },
    /// A registry already holds an item under this name.
    DuplicateName { kind: ItemKind, name: String },
    /// A token referenced a name the registry does not hold.
    UnrecognizedName { kind: ItemKind, name: String },
    /// A per-pass side table ran out of 16-bit indices.
    TooManyInternedItems { kind: ItemKind, limit: usize },
    /// A color token was not `AARRGGBB` hex.
    InvalidColor { text: String },
    /// A custom command payload was not an integer.
    InvalidCustomValue { command_id: u16, text: String },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSettings { reason } => write!(f, "invalid layout settings: {}", reason),
            Self::EmptyName { kind } => write!(f, "{} name must not be empty", kind),
            Self::DuplicateName { kind, name } => {
                write!(f, "{} '{}' is already registered", kind, name)
            }
            Self::UnrecognizedName { kind, name } => {
                write!(f, "unrecognized {} '{}'", kind, name)
            }
            Self::TooManyInternedItems { kind, limit } => {
                write!(f, "too many {} entries in one layout pass (limit={})", kind, limit)
            }
            Self::InvalidColor { text } => write!(f, "invalid color '{}': expected AARRGGBB", text),
            Self::InvalidCustomValue { command_id, text } => write!(
                f,
                "invalid value '{}' for custom command {}",
                text, command_id
            ),
        }
    }
}

impl std::error::Error for LayoutError {}
