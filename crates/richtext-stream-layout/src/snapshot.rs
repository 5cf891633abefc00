use core::fmt;

use serde::{Deserialize, Serialize};

use crate::command::LayoutCommand;
use crate::stream::CommandStream;

/// Version tag written into every snapshot.
pub const SNAPSHOT_SCHEMA_VERSION: u8 = 1;

/// Owned, serializable copy of a command stream.
///
/// Side tables are captured by registry name; sources only by count. Every
/// field is always encoded since the binary form is not self-describing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    pub version: u8,
    pub commands: Vec<LayoutCommand>,
    #[serde(default)]
    pub fonts: Vec<String>,
    #[serde(default)]
    pub icons: Vec<String>,
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default)]
    pub glyph_shaders: Vec<String>,
    pub source_count: usize,
}

/// Snapshot encode/decode failure.
#[derive(Debug)]
pub enum SnapshotError {
    /// Binary encoding failed.
    Postcard(postcard::Error),
    /// JSON encoding failed.
    Json(serde_json::Error),
    /// Decoded snapshot has a schema this build does not read.
    UnsupportedVersion(u8),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Postcard(err) => write!(f, "snapshot binary codec failed: {}", err),
            Self::Json(err) => write!(f, "snapshot json codec failed: {}", err),
            Self::UnsupportedVersion(version) => {
                write!(f, "unsupported snapshot version {}", version)
            }
        }
    }
}

impl std::error::Error for SnapshotError {}

impl From<postcard::Error> for SnapshotError {
    fn from(value: postcard::Error) -> Self {
        Self::Postcard(value)
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl LayoutSnapshot {
    /// Compact binary encoding.
    ///
    /// Two layouts of the same input encode to identical bytes.
    pub fn to_postcard(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(postcard::to_allocvec(self)?)
    }

    /// Decode [`to_postcard`](Self::to_postcard) output.
    pub fn from_postcard(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: Self = postcard::from_bytes(bytes)?;
        snapshot.checked()
    }

    /// Pretty JSON dump.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode [`to_json`](Self::to_json) output.
    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(text)?;
        snapshot.checked()
    }

    fn checked(self) -> Result<Self, SnapshotError> {
        if self.version != SNAPSHOT_SCHEMA_VERSION {
            return Err(SnapshotError::UnsupportedVersion(self.version));
        }
        Ok(self)
    }
}

impl CommandStream {
    /// Capture the stream's commands and side-table names.
    pub fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot {
            version: SNAPSHOT_SCHEMA_VERSION,
            commands: self.commands().to_vec(),
            fonts: self.font_names().to_vec(),
            icons: self.icon_names().to_vec(),
            styles: self.style_names().to_vec(),
            glyph_shaders: self.glyph_shader_names().to_vec(),
            source_count: self.source_count(),
        }
    }
}
