//! Rich-text layout for `richtext-stream` token streams.
//!
//! [`TextLayoutEngine`] turns a [`richtext_stream::TokenStream`] into a
//! [`CommandStream`]: positioned text and icon commands interleaved with the
//! formatting commands that apply to them, grouped into lines.

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

mod color;
mod command;
mod engine;
mod error;
mod font;
mod registry;
mod scope;
mod settings;
mod snapshot;
mod state;
mod stream;
mod style;

pub use color::Color;
pub use command::{
    BlockInfoCommand, ColorCommand, CustomCommand, FontCommand, GlyphShaderCommand, IconCommand,
    LayoutCommand, LayoutCommandType, LineBreakCommand, LineInfoCommand, SourceCommand,
    StyleCommand, TextCommand, MAX_COMMAND_EXTENT,
};
pub use engine::{LayoutSummary, TextLayoutEngine};
pub use error::{ItemKind, LayoutError};
pub use font::{FixedAdvanceFace, Font, FontFace, FontStyle, Size2};
pub use registry::Registry;
pub use settings::{HorizontalAlignment, TextLayoutOptions, TextLayoutSettings, VerticalAlignment};
pub use snapshot::{LayoutSnapshot, SnapshotError, SNAPSHOT_SCHEMA_VERSION};
pub use stream::{CommandStream, CommandStreamGuard, MAX_INTERNED_ITEMS};
pub use style::{
    GlyphShader, GlyphShaderContext, GlyphShaderRef, IconAnimation, IconInfo, TextStyle,
};
