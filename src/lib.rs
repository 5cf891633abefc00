//! Parser-facing data model for `richtext-stream`.
//!
//! Source buffers, string spans over them, and the token stream a layout
//! pass consumes. Layout itself lives in `richtext-stream-layout`.

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

mod plain;
mod source;
mod token;

pub use plain::tokenize_plain_text;
pub use source::{SourceRef, SourceString, SourceStringBuilder, StringSpan};
pub use token::{is_non_breaking_space, ParserOptions, Token, TokenKind, TokenStream};
