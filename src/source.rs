//! Shared source buffers and spans over them.

use core::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Immutable shared source string.
#[derive(Clone)]
pub struct SourceString(Arc<str>);

impl SourceString {
    /// Create a source string from owned or borrowed text.
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self(text.into())
    }

    /// Borrow the text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the buffer holds no text.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when both handles point at the same buffer.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for SourceString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceString")
            .field("len", &self.0.len())
            .finish()
    }
}

impl From<&str> for SourceString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SourceString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Shared growable source buffer.
///
/// Text may be appended between layout passes; spans keep referring to the
/// buffer itself, not to a copy of its contents.
#[derive(Clone, Default)]
pub struct SourceStringBuilder(Arc<RwLock<String>>);

impl SourceStringBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text to the buffer.
    pub fn push_str(&self, text: &str) {
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push_str(text);
    }

    /// Remove all text from the buffer.
    pub fn clear(&self) {
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.with_str(str::len)
    }

    /// True when the buffer holds no text.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `f` against the current contents.
    pub fn with_str<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        let guard = self.0.read().unwrap_or_else(PoisonError::into_inner);
        f(guard.as_str())
    }

    /// True when both handles point at the same buffer.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for SourceStringBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceStringBuilder")
            .field("len", &self.len())
            .finish()
    }
}

impl From<&str> for SourceStringBuilder {
    fn from(value: &str) -> Self {
        Self(Arc::new(RwLock::new(value.to_string())))
    }
}

impl From<String> for SourceStringBuilder {
    fn from(value: String) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }
}

/// Handle to whichever buffer a span reads from.
#[derive(Clone, Debug)]
pub enum SourceRef {
    /// Immutable string.
    String(SourceString),
    /// Growable builder.
    Builder(SourceStringBuilder),
}

impl SourceRef {
    /// True when both refs name the same buffer.
    ///
    /// Buffers with equal contents are still distinct sources.
    pub fn same_buffer(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a.ptr_eq(b),
            (Self::Builder(a), Self::Builder(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Address of the shared buffer.
    ///
    /// Stable for as long as any handle to the buffer is alive, so it can key
    /// identity maps that also hold a handle.
    pub fn buffer_key(&self) -> usize {
        match self {
            Self::String(s) => Arc::as_ptr(&s.0) as *const u8 as usize,
            Self::Builder(b) => Arc::as_ptr(&b.0) as usize,
        }
    }

    /// True for the builder variant.
    pub fn is_builder(&self) -> bool {
        matches!(self, Self::Builder(_))
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        match self {
            Self::String(s) => s.len(),
            Self::Builder(b) => b.len(),
        }
    }

    /// True when the buffer holds no text.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `f` against the current contents.
    pub fn with_str<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        match self {
            Self::String(s) => f(s.as_str()),
            Self::Builder(b) => b.with_str(f),
        }
    }

    /// Span covering the whole buffer.
    pub fn full_span(&self) -> StringSpan {
        StringSpan::new(self.clone(), 0, self.len())
    }
}

impl From<SourceString> for SourceRef {
    fn from(value: SourceString) -> Self {
        Self::String(value)
    }
}

impl From<SourceStringBuilder> for SourceRef {
    fn from(value: SourceStringBuilder) -> Self {
        Self::Builder(value)
    }
}

/// Byte range within a source buffer.
///
/// Offsets always fall on UTF-8 character boundaries of the buffer they were
/// created against. A span whose range no longer resolves (for example after a
/// builder was cleared) reads as the empty string.
#[derive(Clone, Debug)]
pub struct StringSpan {
    source: SourceRef,
    start: usize,
    len: usize,
}

impl StringSpan {
    /// Create a span over `source`.
    pub fn new(source: SourceRef, start: usize, len: usize) -> Self {
        Self { source, start, len }
    }

    /// Buffer this span reads from.
    pub fn source(&self) -> &SourceRef {
        &self.source
    }

    /// Start offset in bytes.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for a zero-length span.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Exclusive end offset.
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// True when `other` reads from the same buffer.
    pub fn is_same_source(&self, other: &Self) -> bool {
        self.source.same_buffer(&other.source)
    }

    /// Span starting `offset` bytes into this one.
    pub fn substring(&self, offset: usize) -> Self {
        let offset = offset.min(self.len);
        Self::new(self.source.clone(), self.start + offset, self.len - offset)
    }

    /// Leading `len` bytes of this span.
    pub fn prefix(&self, len: usize) -> Self {
        Self::new(self.source.clone(), self.start, len.min(self.len))
    }

    /// Run `f` against the spanned text.
    pub fn with_str<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        let (start, end) = (self.start, self.end());
        self.source
            .with_str(|text| f(text.get(start..end).unwrap_or_default()))
    }

    /// First character, if any.
    pub fn first_char(&self) -> Option<char> {
        self.with_str(|text| text.chars().next())
    }

    /// Last character, if any.
    pub fn last_char(&self) -> Option<char> {
        self.with_str(|text| text.chars().next_back())
    }
}

impl fmt::Display for StringSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_str(|text| f.write_str(text))
    }
}
