//! Layout output: command records plus the side tables they index into.

use core::ops::{Deref, DerefMut};
use std::collections::HashMap;

use richtext_stream::{ParserOptions, SourceRef, StringSpan};

use crate::command::{BlockInfoCommand, LayoutCommand, LineInfoCommand};
use crate::error::{ItemKind, LayoutError};
use crate::font::Font;
use crate::style::{GlyphShaderRef, IconInfo, TextStyle};

/// Most entries any one side table can hold in a pass.
pub const MAX_INTERNED_ITEMS: usize = i16::MAX as usize;

fn table_index(index: i16) -> Option<usize> {
    usize::try_from(index).ok()
}

fn next_index(len: usize, kind: ItemKind) -> Result<i16, LayoutError> {
    if len >= MAX_INTERNED_ITEMS {
        return Err(LayoutError::TooManyInternedItems {
            kind,
            limit: MAX_INTERNED_ITEMS,
        });
    }
    i16::try_from(len).map_err(|_| LayoutError::TooManyInternedItems {
        kind,
        limit: MAX_INTERNED_ITEMS,
    })
}

/// Name-deduplicated side table with 16-bit indices.
#[derive(Clone, Debug)]
struct InternTable<T> {
    kind: ItemKind,
    names: Vec<String>,
    items: Vec<T>,
    by_name: HashMap<String, i16>,
}

impl<T: Clone> InternTable<T> {
    fn new(kind: ItemKind) -> Self {
        Self {
            kind,
            names: Vec::new(),
            items: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    fn intern(&mut self, name: &str, item: &T) -> Result<i16, LayoutError> {
        if let Some(&index) = self.by_name.get(name) {
            return Ok(index);
        }
        let index = next_index(self.items.len(), self.kind)?;
        self.names.push(name.to_string());
        self.items.push(item.clone());
        self.by_name.insert(name.to_string(), index);
        Ok(index)
    }

    fn get(&self, index: i16) -> Option<&T> {
        table_index(index).and_then(|i| self.items.get(i))
    }

    fn name(&self, index: i16) -> Option<&str> {
        table_index(index)
            .and_then(|i| self.names.get(i))
            .map(String::as_str)
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn clear(&mut self) {
        self.names.clear();
        self.items.clear();
        self.by_name.clear();
    }
}

/// Replayable output of a layout pass.
///
/// The stream is read through `&self`; every write goes through a
/// [`CommandStreamGuard`] obtained from [`acquire_pointers`](Self::acquire_pointers).
#[derive(Clone, Debug)]
pub struct CommandStream {
    commands: Vec<LayoutCommand>,
    source_text: Option<SourceRef>,
    parser_options: ParserOptions,
    sources: Vec<SourceRef>,
    sources_by_buffer: HashMap<usize, i16>,
    fonts: InternTable<Font>,
    icons: InternTable<IconInfo>,
    styles: InternTable<TextStyle>,
    glyph_shaders: InternTable<GlyphShaderRef>,
    acquired: bool,
}

impl Default for CommandStream {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandStream {
    /// Create an empty stream.
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            source_text: None,
            parser_options: ParserOptions::default(),
            sources: Vec::new(),
            sources_by_buffer: HashMap::new(),
            fonts: InternTable::new(ItemKind::Font),
            icons: InternTable::new(ItemKind::Icon),
            styles: InternTable::new(ItemKind::Style),
            glyph_shaders: InternTable::new(ItemKind::GlyphShader),
            acquired: false,
        }
    }

    /// Open a write batch.
    ///
    /// The returned guard releases the stream when dropped. Acquiring on a
    /// stream that is already acquired yields a guard that leaves the outer
    /// acquisition in place.
    pub fn acquire_pointers(&mut self) -> CommandStreamGuard<'_> {
        let owns = !self.acquired;
        self.acquired = true;
        CommandStreamGuard { stream: self, owns }
    }

    /// True while a write batch is open.
    pub fn has_acquired_pointers(&self) -> bool {
        self.acquired
    }

    /// Drop all commands and side tables and forget the source text.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.source_text = None;
        self.parser_options = ParserOptions::default();
        self.sources.clear();
        self.sources_by_buffer.clear();
        self.fonts.clear();
        self.icons.clear();
        self.styles.clear();
        self.glyph_shaders.clear();
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True when no commands were written.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Command at `index`.
    pub fn get(&self, index: usize) -> Option<&LayoutCommand> {
        self.commands.get(index)
    }

    /// All commands in order.
    pub fn commands(&self) -> &[LayoutCommand] {
        &self.commands
    }

    /// Iterate commands in order.
    pub fn iter(&self) -> core::slice::Iter<'_, LayoutCommand> {
        self.commands.iter()
    }

    /// Source the token stream was parsed from.
    pub fn source_text(&self) -> Option<&SourceRef> {
        self.source_text.as_ref()
    }

    /// Parser options of the token stream.
    pub fn parser_options(&self) -> ParserOptions {
        self.parser_options
    }

    /// Interned source buffer.
    pub fn source(&self, index: i16) -> Option<&SourceRef> {
        table_index(index).and_then(|i| self.sources.get(i))
    }

    /// Number of interned sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Interned font.
    pub fn font(&self, index: i16) -> Option<&Font> {
        self.fonts.get(index)
    }

    /// Registry name of an interned font.
    pub fn font_name(&self, index: i16) -> Option<&str> {
        self.fonts.name(index)
    }

    /// Number of interned fonts.
    pub fn font_count(&self) -> usize {
        self.fonts.len()
    }

    /// Interned icon.
    pub fn icon(&self, index: i16) -> Option<&IconInfo> {
        self.icons.get(index)
    }

    /// Registry name of an interned icon.
    pub fn icon_name(&self, index: i16) -> Option<&str> {
        self.icons.name(index)
    }

    /// Number of interned icons.
    pub fn icon_count(&self) -> usize {
        self.icons.len()
    }

    /// Interned style.
    pub fn style(&self, index: i16) -> Option<&TextStyle> {
        self.styles.get(index)
    }

    /// Registry name of an interned style.
    pub fn style_name(&self, index: i16) -> Option<&str> {
        self.styles.name(index)
    }

    /// Number of interned styles.
    pub fn style_count(&self) -> usize {
        self.styles.len()
    }

    /// Interned glyph shader.
    pub fn glyph_shader(&self, index: i16) -> Option<&GlyphShaderRef> {
        self.glyph_shaders.get(index)
    }

    /// Registry name of an interned glyph shader.
    pub fn glyph_shader_name(&self, index: i16) -> Option<&str> {
        self.glyph_shaders.name(index)
    }

    /// Number of interned glyph shaders.
    pub fn glyph_shader_count(&self) -> usize {
        self.glyph_shaders.len()
    }

    pub(crate) fn font_names(&self) -> &[String] {
        &self.fonts.names
    }

    pub(crate) fn icon_names(&self) -> &[String] {
        &self.icons.names
    }

    pub(crate) fn style_names(&self) -> &[String] {
        &self.styles.names
    }

    pub(crate) fn glyph_shader_names(&self) -> &[String] {
        &self.glyph_shaders.names
    }

    /// Block header, once a pass has written it.
    pub fn block_info(&self) -> Option<&BlockInfoCommand> {
        match self.commands.first() {
            Some(LayoutCommand::BlockInfo(info)) => Some(info),
            _ => None,
        }
    }

    /// Line headers with their command indices.
    pub fn line_infos(&self) -> impl Iterator<Item = (usize, &LineInfoCommand)> + '_ {
        self.commands
            .iter()
            .enumerate()
            .filter_map(|(idx, cmd)| match cmd {
                LayoutCommand::LineInfo(info) => Some((idx, info)),
                _ => None,
            })
    }

    /// Lines in the finished layout.
    pub fn line_count(&self) -> u32 {
        self.block_info().map_or(0, |info| info.line_count)
    }

    /// Width of the widest line.
    pub fn actual_width(&self) -> i32 {
        self.block_info().map_or(0, |info| info.width)
    }

    /// Height of the block including inter-line spacing.
    pub fn actual_height(&self) -> i32 {
        self.block_info().map_or(0, |info| info.height)
    }

    /// Text length across all lines.
    pub fn total_length(&self) -> u32 {
        self.block_info().map_or(0, |info| info.length_in_text)
    }

    /// Source that text commands at `index` resolve against.
    pub fn source_for_command(&self, index: usize) -> Option<&SourceRef> {
        let end = index.min(self.commands.len());
        for cmd in self.commands[..end].iter().rev() {
            match cmd {
                LayoutCommand::ChangeSourceString(change)
                | LayoutCommand::ChangeSourceStringBuilder(change) => {
                    return self.source(change.source_index)
                }
                _ => {}
            }
        }
        self.source_text.as_ref()
    }

    /// Text covered by the text command at `index`.
    pub fn resolve_text(&self, index: usize) -> Option<String> {
        let LayoutCommand::Text(text) = self.commands.get(index)? else {
            return None;
        };
        let source = self.source_for_command(index)?.clone();
        let span = StringSpan::new(source, text.source_start as usize, text.length as usize);
        Some(span.to_string())
    }
}

impl<'a> IntoIterator for &'a CommandStream {
    type Item = &'a LayoutCommand;
    type IntoIter = core::slice::Iter<'a, LayoutCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

/// Open write batch on a [`CommandStream`].
pub struct CommandStreamGuard<'a> {
    stream: &'a mut CommandStream,
    owns: bool,
}

impl CommandStreamGuard<'_> {
    /// Copy the token stream's source and parser options onto the output.
    pub fn set_source_text(&mut self, source_text: Option<SourceRef>, options: ParserOptions) {
        self.stream.source_text = source_text;
        self.stream.parser_options = options;
    }

    /// Append a command, returning its index.
    pub fn write(&mut self, command: LayoutCommand) -> usize {
        self.stream.commands.push(command);
        self.stream.commands.len() - 1
    }

    /// Overwrite the command at `index`. Returns false when out of range.
    pub fn set(&mut self, index: usize, command: LayoutCommand) -> bool {
        match self.stream.commands.get_mut(index) {
            Some(slot) => {
                *slot = command;
                true
            }
            None => false,
        }
    }

    /// Insert a command at `index`, shifting later commands back.
    pub fn insert(&mut self, index: usize, command: LayoutCommand) {
        let index = index.min(self.stream.commands.len());
        self.stream.commands.insert(index, command);
    }

    /// Drop every command from `len` on.
    pub fn truncate(&mut self, len: usize) {
        self.stream.commands.truncate(len);
    }

    /// Mutable access to the command at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut LayoutCommand> {
        self.stream.commands.get_mut(index)
    }

    /// Mutable access to a range of commands.
    pub fn commands_mut(&mut self) -> &mut [LayoutCommand] {
        &mut self.stream.commands
    }

    /// Mutable access to the line header at `index`.
    pub fn line_info_mut(&mut self, index: usize) -> Option<&mut LineInfoCommand> {
        match self.stream.commands.get_mut(index) {
            Some(LayoutCommand::LineInfo(info)) => Some(info),
            _ => None,
        }
    }

    /// Mutable access to the block header.
    pub fn block_info_mut(&mut self) -> Option<&mut BlockInfoCommand> {
        match self.stream.commands.first_mut() {
            Some(LayoutCommand::BlockInfo(info)) => Some(info),
            _ => None,
        }
    }

    /// Intern a source buffer by identity.
    pub fn register_source(&mut self, source: &SourceRef) -> Result<i16, LayoutError> {
        let key = source.buffer_key();
        if let Some(&index) = self.stream.sources_by_buffer.get(&key) {
            return Ok(index);
        }
        let index = next_index(self.stream.sources.len(), ItemKind::Source)?;
        self.stream.sources.push(source.clone());
        self.stream.sources_by_buffer.insert(key, index);
        Ok(index)
    }

    /// Intern a font by registry name.
    pub fn register_font(&mut self, name: &str, font: &Font) -> Result<i16, LayoutError> {
        self.stream.fonts.intern(name, font)
    }

    /// Intern an icon by registry name.
    pub fn register_icon(&mut self, name: &str, icon: &IconInfo) -> Result<i16, LayoutError> {
        self.stream.icons.intern(name, icon)
    }

    /// Intern a style by registry name.
    pub fn register_style(&mut self, name: &str, style: &TextStyle) -> Result<i16, LayoutError> {
        self.stream.styles.intern(name, style)
    }

    /// Intern a glyph shader by registry name.
    pub fn register_glyph_shader(
        &mut self,
        name: &str,
        shader: &GlyphShaderRef,
    ) -> Result<i16, LayoutError> {
        self.stream.glyph_shaders.intern(name, shader)
    }
}

impl Deref for CommandStreamGuard<'_> {
    type Target = CommandStream;

    fn deref(&self) -> &Self::Target {
        self.stream
    }
}

impl DerefMut for CommandStreamGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.stream
    }
}

impl Drop for CommandStreamGuard<'_> {
    fn drop(&mut self) {
        if self.owns {
            self.stream.acquired = false;
        }
    }
}
