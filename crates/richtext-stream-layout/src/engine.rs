//! Token-to-command layout driver.

use richtext_stream::{SourceRef, StringSpan, Token, TokenKind, TokenStream};

use crate::color::Color;
use crate::command::{
    clamp_extent, clamp_offset, ColorCommand, CustomCommand, FontCommand, GlyphShaderCommand,
    IconCommand, LayoutCommand, SourceCommand, StyleCommand, TextCommand, MAX_COMMAND_EXTENT,
};
use crate::error::{ItemKind, LayoutError};
use crate::font::{Font, FontFace, Size2};
use crate::registry::Registry;
use crate::scope::ScopeStacks;
use crate::settings::TextLayoutSettings;
use crate::state::LayoutState;
use crate::stream::{CommandStream, CommandStreamGuard};
use crate::style::{GlyphShaderRef, IconInfo, TextStyle};

/// Totals of a finished layout pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayoutSummary {
    /// Lines written.
    pub line_count: u32,
    /// Width of the widest line.
    pub width: i32,
    /// Block height including inter-line spacing.
    pub height: i32,
    /// Text length laid out.
    pub length_in_text: u32,
    /// Layout stopped before consuming every token, for lack of room.
    pub truncated: bool,
}

/// Lays out token streams into command streams.
///
/// Holds the named styles, fonts, icons and glyph shaders tokens refer to.
/// Registries are only changed between passes; a pass borrows the engine
/// immutably.
#[derive(Debug)]
pub struct TextLayoutEngine {
    styles: Registry<TextStyle>,
    fonts: Registry<Font>,
    icons: Registry<IconInfo>,
    glyph_shaders: Registry<GlyphShaderRef>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    /// Create an engine with empty registries.
    pub fn new() -> Self {
        Self {
            styles: Registry::new(ItemKind::Style),
            fonts: Registry::new(ItemKind::Font),
            icons: Registry::new(ItemKind::Icon),
            glyph_shaders: Registry::new(ItemKind::GlyphShader),
        }
    }

    /// Register a style under a new name.
    pub fn register_style(
        &mut self,
        name: impl Into<String>,
        style: TextStyle,
    ) -> Result<(), LayoutError> {
        self.styles.register(name, style)
    }

    /// Register or overwrite a style, returning the previous definition.
    pub fn replace_style(
        &mut self,
        name: impl Into<String>,
        style: TextStyle,
    ) -> Result<Option<TextStyle>, LayoutError> {
        self.styles.replace(name, style)
    }

    /// Remove a style, returning whether it was registered.
    pub fn unregister_style(&mut self, name: &str) -> bool {
        self.styles.unregister(name)
    }

    /// Register a font under a new name.
    pub fn register_font(&mut self, name: impl Into<String>, font: Font) -> Result<(), LayoutError> {
        self.fonts.register(name, font)
    }

    /// Register or overwrite a font, returning the previous definition.
    pub fn replace_font(
        &mut self,
        name: impl Into<String>,
        font: Font,
    ) -> Result<Option<Font>, LayoutError> {
        self.fonts.replace(name, font)
    }

    /// Remove a font, returning whether it was registered.
    pub fn unregister_font(&mut self, name: &str) -> bool {
        self.fonts.unregister(name)
    }

    /// Register an icon under a new name.
    pub fn register_icon(
        &mut self,
        name: impl Into<String>,
        icon: IconInfo,
    ) -> Result<(), LayoutError> {
        self.icons.register(name, icon)
    }

    /// Register or overwrite an icon, returning the previous definition.
    pub fn replace_icon(
        &mut self,
        name: impl Into<String>,
        icon: IconInfo,
    ) -> Result<Option<IconInfo>, LayoutError> {
        self.icons.replace(name, icon)
    }

    /// Remove an icon, returning whether it was registered.
    pub fn unregister_icon(&mut self, name: &str) -> bool {
        self.icons.unregister(name)
    }

    /// Register a glyph shader under a new name.
    pub fn register_glyph_shader(
        &mut self,
        name: impl Into<String>,
        shader: GlyphShaderRef,
    ) -> Result<(), LayoutError> {
        self.glyph_shaders.register(name, shader)
    }

    /// Register or overwrite a glyph shader, returning the previous definition.
    pub fn replace_glyph_shader(
        &mut self,
        name: impl Into<String>,
        shader: GlyphShaderRef,
    ) -> Result<Option<GlyphShaderRef>, LayoutError> {
        self.glyph_shaders.replace(name, shader)
    }

    /// Remove a glyph shader, returning whether it was registered.
    pub fn unregister_glyph_shader(&mut self, name: &str) -> bool {
        self.glyph_shaders.unregister(name)
    }

    /// Registered styles.
    pub fn styles(&self) -> &Registry<TextStyle> {
        &self.styles
    }

    /// Registered fonts.
    pub fn fonts(&self) -> &Registry<Font> {
        &self.fonts
    }

    /// Registered icons.
    pub fn icons(&self) -> &Registry<IconInfo> {
        &self.icons
    }

    /// Registered glyph shaders.
    pub fn glyph_shaders(&self) -> &Registry<GlyphShaderRef> {
        &self.glyph_shaders
    }

    /// Lay out `input` into `output`.
    ///
    /// `output` is cleared first. Running out of room is not an error: the
    /// stream is finalized and [`LayoutSummary::truncated`] is set. On error
    /// the stream holds a partial, unfinalized layout and should be discarded.
    pub fn calculate_layout(
        &self,
        input: &TokenStream,
        output: &mut CommandStream,
        settings: &TextLayoutSettings,
    ) -> Result<LayoutSummary, LayoutError> {
        let font = settings.validated_font()?;
        let mut out = output.acquire_pointers();
        out.clear();
        out.set_source_text(input.source_text().cloned(), input.parser_options());

        let mut pass = LayoutPass::new(self, input, settings, font);
        pass.run(&mut out)
    }
}

/// Mutable state of one `calculate_layout` call.
struct LayoutPass<'a> {
    engine: &'a TextLayoutEngine,
    input: &'a TokenStream,
    settings: &'a TextLayoutSettings,
    base_font: &'a Font,
    state: LayoutState,
    scopes: ScopeStacks,
    current_source: Option<SourceRef>,
}

impl<'a> LayoutPass<'a> {
    fn new(
        engine: &'a TextLayoutEngine,
        input: &'a TokenStream,
        settings: &'a TextLayoutSettings,
        base_font: &'a Font,
    ) -> Self {
        Self {
            engine,
            input,
            settings,
            base_font,
            state: LayoutState::default(),
            scopes: ScopeStacks::new(settings.style),
            current_source: None,
        }
    }

    fn run(&mut self, out: &mut CommandStreamGuard<'_>) -> Result<LayoutSummary, LayoutError> {
        let settings = self.settings;
        self.state.prime(out);
        if let Some(name) = settings.initial_style.as_deref() {
            self.push_style(out, name)?;
        }

        let input = self.input;
        let available_height = settings.available_height();
        let mut index = 0usize;
        let mut processing = true;
        while index < input.len() && processing {
            if self.state.position_y >= available_height {
                break;
            }
            let token = &input[index];
            let font = self.scopes.current_font().unwrap_or(self.base_font).clone();
            let face = font.face(self.scopes.face_style());

            processing = match token.kind {
                TokenKind::Text => self.process_text(out, face, &mut index)?,
                TokenKind::Icon => self.process_icon(out, token, &mut index)?,
                _ => {
                    self.process_command(out, token)?;
                    index += 1;
                    true
                }
            };
        }

        let truncated = index < input.len();
        let open_scopes = self.scopes.style_depth()
            + self.scopes.font_depth()
            + self.scopes.color_depth()
            + self.scopes.glyph_shader_depth();
        if open_scopes > 0 && !truncated {
            log::debug!(
                "token stream left scopes open: styles={} fonts={} colors={} glyph_shaders={}",
                self.scopes.style_depth(),
                self.scopes.font_depth(),
                self.scopes.color_depth(),
                self.scopes.glyph_shader_depth()
            );
        }
        self.state.finalize_layout(out, self.settings);
        let summary = LayoutSummary {
            line_count: self.state.line_count,
            width: self.state.actual_width,
            height: self.state.actual_height,
            length_in_text: self.state.total_length,
            truncated,
        };
        log::debug!(
            "layout pass: tokens={} commands={} lines={} size={}x{} truncated={}",
            input.len(),
            out.len(),
            summary.line_count,
            summary.width,
            summary.height,
            summary.truncated
        );
        Ok(summary)
    }

    fn process_text(
        &mut self,
        out: &mut CommandStreamGuard<'_>,
        face: &dyn FontFace,
        index: &mut usize,
    ) -> Result<bool, LayoutError> {
        let input = self.input;
        let token = &input[*index];
        if token.is_new_line {
            self.state
                .advance_layout_to_next_line_with_break(out, token.source_length, self.settings);
            self.state.parser_token_offset = None;
            *index += 1;
            return Ok(true);
        }
        self.accumulate_text(out, face, index)
    }

    fn process_icon(
        &mut self,
        out: &mut CommandStreamGuard<'_>,
        token: &Token,
        index: &mut usize,
    ) -> Result<bool, LayoutError> {
        let engine = self.engine;
        let (icon, icon_index) = token.text.with_str(|name| {
            let icon = engine.icons.resolve(name)?;
            out.register_icon(name, icon).map(|index| (icon, index))
        })?;
        let size = icon.size();
        let width = i32::from(clamp_extent(size.width));
        let height = i32::from(clamp_extent(size.height));

        if self.state.position_x > 0
            && self.state.position_x.saturating_add(width) > self.settings.available_width()
        {
            self.state.advance_layout_to_next_line(out, self.settings);
        }
        if self.state.position_y.saturating_add(height) > self.settings.available_height() {
            log::trace!("icon '{}' does not fit vertically; stopping", token.text);
            return Ok(false);
        }

        out.write(LayoutCommand::Icon(IconCommand {
            icon_index,
            x: self.state.position_x,
            y: self.state.position_y,
            width: clamp_extent(width),
            height: clamp_extent(height),
        }));
        self.state.advance_line_to_next_command(width, height, 1, 1);
        *index += 1;
        Ok(true)
    }

    fn process_command(
        &mut self,
        out: &mut CommandStreamGuard<'_>,
        token: &Token,
    ) -> Result<(), LayoutError> {
        let engine = self.engine;
        match token.kind {
            TokenKind::ToggleBold => {
                self.write_marker(out, LayoutCommand::ToggleBold);
                self.scopes.bold = !self.scopes.bold;
            }
            TokenKind::ToggleItalic => {
                self.write_marker(out, LayoutCommand::ToggleItalic);
                self.scopes.italic = !self.scopes.italic;
            }
            TokenKind::PushFont => {
                let (font, font_index) = token.text.with_str(|name| {
                    let font = engine.fonts.resolve(name)?;
                    out.register_font(name, font).map(|index| (font, index))
                })?;
                self.write_marker(out, LayoutCommand::PushFont(FontCommand { font_index }));
                self.scopes.push_font(font.clone());
            }
            TokenKind::PushColor => {
                let color = token.text.with_str(Color::parse_argb_hex)?;
                self.write_marker(
                    out,
                    LayoutCommand::PushColor(ColorCommand {
                        argb: color.to_packed_argb(),
                    }),
                );
                self.scopes.push_color();
            }
            TokenKind::PushStyle => {
                token.text.with_str(|name| self.push_style(out, name))?;
            }
            TokenKind::PushGlyphShader => {
                let glyph_shader_index = token.text.with_str(|name| {
                    let shader = engine.glyph_shaders.resolve(name)?;
                    out.register_glyph_shader(name, shader)
                })?;
                self.write_marker(
                    out,
                    LayoutCommand::PushGlyphShader(GlyphShaderCommand { glyph_shader_index }),
                );
                self.scopes.push_glyph_shader();
            }
            TokenKind::PopFont => {
                self.write_marker(out, LayoutCommand::PopFont);
                if !self.scopes.pop_font() {
                    log::warn!("font pop without a font pushed in the current scope");
                }
            }
            TokenKind::PopColor => {
                self.write_marker(out, LayoutCommand::PopColor);
                if !self.scopes.pop_color() {
                    log::warn!("color pop without a matching push");
                }
            }
            TokenKind::PopStyle => {
                self.write_marker(out, LayoutCommand::PopStyle);
                if !self.scopes.pop_style() {
                    log::warn!("style pop without a matching push");
                }
            }
            TokenKind::PopGlyphShader => {
                self.write_marker(out, LayoutCommand::PopGlyphShader);
                if !self.scopes.pop_glyph_shader() {
                    log::warn!("glyph shader pop without a matching push");
                }
            }
            TokenKind::Custom(id) => {
                let value = token.text.with_str(|text| {
                    if text.is_empty() {
                        return Ok(0);
                    }
                    text.trim()
                        .parse::<i32>()
                        .map_err(|_| LayoutError::InvalidCustomValue {
                            command_id: id,
                            text: text.to_string(),
                        })
                })?;
                self.write_marker(out, LayoutCommand::Custom(CustomCommand { id, value }));
            }
            TokenKind::Text | TokenKind::Icon => {}
        }
        Ok(())
    }

    fn push_style(&mut self, out: &mut CommandStreamGuard<'_>, name: &str) -> Result<(), LayoutError> {
        let engine = self.engine;
        let style = engine.styles.resolve(name)?;
        let style_index = out.register_style(name, style)?;
        self.write_marker(out, LayoutCommand::PushStyle(StyleCommand { style_index }));
        self.scopes.push_style(style);
        Ok(())
    }

    /// Write a zero-size formatting command.
    fn write_marker(&mut self, out: &mut CommandStreamGuard<'_>, command: LayoutCommand) {
        out.write(command);
        self.state.advance_line_to_next_command(0, 0, 1, 0);
    }

    fn is_current_source(&self, span: &StringSpan) -> bool {
        self.current_source
            .as_ref()
            .is_some_and(|source| source.same_buffer(span.source()))
    }

    /// Switch the active source to the token's buffer, writing a change
    /// command unless this is the first switch and it selects the stream's
    /// own source text.
    fn emit_change_source_if_necessary(
        &mut self,
        out: &mut CommandStreamGuard<'_>,
        token: &Token,
    ) -> Result<(), LayoutError> {
        if self.is_current_source(&token.text) {
            return Ok(());
        }
        let source = token.text.source();
        let is_first_source = self.current_source.is_none();
        self.current_source = Some(source.clone());
        let is_input_source = self
            .input
            .source_text()
            .is_some_and(|input_source| input_source.same_buffer(source));
        if is_first_source && is_input_source {
            return Ok(());
        }
        let source_index = out.register_source(source)?;
        let change = SourceCommand { source_index };
        let command = if source.is_builder() {
            LayoutCommand::ChangeSourceStringBuilder(change)
        } else {
            LayoutCommand::ChangeSourceString(change)
        };
        self.write_marker(out, command);
        Ok(())
    }

    /// Fold a run of consecutive plain text tokens from one source into a
    /// single text command, wrapping when the line overflows.
    ///
    /// Returns false when nothing fits on an otherwise empty line.
    fn accumulate_text(
        &mut self,
        out: &mut CommandStreamGuard<'_>,
        face: &dyn FontFace,
        index: &mut usize,
    ) -> Result<bool, LayoutError> {
        let input = self.input;
        let settings = self.settings;
        let available_width = settings.available_width();
        let (x, y) = (self.state.position_x, self.state.position_y);
        let first = &input[*index];
        let run_source = first.text.source().clone();
        let accumulated_start = first.text.start() + self.state.parser_token_offset.unwrap_or(0);
        let mut accumulated_length = 0usize;
        let mut accumulated_count = 0usize;
        let mut width = 0i32;
        let mut height = 0i32;
        let mut line_overflow = false;
        let mut line_break_possible = false;
        let mut overflow_text: Option<StringSpan> = None;
        let mut overflow_size = Size2::ZERO;

        while *index < input.len() {
            let token = &input[*index];
            if token.kind != TokenKind::Text || token.is_new_line {
                break;
            }
            if !self.is_current_source(&token.text) {
                if accumulated_count > 0 {
                    break;
                }
                self.emit_change_source_if_necessary(out, token)?;
            }

            let text = token.text.substring(self.state.parser_token_offset.unwrap_or(0));
            let size = measure_text(face, &text, next_text_token(input, *index));

            if width.saturating_add(size.width) > MAX_COMMAND_EXTENT {
                if accumulated_count == 0 {
                    line_overflow = true;
                    overflow_text = Some(text);
                    overflow_size = size;
                }
                break;
            }
            if self.state.position_x.saturating_add(size.width) > available_width {
                line_overflow = true;
                overflow_text = Some(text);
                overflow_size = size;
                break;
            }
            if !text.is_same_source(&first.text)
                || text.start() != accumulated_start + accumulated_length
            {
                break;
            }

            if token.is_white_space
                && (self.state.line_break_command.is_none() || !token.is_non_breaking_space)
            {
                let break_length = text.last_char().map_or(1, char::len_utf8);
                line_break_possible = true;
                self.state.set_line_break_candidate(
                    out.len(),
                    accumulated_length + text.len() - break_length,
                    break_length,
                );
            }

            width += size.width;
            height = height.max(size.height);
            accumulated_length += text.len();
            accumulated_count += 1;
            self.state
                .advance_line_to_next_command(size.width, size.height, 0, text.len());
            self.state.parser_token_offset = None;
            *index += 1;
        }

        if line_break_possible {
            self.measure_broken_text(face, &run_source, accumulated_start, accumulated_length, *index);
        }

        if accumulated_length > 0 {
            out.write(LayoutCommand::Text(TextCommand {
                source_start: clamp_offset(accumulated_start),
                length: clamp_offset(accumulated_length),
                x,
                y,
                width: clamp_extent(width),
                height: clamp_extent(height),
            }));
            self.state.advance_line_to_next_command(0, 0, 1, 0);
        }

        if !line_overflow || self.state.replace_last_breaking_space_with_line_break(out, settings) {
            return Ok(true);
        }
        let Some(overflow_text) = overflow_text else {
            return Ok(true);
        };

        let overflowing = &input[*index];
        if overflowing.is_white_space && !overflowing.is_non_breaking_space {
            let break_length = overflow_text.first_char().map_or(1, char::len_utf8);
            log::trace!("forced break on overflowing whitespace at token {}", *index);
            self.state
                .advance_layout_to_next_line_with_break(out, break_length, settings);
            if overflow_text.len() > break_length {
                let offset = self.state.parser_token_offset.unwrap_or(0);
                self.state.parser_token_offset = Some(offset + break_length);
            } else {
                self.state.parser_token_offset = None;
                *index += 1;
            }
            return Ok(true);
        }

        let position_x = self.state.position_x;
        let max_width = available_width.min(position_x.saturating_add(MAX_COMMAND_EXTENT));
        let hyphenate = settings.options.hyphenate;
        let (fitted, fitted_size) = fitted_substring(
            face,
            max_width.saturating_sub(position_x),
            &overflow_text,
            overflow_size.height,
            hyphenate,
        );
        if fitted.is_empty() && self.state.line_width == 0 {
            log::trace!("nothing of token {} fits on an empty line; stopping", *index);
            return Ok(false);
        }

        if !fitted.is_empty() {
            out.write(LayoutCommand::Text(TextCommand {
                source_start: clamp_offset(fitted.start()),
                length: clamp_offset(fitted.len()),
                x: position_x,
                y: self.state.position_y,
                width: clamp_extent(fitted_size.width),
                height: clamp_extent(fitted_size.height),
            }));
            self.state
                .advance_line_to_next_command(fitted_size.width, fitted_size.height, 1, fitted.len());
            if hyphenate {
                self.write_marker(out, LayoutCommand::Hyphen);
            }
            log::trace!(
                "hard split of token {} after {} bytes",
                *index,
                fitted.len()
            );
        }
        let offset = self.state.parser_token_offset.unwrap_or(0);
        self.state.parser_token_offset = Some(offset + fitted.len());
        self.state.advance_layout_to_next_line(out, settings);
        Ok(true)
    }

    /// Measure the text on either side of the current break candidate so a
    /// later overflow can break there without remeasuring.
    fn measure_broken_text(
        &mut self,
        face: &dyn FontFace,
        source: &SourceRef,
        start: usize,
        length: usize,
        next_index: usize,
    ) {
        let Some(offset) = self.state.line_break_offset else {
            return;
        };
        let break_length = self.state.line_break_length();
        let before = if offset == 0 {
            Size2::ZERO
        } else {
            measure_text(face, &StringSpan::new(source.clone(), start, offset), None)
        };
        let after_offset = (offset + break_length).min(length);
        let after_span = StringSpan::new(source.clone(), start + after_offset, length - after_offset);
        let after = if after_span.is_empty() {
            Size2::ZERO
        } else {
            let next = next_index
                .checked_sub(1)
                .and_then(|last| next_text_token(self.input, last));
            measure_text(face, &after_span, next)
        };
        self.state.broken_text_size_before_break = Some(before);
        self.state.broken_text_size_after_break = Some(after);
    }
}

/// Next text token after `index`, skipping formatting commands but not icons.
fn next_text_token(input: &TokenStream, index: usize) -> Option<&Token> {
    input
        .iter()
        .skip(index + 1)
        .find(|token| !token.kind.is_command())
        .filter(|token| token.kind == TokenKind::Text)
}

/// Size of `text`, kerned against the first glyph of `next` when it is
/// adjacent plain text.
fn measure_text(face: &dyn FontFace, text: &StringSpan, next: Option<&Token>) -> Size2 {
    let mut size = text.with_str(|s| face.measure_string(s));
    let Some(next) = next else {
        return size;
    };
    if next.kind != TokenKind::Text || next.text.is_empty() || next.is_new_line {
        return size;
    }
    if let (Some(last), Some(first)) = (text.last_char(), next.text.first_char()) {
        size.width += face.kerning(last, first);
    }
    size
}

/// Longest prefix of `text` that fits in `available` px, never the whole
/// token. With hyphenation, room for a trailing hyphen is kept.
fn fitted_substring(
    face: &dyn FontFace,
    available: i32,
    text: &StringSpan,
    height: i32,
    hyphenate: bool,
) -> (StringSpan, Size2) {
    let (length, width) = text.with_str(|s| {
        let mut remaining = available;
        let mut width = 0i32;
        let mut length = 0usize;
        let mut glyphs = s.chars().peekable();
        while let Some(glyph) = glyphs.next() {
            let Some(&next) = glyphs.peek() else {
                break;
            };
            let needed = if hyphenate {
                face.measure_glyph_pair(glyph, '-').width + face.measure_glyph('-').width
            } else {
                face.measure_glyph(glyph).width
            };
            if remaining - needed < 0 {
                break;
            }
            let advance = face.measure_glyph_pair(glyph, next).width;
            remaining -= advance;
            width += advance;
            length += glyph.len_utf8();
        }
        (length, width)
    });
    (text.prefix(length), Size2::new(width, height))
}
