//! Cursor and line bookkeeping for one layout pass.

use crate::command::{
    clamp_extent, clamp_offset, BlockInfoCommand, LayoutCommand, LineBreakCommand,
    LineInfoCommand, TextCommand,
};
use crate::font::Size2;
use crate::settings::{HorizontalAlignment, TextLayoutSettings};
use crate::stream::CommandStreamGuard;

/// Metrics of a contiguous range of commands on one line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct LineMetrics {
    width: i32,
    height: i32,
    commands: u32,
    text: u32,
}

fn measure_line(commands: &[LayoutCommand]) -> LineMetrics {
    let mut metrics = LineMetrics::default();
    for cmd in commands {
        metrics.width += cmd.advance();
        metrics.height = metrics.height.max(cmd.height());
        metrics.commands += 1;
        metrics.text += cmd.text_length();
    }
    metrics
}

#[derive(Debug, Default)]
pub(crate) struct LayoutState {
    pub(crate) position_x: i32,
    pub(crate) position_y: i32,
    pub(crate) line_width: i32,
    pub(crate) line_height: i32,
    pub(crate) line_length_in_commands: u32,
    pub(crate) line_length_in_text: u32,
    pub(crate) line_info_command_index: usize,
    /// Index of the text command holding the last breakable whitespace.
    pub(crate) line_break_command: Option<usize>,
    /// Byte offset of that whitespace within the text command.
    pub(crate) line_break_offset: Option<usize>,
    line_break_length: usize,
    pub(crate) broken_text_size_before_break: Option<Size2>,
    pub(crate) broken_text_size_after_break: Option<Size2>,
    /// Bytes of the current token already laid out on earlier lines.
    pub(crate) parser_token_offset: Option<usize>,
    pub(crate) actual_width: i32,
    pub(crate) actual_height: i32,
    pub(crate) line_count: u32,
    pub(crate) total_length: u32,
}

impl LayoutState {
    /// Write the block header and first line header.
    pub(crate) fn prime(&mut self, out: &mut CommandStreamGuard<'_>) {
        out.write(LayoutCommand::BlockInfo(BlockInfoCommand::default()));
        self.line_info_command_index = out.write(LayoutCommand::LineInfo(LineInfoCommand::default()));
    }

    /// Account for a command just written (or a token folded into one).
    pub(crate) fn advance_line_to_next_command(
        &mut self,
        width: i32,
        height: i32,
        commands: u32,
        text: usize,
    ) {
        self.position_x += width;
        self.line_width += width;
        self.line_height = self.line_height.max(height);
        self.line_length_in_commands += commands;
        self.line_length_in_text = self.line_length_in_text.saturating_add(clamp_offset(text));
    }

    /// Remember a breakable whitespace character inside the text command
    /// that will be written at `command_index`.
    pub(crate) fn set_line_break_candidate(
        &mut self,
        command_index: usize,
        offset: usize,
        length: usize,
    ) {
        self.line_break_command = Some(command_index);
        self.line_break_offset = Some(offset);
        self.line_break_length = length;
    }

    pub(crate) fn line_break_length(&self) -> usize {
        self.line_break_length
    }

    fn clear_line_break_candidate(&mut self) {
        self.line_break_command = None;
        self.line_break_offset = None;
        self.line_break_length = 0;
        self.broken_text_size_before_break = None;
        self.broken_text_size_after_break = None;
    }

    /// Patch the current line header from the running metrics and fold the
    /// line into the block totals. Returns the line height.
    fn finalize_line(&mut self, out: &mut CommandStreamGuard<'_>, settings: &TextLayoutSettings) -> i32 {
        let mut height = self.line_height;
        if height == 0 && self.line_length_in_commands > 0 {
            height = settings.font.as_ref().map_or(0, |font| font.line_spacing());
        }
        let offset = match settings.width {
            Some(width) => settings.horizontal_alignment.offset(width, self.line_width),
            None => 0,
        };
        if let Some(info) = out.line_info_mut(self.line_info_command_index) {
            *info = LineInfoCommand {
                offset,
                width: self.line_width,
                height,
                length_in_commands: self.line_length_in_commands,
                length_in_text: self.line_length_in_text,
            };
        }
        self.actual_width = self.actual_width.max(self.line_width);
        self.actual_height = self.position_y + height;
        self.line_count += 1;
        self.total_length = self.total_length.saturating_add(self.line_length_in_text);
        height
    }

    fn reset_line(&mut self) {
        self.position_x = 0;
        self.line_width = 0;
        self.line_height = 0;
        self.line_length_in_commands = 0;
        self.line_length_in_text = 0;
        self.clear_line_break_candidate();
    }

    /// Close the current line and open a new one below it.
    pub(crate) fn advance_layout_to_next_line(
        &mut self,
        out: &mut CommandStreamGuard<'_>,
        settings: &TextLayoutSettings,
    ) {
        let height = self.finalize_line(out, settings);
        self.position_y += height + settings.line_spacing;
        self.reset_line();
        self.line_info_command_index = out.write(LayoutCommand::LineInfo(LineInfoCommand::default()));
    }

    /// Write an explicit break of `length` source bytes, then rotate the line.
    pub(crate) fn advance_layout_to_next_line_with_break(
        &mut self,
        out: &mut CommandStreamGuard<'_>,
        length: usize,
        settings: &TextLayoutSettings,
    ) {
        out.write(LayoutCommand::LineBreak(LineBreakCommand {
            length: clamp_offset(length),
        }));
        self.advance_line_to_next_command(0, 0, 1, length);
        self.advance_layout_to_next_line(out, settings);
    }

    /// Break the current line at the remembered whitespace.
    ///
    /// The text command holding the whitespace is cut there, a line break and
    /// a new line header are inserted after it, and the rest of the line moves
    /// to the new line. Returns false without touching the stream when the
    /// line has no break candidate.
    pub(crate) fn replace_last_breaking_space_with_line_break(
        &mut self,
        out: &mut CommandStreamGuard<'_>,
        settings: &TextLayoutSettings,
    ) -> bool {
        let (Some(command_index), Some(offset)) = (self.line_break_command, self.line_break_offset)
        else {
            return false;
        };
        let Some(LayoutCommand::Text(text)) = out.get(command_index).copied() else {
            return false;
        };
        let break_length = self.line_break_length;
        let offset_u32 = clamp_offset(offset);
        let break_u32 = clamp_offset(break_length);
        if offset_u32.saturating_add(break_u32) > text.length {
            return false;
        }
        let before = self.broken_text_size_before_break.unwrap_or_default();
        let after = self.broken_text_size_after_break.unwrap_or_default();
        let after_start = text.source_start + offset_u32 + break_u32;
        let after_length = text.length - offset_u32 - break_u32;

        let line_break = LayoutCommand::LineBreak(LineBreakCommand { length: break_u32 });
        let break_index = if offset == 0 {
            out.set(command_index, line_break);
            command_index
        } else {
            out.set(
                command_index,
                LayoutCommand::Text(TextCommand {
                    length: offset_u32,
                    width: clamp_extent(before.width),
                    ..text
                }),
            );
            out.insert(command_index + 1, line_break);
            command_index + 1
        };

        let first_line = self.line_info_command_index + 1..break_index + 1;
        let first = measure_line(&out.commands()[first_line]);
        self.line_width = first.width;
        self.line_height = first.height;
        self.line_length_in_commands = first.commands;
        self.line_length_in_text = first.text;
        let height = self.finalize_line(out, settings);
        self.position_y += height + settings.line_spacing;

        let line_info_index = break_index + 1;
        out.insert(line_info_index, LayoutCommand::LineInfo(LineInfoCommand::default()));
        self.line_info_command_index = line_info_index;

        let mut moved_from = line_info_index + 1;
        if after_length > 0 {
            out.insert(
                moved_from,
                LayoutCommand::Text(TextCommand {
                    source_start: after_start,
                    length: after_length,
                    x: 0,
                    y: self.position_y,
                    width: clamp_extent(after.width),
                    height: text.height,
                }),
            );
            moved_from += 1;
        }

        let shift = text.x + i32::from(text.width) - after.width;
        let new_y = self.position_y;
        for cmd in &mut out.commands_mut()[moved_from..] {
            match cmd {
                LayoutCommand::Text(moved) => {
                    moved.x -= shift;
                    moved.y = new_y;
                }
                LayoutCommand::Icon(moved) => {
                    moved.x -= shift;
                    moved.y = new_y;
                }
                _ => {}
            }
        }

        let second = measure_line(&out.commands()[line_info_index + 1..]);
        self.position_x = second.width;
        self.line_width = second.width;
        self.line_height = second.height;
        self.line_length_in_commands = second.commands;
        self.line_length_in_text = second.text;
        self.clear_line_break_candidate();
        log::trace!(
            "broke line at whitespace in command {} (offset {})",
            command_index,
            offset
        );
        true
    }

    /// Close the last line and write the block header.
    pub(crate) fn finalize_layout(
        &mut self,
        out: &mut CommandStreamGuard<'_>,
        settings: &TextLayoutSettings,
    ) {
        let cut_off = self.line_count > 0
            && self.line_length_in_commands == 0
            && self.position_y >= settings.available_height();
        if cut_off {
            out.truncate(self.line_info_command_index);
        } else {
            self.finalize_line(out, settings);
        }

        if settings.width.is_none() && settings.horizontal_alignment != HorizontalAlignment::Left {
            let block_width = self.actual_width;
            for cmd in out.commands_mut() {
                if let LayoutCommand::LineInfo(info) = cmd {
                    info.offset = settings.horizontal_alignment.offset(block_width, info.width);
                }
            }
        }

        let offset = match settings.height {
            Some(height) => settings.vertical_alignment.offset(height, self.actual_height),
            None => 0,
        };
        if let Some(block) = out.block_info_mut() {
            *block = BlockInfoCommand {
                offset,
                width: self.actual_width,
                height: self.actual_height,
                line_count: self.line_count,
                length_in_text: self.total_length,
            };
        }
    }
}
