//! Concise (indentation-sensitive) content.
//!
//! Each line's leading whitespace is accumulated; the first non-whitespace
//! byte closes dedented elements, validates the line against its parent, and
//! dispatches on the construct the line opens. Line terminators (`;`, `]`,
//! newline) close the current tag's attribute list.

use crate::chars;
use crate::error::ErrorCode;
use crate::events::{BodyMode, Handler, TagEnding};
use crate::span::{Span, ValueSpan};

use super::frames::{
    ConciseContentData, DelimitedHtmlBlockData, Delimiter, ExprData, Frame, FrameData,
    InlineScriptData, StateKind, CLOSE_BRACE_TERMINATOR, NO_TERMINATORS,
};
use super::Parser;

impl<H: Handler> Parser<'_, '_, H> {
    pub(super) fn enter_concise_root(&mut self) {
        self.push_frame(FrameData::ConciseContent(ConciseContentData {
            at_line_start: true,
            indent_start: 0,
            text_start: None,
            text_placeholders: true,
        }));
    }

    fn concise(&mut self) -> &mut ConciseContentData {
        match &mut self.top().data {
            FrameData::ConciseContent(content) => content,
            _ => unreachable!("concise hook on non-concise frame"),
        }
    }

    pub(super) fn concise_char(&mut self, code: u8) {
        if self.pending_blank_to_eol {
            if chars::is_inline_whitespace(code) {
                self.pos += 1;
            } else {
                self.error_here(
                    ErrorCode::InvalidCharacter,
                    "only whitespace may follow on this line",
                );
            }
            return;
        }
        let (at_line_start, text_active, placeholders) = {
            let content = self.concise();
            (
                content.at_line_start,
                content.text_start.is_some(),
                content.text_placeholders,
            )
        };
        if at_line_start {
            if chars::is_inline_whitespace(code) {
                self.pos += 1;
            } else {
                self.concise_line_start(code);
            }
            return;
        }
        if text_active {
            if placeholders && code == chars::DOLLAR {
                if let Some((escape, open_len)) = self.placeholder_ahead() {
                    self.flush_text(self.pos);
                    self.enter_placeholder(escape, open_len);
                    return;
                }
            }
            self.consume_text_run(false, placeholders);
            return;
        }
        // Stray mid-line content (e.g. after an inline script block): treat
        // it as text for the remainder of the line.
        let pos = self.pos;
        self.concise().text_start = Some(pos);
        self.consume_text_run(false, placeholders);
    }

    /// First non-whitespace byte of a line.
    fn concise_line_start(&mut self, code: u8) {
        let indent = {
            let pos = self.pos;
            let content = self.concise();
            content.at_line_start = false;
            Span::new(content.indent_start, pos)
        };
        self.line_indent = indent;

        let closed_any = self.close_tags_to_indent(indent.len(), self.pos);
        let parent = self
            .tags
            .last()
            .map(|tag| (tag.ending, tag.body_mode, tag.nested_indent));
        if let Some((ending, body_mode, nested_indent)) = parent {
            if ending != TagEnding::Tag {
                self.error_here(ErrorCode::InvalidBody, "tag does not allow nested content");
                return;
            }
            let raw_body = body_mode != BodyMode::Html;
            if raw_body && code != chars::HYPHEN {
                self.error_here(
                    ErrorCode::IllegalLineStart,
                    "lines in a text body must start with `-`",
                );
                return;
            }
            match nested_indent {
                None => {
                    if let Some(parent) = self.tags.last_mut() {
                        parent.nested_indent = Some(indent);
                    }
                }
                Some(expected) => {
                    let matches = self.data[expected.start..expected.end]
                        == self.data[indent.start..indent.end];
                    if !matches {
                        self.error_here(
                            ErrorCode::BadIndentation,
                            "line does not match the block's established indentation",
                        );
                        return;
                    }
                }
            }
            if raw_body {
                // `- content`: one marker, one optional separator space.
                self.pos += 1;
                if self.at(self.pos) == Some(chars::SPACE) {
                    self.pos += 1;
                }
                let pos = self.pos;
                let content = self.concise();
                content.text_start = Some(pos);
                content.text_placeholders = body_mode == BodyMode::ParsedText;
                return;
            }
        } else if closed_any && !indent.is_empty() {
            self.error_here(
                ErrorCode::BadIndentation,
                "line is indented below the root level",
            );
            return;
        }

        match code {
            chars::OPEN_ANGLE => self.enter_html_content(true, None),
            chars::DOLLAR if self.peek(1).is_some_and(chars::is_whitespace) => {
                self.enter_inline_script();
            }
            chars::DOLLAR if self.placeholder_ahead().is_some() => {
                // A line may open directly with a placeholder; the rest of
                // the line resumes as text.
                let (escape, open_len) = self.placeholder_ahead().unwrap_or((true, 2));
                self.enter_placeholder(escape, open_len);
            }
            chars::HYPHEN if self.peek(1) == Some(chars::HYPHEN) => {
                self.push_frame(FrameData::DelimitedHtmlBlock(DelimitedHtmlBlockData {
                    dashes: 0,
                    single_line: false,
                }));
            }
            chars::HYPHEN => {
                self.error_here(
                    ErrorCode::IllegalLineStart,
                    "a line cannot start with a single `-`",
                );
            }
            chars::FORWARD_SLASH if self.peek(1) == Some(chars::FORWARD_SLASH) => {
                self.push_frame(FrameData::LineComment);
                self.pos += 2;
            }
            chars::FORWARD_SLASH if self.peek(1) == Some(chars::ASTERISK) => {
                self.push_frame(FrameData::BlockComment);
                self.pos += 2;
            }
            _ => {
                self.enter_open_tag(true);
                self.enter_tag_name();
            }
        }
    }

    pub(super) fn concise_eol(&mut self, len: usize) {
        self.flush_text(self.pos);
        self.pending_blank_to_eol = false;
        self.pos += len;
        let pos = self.pos;
        let content = self.concise();
        content.at_line_start = true;
        content.indent_start = pos;
        content.text_placeholders = true;
    }

    pub(super) fn concise_eof(&mut self) {
        self.flush_text(self.pos);
        self.close_remaining_tags(self.pos);
        self.exit_state();
    }

    pub(super) fn concise_return(&mut self, child: Frame) {
        match child.data {
            FrameData::OpenTag(_) => {
                if self.pending_line_text {
                    self.pending_line_text = false;
                    let pos = self.pos;
                    let content = self.concise();
                    content.text_start = Some(pos);
                    content.text_placeholders = true;
                }
            }
            FrameData::Placeholder(_) => {
                // Resume the line's text run after the placeholder.
                let pos = self.pos;
                self.concise().text_start = Some(pos);
            }
            FrameData::LineComment => {
                let comment = ValueSpan::new(
                    Span::new(child.start, child.end),
                    Span::new(child.start + 2, child.end),
                );
                self.emit_comment(&comment);
            }
            FrameData::BlockComment => {
                let comment = ValueSpan::new(
                    Span::new(child.start, child.end),
                    Span::new(child.start + 2, child.end.saturating_sub(2)),
                );
                self.emit_comment(&comment);
                self.pending_blank_to_eol = true;
            }
            FrameData::DelimitedHtmlBlock(block) => {
                if block.single_line {
                    let pos = self.pos;
                    let content = self.concise();
                    content.text_start = Some(pos);
                    content.text_placeholders = true;
                } else if self.pos < self.max_pos {
                    let delimiter = Delimiter {
                        indent: self.line_indent,
                        dashes: block.dashes,
                    };
                    self.enter_html_content(true, Some(delimiter));
                }
                // A block opened at end of input is empty.
            }
            FrameData::HtmlContent(content) => {
                if content.delimiter.is_some() {
                    // The closing delimiter line was consumed up to its
                    // trailing whitespace.
                    self.pending_blank_to_eol = true;
                }
            }
            _ => {}
        }
    }

    // ---- delimited HTML blocks ----

    /// Entered at the first of two-or-more dashes; decides between the
    /// single-line text form and the delimited block form.
    pub(super) fn delimited_block_char(&mut self, code: u8) {
        debug_assert_eq!(code, chars::HYPHEN);
        let mut dashes = 0;
        while self.at(self.pos) == Some(chars::HYPHEN) {
            self.pos += 1;
            dashes += 1;
        }
        let single_line = match self.at(self.pos) {
            None | Some(chars::NEWLINE) => false,
            Some(chars::CARRIAGE_RETURN) if self.peek(1) == Some(chars::NEWLINE) => false,
            _ => true,
        };
        if single_line {
            self.consume_inline_whitespace();
        }
        if let FrameData::DelimitedHtmlBlock(block) = &mut self.top().data {
            block.dashes = dashes;
            block.single_line = single_line;
        }
        self.exit_state();
    }

    // ---- inline scripts ----

    /// `$ statement` / `$ { block }` at line start. Consumes the `$` and the
    /// separating whitespace; the next dispatch decides the form.
    pub(super) fn enter_inline_script(&mut self) {
        self.push_frame(FrameData::InlineScript(InlineScriptData { block: false }));
        self.pos += 1;
        self.consume_inline_whitespace();
    }

    pub(super) fn inline_script_char(&mut self, code: u8) {
        if code == chars::OPEN_BRACE {
            if let FrameData::InlineScript(script) = &mut self.top().data {
                script.block = true;
            }
            self.pos += 1;
            self.enter_expression(ExprData {
                group_stack: Vec::new(),
                terminators: CLOSE_BRACE_TERMINATOR,
                terminated_by_whitespace: false,
                terminated_by_eol: false,
                skip_operators: false,
                concise: true,
            });
        } else {
            self.enter_expression(ExprData {
                group_stack: Vec::new(),
                terminators: NO_TERMINATORS,
                terminated_by_whitespace: false,
                terminated_by_eol: true,
                skip_operators: false,
                concise: true,
            });
        }
    }

    pub(super) fn inline_script_return(&mut self, child: Frame) {
        debug_assert_eq!(child.kind, StateKind::Expr);
        let (start, block) = {
            let frame = self.top();
            let block = match &frame.data {
                FrameData::InlineScript(script) => script.block,
                _ => false,
            };
            (frame.start, block)
        };
        if block {
            debug_assert_eq!(self.at(self.pos), Some(chars::CLOSE_BRACE));
            if self.at(self.pos) == Some(chars::CLOSE_BRACE) {
                self.pos += 1;
            }
        }
        let scriptlet = crate::events::Scriptlet {
            span: Span::new(start, self.pos),
            value: Span::new(child.start, child.end),
            tag: false,
            block,
        };
        self.emit_scriptlet(&scriptlet);
        self.exit_state();
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::test_util::record;

    #[test]
    fn nested_tags_close_on_dedent() {
        let events = record("div\n  span -- hello\ndiv");
        let expected = [
            "OpenTag(div)",
            "OpenTag(span)",
            "Text(hello)",
            "CloseTag(span)",
            "CloseTag(div)",
        ];
        let tags: Vec<&String> = events
            .iter()
            .filter(|e| {
                e.starts_with("OpenTag(") || e.starts_with("CloseTag") || e.starts_with("Text")
            })
            .take(5)
            .collect();
        assert_eq!(tags, expected.to_vec(), "{events:?}");
    }

    #[test]
    fn bare_word_after_tag_is_text() {
        let events = record("div\n  span hello");
        assert!(events.contains(&"Text(hello)".to_string()), "{events:?}");
        assert!(
            !events.iter().any(|e| e.starts_with("AttrName")),
            "{events:?}"
        );
    }

    #[test]
    fn sibling_with_deviating_indent_is_bad_indentation() {
        let events = record("div\n  span a=1\n span b=2");
        assert!(
            events
                .iter()
                .any(|e| e.starts_with("Error(BAD_INDENTATION")),
            "{events:?}"
        );
    }

    #[test]
    fn dedent_below_indented_root_is_bad_indentation() {
        let events = record("  div\n span");
        assert!(
            events
                .iter()
                .any(|e| e.starts_with("Error(BAD_INDENTATION")),
            "{events:?}"
        );
    }

    #[test]
    fn blank_lines_do_not_close_tags() {
        let events = record("div\n\n  span x=1\n");
        assert!(events.contains(&"AttrValue(1)".to_string()), "{events:?}");
        let close_index = events
            .iter()
            .position(|e| e == "CloseTag(span)")
            .expect("span must close");
        let open_index = events
            .iter()
            .position(|e| e == "OpenTag(span)")
            .expect("span must open");
        assert!(open_index < close_index, "{events:?}");
    }

    #[test]
    fn child_under_open_only_tag_is_invalid_body() {
        let events = record("input/\n  div");
        assert!(
            events.iter().any(|e| e.starts_with("Error(INVALID_BODY")),
            "{events:?}"
        );
    }

    #[test]
    fn inline_script_line_and_block() {
        let line = record("$ const x = 1;\ndiv");
        assert!(
            line.contains(&"Scriptlet(const x = 1;)".to_string()),
            "{line:?}"
        );

        let block = record("$ { run(); }\ndiv");
        assert!(
            block.contains(&"Scriptlet(block  run(); )".to_string()),
            "{block:?}"
        );
    }

    #[test]
    fn line_comments_surface_as_comment_events() {
        let events = record("// heading\ndiv\n  /* note */\n  span");
        assert!(events.contains(&"Comment( heading)".to_string()), "{events:?}");
        assert!(events.contains(&"Comment( note )".to_string()), "{events:?}");
    }

    #[test]
    fn content_after_block_comment_is_rejected() {
        let events = record("/* note */ div");
        assert!(
            events
                .iter()
                .any(|e| e.starts_with("Error(INVALID_CHARACTER")),
            "{events:?}"
        );
    }

    #[test]
    fn delimited_block_collects_html_until_matching_dashes() {
        let events = record("div\n  --\n  <b>bold</b> and ${x}\n  --\ndiv");
        assert!(
            events.contains(&"OpenTagName(b)".to_string()),
            "tags parse inside the block: {events:?}"
        );
        assert!(events.contains(&"Placeholder(x)".to_string()), "{events:?}");
        assert!(
            events.iter().any(|e| e.starts_with("Text( and ")),
            "{events:?}"
        );
    }

    #[test]
    fn single_line_text_marker() {
        let events = record("div\n  -- just text <not-a-tag>");
        assert!(
            events.contains(&"Text(just text <not-a-tag>)".to_string()),
            "{events:?}"
        );
    }

    #[test]
    fn parsed_text_body_lines_need_dash() {
        let events = record("script\n  - const a = 1;\n  - ${x}\ndiv");
        assert!(
            events.contains(&"Text(const a = 1;)".to_string()),
            "{events:?}"
        );
        assert!(events.contains(&"Placeholder(x)".to_string()), "{events:?}");

        let bad = record("script\n  const a = 1;");
        assert!(
            bad.iter().any(|e| e.starts_with("Error(ILLEGAL_LINE_START")),
            "{bad:?}"
        );
    }

    #[test]
    fn single_dash_line_is_illegal_outside_text_bodies() {
        let events = record("div\n  - x");
        assert!(
            events
                .iter()
                .any(|e| e.starts_with("Error(ILLEGAL_LINE_START")),
            "{events:?}"
        );
    }

    #[test]
    fn semicolon_ends_the_statement() {
        let ok = record("div a=1;\ndiv");
        assert!(ok.contains(&"OpenTag(div)".to_string()), "{ok:?}");

        let bad = record("div a=1; extra");
        assert!(
            bad.iter()
                .any(|e| e.starts_with("Error(INVALID_CHARACTER")),
            "{bad:?}"
        );
    }

    #[test]
    fn mixed_mode_line_returns_to_concise() {
        let events = record("div\n  <em>hi</em>\n  span x=1");
        assert!(events.contains(&"CloseTag(em)".to_string()), "{events:?}");
        assert!(events.contains(&"AttrValue(1)".to_string()), "{events:?}");
        // `span` is a child of `div`, so `div` closes after it.
        let div_close = events.iter().rposition(|e| e == "CloseTag(div)").unwrap();
        let span_close = events.iter().rposition(|e| e == "CloseTag(span)").unwrap();
        assert!(span_close < div_close, "{events:?}");
    }
}
