//! Verbose-mode content: text runs, placeholders, tag dispatch, close tags,
//! comment/CDATA/doctype/declaration/scriptlet sections, and raw tag bodies.

use memchr::{memchr, memchr2, memmem};

use crate::chars;
use crate::error::ErrorCode;
use crate::events::{CloseTag, Handler, Placeholder, Scriptlet};
use crate::span::{Span, ValueSpan};

use super::frames::{
    Delimiter, ExprData, Frame, FrameData, HtmlContentData, PlaceholderData, RawTextData,
    StateKind, CLOSE_BRACE_TERMINATOR,
};
use super::Parser;

impl<H: Handler> Parser<'_, '_, H> {
    pub(super) fn enter_html_content(&mut self, from_concise: bool, delimiter: Option<Delimiter>) {
        let base_tags = self.tags.len();
        self.push_frame(FrameData::HtmlContent(HtmlContentData {
            text_start: None,
            from_concise,
            base_tags,
            delimiter,
        }));
    }

    /// Take the pending text run of the active content-bearing state.
    fn take_text_run(&mut self, end: usize) -> Option<Span> {
        let run = match &mut self.top().data {
            FrameData::HtmlContent(c) => &mut c.text_start,
            FrameData::RawText(r) => &mut r.text_start,
            FrameData::ConciseContent(c) => &mut c.text_start,
            _ => return None,
        };
        match run.take() {
            Some(start) if start < end => Some(Span::new(start, end)),
            _ => None,
        }
    }

    pub(super) fn flush_text(&mut self, end: usize) {
        if let Some(span) = self.take_text_run(end) {
            self.emit_text(span);
        }
    }

    /// Consume a text run: the current byte plus everything up to the next
    /// byte the caller considers significant (line terminators always stop
    /// the run so the dispatch loop sees them).
    pub(super) fn consume_text_run(&mut self, stop_angle: bool, stop_dollar: bool) {
        self.pos += 1;
        let rest = &self.data[self.pos..];
        let mut stop = memchr2(chars::CARRIAGE_RETURN, chars::NEWLINE, rest).unwrap_or(rest.len());
        if stop_angle {
            if let Some(found) = memchr(chars::OPEN_ANGLE, &rest[..stop]) {
                stop = found;
            }
        }
        if stop_dollar {
            if let Some(found) = memchr(chars::DOLLAR, &rest[..stop]) {
                stop = found;
            }
        }
        self.pos += stop;
    }

    pub(super) fn content_char(&mut self, code: u8) {
        match code {
            chars::OPEN_ANGLE => {
                self.flush_text(self.pos);
                self.angle_dispatch();
            }
            chars::DOLLAR => {
                if let Some((escape, open_len)) = self.placeholder_ahead() {
                    self.flush_text(self.pos);
                    self.enter_placeholder(escape, open_len);
                } else {
                    self.content_text(false);
                }
            }
            _ => self.content_text(true),
        }
    }

    fn content_text(&mut self, stop_dollar: bool) {
        let pos = self.pos;
        if let FrameData::HtmlContent(c) = &mut self.top().data {
            if c.text_start.is_none() {
                c.text_start = Some(pos);
            }
        }
        self.consume_text_run(true, stop_dollar);
    }

    /// Dispatch at a `<` that is not part of a text run.
    fn angle_dispatch(&mut self) {
        match self.peek(1) {
            Some(chars::FORWARD_SLASH) => self.scan_close_tag(),
            Some(chars::EXCLAMATION) => {
                if self.starts_with_at(self.pos + 2, b"--") {
                    self.push_frame(FrameData::HtmlComment);
                    self.pos += 4;
                } else if self.starts_with_at(self.pos + 2, b"[CDATA[") {
                    self.push_frame(FrameData::Cdata);
                    self.pos += 9;
                } else if self.starts_with_ci(self.pos + 2, b"DOCTYPE") {
                    self.push_frame(FrameData::Doctype);
                    self.pos += 9;
                } else {
                    self.push_frame(FrameData::Declaration);
                    self.pos += 2;
                }
            }
            Some(chars::QUESTION) => {
                self.push_frame(FrameData::Scriptlet);
                self.pos += 2;
            }
            _ => {
                self.enter_open_tag(false);
                self.pos += 1;
                self.enter_tag_name();
            }
        }
    }

    /// `</name>`; a bare `</>` closes the innermost element with a zero-width
    /// name. Close-tag names are reported, not validated.
    fn scan_close_tag(&mut self) {
        let start = self.pos;
        let Some(found) = memchr(chars::CLOSE_ANGLE, &self.data[self.pos + 2..]) else {
            self.pos = self.max_pos;
            self.error_at(
                ErrorCode::InvalidCharacter,
                start,
                "end of input reached while parsing closing tag".to_string(),
            );
            return;
        };
        let close = self.pos + 2 + found;
        let mut name_start = self.pos + 2;
        let mut name_end = close;
        while name_start < name_end && chars::is_inline_whitespace(self.data[name_start]) {
            name_start += 1;
        }
        while name_end > name_start && chars::is_inline_whitespace(self.data[name_end - 1]) {
            name_end -= 1;
        }
        self.pos = close + 1;
        let base_tags = match &self.top().data {
            FrameData::HtmlContent(c) => c.base_tags,
            _ => 0,
        };
        if self.tags.len() > base_tags {
            self.tags.pop();
        }
        self.emit_close_tag(&CloseTag {
            span: Span::new(start, self.pos),
            tag_name: Span::new(name_start, name_end),
        });
    }

    pub(super) fn content_eol(&mut self, len: usize) {
        let (from_concise, base_tags, delimiter) = match &self.top().data {
            FrameData::HtmlContent(c) => (c.from_concise, c.base_tags, c.delimiter),
            _ => return,
        };
        if let Some(delimiter) = delimiter {
            let after = self.pos + len;
            if let Some(consumed) = self.delimiter_line_len(after, delimiter) {
                self.flush_text(self.pos);
                self.pos = after + consumed;
                self.exit_state();
                return;
            }
        } else if from_concise && self.tags.len() == base_tags {
            // The concise line's element tree is closed; the newline belongs
            // to the concise parent.
            self.flush_text(self.pos);
            self.exit_state();
            return;
        }
        self.pos += len;
        let pos = self.pos;
        if let FrameData::HtmlContent(c) = &mut self.top().data {
            if c.text_start.is_none() {
                c.text_start = Some(pos);
            }
        }
    }

    /// Number of bytes (indent + dashes + trailing inline whitespace) of a
    /// closing delimiter line starting at `at`, if it matches.
    fn delimiter_line_len(&self, at: usize, delimiter: Delimiter) -> Option<usize> {
        let indent = &self.data[delimiter.indent.start..delimiter.indent.end];
        if !self.starts_with_at(at, indent) {
            return None;
        }
        let dash_start = at + indent.len();
        let mut i = dash_start;
        while self.at(i) == Some(chars::HYPHEN) {
            i += 1;
        }
        if i - dash_start != delimiter.dashes {
            return None;
        }
        while matches!(self.at(i), Some(code) if chars::is_inline_whitespace(code)) {
            i += 1;
        }
        match self.at(i) {
            None | Some(chars::NEWLINE) => Some(i - at),
            Some(chars::CARRIAGE_RETURN) if self.at(i + 1) == Some(chars::NEWLINE) => {
                Some(i - at)
            }
            _ => None,
        }
    }

    pub(super) fn content_eof(&mut self) {
        self.flush_text(self.pos);
        self.exit_state();
    }

    pub(super) fn content_return(&mut self, child: Frame) {
        if child.kind == StateKind::OpenTag {
            if let Some((parsed, name)) = self.pending_raw_body.take() {
                self.push_frame(FrameData::RawText(RawTextData {
                    parsed,
                    text_start: None,
                    name,
                }));
            }
        }
    }

    // ---- placeholders ----

    pub(super) fn enter_placeholder(&mut self, escape: bool, open_len: usize) {
        self.push_frame(FrameData::Placeholder(PlaceholderData { escape }));
        self.pos += open_len;
        self.enter_expression(ExprData {
            group_stack: Vec::new(),
            terminators: CLOSE_BRACE_TERMINATOR,
            terminated_by_whitespace: false,
            terminated_by_eol: false,
            skip_operators: false,
            concise: false,
        });
    }

    pub(super) fn placeholder_char(&mut self, _code: u8) {
        // The placeholder frame always has an expression child; dispatch can
        // only land here if that contract is broken.
        debug_assert!(false, "placeholder frame dispatched directly");
        self.pos += 1;
    }

    pub(super) fn placeholder_return(&mut self, child: Frame) {
        debug_assert_eq!(child.kind, StateKind::Expr);
        let (start, escape) = {
            let frame = self.top();
            let escape = match &frame.data {
                FrameData::Placeholder(p) => p.escape,
                _ => true,
            };
            (frame.start, escape)
        };
        if child.start == child.end {
            self.error_at(
                ErrorCode::MalformedPlaceholder,
                start,
                "placeholder is missing its expression".to_string(),
            );
            return;
        }
        debug_assert_eq!(self.at(self.pos), Some(chars::CLOSE_BRACE));
        if self.at(self.pos) == Some(chars::CLOSE_BRACE) {
            self.pos += 1;
        }
        let placeholder = Placeholder {
            span: Span::new(start, self.pos),
            value: Span::new(child.start, child.end),
            escape,
        };
        self.emit_placeholder(&placeholder);
        self.exit_state();
    }

    // ---- sections ----

    /// One-shot scans to the section terminator. The frame was entered with
    /// the opener consumed; EOF before the terminator is reported by the
    /// matching eof hook.
    pub(super) fn section_char(&mut self) {
        let kind = self.top_kind();
        let start = self.frames.last().map(|f| f.start).unwrap_or(self.pos);
        match kind {
            StateKind::HtmlComment => {
                if let Some(found) = memmem::find(&self.data[self.pos..], b"-->") {
                    let value = Span::new(start + 4, self.pos + found);
                    self.pos += found + 3;
                    let comment = ValueSpan::new(Span::new(start, self.pos), value);
                    self.emit_comment(&comment);
                    self.exit_state();
                } else {
                    self.pos = self.max_pos;
                }
            }
            StateKind::Cdata => {
                if let Some(found) = memmem::find(&self.data[self.pos..], b"]]>") {
                    let value = Span::new(start + 9, self.pos + found);
                    self.pos += found + 3;
                    let cdata = ValueSpan::new(Span::new(start, self.pos), value);
                    self.emit_cdata(&cdata);
                    self.exit_state();
                } else {
                    self.pos = self.max_pos;
                }
            }
            StateKind::Doctype | StateKind::Declaration => {
                if let Some(found) = memchr(chars::CLOSE_ANGLE, &self.data[self.pos..]) {
                    let value = Span::new(start + 2, self.pos + found);
                    self.pos += found + 1;
                    let payload = ValueSpan::new(Span::new(start, self.pos), value);
                    if kind == StateKind::Doctype {
                        self.emit_doctype(&payload);
                    } else {
                        self.emit_declaration(&payload);
                    }
                    self.exit_state();
                } else {
                    self.pos = self.max_pos;
                }
            }
            StateKind::Scriptlet => {
                if let Some(found) = memmem::find(&self.data[self.pos..], b"?>") {
                    let value = Span::new(start + 2, self.pos + found);
                    self.pos += found + 2;
                    let scriptlet = Scriptlet {
                        span: Span::new(start, self.pos),
                        value,
                        tag: true,
                        block: false,
                    };
                    self.emit_scriptlet(&scriptlet);
                    self.exit_state();
                } else {
                    self.pos = self.max_pos;
                }
            }
            _ => {
                debug_assert!(false, "section dispatch on {kind:?}");
                self.pos += 1;
            }
        }
    }

    // ---- raw tag bodies (parsed / static text) ----

    pub(super) fn raw_text_char(&mut self, code: u8) {
        let (parsed, name) = match &self.top().data {
            FrameData::RawText(r) => (r.parsed, r.name),
            _ => return,
        };
        match code {
            chars::OPEN_ANGLE if self.peek(1) == Some(chars::FORWARD_SLASH) => {
                if let Some((name_span, end)) = self.closing_tag_ahead(name) {
                    let start = self.pos;
                    self.flush_text(self.pos);
                    self.pos = end;
                    self.tags.pop();
                    self.emit_close_tag(&CloseTag {
                        span: Span::new(start, end),
                        tag_name: name_span,
                    });
                    self.exit_state();
                } else {
                    self.raw_text(parsed);
                }
            }
            chars::DOLLAR if parsed => {
                if let Some((escape, open_len)) = self.placeholder_ahead() {
                    self.flush_text(self.pos);
                    self.enter_placeholder(escape, open_len);
                } else {
                    self.raw_text(parsed);
                }
            }
            _ => self.raw_text(parsed),
        }
    }

    fn raw_text(&mut self, parsed: bool) {
        let pos = self.pos;
        if let FrameData::RawText(r) = &mut self.top().data {
            if r.text_start.is_none() {
                r.text_start = Some(pos);
            }
        }
        self.consume_text_run(true, parsed);
    }

    /// `</` + the raw tag's name (ASCII case-insensitive) + optional inline
    /// whitespace + `>`, anchored at the current `<`.
    fn closing_tag_ahead(&self, name: Span) -> Option<(Span, usize)> {
        let name_at = self.pos + 2;
        if !self.starts_with_ci(name_at, &self.data[name.start..name.end]) {
            return None;
        }
        let mut i = name_at + name.len();
        while matches!(self.at(i), Some(code) if chars::is_inline_whitespace(code)) {
            i += 1;
        }
        if self.at(i) == Some(chars::CLOSE_ANGLE) {
            Some((Span::new(name_at, name_at + name.len()), i + 1))
        } else {
            None
        }
    }

    pub(super) fn raw_text_eol(&mut self, len: usize) {
        self.pos += len;
        let pos = self.pos;
        if let FrameData::RawText(r) = &mut self.top().data {
            if r.text_start.is_none() {
                r.text_start = Some(pos);
            }
        }
    }

    pub(super) fn raw_text_eof(&mut self) {
        self.flush_text(self.pos);
        self.exit_state();
    }

    pub(super) fn raw_text_return(&mut self, _child: Frame) {
        // Placeholders return here; the next text byte restarts the run.
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::test_util::record;

    #[test]
    fn text_and_placeholders_interleave() {
        let events = record("<a>x${y}z$!{w}</a>");
        let expected = [
            "Text(x)",
            "Placeholder(y)",
            "Text(z)",
            "Placeholder(!w)",
            "CloseTag(a)",
        ];
        for needle in expected {
            assert!(
                events.contains(&needle.to_string()),
                "missing {needle}: {events:?}"
            );
        }
    }

    #[test]
    fn dollar_without_brace_is_plain_text() {
        let events = record("<a>cost: $5</a>");
        assert!(
            events.contains(&"Text(cost: $5)".to_string()),
            "{events:?}"
        );
    }

    #[test]
    fn comment_cdata_doctype_declaration_scriptlet() {
        let events = record("<!-- c --><![CDATA[d]]><!DOCTYPE html><!ENTITY e><?px q?>");
        let expected = [
            "Comment( c )",
            "CData(d)",
            "Doctype(DOCTYPE html)",
            "Declaration(ENTITY e)",
            "Scriptlet(tag px q)",
        ];
        for needle in expected {
            assert!(
                events.contains(&needle.to_string()),
                "missing {needle}: {events:?}"
            );
        }
    }

    #[test]
    fn unterminated_comment_reports_malformed_comment() {
        let events = record("<!-- never");
        assert!(
            events
                .iter()
                .any(|e| e.starts_with("Error(MALFORMED_COMMENT")),
            "{events:?}"
        );
    }

    #[test]
    fn parsed_text_body_sees_placeholders_but_not_tags() {
        let events = record("<script>if (a < b) ${x}</script>");
        assert!(
            events.contains(&"Placeholder(x)".to_string()),
            "{events:?}"
        );
        assert!(
            events.contains(&"CloseTag(script)".to_string()),
            "{events:?}"
        );
        // `<b)` inside the body must not open a tag.
        assert_eq!(
            events
                .iter()
                .filter(|e| e.starts_with("OpenTagName"))
                .count(),
            1,
            "{events:?}"
        );
    }

    #[test]
    fn static_text_body_ignores_placeholders() {
        let events = record("<style>a ${not} b</style>");
        assert!(
            !events.iter().any(|e| e.starts_with("Placeholder")),
            "{events:?}"
        );
        assert!(
            events.iter().any(|e| e.starts_with("Text(a ${not} b")),
            "{events:?}"
        );
    }

    #[test]
    fn raw_body_close_tag_is_case_insensitive() {
        let events = record("<script>x</SCRIPT>");
        assert!(
            events.contains(&"CloseTag(SCRIPT)".to_string()),
            "{events:?}"
        );
    }

    #[test]
    fn anonymous_close_tag_closes_innermost_element() {
        let events = record("<a><b>x</></>");
        let closes = events
            .iter()
            .filter(|e| e.starts_with("CloseTag"))
            .count();
        assert_eq!(closes, 2, "{events:?}");
    }
}
