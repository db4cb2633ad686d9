//! Parser core.
//!
//! A pushdown automaton over a complete source buffer. The dispatch loop
//! classifies the byte under `pos` and routes it to the active state's `char`
//! hook, or to its `eol` hook for `\n` / `\r\n` (the pair is one atom); end of
//! input drives `eof` hooks top-down until the stack unwinds.
//!
//! Invariants:
//! - Hooks consume input explicitly. A state that must let another state
//!   re-see the triggering byte enters/exits without consuming it; the next
//!   dispatch then routes the same byte to the new active state.
//! - Every dispatch iteration advances `pos`, changes the stack, or raises
//!   the error latch (progress is debug-asserted).
//! - `exit_state` stamps the popped frame's `end` and hands it to the
//!   parent's return hook, the only place parents learn child ranges.
//! - The error latch is single-shot: after the first error no handler other
//!   than `on_finish` runs, and `parse` returns normally.

use crate::chars;
use crate::error::{ErrorCode, ParseError};
use crate::events::{
    AttrMethod, AttrValue, CloseTag, Handler, OpenTag, OpenTagName, ParseOptions, Placeholder,
    Scriptlet, TagEnding,
};
use crate::span::{Span, ValueSpan};

mod attr;
mod concise;
mod content;
mod expr;
mod frames;
mod lexers;
mod operators;
mod tag;
#[cfg(test)]
pub(crate) mod test_util;

use frames::{Frame, FrameData, StateKind, TagEntry};

/// Parse `source`, delivering events to `handler`. Returns instrumentation
/// counters for the run.
pub fn parse<H: Handler>(source: &str, handler: &mut H) -> ParserStats {
    let mut parser = Parser::new(source, handler);
    parser.run();
    parser.stats
}

/// Minimal parser instrumentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParserStats {
    pub bytes: usize,
    pub states_entered: u64,
    pub states_exited: u64,
    pub events_emitted: u64,
    pub errors: u64,
}

pub(crate) struct Parser<'a, 'h, H: Handler> {
    source: &'a str,
    data: &'a [u8],
    pos: usize,
    max_pos: usize,
    handler: &'h mut H,
    frames: Vec<Frame>,
    /// Open-element stack; independent of the lexical state stack.
    tags: Vec<TagEntry>,
    /// Indent span of the current concise line.
    line_indent: Span,
    /// Set when a completed verbose tag needs a raw text body: (placeholders
    /// recognized, tag name). Consumed by the content state's return hook.
    pending_raw_body: Option<(bool, Span)>,
    /// Set when a completed concise tag is followed by inline text on the
    /// same line (`-- text` or a bare word).
    pending_line_text: bool,
    /// Set when only whitespace may follow on the current concise line.
    pending_blank_to_eol: bool,
    errored: bool,
    stats: ParserStats,
}

impl<'a, 'h, H: Handler> Parser<'a, 'h, H> {
    pub(crate) fn new(source: &'a str, handler: &'h mut H) -> Self {
        let data = source.as_bytes();
        Self {
            source,
            data,
            pos: 0,
            max_pos: data.len(),
            handler,
            frames: Vec::with_capacity(16),
            tags: Vec::with_capacity(8),
            line_indent: Span::empty_at(0),
            pending_raw_body: None,
            pending_line_text: false,
            pending_blank_to_eol: false,
            errored: false,
            stats: ParserStats {
                bytes: data.len(),
                ..ParserStats::default()
            },
        }
    }

    pub(crate) fn run(&mut self) {
        self.enter_concise_root();
        while self.pos < self.max_pos && !self.errored {
            let before = (self.pos, self.frames.len(), self.top_kind());
            let code = self.data[self.pos];
            if code == chars::NEWLINE {
                self.dispatch_eol(1);
            } else if code == chars::CARRIAGE_RETURN
                && self.data.get(self.pos + 1) == Some(&chars::NEWLINE)
            {
                self.dispatch_eol(2);
            } else {
                self.dispatch_char(code);
            }
            debug_assert!(
                self.errored
                    || self.pos != before.0
                    || self.frames.len() != before.1
                    || self.top_kind() != before.2,
                "dispatch made no progress at {} in {:?}",
                before.0,
                before.2,
            );
        }
        while !self.errored && !self.frames.is_empty() {
            let depth = self.frames.len();
            self.dispatch_eof();
            debug_assert!(
                self.errored || self.frames.len() < depth,
                "eof hook neither popped nor errored"
            );
        }
        self.frames.clear();
        self.handler.on_finish();
    }

    fn dispatch_char(&mut self, code: u8) {
        match self.top_kind() {
            StateKind::ConciseContent => self.concise_char(code),
            StateKind::HtmlContent => self.content_char(code),
            StateKind::DelimitedHtmlBlock => self.delimited_block_char(code),
            StateKind::OpenTag => self.open_tag_char(code),
            StateKind::TagName => self.tag_name_char(code),
            StateKind::Attr => self.attr_char(code),
            StateKind::Expr => self.expr_char(code),
            StateKind::Str => self.string_char(code),
            StateKind::TemplateString => self.template_char(code),
            StateKind::Regex => self.regex_char(code),
            StateKind::LineComment => self.line_comment_char(code),
            StateKind::BlockComment => self.block_comment_char(code),
            StateKind::Placeholder => self.placeholder_char(code),
            StateKind::Cdata
            | StateKind::HtmlComment
            | StateKind::Doctype
            | StateKind::Declaration
            | StateKind::Scriptlet => self.section_char(),
            StateKind::InlineScript => self.inline_script_char(code),
            StateKind::RawText => self.raw_text_char(code),
        }
    }

    fn dispatch_eol(&mut self, len: usize) {
        match self.top_kind() {
            StateKind::ConciseContent => self.concise_eol(len),
            StateKind::HtmlContent => self.content_eol(len),
            StateKind::OpenTag => self.open_tag_eol(len),
            StateKind::TagName => self.tag_name_eol(),
            StateKind::Attr => self.attr_eol(len),
            StateKind::Expr => self.expr_eol(len),
            StateKind::Str => self.unterminated_error("string"),
            StateKind::Regex => self.unterminated_error("regular expression"),
            StateKind::LineComment => self.exit_state(),
            StateKind::InlineScript => self.exit_state(),
            StateKind::RawText => self.raw_text_eol(len),
            // Remaining states treat line terminators as ordinary content.
            _ => self.pos += len,
        }
    }

    fn dispatch_eof(&mut self) {
        match self.top_kind() {
            StateKind::ConciseContent => self.concise_eof(),
            StateKind::HtmlContent => self.content_eof(),
            StateKind::DelimitedHtmlBlock => self.exit_state(),
            StateKind::OpenTag => self.open_tag_eof(),
            StateKind::TagName => self.tag_name_eol(),
            StateKind::Attr => self.attr_eof(),
            StateKind::Expr => self.expr_eof(),
            StateKind::Str => self.unterminated_error("string"),
            StateKind::TemplateString => self.unterminated_error("template string"),
            StateKind::Regex => self.unterminated_error("regular expression"),
            StateKind::LineComment => self.exit_state(),
            StateKind::BlockComment => self.frame_eof_error(ErrorCode::MalformedComment, "comment"),
            StateKind::Placeholder => {
                self.frame_eof_error(ErrorCode::MalformedPlaceholder, "placeholder")
            }
            StateKind::Cdata => self.frame_eof_error(ErrorCode::MalformedCdata, "CDATA section"),
            StateKind::HtmlComment => self.frame_eof_error(ErrorCode::MalformedComment, "comment"),
            StateKind::Doctype => {
                self.frame_eof_error(ErrorCode::MalformedDocumentType, "document type")
            }
            StateKind::Declaration => {
                self.frame_eof_error(ErrorCode::MalformedDeclaration, "declaration")
            }
            StateKind::Scriptlet => {
                self.frame_eof_error(ErrorCode::MalformedScriptlet, "scriptlet")
            }
            StateKind::InlineScript => self.exit_state(),
            StateKind::RawText => self.raw_text_eof(),
        }
    }

    // ---- state stack primitives ----

    fn top_kind(&self) -> StateKind {
        debug_assert!(!self.frames.is_empty(), "state stack underflow");
        self.frames.last().map(|f| f.kind).unwrap_or(StateKind::ConciseContent)
    }

    fn top(&mut self) -> &mut Frame {
        debug_assert!(!self.frames.is_empty(), "state stack underflow");
        let idx = self.frames.len() - 1;
        &mut self.frames[idx]
    }

    fn push_frame(&mut self, data: FrameData) {
        let kind = data.kind();
        let parent = self.frames.last().map(|f| f.kind).unwrap_or(kind);
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(
            target: "tpl.parser",
            "enter {:?} @{} (parent {:?})",
            kind,
            self.pos,
            parent
        );
        self.frames.push(Frame {
            kind,
            parent,
            start: self.pos,
            end: self.pos,
            data,
        });
        self.stats.states_entered += 1;
    }

    /// Pop the active frame, stamp its range, and run the parent's return
    /// hook with it.
    fn exit_state(&mut self) {
        let Some(mut child) = self.frames.pop() else {
            debug_assert!(false, "exit_state on empty stack");
            return;
        };
        child.end = self.pos;
        self.stats.states_exited += 1;
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(
            target: "tpl.parser",
            "exit {:?} [{}..{}]",
            child.kind,
            child.start,
            child.end
        );
        self.handle_return(child);
    }

    fn handle_return(&mut self, child: Frame) {
        if self.frames.is_empty() {
            // The root frame has no parent to resume.
            return;
        }
        debug_assert_eq!(
            self.frames.last().map(|f| f.kind),
            Some(child.parent),
            "stored parent discriminator out of sync with the stack"
        );
        match child.parent {
            StateKind::ConciseContent => self.concise_return(child),
            StateKind::HtmlContent => self.content_return(child),
            StateKind::RawText => self.raw_text_return(child),
            StateKind::OpenTag => self.open_tag_return(child),
            StateKind::Attr => self.attr_return(child),
            StateKind::TemplateString => self.template_return(child),
            StateKind::Placeholder => self.placeholder_return(child),
            StateKind::InlineScript => self.inline_script_return(child),
            // Strings, comments and regexes returning into an expression need
            // no bookkeeping; the expression resumes at the next byte.
            _ => {}
        }
    }

    // ---- byte helpers ----

    fn at(&self, pos: usize) -> Option<u8> {
        self.data.get(pos).copied()
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.data.get(self.pos + offset).copied()
    }

    fn starts_with_at(&self, pos: usize, pattern: &[u8]) -> bool {
        self.data[pos.min(self.max_pos)..].starts_with(pattern)
    }

    fn starts_with(&self, pattern: &[u8]) -> bool {
        self.starts_with_at(self.pos, pattern)
    }

    fn starts_with_ci(&self, pos: usize, pattern: &[u8]) -> bool {
        let end = pos + pattern.len();
        end <= self.max_pos && self.data[pos..end].eq_ignore_ascii_case(pattern)
    }

    fn consume_inline_whitespace(&mut self) {
        while self.pos < self.max_pos && chars::is_inline_whitespace(self.data[self.pos]) {
            self.pos += 1;
        }
    }

    /// Last non-whitespace byte strictly before `pos`, if any.
    fn previous_non_whitespace(&self, pos: usize) -> Option<u8> {
        self.data[..pos.min(self.max_pos)]
            .iter()
            .rev()
            .copied()
            .find(|&code| !chars::is_whitespace(code))
    }

    /// `${` / `$!{` lookahead at the current `$`: (escape, opener length).
    fn placeholder_ahead(&self) -> Option<(bool, usize)> {
        debug_assert_eq!(self.at(self.pos), Some(chars::DOLLAR));
        match self.peek(1) {
            Some(chars::OPEN_BRACE) => Some((true, 2)),
            Some(chars::EXCLAMATION) if self.peek(2) == Some(chars::OPEN_BRACE) => {
                Some((false, 3))
            }
            _ => None,
        }
    }

    // ---- open-element stack ----

    /// Close open elements whose recorded indent is at least `indent_len`
    /// bytes; synthetic close events land just before the current byte.
    fn close_tags_to_indent(&mut self, indent_len: usize, at: usize) -> bool {
        let mut closed_any = false;
        while let Some(top) = self.tags.last() {
            if top.indent.len() < indent_len {
                break;
            }
            closed_any = true;
            self.close_top_tag(at);
        }
        closed_any
    }

    fn close_remaining_tags(&mut self, at: usize) {
        while !self.tags.is_empty() {
            self.close_top_tag(at);
        }
    }

    fn close_top_tag(&mut self, at: usize) {
        let Some(entry) = self.tags.pop() else {
            return;
        };
        if entry.ending == TagEnding::Tag {
            self.emit_close_tag(&CloseTag {
                span: Span::empty_at(at),
                tag_name: entry.name,
            });
        }
    }

    // ---- event emission (latched) ----

    fn emit_text(&mut self, span: Span) {
        if self.errored || span.is_empty() {
            return;
        }
        self.stats.events_emitted += 1;
        self.handler.on_text(span);
    }

    fn emit_placeholder(&mut self, placeholder: &Placeholder) {
        if self.errored {
            return;
        }
        self.stats.events_emitted += 1;
        self.handler.on_placeholder(placeholder);
    }

    fn emit_open_tag_name(&mut self, name: &OpenTagName) -> ParseOptions {
        if self.errored {
            return ParseOptions::default();
        }
        self.stats.events_emitted += 1;
        self.handler.on_open_tag_name(name)
    }

    fn emit_open_tag(&mut self, tag: &OpenTag) {
        if self.errored {
            return;
        }
        self.stats.events_emitted += 1;
        self.handler.on_open_tag(tag);
    }

    fn emit_close_tag(&mut self, tag: &CloseTag) {
        if self.errored {
            return;
        }
        self.stats.events_emitted += 1;
        self.handler.on_close_tag(tag);
    }

    fn emit_attr_name(&mut self, name: Span) {
        if self.errored {
            return;
        }
        self.stats.events_emitted += 1;
        self.handler.on_attr_name(name);
    }

    fn emit_attr_args(&mut self, args: &ValueSpan) {
        if self.errored {
            return;
        }
        self.stats.events_emitted += 1;
        self.handler.on_attr_args(args);
    }

    fn emit_attr_value(&mut self, value: &AttrValue) {
        if self.errored {
            return;
        }
        self.stats.events_emitted += 1;
        self.handler.on_attr_value(value);
    }

    fn emit_attr_spread(&mut self, spread: &AttrValue) {
        if self.errored {
            return;
        }
        self.stats.events_emitted += 1;
        self.handler.on_attr_spread(spread);
    }

    fn emit_attr_method(&mut self, method: &AttrMethod) {
        if self.errored {
            return;
        }
        self.stats.events_emitted += 1;
        self.handler.on_attr_method(method);
    }

    fn emit_comment(&mut self, comment: &ValueSpan) {
        if self.errored {
            return;
        }
        self.stats.events_emitted += 1;
        self.handler.on_comment(comment);
    }

    fn emit_cdata(&mut self, cdata: &ValueSpan) {
        if self.errored {
            return;
        }
        self.stats.events_emitted += 1;
        self.handler.on_cdata(cdata);
    }

    fn emit_doctype(&mut self, doctype: &ValueSpan) {
        if self.errored {
            return;
        }
        self.stats.events_emitted += 1;
        self.handler.on_doctype(doctype);
    }

    fn emit_declaration(&mut self, declaration: &ValueSpan) {
        if self.errored {
            return;
        }
        self.stats.events_emitted += 1;
        self.handler.on_declaration(declaration);
    }

    fn emit_scriptlet(&mut self, scriptlet: &Scriptlet) {
        if self.errored {
            return;
        }
        self.stats.events_emitted += 1;
        self.handler.on_scriptlet(scriptlet);
    }

    // ---- error reporting ----

    /// Raise the error latch. The span runs from `start` to just past the
    /// current byte, clamped to the buffer.
    fn error_at(&mut self, code: ErrorCode, start: usize, message: String) {
        if self.errored {
            return;
        }
        self.errored = true;
        self.stats.errors += 1;
        let end = (self.pos + 1).min(self.max_pos).max(start);
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(target: "tpl.parser", "error {} [{}..{}] {}", code, start, end, message);
        let error = ParseError {
            code,
            span: Span::new(start, end),
            message,
        };
        self.stats.events_emitted += 1;
        self.handler.on_error(&error);
    }

    fn error_here(&mut self, code: ErrorCode, message: &str) {
        self.error_at(code, self.pos, message.to_string());
    }

    /// EOF in a section state (comment, CDATA, doctype, declaration,
    /// scriptlet): attribute the error to the whole unterminated construct.
    fn frame_eof_error(&mut self, code: ErrorCode, what: &str) {
        let start = self.frames.last().map(|f| f.start).unwrap_or(self.pos);
        self.error_at(
            code,
            start,
            format!("end of input reached while parsing {what}"),
        );
    }

    /// Unterminated embedded-language construct (string, regex, template
    /// string, expression group). The code and span come from the nearest
    /// enclosing open-tag / placeholder / scriptlet frame.
    fn unterminated_error(&mut self, what: &str) {
        let mut code = ErrorCode::InvalidExpression;
        let mut start = self.frames.last().map(|f| f.start).unwrap_or(self.pos);
        let mut detail = String::new();
        for frame in self.frames.iter().rev() {
            match (&frame.data, frame.kind) {
                (FrameData::Attr(attr), _) => {
                    if detail.is_empty() {
                        detail = match attr.name {
                            Some(name) if !name.is_empty() => {
                                format!(" for attribute {:?}", name.of(self.source))
                            }
                            _ => " for attribute".to_string(),
                        };
                    }
                }
                (_, StateKind::OpenTag) => {
                    code = ErrorCode::MalformedOpenTag;
                    start = frame.start;
                    break;
                }
                (_, StateKind::Placeholder) => {
                    code = ErrorCode::MalformedPlaceholder;
                    start = frame.start;
                    break;
                }
                (_, StateKind::InlineScript | StateKind::Scriptlet) => {
                    code = ErrorCode::MalformedScriptlet;
                    start = frame.start;
                    break;
                }
                _ => {}
            }
        }
        self.error_at(code, start, format!("unterminated {what}{detail}"));
    }
}
