//! Open tags and the tag-name section.
//!
//! The tag-name state collects the base name plus `#id` / `.class` shorthand
//! segments. Back in the open tag, `/ident` binds the tag variable, `(…)` the
//! tag argument and `|…|` the parameters (each only before the first
//! attribute); everything else is attribute or, in concise mode, inline text.

use crate::chars;
use crate::error::ErrorCode;
use crate::events::{BodyMode, Handler, OpenTag, OpenTagName, TagEnding, TagState};
use crate::span::{Span, ValueSpan};

use super::frames::{
    ExprData, Frame, FrameData, OpenTagData, SegKind, TagEntry, TagNameData, TagStage,
    CLOSE_PAREN_TERMINATOR, PIPE_TERMINATOR, TAG_VAR_TERMINATORS_CONCISE,
    TAG_VAR_TERMINATORS_HTML,
};
use super::Parser;

impl<H: Handler> Parser<'_, '_, H> {
    pub(super) fn enter_open_tag(&mut self, concise: bool) {
        self.push_frame(FrameData::OpenTag(OpenTagData {
            tag_name: Span::empty_at(self.pos),
            shorthand_id: None,
            shorthand_class_names: Vec::new(),
            var: None,
            argument: None,
            params: None,
            attributes: Vec::new(),
            indent: self.line_indent,
            body_mode: BodyMode::Html,
            concise,
            in_attr_group: false,
            open_only: false,
            stage: TagStage::Name,
        }));
    }

    pub(super) fn enter_tag_name(&mut self) {
        self.push_frame(FrameData::TagName(TagNameData {
            base: None,
            shorthand_id: None,
            classes: Vec::new(),
            seg_start: self.pos,
            seg_kind: SegKind::Base,
        }));
    }

    fn open_tag(&mut self) -> &mut OpenTagData {
        match &mut self.top().data {
            FrameData::OpenTag(tag) => tag,
            _ => unreachable!("open-tag hook on non-tag frame"),
        }
    }

    // ---- tag name ----

    fn is_tag_name_terminator(&self, code: u8, concise: bool) -> bool {
        if chars::is_inline_whitespace(code) {
            return true;
        }
        match code {
            chars::FORWARD_SLASH
            | chars::CLOSE_ANGLE
            | chars::OPEN_PAREN
            | chars::PIPE
            | chars::EQUAL
            | chars::COMMA => true,
            chars::SEMICOLON | chars::CLOSE_BRACKET | chars::OPEN_BRACKET => concise,
            _ => false,
        }
    }

    pub(super) fn tag_name_char(&mut self, code: u8) {
        let concise = match self.frames.iter().rev().find_map(|f| match &f.data {
            FrameData::OpenTag(tag) => Some(tag.concise),
            _ => None,
        }) {
            Some(concise) => concise,
            None => false,
        };
        if self.is_tag_name_terminator(code, concise) {
            self.finish_tag_name_segment();
            self.exit_state();
            return;
        }
        match code {
            chars::PERIOD => {
                self.finish_tag_name_segment();
                let seg_start = self.pos + 1;
                if let FrameData::TagName(name) = &mut self.top().data {
                    name.seg_kind = SegKind::Class;
                    name.seg_start = seg_start;
                }
                self.pos += 1;
            }
            chars::NUMBER_SIGN => {
                self.finish_tag_name_segment();
                let seg_start = self.pos + 1;
                if let FrameData::TagName(name) = &mut self.top().data {
                    name.seg_kind = SegKind::Id;
                    name.seg_start = seg_start;
                }
                self.pos += 1;
            }
            _ => self.pos += 1,
        }
    }

    /// Shared by the eol and eof paths: the name section ends at the line.
    pub(super) fn tag_name_eol(&mut self) {
        self.finish_tag_name_segment();
        self.exit_state();
    }

    fn finish_tag_name_segment(&mut self) {
        let pos = self.pos;
        if let FrameData::TagName(name) = &mut self.top().data {
            let segment = Span::new(name.seg_start, pos);
            match name.seg_kind {
                SegKind::Base => {
                    if name.base.is_none() {
                        name.base = Some(segment);
                    }
                }
                SegKind::Id => name.shorthand_id = Some(segment),
                SegKind::Class => name.classes.push(segment),
            }
        }
    }

    // ---- open tag ----

    pub(super) fn open_tag_char(&mut self, code: u8) {
        let (concise, in_group, has_attrs, has_var, has_argument, has_params) = {
            let tag = self.open_tag();
            (
                tag.concise,
                tag.in_attr_group,
                !tag.attributes.is_empty(),
                tag.var.is_some(),
                tag.argument.is_some(),
                tag.params.is_some(),
            )
        };
        let virgin = !has_attrs && !has_var && !has_argument && !has_params && !in_group;

        if chars::is_inline_whitespace(code) {
            self.consume_inline_whitespace();
            return;
        }
        match code {
            chars::COMMA => self.pos += 1,
            chars::SEMICOLON if concise => {
                self.complete_tag(TagEnding::Tag);
                self.pos += 1;
                self.pending_blank_to_eol = true;
                self.exit_state();
            }
            chars::CLOSE_BRACKET if concise && in_group => {
                self.open_tag().in_attr_group = false;
                self.pos += 1;
            }
            chars::CLOSE_BRACKET if concise => {
                self.complete_tag(TagEnding::Tag);
                self.pos += 1;
                self.pending_blank_to_eol = true;
                self.exit_state();
            }
            chars::OPEN_BRACKET if concise && !in_group => {
                self.open_tag().in_attr_group = true;
                self.pos += 1;
            }
            chars::HYPHEN
                if concise
                    && self.peek(1) == Some(chars::HYPHEN)
                    && self
                        .peek(2)
                        .map_or(true, chars::is_whitespace) =>
            {
                // `-- …`: the attribute list ends and the remainder of the
                // line is inline text content.
                self.pos += 2;
                self.consume_inline_whitespace();
                self.pending_line_text = true;
                self.complete_tag(TagEnding::Tag);
                self.exit_state();
            }
            chars::FORWARD_SLASH => self.open_tag_slash(concise, virgin),
            chars::CLOSE_ANGLE if !concise => {
                self.pos += 1;
                self.complete_tag(TagEnding::Tag);
                self.exit_state();
            }
            chars::OPEN_PAREN if !has_argument && !has_attrs && !in_group => {
                self.open_tag().stage = TagStage::Argument;
                self.pos += 1;
                self.enter_expression(ExprData {
                    group_stack: Vec::new(),
                    terminators: CLOSE_PAREN_TERMINATOR,
                    terminated_by_whitespace: false,
                    terminated_by_eol: false,
                    skip_operators: false,
                    concise,
                });
            }
            chars::PIPE if !has_params && !has_attrs => {
                self.open_tag().stage = TagStage::Params;
                self.pos += 1;
                self.enter_expression(ExprData {
                    group_stack: Vec::new(),
                    terminators: PIPE_TERMINATOR,
                    terminated_by_whitespace: false,
                    terminated_by_eol: false,
                    skip_operators: false,
                    concise,
                });
            }
            _ => {
                if concise && !self.concise_token_is_attribute() {
                    self.pending_line_text = true;
                    self.complete_tag(TagEnding::Tag);
                    self.exit_state();
                } else {
                    self.enter_attribute();
                }
            }
        }
    }

    fn open_tag_slash(&mut self, concise: bool, virgin: bool) {
        match self.peek(1) {
            Some(chars::FORWARD_SLASH) => {
                self.push_frame(FrameData::LineComment);
                self.pos += 2;
            }
            Some(chars::ASTERISK) => {
                self.push_frame(FrameData::BlockComment);
                self.pos += 2;
            }
            Some(chars::CLOSE_ANGLE) if !concise => {
                self.pos += 2;
                self.complete_tag(TagEnding::SelfClosed);
                self.exit_state();
            }
            _ if virgin => {
                // Tag variable; an empty one in concise mode is the
                // statement-level "no body" marker.
                self.open_tag().stage = TagStage::Var;
                self.pos += 1;
                self.enter_expression(ExprData {
                    group_stack: Vec::new(),
                    terminators: if concise {
                        TAG_VAR_TERMINATORS_CONCISE
                    } else {
                        TAG_VAR_TERMINATORS_HTML
                    },
                    terminated_by_whitespace: true,
                    terminated_by_eol: concise,
                    skip_operators: true,
                    concise,
                });
            }
            _ if concise => {
                // Trailing `/` after the attribute list: no body allowed.
                self.open_tag().open_only = true;
                self.pos += 1;
            }
            _ => self.error_here(ErrorCode::MalformedOpenTag, "unexpected `/` in open tag"),
        }
    }

    /// Concise content rule: a token at attribute position with no attribute
    /// marker before its end is inline text, and completes the tag.
    fn concise_token_is_attribute(&self) -> bool {
        if self.starts_with(b"...") {
            return true;
        }
        let mut i = self.pos;
        while let Some(code) = self.at(i) {
            match code {
                chars::EQUAL | chars::OPEN_PAREN | chars::OPEN_BRACE | chars::COMMA => {
                    return true;
                }
                chars::COLON if self.at(i + 1) == Some(chars::EQUAL) => return true,
                chars::SEMICOLON | chars::CLOSE_BRACKET => return false,
                code if chars::is_whitespace(code) => return false,
                _ => i += 1,
            }
        }
        false
    }

    pub(super) fn open_tag_eol(&mut self, len: usize) {
        let (concise, in_group) = {
            let tag = self.open_tag();
            (tag.concise, tag.in_attr_group)
        };
        if !concise || in_group {
            self.pos += len;
            return;
        }
        self.complete_tag(TagEnding::Tag);
        self.exit_state();
    }

    pub(super) fn open_tag_eof(&mut self) {
        if self.open_tag().concise {
            self.complete_tag(TagEnding::Tag);
            self.exit_state();
        } else {
            let start = self.top().start;
            self.error_at(
                ErrorCode::MalformedOpenTag,
                start,
                "end of input reached while parsing open tag".to_string(),
            );
        }
    }

    /// Emit the open-tag event and push the open-element entry. The caller
    /// exits the frame afterwards.
    fn complete_tag(&mut self, ending: TagEnding) {
        let pos = self.pos;
        let (event, name, indent, body_mode, concise, ending) = {
            let start = self.top().start;
            let tag = self.open_tag();
            let ending = if ending == TagEnding::Tag && tag.open_only {
                TagEnding::OpenOnly
            } else {
                ending
            };
            let event = OpenTag {
                span: Span::new(start, pos),
                tag_name: tag.tag_name,
                var: tag.var,
                argument: tag.argument,
                params: tag.params,
                attributes: std::mem::take(&mut tag.attributes),
                concise: tag.concise,
                open_tag_only: ending == TagEnding::OpenOnly,
                self_closed: ending == TagEnding::SelfClosed,
                shorthand_id: tag.shorthand_id,
                shorthand_class_names: std::mem::take(&mut tag.shorthand_class_names),
            };
            (event, tag.tag_name, tag.indent, tag.body_mode, tag.concise, ending)
        };
        self.emit_open_tag(&event);
        // Concise keeps every completed tag on the element stack so dedent
        // bookkeeping and body checks see it; verbose only tags with bodies.
        if concise || ending == TagEnding::Tag {
            self.tags.push(TagEntry {
                name,
                indent,
                nested_indent: None,
                body_mode,
                ending,
                concise,
            });
        }
        if !concise && ending == TagEnding::Tag && body_mode != BodyMode::Html {
            self.pending_raw_body = Some((body_mode == BodyMode::ParsedText, name));
        }
    }

    pub(super) fn open_tag_return(&mut self, child: Frame) {
        match child.data {
            FrameData::TagName(name) => {
                let tag_name = name.base.unwrap_or_else(|| Span::empty_at(child.start));
                let concise = {
                    let tag = self.open_tag();
                    tag.tag_name = tag_name;
                    tag.shorthand_id = name.shorthand_id;
                    tag.shorthand_class_names = name.classes;
                    tag.stage = TagStage::Content;
                    tag.concise
                };
                let event = {
                    let tag = self.open_tag();
                    OpenTagName {
                        span: Span::new(child.start, child.end),
                        tag_name,
                        shorthand_id: tag.shorthand_id,
                        shorthand_class_names: tag.shorthand_class_names.clone(),
                        concise,
                    }
                };
                let options = self.emit_open_tag_name(&event);
                if let Some(state) = options.state {
                    self.open_tag().body_mode = match state {
                        TagState::ParsedText => BodyMode::ParsedText,
                        TagState::StaticText => BodyMode::StaticText,
                    };
                }
            }
            FrameData::Expr(_) => {
                let stage = self.open_tag().stage;
                let span = Span::new(child.start, child.end);
                match stage {
                    TagStage::Var => {
                        let tag = self.open_tag();
                        tag.stage = TagStage::Content;
                        if span.is_empty() {
                            if tag.concise {
                                tag.open_only = true;
                            } else {
                                self.error_here(
                                    ErrorCode::MalformedOpenTag,
                                    "missing tag variable after `/`",
                                );
                            }
                        } else {
                            tag.var = Some(span);
                        }
                    }
                    TagStage::Argument => {
                        debug_assert_eq!(self.at(self.pos), Some(chars::CLOSE_PAREN));
                        if self.at(self.pos) == Some(chars::CLOSE_PAREN) {
                            self.pos += 1;
                        }
                        let argument = ValueSpan::new(Span::new(span.start - 1, self.pos), span);
                        let tag = self.open_tag();
                        tag.argument = Some(argument);
                        tag.stage = TagStage::Content;
                    }
                    TagStage::Params => {
                        debug_assert_eq!(self.at(self.pos), Some(chars::PIPE));
                        if self.at(self.pos) == Some(chars::PIPE) {
                            self.pos += 1;
                        }
                        let params = ValueSpan::new(Span::new(span.start - 1, self.pos), span);
                        let tag = self.open_tag();
                        tag.params = Some(params);
                        tag.stage = TagStage::Content;
                    }
                    _ => debug_assert!(false, "expression returned in stage {stage:?}"),
                }
            }
            FrameData::Attr(attr) => {
                let summary = crate::events::Attribute {
                    name: attr.name.unwrap_or_else(|| Span::empty_at(child.start)),
                    value: attr.value,
                    args: attr.args,
                    bound: attr.bound,
                    spread: attr.spread,
                    method: attr.method,
                    default: attr.default,
                };
                self.open_tag().attributes.push(summary);
            }
            FrameData::LineComment | FrameData::BlockComment => {
                // Comments between attributes carry no event.
            }
            _ => debug_assert!(false, "unexpected child {:?} of open tag", child.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::test_util::record;

    #[test]
    fn verbose_tag_with_shorthands() {
        let events = record("<div#main.a.b>");
        assert!(
            events.contains(&"OpenTagName(div#main.a.b)".to_string()),
            "{events:?}"
        );
    }

    #[test]
    fn shorthand_without_base_name_keeps_zero_width_name() {
        let events = record(".card text");
        assert!(
            events.contains(&"OpenTagName(.card)".to_string()),
            "{events:?}"
        );
        assert!(events.contains(&"Text(text)".to_string()), "{events:?}");
    }

    #[test]
    fn self_closed_tag_has_no_close_event() {
        let events = record("<a/>");
        assert!(events.contains(&"OpenTag(a selfClosed)".to_string()), "{events:?}");
        assert!(
            !events.iter().any(|e| e.starts_with("CloseTag")),
            "{events:?}"
        );
    }

    #[test]
    fn tag_variable_argument_and_params() {
        let events = record("<for/item (list) |i|>x</for>");
        assert!(
            events.contains(&"OpenTag(for /item (list) |i|)".to_string()),
            "{events:?}"
        );
    }

    #[test]
    fn concise_open_only_marker() {
        let events = record("input/\ndiv");
        assert!(
            events.contains(&"OpenTag(input openTagOnly)".to_string()),
            "{events:?}"
        );
        // Open-only tags never receive a close event.
        assert_eq!(
            events.iter().filter(|e| e.starts_with("CloseTag")).count(),
            1,
            "{events:?}"
        );
    }

    #[test]
    fn malformed_open_tag_at_eof() {
        let events = record("<a b=1");
        assert!(
            events
                .iter()
                .any(|e| e.starts_with("Error(MALFORMED_OPEN_TAG")),
            "{events:?}"
        );
    }

    #[test]
    fn concise_attr_group_spans_lines() {
        let events = record("div [\n  a=1\n  b=2\n]\nspan");
        assert!(events.contains(&"AttrValue(1)".to_string()), "{events:?}");
        assert!(events.contains(&"AttrValue(2)".to_string()), "{events:?}");
        assert!(events.contains(&"OpenTag(div)".to_string()), "{events:?}");
        assert!(events.contains(&"OpenTagName(span)".to_string()), "{events:?}");
    }

    #[test]
    fn comma_separates_attributes() {
        let events = record("<a x=1, y=2>");
        assert_eq!(
            events
                .iter()
                .filter(|e| e.starts_with("AttrName"))
                .count(),
            2,
            "{events:?}"
        );
    }
}
