//! Attribute recognition.
//!
//! An attribute progresses Unknown -> Name -> optional Argument -> optional
//! Block or Value. Entry contract: the open tag enters this state at the
//! attribute's first byte without consuming it.

use crate::chars;
use crate::error::ErrorCode;
use crate::events::{AttrMethod, AttrValue, Handler};
use crate::span::{Span, ValueSpan};

use super::frames::{
    AttrData, AttrPending, AttrStage, ExprData, Frame, FrameData, StateKind,
    ATTR_NAME_TERMINATORS_CONCISE, ATTR_NAME_TERMINATORS_HTML, ATTR_VALUE_TERMINATORS_CONCISE,
    ATTR_VALUE_TERMINATORS_HTML, CLOSE_BRACE_TERMINATOR, CLOSE_PAREN_TERMINATOR,
};
use super::Parser;

impl<H: Handler> Parser<'_, '_, H> {
    pub(super) fn enter_attribute(&mut self) {
        self.push_frame(FrameData::Attr(AttrData {
            stage: AttrStage::Unknown,
            pending: AttrPending::None,
            name: None,
            value_start: self.pos,
            args: None,
            args_emitted: false,
            bound: false,
            spread: false,
            method: false,
            default: false,
            value: None,
        }));
    }

    /// The open tag enclosing the active frame; attributes and tag names are
    /// always nested under one.
    fn enclosing_tag_is_concise(&self) -> bool {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| match &frame.data {
                FrameData::OpenTag(tag) => Some(tag.concise),
                _ => None,
            })
            .unwrap_or(false)
    }

    fn enclosing_tag_attr_count(&self) -> usize {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| match &frame.data {
                FrameData::OpenTag(tag) => Some(tag.attributes.len()),
                _ => None,
            })
            .unwrap_or(0)
    }

    fn attr(&mut self) -> &mut AttrData {
        match &mut self.top().data {
            FrameData::Attr(attr) => attr,
            _ => unreachable!("attr hook on non-attr frame"),
        }
    }

    pub(super) fn attr_char(&mut self, code: u8) {
        let concise = self.enclosing_tag_is_concise();
        let (stage, has_name, has_args) = {
            let attr = self.attr();
            (attr.stage, attr.name.is_some(), attr.args.is_some())
        };

        // The byte after a closed `(…)` decides the argument's fate: `{`
        // retains it as method params, anything else emits it immediately.
        if stage == AttrStage::AfterArgument
            && code != chars::OPEN_BRACE
            && !chars::is_inline_whitespace(code)
        {
            self.emit_pending_args();
        }

        if chars::is_inline_whitespace(code) {
            self.pos += 1;
            return;
        }

        match code {
            chars::EQUAL => {
                let pos = self.pos;
                self.attr().value_start = pos;
                self.pos += 1;
                self.consume_inline_whitespace();
                self.begin_value(concise, false, false);
            }
            chars::COLON if self.peek(1) == Some(chars::EQUAL) => {
                let pos = self.pos;
                self.attr().value_start = pos;
                self.pos += 2;
                self.consume_inline_whitespace();
                self.begin_value(concise, true, false);
            }
            chars::PERIOD if self.starts_with(b"...") => {
                let pos = self.pos;
                self.attr().value_start = pos;
                self.pos += 3;
                self.begin_value(concise, false, true);
            }
            chars::OPEN_PAREN => {
                if has_args {
                    self.error_here(
                        ErrorCode::IllegalAttributeArgument,
                        "attribute already has an argument",
                    );
                    return;
                }
                self.attr().pending = AttrPending::Argument;
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
            chars::OPEN_BRACE if has_args || !has_name => {
                let attr = self.attr();
                attr.pending = AttrPending::Block;
                attr.method = true;
                self.pos += 1;
                self.enter_expression(ExprData {
                    group_stack: Vec::new(),
                    terminators: CLOSE_BRACE_TERMINATOR,
                    terminated_by_whitespace: false,
                    terminated_by_eol: false,
                    skip_operators: false,
                    concise,
                });
            }
            _ if stage == AttrStage::Unknown => {
                self.attr().pending = AttrPending::Name;
                self.enter_expression(ExprData {
                    group_stack: Vec::new(),
                    terminators: if concise {
                        ATTR_NAME_TERMINATORS_CONCISE
                    } else {
                        ATTR_NAME_TERMINATORS_HTML
                    },
                    terminated_by_whitespace: true,
                    terminated_by_eol: concise,
                    skip_operators: true,
                    concise,
                });
            }
            _ => {
                // Not part of this attribute; the open tag re-decides.
                self.finalize_attribute();
                self.exit_state();
            }
        }
    }

    fn begin_value(&mut self, concise: bool, bound: bool, spread: bool) {
        let attr = self.attr();
        attr.pending = AttrPending::Value;
        attr.bound = bound;
        attr.spread = spread;
        self.enter_expression(ExprData {
            group_stack: Vec::new(),
            terminators: if concise {
                ATTR_VALUE_TERMINATORS_CONCISE
            } else {
                ATTR_VALUE_TERMINATORS_HTML
            },
            terminated_by_whitespace: true,
            terminated_by_eol: concise,
            skip_operators: false,
            concise,
        });
    }

    pub(super) fn attr_eol(&mut self, len: usize) {
        if self.enclosing_tag_is_concise() {
            self.finalize_attribute();
            self.exit_state();
        } else {
            // Inside a verbose tag a newline is ordinary whitespace.
            self.pos += len;
        }
    }

    pub(super) fn attr_eof(&mut self) {
        self.finalize_attribute();
        self.exit_state();
    }

    /// Emit anything still pending before the attribute ends.
    fn finalize_attribute(&mut self) {
        self.emit_pending_args();
    }

    fn emit_pending_args(&mut self) {
        let args = {
            let attr = self.attr();
            if attr.args_emitted || attr.method {
                None
            } else {
                attr.args_emitted = true;
                attr.stage = AttrStage::AfterName;
                attr.args
            }
        };
        if let Some(args) = args {
            self.emit_attr_args(&args);
        }
    }

    /// Synthesize a zero-width name at the attribute start for value-like
    /// triggers with no parsed name (the "default" attribute).
    fn ensure_attr_name(&mut self) {
        let start = self.top().start;
        let first = self.enclosing_tag_attr_count() == 0;
        let attr = self.attr();
        if attr.name.is_none() {
            attr.name = Some(Span::empty_at(start));
            attr.default = first;
        }
    }

    pub(super) fn attr_return(&mut self, child: Frame) {
        debug_assert_eq!(child.kind, StateKind::Expr);
        let child_span = Span::new(child.start, child.end);
        let pending = {
            let attr = self.attr();
            let pending = attr.pending;
            attr.pending = AttrPending::None;
            pending
        };
        match pending {
            AttrPending::Name => {
                let attr = self.attr();
                attr.stage = AttrStage::AfterName;
                if !child_span.is_empty() {
                    attr.name = Some(child_span);
                    self.emit_attr_name(child_span);
                }
            }
            AttrPending::Value => {
                if child_span.is_empty() {
                    let start = self.attr().value_start;
                    self.error_at(
                        ErrorCode::IllegalAttributeValue,
                        start,
                        "attribute value is missing".to_string(),
                    );
                    return;
                }
                self.ensure_attr_name();
                self.emit_pending_args();
                let (value_start, bound, spread) = {
                    let attr = self.attr();
                    (attr.value_start, attr.bound, attr.spread)
                };
                let value = AttrValue {
                    span: Span::new(value_start, child_span.end),
                    value: child_span,
                    bound,
                };
                self.attr().value = Some(ValueSpan::new(value.span, value.value));
                if spread {
                    self.emit_attr_spread(&value);
                } else {
                    self.emit_attr_value(&value);
                }
                self.exit_state();
            }
            AttrPending::Argument => {
                debug_assert_eq!(self.at(self.pos), Some(chars::CLOSE_PAREN));
                if self.at(self.pos) == Some(chars::CLOSE_PAREN) {
                    self.pos += 1;
                }
                let args = ValueSpan::new(Span::new(child_span.start - 1, self.pos), child_span);
                let attr = self.attr();
                attr.args = Some(args);
                attr.stage = AttrStage::AfterArgument;
            }
            AttrPending::Block => {
                debug_assert_eq!(self.at(self.pos), Some(chars::CLOSE_BRACE));
                if self.at(self.pos) == Some(chars::CLOSE_BRACE) {
                    self.pos += 1;
                }
                let body = ValueSpan::new(Span::new(child_span.start - 1, self.pos), child_span);
                self.ensure_attr_name();
                let (start, params) = {
                    let start = self.top().start;
                    (start, self.attr().args)
                };
                let method = AttrMethod {
                    span: Span::new(start, self.pos),
                    params,
                    body,
                };
                self.emit_attr_method(&method);
                self.exit_state();
            }
            AttrPending::None => {
                debug_assert!(false, "attribute return with nothing pending");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::test_util::record;

    #[test]
    fn names_and_values_in_source_order() {
        let events = record("<a b=c d=\"e\">");
        let interesting: Vec<&String> = events
            .iter()
            .filter(|e| e.starts_with("Attr") || e.starts_with("Open"))
            .collect();
        assert_eq!(
            interesting,
            vec![
                "OpenTagName(a)",
                "AttrName(b)",
                "AttrValue(c)",
                "AttrName(d)",
                "AttrValue(\"e\")",
                "OpenTag(a)",
            ],
            "{events:?}"
        );
    }

    #[test]
    fn bound_attribute_value() {
        let events = record("<a b:=c>");
        assert!(events.contains(&"AttrValue(bound c)".to_string()), "{events:?}");
    }

    #[test]
    fn spread_attribute() {
        let events = record("<a ...rest>");
        assert!(events.contains(&"AttrSpread(rest)".to_string()), "{events:?}");
        assert!(
            !events.iter().any(|e| e.starts_with("AttrName")),
            "spread has no name event: {events:?}"
        );
    }

    #[test]
    fn argument_is_emitted_when_no_block_follows() {
        let events = record("<a if(x > 1) b=2>");
        assert!(events.contains(&"AttrName(if)".to_string()), "{events:?}");
        assert!(events.contains(&"AttrArgs(x > 1)".to_string()), "{events:?}");
        assert!(events.contains(&"AttrName(b)".to_string()), "{events:?}");
    }

    #[test]
    fn method_shorthand_keeps_params_and_body() {
        let events = record("<a on-click() { doThing() }>");
        assert!(events.contains(&"AttrName(on-click)".to_string()), "{events:?}");
        assert!(
            events.contains(&"AttrMethod((), doThing())".to_string()),
            "{events:?}"
        );
        assert!(
            !events.iter().any(|e| e.starts_with("AttrArgs")),
            "method params must not double as an args event: {events:?}"
        );
    }

    #[test]
    fn second_argument_is_rejected() {
        let events = record("<a b(1)(2)>");
        assert!(
            events
                .iter()
                .any(|e| e.starts_with("Error(ILLEGAL_ATTRIBUTE_ARGUMENT")),
            "{events:?}"
        );
    }

    #[test]
    fn empty_value_is_rejected() {
        let events = record("<a b=>");
        assert!(
            events
                .iter()
                .any(|e| e.starts_with("Error(ILLEGAL_ATTRIBUTE_VALUE")),
            "{events:?}"
        );
    }

    #[test]
    fn argument_after_value_trigger_stays_with_attribute() {
        let events = record("<a b(x)=1>");
        assert!(events.contains(&"AttrArgs(x)".to_string()), "{events:?}");
        assert!(events.contains(&"AttrValue(1)".to_string()), "{events:?}");
    }

    #[test]
    fn whitespace_around_equals_is_tolerated() {
        let events = record("<a b = c>");
        assert!(events.contains(&"AttrValue(c)".to_string()), "{events:?}");
    }
}
