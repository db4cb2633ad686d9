//! Embedded-language expression scanning.
//!
//! An expression consumes a maximal fragment, respecting bracket nesting and
//! string/comment/regex lexemes. Terminator and operator checks apply only at
//! group depth zero; whitespace inside a group is consumed silently.
//! Entry contract: the parent configures the frame and does not consume the
//! first expression byte, so the first `char` dispatch sees it.

use crate::chars;
use crate::error::ErrorCode;
use crate::events::Handler;

use super::frames::{ExprData, FrameData, RegexData, StrData, Term};
use super::{operators, Parser};

impl<H: Handler> Parser<'_, '_, H> {
    pub(super) fn enter_expression(&mut self, data: ExprData) {
        self.push_frame(FrameData::Expr(data));
    }

    fn expr_flags(&mut self) -> (bool, bool, bool, bool, bool, &'static [Term], usize) {
        let frame = self.top();
        let start = frame.start;
        let FrameData::Expr(e) = &frame.data else {
            debug_assert!(false, "expr hook on non-expr frame");
            return (true, false, false, false, false, &[], 0);
        };
        (
            e.group_stack.is_empty(),
            e.terminated_by_whitespace,
            e.terminated_by_eol,
            e.skip_operators,
            e.concise,
            e.terminators,
            start,
        )
    }

    pub(super) fn expr_char(&mut self, code: u8) {
        let (depth0, by_ws, _, skip_ops, concise, terms, start) = self.expr_flags();

        if depth0 {
            if chars::is_inline_whitespace(code) {
                if !by_ws {
                    self.pos += 1;
                } else if skip_ops {
                    self.exit_state();
                } else {
                    match operators::continuation(self.data, self.pos, start, concise) {
                        Some(len) => self.pos += len,
                        None => self.exit_state(),
                    }
                }
                return;
            }
            if self.terminator_matches(terms) {
                self.exit_state();
                return;
            }
        }

        match code {
            chars::DOUBLE_QUOTE | chars::SINGLE_QUOTE => {
                self.push_frame(FrameData::Str(StrData { quote: code }));
                self.pos += 1;
            }
            chars::BACKTICK => {
                self.push_frame(FrameData::TemplateString);
                self.pos += 1;
            }
            chars::FORWARD_SLASH => match self.peek(1) {
                Some(chars::FORWARD_SLASH) => {
                    self.push_frame(FrameData::LineComment);
                    self.pos += 2;
                }
                Some(chars::ASTERISK) => {
                    self.push_frame(FrameData::BlockComment);
                    self.pos += 2;
                }
                _ => {
                    let division = self
                        .previous_non_whitespace(self.pos)
                        .is_some_and(chars::can_be_followed_by_division);
                    if division {
                        self.pos += 1;
                    } else {
                        self.push_frame(FrameData::Regex(RegexData { in_class: false }));
                        self.pos += 1;
                    }
                }
            },
            _ => {
                if let Some(close) = chars::close_bracket_for(code) {
                    if let FrameData::Expr(e) = &mut self.top().data {
                        e.group_stack.push(close);
                    }
                    self.pos += 1;
                } else if chars::is_close_bracket(code) {
                    let matches_top = match &self.top().data {
                        FrameData::Expr(e) => e.group_stack.last() == Some(&code),
                        _ => false,
                    };
                    if matches_top {
                        if let FrameData::Expr(e) = &mut self.top().data {
                            e.group_stack.pop();
                        }
                        self.pos += 1;
                    } else {
                        self.error_here(ErrorCode::InvalidExpression, "mismatched closing bracket");
                    }
                } else {
                    self.pos += 1;
                }
            }
        }
    }

    pub(super) fn expr_eol(&mut self, len: usize) {
        let (depth0, by_ws, by_eol, skip_ops, concise, _, start) = self.expr_flags();
        if depth0 {
            if by_eol {
                self.exit_state();
                return;
            }
            if by_ws {
                if skip_ops {
                    self.exit_state();
                    return;
                }
                match operators::continuation(self.data, self.pos, start, concise) {
                    Some(consumed) => self.pos += consumed,
                    None => self.exit_state(),
                }
                return;
            }
        }
        self.pos += len;
    }

    pub(super) fn expr_eof(&mut self) {
        let (depth0, by_ws, by_eol, _, _, terms, _) = self.expr_flags();
        if !depth0 {
            self.unterminated_error("expression");
        } else if !by_ws && !by_eol && !terms.is_empty() {
            self.unterminated_error("expression");
        } else {
            self.exit_state();
        }
    }

    fn terminator_matches(&self, terms: &[Term]) -> bool {
        terms.iter().any(|term| match term {
            Term::Code(code) => self.at(self.pos) == Some(*code),
            Term::Seq(seq) => self.starts_with(seq),
        })
    }
}
