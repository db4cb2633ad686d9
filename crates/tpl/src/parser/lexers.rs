//! Embedded-language sub-lexers: strings, template strings, regular
//! expressions, and comments.
//!
//! Entry contract: the parent pushes the frame at the opening delimiter and
//! consumes the delimiter itself (two bytes for `//` and `/*`), so the first
//! `char` dispatch sees the byte after it.

use memchr::{memchr, memchr2, memchr3, memmem};

use crate::chars;
use crate::events::Handler;

use super::frames::{FrameData, StateKind};
use super::Parser;

impl<H: Handler> Parser<'_, '_, H> {
    pub(super) fn string_char(&mut self, code: u8) {
        let quote = match &self.top().data {
            FrameData::Str(s) => s.quote,
            _ => return,
        };
        if code == quote {
            self.pos += 1;
            self.exit_state();
        } else if code == chars::BACKSLASH {
            self.pos = (self.pos + 2).min(self.max_pos);
        } else {
            self.pos += 1;
            let rest = &self.data[self.pos..];
            let mut stop = rest.len();
            if let Some(found) = memchr3(quote, chars::BACKSLASH, chars::NEWLINE, rest) {
                stop = found;
            }
            if let Some(found) = memchr(chars::CARRIAGE_RETURN, rest) {
                stop = stop.min(found);
            }
            self.pos += stop;
        }
    }

    pub(super) fn template_char(&mut self, code: u8) {
        match code {
            chars::BACKTICK => {
                self.pos += 1;
                self.exit_state();
            }
            chars::BACKSLASH => {
                self.pos = (self.pos + 2).min(self.max_pos);
            }
            chars::DOLLAR if self.peek(1) == Some(chars::OPEN_BRACE) => {
                self.pos += 2;
                self.enter_expression(super::frames::ExprData {
                    group_stack: Vec::new(),
                    terminators: super::frames::CLOSE_BRACE_TERMINATOR,
                    terminated_by_whitespace: false,
                    terminated_by_eol: false,
                    skip_operators: false,
                    concise: false,
                });
            }
            _ => {
                self.pos += 1;
                let rest = &self.data[self.pos..];
                let stop = memchr3(chars::BACKTICK, chars::BACKSLASH, chars::DOLLAR, rest)
                    .unwrap_or(rest.len());
                self.pos += stop;
            }
        }
    }

    /// The inner `${…}` expression exits at the closing brace without
    /// consuming it.
    pub(super) fn template_return(&mut self, child: super::frames::Frame) {
        debug_assert_eq!(child.kind, StateKind::Expr);
        debug_assert_eq!(self.at(self.pos), Some(chars::CLOSE_BRACE));
        if self.at(self.pos) == Some(chars::CLOSE_BRACE) {
            self.pos += 1;
        }
    }

    pub(super) fn regex_char(&mut self, code: u8) {
        let in_class = match &self.top().data {
            FrameData::Regex(r) => r.in_class,
            _ => return,
        };
        match code {
            chars::BACKSLASH => {
                self.pos = (self.pos + 2).min(self.max_pos);
            }
            chars::OPEN_BRACKET => {
                if let FrameData::Regex(r) = &mut self.top().data {
                    r.in_class = true;
                }
                self.pos += 1;
            }
            chars::CLOSE_BRACKET => {
                if let FrameData::Regex(r) = &mut self.top().data {
                    r.in_class = false;
                }
                self.pos += 1;
            }
            chars::FORWARD_SLASH if !in_class => {
                self.pos += 1;
                while self.pos < self.max_pos && self.data[self.pos].is_ascii_alphabetic() {
                    self.pos += 1;
                }
                self.exit_state();
            }
            _ => {
                self.pos += 1;
            }
        }
    }

    pub(super) fn line_comment_char(&mut self, _code: u8) {
        self.pos += 1;
        let rest = &self.data[self.pos..];
        let stop = memchr2(chars::CARRIAGE_RETURN, chars::NEWLINE, rest).unwrap_or(rest.len());
        self.pos += stop;
    }

    pub(super) fn block_comment_char(&mut self, _code: u8) {
        match memmem::find(&self.data[self.pos..], b"*/") {
            Some(found) => {
                self.pos += found + 2;
                self.exit_state();
            }
            None => {
                // Unterminated; EOF reporting happens in the eof hook.
                self.pos = self.max_pos;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::test_util::record;

    #[test]
    fn quoted_value_keeps_delimiters_and_escapes() {
        let events = record(r#"<a b="e \" f">"#);
        assert!(
            events.contains(&r#"AttrValue("e \" f")"#.to_string()),
            "{events:?}"
        );
    }

    #[test]
    fn single_quotes_behave_like_double_quotes() {
        let events = record("<a b='x > y'>");
        assert!(
            events.contains(&"AttrValue('x > y')".to_string()),
            "angle bracket inside a string must not close the tag: {events:?}"
        );
    }

    #[test]
    fn unterminated_string_at_end_of_line_is_reported() {
        let events = record("<a b=\"hi\nc=2>");
        assert!(
            events
                .iter()
                .any(|e| e.starts_with("Error(MALFORMED_OPEN_TAG")),
            "{events:?}"
        );
        // Single-shot: nothing after the error but the implicit finish.
        assert!(
            events.last().unwrap().starts_with("Error("),
            "{events:?}"
        );
    }

    #[test]
    fn template_strings_span_lines() {
        let events = record("<a b=`x\ny` c=1>");
        assert!(
            events.contains(&"AttrValue(`x\ny`)".to_string()),
            "{events:?}"
        );
        assert!(events.contains(&"AttrValue(1)".to_string()), "{events:?}");
    }

    #[test]
    fn regex_character_class_hides_slash() {
        let events = record("<a b=/[/]x/g>");
        assert!(
            events.contains(&"AttrValue(/[/]x/g)".to_string()),
            "slash inside a character class must not end the regex: {events:?}"
        );
    }

    #[test]
    fn unterminated_block_comment_is_malformed_comment() {
        let events = record("div a=1 /* never closed");
        assert!(
            events
                .iter()
                .any(|e| e.starts_with("Error(MALFORMED_COMMENT")),
            "{events:?}"
        );
    }
}
