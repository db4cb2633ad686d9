//! Byte codes and classifier predicates.
//!
//! The tokenizer dispatches on raw bytes. Every byte the state machines care
//! about is ASCII; multi-byte UTF-8 sequences only ever appear inside text and
//! expression runs, where they are consumed opaquely (continuation bytes are
//! >= 0x80 and match none of the significant codes).

pub const TAB: u8 = 0x09;
pub const NEWLINE: u8 = 0x0A;
pub const CARRIAGE_RETURN: u8 = 0x0D;
pub const SPACE: u8 = 0x20;
pub const EXCLAMATION: u8 = 0x21;
pub const DOUBLE_QUOTE: u8 = 0x22;
pub const NUMBER_SIGN: u8 = 0x23;
pub const DOLLAR: u8 = 0x24;
pub const PERCENT: u8 = 0x25;
pub const AMPERSAND: u8 = 0x26;
pub const SINGLE_QUOTE: u8 = 0x27;
pub const OPEN_PAREN: u8 = 0x28;
pub const CLOSE_PAREN: u8 = 0x29;
pub const ASTERISK: u8 = 0x2A;
pub const PLUS: u8 = 0x2B;
pub const COMMA: u8 = 0x2C;
pub const HYPHEN: u8 = 0x2D;
pub const PERIOD: u8 = 0x2E;
pub const FORWARD_SLASH: u8 = 0x2F;
pub const COLON: u8 = 0x3A;
pub const SEMICOLON: u8 = 0x3B;
pub const OPEN_ANGLE: u8 = 0x3C;
pub const EQUAL: u8 = 0x3D;
pub const CLOSE_ANGLE: u8 = 0x3E;
pub const QUESTION: u8 = 0x3F;
pub const OPEN_BRACKET: u8 = 0x5B;
pub const BACKSLASH: u8 = 0x5C;
pub const CLOSE_BRACKET: u8 = 0x5D;
pub const CARET: u8 = 0x5E;
pub const UNDERSCORE: u8 = 0x5F;
pub const BACKTICK: u8 = 0x60;
pub const OPEN_BRACE: u8 = 0x7B;
pub const PIPE: u8 = 0x7C;
pub const CLOSE_BRACE: u8 = 0x7D;

/// Inline whitespace: space or tab. Newlines are routed through the `eol`
/// hooks and are never classified here.
#[inline]
pub fn is_inline_whitespace(code: u8) -> bool {
    code == SPACE || code == TAB
}

/// Any whitespace, including line terminators. Used by the operator
/// continuation matcher, which may consume newlines as part of a match.
#[inline]
pub fn is_whitespace(code: u8) -> bool {
    code == SPACE || code == TAB || code == NEWLINE || code == CARRIAGE_RETURN
}

#[inline]
pub fn is_digit(code: u8) -> bool {
    code.is_ascii_digit()
}

#[inline]
pub fn is_identifier(code: u8) -> bool {
    code.is_ascii_alphanumeric() || code == UNDERSCORE || code == DOLLAR
}

/// Whether a `/` appearing after this byte is the division operator rather
/// than the start of a regular expression literal.
#[inline]
pub fn can_be_followed_by_division(code: u8) -> bool {
    code.is_ascii_alphanumeric()
        || code == PERCENT
        || code == CLOSE_PAREN
        || code == PERIOD
        || code == OPEN_ANGLE
        || code == CLOSE_BRACKET
        || code == CLOSE_BRACE
}

/// Matching close bracket for an expression group opener, if any.
#[inline]
pub fn close_bracket_for(code: u8) -> Option<u8> {
    match code {
        OPEN_PAREN => Some(CLOSE_PAREN),
        OPEN_BRACKET => Some(CLOSE_BRACKET),
        OPEN_BRACE => Some(CLOSE_BRACE),
        _ => None,
    }
}

#[inline]
pub fn is_close_bracket(code: u8) -> bool {
    code == CLOSE_PAREN || code == CLOSE_BRACKET || code == CLOSE_BRACE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_predecessors() {
        for code in [b'a', b'Z', b'0', b')', b']', b'}', b'.', b'%'] {
            assert!(can_be_followed_by_division(code), "{}", code as char);
        }
        for code in [b'=', b'(', b'[', b'{', b'+', b',', b' '] {
            assert!(!can_be_followed_by_division(code), "{}", code as char);
        }
    }

    #[test]
    fn bracket_pairs() {
        assert_eq!(close_bracket_for(OPEN_PAREN), Some(CLOSE_PAREN));
        assert_eq!(close_bracket_for(OPEN_BRACKET), Some(CLOSE_BRACKET));
        assert_eq!(close_bracket_for(OPEN_BRACE), Some(CLOSE_BRACE));
        assert_eq!(close_bracket_for(OPEN_ANGLE), None);
    }
}
