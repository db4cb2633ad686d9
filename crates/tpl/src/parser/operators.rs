//! Operator continuation matching.
//!
//! At a whitespace boundary with the group stack empty, an expression keeps
//! scanning only if the bytes around the whitespace form an operator
//! continuation. Two anchored checks implement this, one per direction:
//!
//! - Lookahead: leading whitespace, then a continuation operator, then any
//!   trailing whitespace. Matching consumes the whole run.
//! - Lookbehind: the expression text already ends in a binary/unary operator;
//!   the match is zero-width and only the whitespace run is consumed.
//!
//! Hand-written over the byte buffer rather than compiled patterns: every
//! check is anchored, allocation-free, and branches on at most two bytes of
//! context. The word operators are ASCII-only by design.

use crate::chars::{self, is_identifier, is_whitespace};

/// Operators that continue an expression regardless of surface mode.
const BINARY: &[u8] = b"*%<&^|?:";

/// Keywords that, as a suffix of the expression, promise an operand follows.
const KEYWORDS: &[&[u8]] = &[
    b"in",
    b"instanceof",
    b"async",
    b"await",
    b"class",
    b"function",
    b"new",
    b"typeof",
    b"void",
];

/// Decide whether the expression continues across the whitespace at `at`.
/// Returns the number of bytes to consume (>= 1) or `None` to terminate.
/// `expr_start` bounds the lookbehind; `concise` selects the surface-mode
/// pattern.
pub(crate) fn continuation(
    data: &[u8],
    at: usize,
    expr_start: usize,
    concise: bool,
) -> Option<usize> {
    debug_assert!(
        at < data.len() && is_whitespace(data[at]),
        "continuation must be anchored at a whitespace byte"
    );
    if let Some(len) = look_ahead(data, at, concise) {
        return Some(len);
    }
    if ends_in_operator(&data[expr_start..at], concise) {
        return Some(whitespace_run(data, at));
    }
    None
}

fn whitespace_run(data: &[u8], from: usize) -> usize {
    let mut i = from;
    while i < data.len() && is_whitespace(data[i]) {
        i += 1;
    }
    i - from
}

fn look_ahead(data: &[u8], at: usize, concise: bool) -> Option<usize> {
    let ws_before = whitespace_run(data, at);
    let op_at = at + ws_before;
    let rest = &data[op_at..];
    let first = *rest.first()?;

    // Whitespace followed by a group opener continues the expression, but
    // only the whitespace is consumed so the opener still reaches the group
    // stack.
    if first == chars::OPEN_BRACE
        || first == chars::OPEN_PAREN
        || (concise && first == chars::OPEN_BRACKET)
    {
        return Some(ws_before);
    }

    let op_len = operator_at(rest, concise)?;
    let after = op_at + op_len;
    Some(ws_before + op_len + whitespace_run(data, after))
}

/// Length of a continuation operator anchored at `rest[0]`, if present.
fn operator_at(rest: &[u8], concise: bool) -> Option<usize> {
    let first = rest[0];
    let second = rest.get(1).copied();
    if BINARY.contains(&first) {
        return Some(1);
    }
    match first {
        chars::EQUAL => match second {
            Some(chars::EQUAL) | Some(chars::CLOSE_ANGLE) => Some(2),
            _ => None,
        },
        // Division, never `//`, `/*`, or `/>`.
        chars::FORWARD_SLASH => match second {
            Some(chars::FORWARD_SLASH) | Some(chars::ASTERISK) | Some(chars::CLOSE_ANGLE) => None,
            _ => Some(1),
        },
        // Member access continues only when the dot itself is followed by
        // whitespace; `.name` without whitespace never reaches this path.
        chars::PERIOD => match second {
            Some(code) if is_whitespace(code) => Some(1),
            _ => None,
        },
        chars::PLUS => {
            let mut len = 1;
            while rest.get(len) == Some(&chars::PLUS) {
                len += 1;
            }
            Some(len)
        }
        chars::HYPHEN => {
            if concise && second == Some(chars::HYPHEN) {
                None
            } else {
                Some(1)
            }
        }
        chars::CLOSE_ANGLE => {
            if concise {
                Some(1)
            } else {
                // Verbose mode: a bare `>` closes the tag; only `>=` / `>>`
                // continue, and both bytes are consumed so the trailing `>`
                // is not re-read as a terminator.
                match second {
                    Some(chars::EQUAL) | Some(chars::CLOSE_ANGLE) => Some(2),
                    _ => None,
                }
            }
        }
        b'i' => {
            if rest.starts_with(b"instanceof") && followed_by_whitespace(rest, 10) {
                Some(10)
            } else if rest.starts_with(b"in") && followed_by_whitespace(rest, 2) {
                Some(2)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn followed_by_whitespace(rest: &[u8], at: usize) -> bool {
    matches!(rest.get(at), Some(&code) if is_whitespace(code))
}

/// Lookbehind: does the expression text end in an operator that promises an
/// operand?
fn ends_in_operator(text: &[u8], concise: bool) -> bool {
    let Some(&last) = text.last() else {
        return false;
    };
    match last {
        b'*' | b'%' | b'<' | b'&' | b'^' | b'|' | b'?' | b':' | b'/' | b'.' | b'!' => true,
        // Compound comparisons and arrows; a bare `=` is not a continuation.
        chars::EQUAL => matches!(
            prev(text),
            Some(chars::EQUAL) | Some(b'<') | Some(b'>') | Some(b'!')
        ),
        // Mirrors the lookahead arm (`=>` and `>>`). In verbose mode a bare
        // `>` is a hard terminator in every whitespace-terminated context, so
        // the `>>` case is defensive symmetry only.
        chars::CLOSE_ANGLE => {
            concise || matches!(prev(text), Some(chars::EQUAL) | Some(chars::CLOSE_ANGLE))
        }
        chars::PLUS => prev(text) != Some(chars::PLUS),
        chars::HYPHEN => prev(text) != Some(chars::HYPHEN),
        _ => ends_in_keyword(text),
    }
}

fn prev(text: &[u8]) -> Option<u8> {
    text.len().checked_sub(2).map(|i| text[i])
}

fn ends_in_keyword(text: &[u8]) -> bool {
    KEYWORDS.iter().any(|kw| {
        text.ends_with(kw)
            && (text.len() == kw.len() || !is_identifier(text[text.len() - kw.len() - 1]))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cont(source: &str, at: usize, concise: bool) -> Option<usize> {
        continuation(source.as_bytes(), at, 0, concise)
    }

    #[test]
    fn binary_operator_across_whitespace() {
        // "1 + 2": whitespace, operator, whitespace all consumed.
        assert_eq!(cont("1 + 2", 1, false), Some(3));
        assert_eq!(cont("1 * 2", 1, true), Some(3));
    }

    #[test]
    fn plus_runs_and_tight_operands() {
        assert_eq!(cont("1 +2", 1, false), Some(2));
        assert_eq!(cont("a ++ b", 1, false), Some(4));
    }

    #[test]
    fn lookbehind_consumes_only_whitespace() {
        // "1+ 2": the text before the space ends in `+`.
        assert_eq!(cont("1+ 2", 2, false), Some(1));
        assert_eq!(cont("1/ 2", 2, false), Some(1));
        assert_eq!(cont("new x", 3, false), Some(1));
    }

    #[test]
    fn postfix_increment_is_not_a_continuation() {
        assert_eq!(cont("i++ j", 3, false), None);
        assert_eq!(cont("i-- j", 3, false), None);
    }

    #[test]
    fn identifier_suffix_is_not_a_keyword() {
        // "renew" ends with "new" but is a plain identifier.
        assert_eq!(cont("renew x", 5, false), None);
        assert_eq!(cont("margin x", 6, false), None);
    }

    #[test]
    fn word_operators_need_trailing_whitespace() {
        assert_eq!(cont("a in b", 1, false), Some(4));
        assert_eq!(cont("a instanceof b", 1, false), Some(12));
        assert_eq!(cont("a int", 1, false), None);
    }

    #[test]
    fn division_never_matches_comment_or_tag_close() {
        assert_eq!(cont("1 / 2", 1, false), Some(3));
        assert_eq!(cont("1 // x", 1, false), None);
        assert_eq!(cont("1 /* x", 1, false), None);
        assert_eq!(cont("x />", 1, false), None);
    }

    #[test]
    fn angle_continuation_is_mode_sensitive() {
        // Verbose mode reserves bare `>` for the tag; compounds continue.
        assert_eq!(cont("a > b", 1, false), None);
        assert_eq!(cont("a >= b", 1, false), Some(4));
        assert_eq!(cont("a > b", 1, true), Some(3));
        assert_eq!(cont("a < b", 1, false), Some(3));
    }

    #[test]
    fn hyphen_is_not_doubled_in_concise_mode() {
        assert_eq!(cont("a - b", 1, true), Some(3));
        assert_eq!(cont("a -- b", 1, true), None);
        assert_eq!(cont("a - b", 1, false), Some(3));
    }

    #[test]
    fn group_opener_consumes_only_leading_whitespace() {
        assert_eq!(cont("f (x)", 1, false), Some(1));
        assert_eq!(cont("f {x}", 1, false), Some(1));
        assert_eq!(cont("f [x]", 1, true), Some(1));
        assert_eq!(cont("f [x]", 1, false), None);
    }

    #[test]
    fn arrow_and_equality_compounds() {
        assert_eq!(cont("a == b", 1, false), Some(4));
        assert_eq!(cont("a => b", 1, false), Some(4));
        assert_eq!(cont("x = y", 1, false), None);
        assert_eq!(cont("a != b", 4, false), Some(1));
    }

    #[test]
    fn dot_requires_trailing_whitespace() {
        assert_eq!(cont("a . b", 1, false), Some(3));
        assert_eq!(cont("a .5", 1, false), None);
    }
}
