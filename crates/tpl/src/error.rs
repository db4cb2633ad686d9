//! Parse errors.
//!
//! The parser is single-shot: the first error latches, every later handler
//! invocation except `on_finish` is suppressed, and `parse` returns normally
//! after the state stack unwinds.

use crate::span::Span;

/// Stable error identifiers. `as_str` yields the wire-level constant names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    MalformedOpenTag,
    InvalidExpression,
    IllegalAttributeArgument,
    IllegalAttributeValue,
    BadIndentation,
    InvalidBody,
    IllegalLineStart,
    InvalidCharacter,
    MalformedPlaceholder,
    MalformedCdata,
    MalformedComment,
    MalformedDocumentType,
    MalformedDeclaration,
    MalformedScriptlet,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MalformedOpenTag => "MALFORMED_OPEN_TAG",
            ErrorCode::InvalidExpression => "INVALID_EXPRESSION",
            ErrorCode::IllegalAttributeArgument => "ILLEGAL_ATTRIBUTE_ARGUMENT",
            ErrorCode::IllegalAttributeValue => "ILLEGAL_ATTRIBUTE_VALUE",
            ErrorCode::BadIndentation => "BAD_INDENTATION",
            ErrorCode::InvalidBody => "INVALID_BODY",
            ErrorCode::IllegalLineStart => "ILLEGAL_LINE_START",
            ErrorCode::InvalidCharacter => "INVALID_CHARACTER",
            ErrorCode::MalformedPlaceholder => "MALFORMED_PLACEHOLDER",
            ErrorCode::MalformedCdata => "MALFORMED_CDATA",
            ErrorCode::MalformedComment => "MALFORMED_COMMENT",
            ErrorCode::MalformedDocumentType => "MALFORMED_DOCUMENT_TYPE",
            ErrorCode::MalformedDeclaration => "MALFORMED_DECLARATION",
            ErrorCode::MalformedScriptlet => "MALFORMED_SCRIPTLET",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error payload delivered through `Handler::on_error`.
///
/// `span.end` is clamped to the source length; for EOF errors `span.start`
/// names the outermost unterminated construct.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub code: ErrorCode,
    pub span: Span,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_names_are_stable() {
        assert_eq!(ErrorCode::MalformedOpenTag.as_str(), "MALFORMED_OPEN_TAG");
        assert_eq!(ErrorCode::BadIndentation.as_str(), "BAD_INDENTATION");
        assert_eq!(
            ErrorCode::IllegalAttributeArgument.to_string(),
            "ILLEGAL_ATTRIBUTE_ARGUMENT"
        );
    }
}
