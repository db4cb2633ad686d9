//! Streaming tokenizer for an HTML-superset templating language.
//!
//! The parser consumes a complete source buffer and synchronously invokes a
//! [`Handler`] with range-tagged events (open tags, attributes, text,
//! placeholders, comments, errors, ...). It recognizes two surface syntaxes
//! (an angle-bracket "verbose" mode and an indentation-sensitive "concise"
//! mode) and embedded C-family expression fragments whose lexical rules
//! decide when an HTML-significant byte actually terminates a fragment.
//!
//! Invariants:
//! - Zero-copy: events carry byte spans into the caller's buffer; the parser
//!   never materializes substrings on the hot path.
//! - Ordering: handler invocations observe strict source order; a parent
//!   event fires after all of its inner events.
//! - One-shot errors: after the first `on_error` no handler other than
//!   `on_finish` is invoked, and [`parse`] returns normally.
//!
//! ```
//! use tpl::{parse, Handler, Span};
//!
//! struct TextCollector(Vec<Span>);
//!
//! impl Handler for TextCollector {
//!     fn on_text(&mut self, text: Span) {
//!         self.0.push(text);
//!     }
//! }
//!
//! let source = "div\n  span -- hello";
//! let mut collector = TextCollector(Vec::new());
//! parse(source, &mut collector);
//! assert_eq!(collector.0.len(), 1);
//! assert_eq!(collector.0[0].of(source), "hello");
//! ```

pub mod chars;
mod error;
mod events;
mod parser;
mod span;

pub use error::{ErrorCode, ParseError};
pub use events::{
    AttrMethod, AttrValue, Attribute, BodyMode, CloseTag, Handler, OpenTag, OpenTagName,
    ParseOptions, Placeholder, Scriptlet, TagEnding, TagState,
};
pub use parser::{parse, ParserStats};
pub use span::{Span, ValueSpan};
