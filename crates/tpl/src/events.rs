//! Parse events and the handler table.
//!
//! Events carry byte spans only; resolving them against the source is the
//! consumer's job. Handler invocations are strictly source-ordered and a
//! parent event fires after all of its inner events (attribute events precede
//! the enclosing open-tag event).

use crate::error::ParseError;
use crate::span::{Span, ValueSpan};

/// How a tag's body is lexed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BodyMode {
    /// Regular HTML content: nested tags, text, placeholders.
    #[default]
    Html,
    /// Raw text with placeholders; only the matching close tag ends it.
    ParsedText,
    /// Raw text without placeholders.
    StaticText,
    /// Raw character data (treated as static text).
    Cdata,
}

/// How an open tag ended.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TagEnding {
    /// Normal open tag; a body and close tag may follow.
    #[default]
    Tag,
    /// Concise tag marked with a trailing `/`: no body allowed.
    OpenOnly,
    /// Verbose tag ended with `/>`.
    SelfClosed,
}

/// Body-state override returned from `Handler::on_open_tag_name`.
///
/// This is how a consumer marks `script`/`style`-like tags without the parser
/// carrying a tag-name policy of its own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub state: Option<TagState>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagState {
    /// Body is raw text in which placeholders are still recognized.
    ParsedText,
    /// Body is raw text, nothing recognized.
    StaticText,
}

/// `${…}` / `$!{…}` in text content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placeholder {
    pub span: Span,
    pub value: Span,
    /// `true` for `${…}`, `false` for the non-escaping `$!{…}` form.
    pub escape: bool,
}

/// Fired as soon as the tag-name section (name plus `#id`/`.class`
/// shorthands) is complete, before any attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenTagName {
    pub span: Span,
    /// Zero-width when the tag starts directly with a shorthand.
    pub tag_name: Span,
    pub shorthand_id: Option<Span>,
    pub shorthand_class_names: Vec<Span>,
    pub concise: bool,
}

/// Attribute summary carried on the open-tag event. The individual attribute
/// events have already fired by the time this is delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attribute {
    /// Zero-width for the defaulted (nameless) attribute.
    pub name: Span,
    pub value: Option<ValueSpan>,
    pub args: Option<ValueSpan>,
    pub bound: bool,
    pub spread: bool,
    pub method: bool,
    pub default: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenTag {
    pub span: Span,
    pub tag_name: Span,
    pub var: Option<Span>,
    pub argument: Option<ValueSpan>,
    pub params: Option<ValueSpan>,
    pub attributes: Vec<Attribute>,
    pub concise: bool,
    pub open_tag_only: bool,
    pub self_closed: bool,
    pub shorthand_id: Option<Span>,
    pub shorthand_class_names: Vec<Span>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CloseTag {
    /// Zero-width for closes synthesized by concise dedent or EOF.
    pub span: Span,
    pub tag_name: Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttrValue {
    pub span: Span,
    pub value: Span,
    /// `true` when introduced by `:=`.
    pub bound: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttrMethod {
    pub span: Span,
    pub params: Option<ValueSpan>,
    pub body: ValueSpan,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scriptlet {
    pub span: Span,
    pub value: Span,
    /// `true` for the `<?…?>` form, `false` for concise `$ …` lines.
    pub tag: bool,
    /// `true` for the concise `$ { … }` block form.
    pub block: bool,
}

/// Typed callback table. Every method has a no-op default so consumers
/// implement only what they observe.
pub trait Handler {
    fn on_text(&mut self, _text: Span) {}
    fn on_placeholder(&mut self, _placeholder: &Placeholder) {}

    /// May return body-state options for the tag that was just named; the
    /// parser honors them for the remainder of the tag body.
    fn on_open_tag_name(&mut self, _name: &OpenTagName) -> ParseOptions {
        ParseOptions::default()
    }
    fn on_open_tag(&mut self, _tag: &OpenTag) {}
    fn on_close_tag(&mut self, _tag: &CloseTag) {}

    fn on_attr_name(&mut self, _name: Span) {}
    fn on_attr_args(&mut self, _args: &ValueSpan) {}
    fn on_attr_value(&mut self, _value: &AttrValue) {}
    fn on_attr_spread(&mut self, _spread: &AttrValue) {}
    fn on_attr_method(&mut self, _method: &AttrMethod) {}

    fn on_comment(&mut self, _comment: &ValueSpan) {}
    fn on_cdata(&mut self, _cdata: &ValueSpan) {}
    fn on_doctype(&mut self, _doctype: &ValueSpan) {}
    fn on_declaration(&mut self, _declaration: &ValueSpan) {}
    fn on_scriptlet(&mut self, _scriptlet: &Scriptlet) {}

    fn on_error(&mut self, _error: &ParseError) {}
    fn on_finish(&mut self) {}
}
