//! State stack frames.
//!
//! One frame per lexical context, laid out as a shared header (discriminator,
//! parent discriminator, start/end offsets) plus a variant payload. The parent
//! discriminator is stored rather than derived so `return`/EOF paths can name
//! the parent without traversing the stack.

use crate::chars;
use crate::events::{Attribute, BodyMode, TagEnding};
use crate::span::{Span, ValueSpan};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StateKind {
    ConciseContent,
    HtmlContent,
    DelimitedHtmlBlock,
    OpenTag,
    TagName,
    Attr,
    Expr,
    Str,
    TemplateString,
    Regex,
    LineComment,
    BlockComment,
    Placeholder,
    Cdata,
    HtmlComment,
    Doctype,
    Declaration,
    Scriptlet,
    InlineScript,
    RawText,
}

#[derive(Debug)]
pub(crate) struct Frame {
    pub kind: StateKind,
    /// Discriminator of the frame below this one (self for the root).
    pub parent: StateKind,
    pub start: usize,
    /// Stamped by `exit_state`; tracks `start` until then.
    pub end: usize,
    pub data: FrameData,
}

#[derive(Debug)]
pub(crate) enum FrameData {
    ConciseContent(ConciseContentData),
    HtmlContent(HtmlContentData),
    DelimitedHtmlBlock(DelimitedHtmlBlockData),
    OpenTag(OpenTagData),
    TagName(TagNameData),
    Attr(AttrData),
    Expr(ExprData),
    Str(StrData),
    TemplateString,
    Regex(RegexData),
    LineComment,
    BlockComment,
    Placeholder(PlaceholderData),
    Cdata,
    HtmlComment,
    Doctype,
    Declaration,
    Scriptlet,
    InlineScript(InlineScriptData),
    RawText(RawTextData),
}

impl FrameData {
    pub fn kind(&self) -> StateKind {
        match self {
            FrameData::ConciseContent(_) => StateKind::ConciseContent,
            FrameData::HtmlContent(_) => StateKind::HtmlContent,
            FrameData::DelimitedHtmlBlock(_) => StateKind::DelimitedHtmlBlock,
            FrameData::OpenTag(_) => StateKind::OpenTag,
            FrameData::TagName(_) => StateKind::TagName,
            FrameData::Attr(_) => StateKind::Attr,
            FrameData::Expr(_) => StateKind::Expr,
            FrameData::Str(_) => StateKind::Str,
            FrameData::TemplateString => StateKind::TemplateString,
            FrameData::Regex(_) => StateKind::Regex,
            FrameData::LineComment => StateKind::LineComment,
            FrameData::BlockComment => StateKind::BlockComment,
            FrameData::Placeholder(_) => StateKind::Placeholder,
            FrameData::Cdata => StateKind::Cdata,
            FrameData::HtmlComment => StateKind::HtmlComment,
            FrameData::Doctype => StateKind::Doctype,
            FrameData::Declaration => StateKind::Declaration,
            FrameData::Scriptlet => StateKind::Scriptlet,
            FrameData::InlineScript(_) => StateKind::InlineScript,
            FrameData::RawText(_) => StateKind::RawText,
        }
    }
}

#[derive(Debug)]
pub(crate) struct ConciseContentData {
    pub at_line_start: bool,
    pub indent_start: usize,
    /// Start of an inline text run on the current line, if any.
    pub text_start: Option<usize>,
    pub text_placeholders: bool,
}

#[derive(Debug)]
pub(crate) struct HtmlContentData {
    pub text_start: Option<usize>,
    /// Entered from a concise line: exit at end-of-line once the element
    /// depth is back at `base_tags`.
    pub from_concise: bool,
    pub base_tags: usize,
    /// Delimited block form: exit at a line holding the identical dash run at
    /// the identical indent.
    pub delimiter: Option<Delimiter>,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Delimiter {
    pub indent: Span,
    pub dashes: usize,
}

#[derive(Debug)]
pub(crate) struct DelimitedHtmlBlockData {
    pub dashes: usize,
    pub single_line: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TagStage {
    /// Tag-name section still being read.
    Name,
    /// Reading attributes / structural bytes.
    Content,
    /// An expression child is scanning the tag variable.
    Var,
    /// An expression child is scanning the tag argument.
    Argument,
    /// An expression child is scanning the `|…|` parameters.
    Params,
}

#[derive(Debug)]
pub(crate) struct OpenTagData {
    pub tag_name: Span,
    pub shorthand_id: Option<Span>,
    pub shorthand_class_names: Vec<Span>,
    pub var: Option<Span>,
    pub argument: Option<ValueSpan>,
    pub params: Option<ValueSpan>,
    pub attributes: Vec<Attribute>,
    /// Indent of the concise line that opened the tag.
    pub indent: Span,
    pub body_mode: BodyMode,
    pub concise: bool,
    pub in_attr_group: bool,
    /// Concise trailing `/` seen: tag ends as `OpenOnly`.
    pub open_only: bool,
    pub stage: TagStage,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SegKind {
    Base,
    Id,
    Class,
}

#[derive(Debug)]
pub(crate) struct TagNameData {
    pub base: Option<Span>,
    pub shorthand_id: Option<Span>,
    pub classes: Vec<Span>,
    pub seg_start: usize,
    pub seg_kind: SegKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AttrStage {
    Unknown,
    AfterName,
    /// `(…)` closed; deciding between a method block and immediate emission.
    AfterArgument,
}

/// Which expression child the attribute is waiting on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AttrPending {
    None,
    Name,
    Value,
    Argument,
    Block,
}

#[derive(Debug)]
pub(crate) struct AttrData {
    pub stage: AttrStage,
    pub pending: AttrPending,
    pub name: Option<Span>,
    pub value_start: usize,
    pub args: Option<ValueSpan>,
    pub args_emitted: bool,
    pub bound: bool,
    pub spread: bool,
    pub method: bool,
    pub default: bool,
    /// Completed value, kept for the open-tag attribute summary.
    pub value: Option<ValueSpan>,
}

/// Terminator element: a single byte or a multi-byte literal anchored at the
/// current position.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Term {
    Code(u8),
    Seq(&'static [u8]),
}

pub(crate) const ATTR_NAME_TERMINATORS_HTML: &[Term] = &[
    Term::Seq(b"/>"),
    Term::Seq(b":="),
    Term::Code(chars::CLOSE_ANGLE),
    Term::Code(chars::COMMA),
    Term::Code(chars::OPEN_PAREN),
    Term::Code(chars::EQUAL),
];

pub(crate) const ATTR_NAME_TERMINATORS_CONCISE: &[Term] = &[
    Term::Seq(b":="),
    Term::Code(chars::CLOSE_BRACKET),
    Term::Code(chars::SEMICOLON),
    Term::Code(chars::EQUAL),
    Term::Code(chars::COMMA),
    Term::Code(chars::OPEN_PAREN),
];

pub(crate) const ATTR_VALUE_TERMINATORS_HTML: &[Term] = &[
    Term::Seq(b"/>"),
    Term::Code(chars::CLOSE_ANGLE),
    Term::Code(chars::COMMA),
];

pub(crate) const ATTR_VALUE_TERMINATORS_CONCISE: &[Term] = &[
    Term::Code(chars::CLOSE_BRACKET),
    Term::Code(chars::SEMICOLON),
    Term::Code(chars::COMMA),
];

pub(crate) const TAG_VAR_TERMINATORS_HTML: &[Term] = &[
    Term::Seq(b"/>"),
    Term::Seq(b":="),
    Term::Code(chars::CLOSE_ANGLE),
    Term::Code(chars::EQUAL),
    Term::Code(chars::OPEN_PAREN),
    Term::Code(chars::COMMA),
    Term::Code(chars::PIPE),
];

pub(crate) const TAG_VAR_TERMINATORS_CONCISE: &[Term] = &[
    Term::Seq(b":="),
    Term::Code(chars::EQUAL),
    Term::Code(chars::OPEN_PAREN),
    Term::Code(chars::SEMICOLON),
    Term::Code(chars::CLOSE_BRACKET),
    Term::Code(chars::COMMA),
    Term::Code(chars::PIPE),
];

pub(crate) const CLOSE_BRACE_TERMINATOR: &[Term] = &[Term::Code(chars::CLOSE_BRACE)];
pub(crate) const CLOSE_PAREN_TERMINATOR: &[Term] = &[Term::Code(chars::CLOSE_PAREN)];
pub(crate) const PIPE_TERMINATOR: &[Term] = &[Term::Code(chars::PIPE)];
pub(crate) const NO_TERMINATORS: &[Term] = &[];

#[derive(Debug)]
pub(crate) struct ExprData {
    /// Expected closing byte for each open bracket, innermost last.
    pub group_stack: Vec<u8>,
    pub terminators: &'static [Term],
    pub terminated_by_whitespace: bool,
    pub terminated_by_eol: bool,
    pub skip_operators: bool,
    /// Surface mode snapshot taken at entry; selects the operator pattern.
    pub concise: bool,
}

#[derive(Debug)]
pub(crate) struct StrData {
    pub quote: u8,
}

#[derive(Debug)]
pub(crate) struct RegexData {
    pub in_class: bool,
}

#[derive(Debug)]
pub(crate) struct PlaceholderData {
    pub escape: bool,
}

#[derive(Debug)]
pub(crate) struct InlineScriptData {
    pub block: bool,
}

#[derive(Debug)]
pub(crate) struct RawTextData {
    pub parsed: bool,
    pub text_start: Option<usize>,
    pub name: Span,
}

/// Open-element stack entry, recorded when an open tag completes. Drives
/// concise dedent closing, body checks, and raw-body close-tag matching.
#[derive(Debug)]
pub(crate) struct TagEntry {
    pub name: Span,
    pub indent: Span,
    /// Canonical child indent, set by the first nested concise line.
    pub nested_indent: Option<Span>,
    pub body_mode: BodyMode,
    pub ending: TagEnding,
    pub concise: bool,
}
