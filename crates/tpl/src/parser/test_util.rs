//! In-crate event recording for unit tests.
//!
//! Formats every event into a snapshot string with spans resolved against the
//! source, so tests compare flat string sequences instead of raw offsets.
//! Integration tests use the `tpl_test_support` crate, which provides the
//! same shape against the public API.

use crate::error::ParseError;
use crate::events::{
    AttrMethod, AttrValue, CloseTag, Handler, OpenTag, OpenTagName, ParseOptions, Placeholder,
    Scriptlet, TagState,
};
use crate::span::{Span, ValueSpan};

pub(crate) struct Recorder {
    source: String,
    pub events: Vec<String>,
}

impl Recorder {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            events: Vec::new(),
        }
    }

    fn text(&self, span: Span) -> &str {
        span.of(&self.source)
    }
}

impl Handler for Recorder {
    fn on_text(&mut self, text: Span) {
        let event = format!("Text({})", self.text(text));
        self.events.push(event);
    }

    fn on_placeholder(&mut self, placeholder: &Placeholder) {
        let bang = if placeholder.escape { "" } else { "!" };
        let event = format!("Placeholder({bang}{})", self.text(placeholder.value));
        self.events.push(event);
    }

    fn on_open_tag_name(&mut self, name: &OpenTagName) -> ParseOptions {
        let mut rendered = format!("OpenTagName({}", self.text(name.tag_name));
        if let Some(id) = name.shorthand_id {
            rendered.push('#');
            rendered.push_str(self.text(id).to_string().as_str());
        }
        for class in &name.shorthand_class_names {
            rendered.push('.');
            rendered.push_str(self.text(*class).to_string().as_str());
        }
        rendered.push(')');
        self.events.push(rendered);
        // Stand-in for a consumer's raw-tag policy.
        let state = match self.text(name.tag_name) {
            "script" | "textarea" => Some(TagState::ParsedText),
            "style" => Some(TagState::StaticText),
            _ => None,
        };
        ParseOptions { state }
    }

    fn on_open_tag(&mut self, tag: &OpenTag) {
        let mut rendered = format!("OpenTag({}", self.text(tag.tag_name));
        if let Some(var) = tag.var {
            rendered.push_str(&format!(" /{}", self.text(var)));
        }
        if let Some(argument) = tag.argument {
            rendered.push_str(&format!(" {}", self.text(argument.span)));
        }
        if let Some(params) = tag.params {
            rendered.push_str(&format!(" |{}|", self.text(params.value)));
        }
        if tag.self_closed {
            rendered.push_str(" selfClosed");
        }
        if tag.open_tag_only {
            rendered.push_str(" openTagOnly");
        }
        rendered.push(')');
        self.events.push(rendered);
    }

    fn on_close_tag(&mut self, tag: &CloseTag) {
        let event = format!("CloseTag({})", self.text(tag.tag_name));
        self.events.push(event);
    }

    fn on_attr_name(&mut self, name: Span) {
        let event = format!("AttrName({})", self.text(name));
        self.events.push(event);
    }

    fn on_attr_args(&mut self, args: &ValueSpan) {
        let event = format!("AttrArgs({})", self.text(args.value));
        self.events.push(event);
    }

    fn on_attr_value(&mut self, value: &AttrValue) {
        let bound = if value.bound { "bound " } else { "" };
        let event = format!("AttrValue({bound}{})", self.text(value.value));
        self.events.push(event);
    }

    fn on_attr_spread(&mut self, spread: &AttrValue) {
        let event = format!("AttrSpread({})", self.text(spread.value));
        self.events.push(event);
    }

    fn on_attr_method(&mut self, method: &AttrMethod) {
        let params = method
            .params
            .map(|p| self.text(p.span).to_string())
            .unwrap_or_default();
        let body = self.text(method.body.value).trim().to_string();
        self.events.push(format!("AttrMethod({params}, {body})"));
    }

    fn on_comment(&mut self, comment: &ValueSpan) {
        let event = format!("Comment({})", self.text(comment.value));
        self.events.push(event);
    }

    fn on_cdata(&mut self, cdata: &ValueSpan) {
        let event = format!("CData({})", self.text(cdata.value));
        self.events.push(event);
    }

    fn on_doctype(&mut self, doctype: &ValueSpan) {
        let event = format!("Doctype({})", self.text(doctype.value));
        self.events.push(event);
    }

    fn on_declaration(&mut self, declaration: &ValueSpan) {
        let event = format!("Declaration({})", self.text(declaration.value));
        self.events.push(event);
    }

    fn on_scriptlet(&mut self, scriptlet: &Scriptlet) {
        let flavor = if scriptlet.tag {
            "tag "
        } else if scriptlet.block {
            "block "
        } else {
            ""
        };
        let event = format!("Scriptlet({flavor}{})", self.text(scriptlet.value));
        self.events.push(event);
    }

    fn on_error(&mut self, error: &ParseError) {
        self.events
            .push(format!("Error({}: {})", error.code, error.message));
    }
}

/// Parse and return the formatted event sequence.
pub(crate) fn record(source: &str) -> Vec<String> {
    let mut recorder = Recorder::new(source);
    crate::parser::parse(source, &mut recorder);
    recorder.events
}
