//! Event recording and snapshot helpers for `tpl` tests.
//!
//! The recorder formats every parse event into a flat snapshot string with
//! spans resolved against the source, so tests assert on readable sequences
//! instead of raw byte offsets.

use tpl::{
    AttrMethod, AttrValue, CloseTag, Handler, OpenTag, OpenTagName, ParseError, ParseOptions,
    Placeholder, Scriptlet, Span, TagState, ValueSpan,
};

/// Records one line per event. Marks `script`/`textarea` bodies as parsed
/// text and `style` bodies as static text, standing in for a consumer's
/// raw-tag policy.
pub struct Recorder {
    source: String,
    pub events: Vec<String>,
    pub finished: bool,
}

impl Recorder {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            events: Vec::new(),
            finished: false,
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
            let id = self.text(id).to_string();
            rendered.push('#');
            rendered.push_str(&id);
        }
        for class in &name.shorthand_class_names {
            let class = self.text(*class).to_string();
            rendered.push('.');
            rendered.push_str(&class);
        }
        rendered.push(')');
        self.events.push(rendered);
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

    fn on_finish(&mut self) {
        self.finished = true;
    }
}

/// Parse `source` and return the formatted event sequence.
pub fn record(source: &str) -> Vec<String> {
    let mut recorder = Recorder::new(source);
    tpl::parse(source, &mut recorder);
    recorder.events
}

/// A handler that captures raw event spans for offset-level assertions.
#[derive(Default)]
pub struct SpanCollector {
    pub spans: Vec<(String, Span)>,
    pub errors: Vec<ParseError>,
}

impl Handler for SpanCollector {
    fn on_text(&mut self, text: Span) {
        self.spans.push(("text".into(), text));
    }

    fn on_placeholder(&mut self, placeholder: &Placeholder) {
        self.spans.push(("placeholder".into(), placeholder.span));
    }

    fn on_open_tag_name(&mut self, name: &OpenTagName) -> ParseOptions {
        self.spans.push(("open_tag_name".into(), name.span));
        ParseOptions::default()
    }

    fn on_open_tag(&mut self, tag: &OpenTag) {
        self.spans.push(("open_tag".into(), tag.span));
    }

    fn on_close_tag(&mut self, tag: &CloseTag) {
        self.spans.push(("close_tag".into(), tag.span));
    }

    fn on_attr_name(&mut self, name: Span) {
        self.spans.push(("attr_name".into(), name));
    }

    fn on_attr_value(&mut self, value: &AttrValue) {
        self.spans.push(("attr_value".into(), value.span));
    }

    fn on_error(&mut self, error: &ParseError) {
        self.errors.push(error.clone());
    }
}
