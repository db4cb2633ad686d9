//! End-to-end scenarios over the public API.

use tpl::{parse, ErrorCode, Handler, ParseError};
use tpl_test_support::{record, Recorder, SpanCollector};

fn assert_sequence(events: &[String], expected: &[&str]) {
    let mut remaining = events.iter();
    for needle in expected {
        assert!(
            remaining.any(|e| e == needle),
            "missing {needle} (in order) in {events:?}"
        );
    }
}

#[test]
fn s1_html_attributes() {
    let events = record("<a b=c d=\"e\">");
    assert_sequence(
        &events,
        &[
            "OpenTagName(a)",
            "AttrName(b)",
            "AttrValue(c)",
            "AttrName(d)",
            "AttrValue(\"e\")",
            "OpenTag(a)",
        ],
    );
}

#[test]
fn s2_operator_continuation() {
    let events = record("<a b=1 + 2 c=3>");
    assert_sequence(
        &events,
        &["AttrName(b)", "AttrValue(1 + 2)", "AttrName(c)", "AttrValue(3)"],
    );
}

#[test]
fn s3_method_shorthand() {
    let events = record("<a on-click() { doThing() }>");
    assert_sequence(&events, &["AttrName(on-click)", "AttrMethod((), doThing())"]);
}

#[test]
fn s4_spread() {
    let events = record("<a ...rest>");
    assert_sequence(&events, &["AttrSpread(rest)", "OpenTag(a)"]);
}

#[test]
fn s5_concise_nesting() {
    let events = record("div\n  span hello");
    assert_sequence(
        &events,
        &[
            "OpenTag(div)",
            "OpenTag(span)",
            "Text(hello)",
            "CloseTag(span)",
            "CloseTag(div)",
        ],
    );
}

#[test]
fn s5_inconsistent_sibling_indent_is_rejected() {
    let events = record("div\n  span a=1\n   span b=2\n");
    // The third line is a child of the second span, which is legal; an
    // actually inconsistent sibling dedent must fail.
    assert!(
        !events.iter().any(|e| e.starts_with("Error(")),
        "{events:?}"
    );

    let events = record("div\n  span a=1\n span b=2\n");
    assert!(
        events
            .iter()
            .any(|e| e.starts_with("Error(BAD_INDENTATION")),
        "{events:?}"
    );
}

#[test]
fn s6_placeholder_inside_attribute_template_string() {
    let events = record("<a b=`x${1+2}y`>");
    assert_sequence(&events, &["AttrValue(`x${1+2}y`)", "OpenTag(a)"]);
    assert!(
        !events.iter().any(|e| e.starts_with("Placeholder")),
        "template interpolation is not a placeholder event: {events:?}"
    );
}

#[test]
fn s7_regex_vs_division() {
    assert_sequence(&record("<a b=1/2>"), &["AttrValue(1/2)"]);
    assert_sequence(&record("<a b=/re/gi>"), &["AttrValue(/re/gi)"]);
}

#[test]
fn s8_unterminated_string_describes_the_attribute() {
    let mut collector = SpanCollector::default();
    parse("<a b=\"hi", &mut collector);
    let error = collector.errors.first().expect("an error must be reported");
    assert_eq!(error.code, ErrorCode::MalformedOpenTag);
    assert!(
        error.message.contains("\"b\""),
        "message should name the attribute: {}",
        error.message
    );
    assert_eq!(error.span.start, 0, "error attributes to the open tag");
    assert_eq!(error.span.end, "<a b=\"hi".len());
}

#[test]
fn events_carry_monotonic_well_formed_spans() {
    let source = "div\n  span hello ${name}\n  <em a=1>x</em>\ndiv";
    let mut collector = SpanCollector::default();
    parse(source, &mut collector);
    assert!(collector.errors.is_empty(), "{:?}", collector.errors);
    let mut last_end = 0;
    for (kind, span) in &collector.spans {
        assert!(span.start <= span.end, "{kind} span inverted: {span:?}");
        assert!(span.end <= source.len(), "{kind} span out of bounds");
        // A parent event fires after its inner events, so emission order is
        // non-decreasing in end offsets.
        assert!(
            span.end >= last_end,
            "{kind} emitted out of order: {:?}",
            collector.spans
        );
        last_end = span.end;
    }
}

#[test]
fn text_events_never_overlap() {
    let source = "<a>alpha${x}beta</a>\n<b>gamma</b>";
    let mut collector = SpanCollector::default();
    parse(source, &mut collector);
    let mut last_end = 0;
    for (kind, span) in &collector.spans {
        if kind == "text" {
            assert!(span.start >= last_end, "overlapping text: {:?}", collector.spans);
            last_end = span.end;
        }
    }
}

#[test]
fn error_latch_is_single_shot() {
    struct Latch {
        after_error: usize,
        errors: usize,
        finished: bool,
    }
    impl Handler for Latch {
        fn on_text(&mut self, _text: tpl::Span) {
            if self.errors > 0 {
                self.after_error += 1;
            }
        }
        fn on_error(&mut self, _error: &ParseError) {
            self.errors += 1;
        }
        fn on_finish(&mut self) {
            self.finished = true;
        }
    }
    let mut latch = Latch {
        after_error: 0,
        errors: 0,
        finished: false,
    };
    // The bad indentation is followed by more parseable content.
    parse("div\n  a\n x\nmore text here", &mut latch);
    assert_eq!(latch.errors, 1, "exactly one error");
    assert_eq!(latch.after_error, 0, "no events after the error");
    assert!(latch.finished, "finish still fires");
}

#[test]
fn identical_concise_input_parses_identically() {
    let source = "ul\n  li -- one\n  li -- two\n";
    assert_eq!(record(source), record(source));
}

#[test]
fn finish_fires_on_clean_parse() {
    let mut recorder = Recorder::new("div");
    parse("div", &mut recorder);
    assert!(recorder.finished);
}

#[test]
fn stats_reflect_the_run() {
    let mut recorder = Recorder::new("div\n  span x=1");
    let stats = parse("div\n  span x=1", &mut recorder);
    assert_eq!(stats.bytes, "div\n  span x=1".len());
    assert!(stats.events_emitted > 0);
    assert_eq!(stats.states_entered, stats.states_exited);
    assert_eq!(stats.errors, 0);
}

#[test]
fn mixed_document_round_trip() {
    let source = concat!(
        "<!DOCTYPE html>\n",
        "html\n",
        "  head\n",
        "    title -- Demo\n",
        "  body\n",
        "    <!-- layout -->\n",
        "    div.main#app\n",
        "      p -- Hello ${user.name}!\n",
        "      input value=data.query\n",
        "    $ const total = items.length;\n",
        "    script\n",
        "      - render(${total})\n",
    );
    let events = record(source);
    assert_sequence(
        &events,
        &[
            "Doctype(DOCTYPE html)",
            "OpenTag(html)",
            "OpenTag(head)",
            "Text(Demo)",
            "CloseTag(head)",
            "Comment( layout )",
            "OpenTagName(div#app.main)",
            "Text(Hello )",
            "Placeholder(user.name)",
            "Text(!)",
            "AttrValue(data.query)",
            "OpenTag(input)",
            "Scriptlet(const total = items.length;)",
            "OpenTagName(script)",
            "Placeholder(total)",
            "CloseTag(html)",
        ],
    );
    assert!(!events.iter().any(|e| e.starts_with("Error(")), "{events:?}");
}
