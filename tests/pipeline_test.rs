//! End-to-end pipeline tests
//!
//! Worked scenarios through the public API, plus property tests over random
//! trees for the guarantees the unwrapper and the cleanup pass make.

use article_markdown_converter::node::{Element, Fragment, MarkupNode};
use article_markdown_converter::policy::{self, TagClass};
use article_markdown_converter::postprocess::{continuation_notice, post_process};
use article_markdown_converter::renderer::MarkdownRenderer;
use article_markdown_converter::{MarkdownConverter, sanitize_and_unwrap};
use proptest::prelude::*;

fn el(name: &str) -> Element {
    Element::new(name).expect("valid tag name")
}

fn render_and_clean(fragment: &Fragment, preserve_links: bool) -> String {
    let raw = MarkdownRenderer::new().render(fragment);
    post_process(&raw, preserve_links, 0, "")
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_scenario_nested_divs() {
    let tree = el("div")
        .with_child(
            el("p")
                .with_child(MarkupNode::text("Hello "))
                .with_child(el("b").with_child(MarkupNode::text("world"))),
        )
        .with_child(el("div").with_child(MarkupNode::text("Bye")));

    let sanitized = sanitize_and_unwrap(tree, false);
    assert_eq!(render_and_clean(&sanitized, false), "Hello **world**\n\nBye");

    let converted = MarkdownConverter::new()
        .convert("<div><p>Hello <b>world</b></p><div>Bye</div></div>")
        .expect("conversion succeeds");
    assert_eq!(converted, "Hello **world**\n\nBye");
}

#[test]
fn test_scenario_empty_span() {
    let sanitized = sanitize_and_unwrap(el("span"), false);
    assert!(sanitized.is_empty());
    assert_eq!(render_and_clean(&sanitized, false), "");
}

#[test]
fn test_scenario_link_flattening() {
    assert_eq!(
        post_process("See [here](http://x) and [][ref]", false, 0, ""),
        "See here and"
    );
}

#[test]
fn test_scenario_budget() {
    let input = "abcdefghijklmnopqrst";
    assert_eq!(input.chars().count(), 20);
    assert_eq!(post_process(input, false, 10, "...more"), "abcdefghij...more");
}

#[test]
fn test_scenario_blank_lines() {
    assert_eq!(
        post_process("Para one\n\n\n\n\nPara two", false, 0, ""),
        "Para one\n\nPara two"
    );
}

#[test]
fn test_news_article_body() {
    let html = r#"
        <div class="article-body">
          <header><h1>Storm closes schools</h1><span class="byline">By Staff</span></header>
          <div class="ad"><!-- ad slot --></div>
          <p>Schools across the <a href="/region">region</a> closed on Monday.</p>
          <aside><script>loadWidget()</script></aside>
          <ul class="facts">
            <li>Winds of <strong>90 km/h</strong></li>
            <li>Power cuts in <em>three</em> towns</li>
          </ul>
          <footer><p>Share this story</p></footer>
        </div>"#;

    let markdown = MarkdownConverter::new().convert(html).expect("conversion succeeds");

    assert_eq!(
        markdown,
        "# Storm closes schools\n\nBy Staff\n\nSchools across the region closed on Monday.\n\
         - Winds of **90 km/h**\n\
         - Power cuts in *three* towns\n\nShare this story"
    );
}

#[test]
fn test_script_inside_flattened_link_is_not_text() {
    let markdown = MarkdownConverter::new()
        .convert(r#"<p>Read <a href="/x">more<script>trackClick()</script></a> now</p>"#)
        .expect("conversion succeeds");
    assert_eq!(markdown, "Read more now");
}

#[test]
fn test_source_url_hint_is_appended_once() {
    let hint = continuation_notice("https://news.example/story/42");
    let body = "word ".repeat(50);

    let once = post_process(&body, false, 30, &hint);
    assert!(once.ends_with(&hint));
    assert_eq!(once.matches("[Truncated").count(), 1);
    assert_eq!(post_process(&once, false, 30, &hint), once);
}

// ============================================================================
// Property-Based Tests
// ============================================================================

const TAGS: &[&str] = &[
    "div", "span", "section", "article", "font", "figure", "p", "b", "em", "a", "img", "ul", "li",
    "table", "tr", "td", "br", "h2", "blockquote", "code", "script", "style",
];

/// Text a reader would see: non-content subtrees and comments contribute nothing
fn visible_text(node: &MarkupNode, output: &mut String) {
    match node {
        MarkupNode::Element(element) if matches!(element.name(), "script" | "style") => {}
        MarkupNode::Element(element) => {
            for child in element.children() {
                visible_text(child, output);
            }
        }
        MarkupNode::Text(text) => output.push_str(text),
        MarkupNode::Comment(_) => {}
    }
}

const ATTRS: &[&str] = &["href", "src", "alt", "class", "style", "onclick", "id"];

fn arb_element(children: Vec<MarkupNode>, tag: &str, attrs: Vec<(&str, String)>) -> MarkupNode {
    attrs
        .into_iter()
        .fold(el(tag), |element, (name, value)| element.with_attr(name, value))
        .with_children(children)
        .into()
}

fn arb_tree() -> impl Strategy<Value = MarkupNode> {
    let attrs = prop::collection::vec(
        (prop::sample::select(ATTRS), "[a-z:/.]{0,10}"),
        0..3,
    );
    let leaf = prop_oneof![
        3 => "[a-z ]{0,8}".prop_map(MarkupNode::Text),
        1 => "[a-z]{0,5}".prop_map(MarkupNode::Comment),
        2 => (prop::sample::select(TAGS), attrs.clone())
            .prop_map(|(tag, attrs)| arb_element(Vec::new(), tag, attrs)),
    ];

    leaf.prop_recursive(4, 48, 5, move |inner| {
        (
            prop::sample::select(TAGS),
            attrs.clone(),
            prop::collection::vec(inner, 0..5),
        )
            .prop_map(|(tag, attrs, children)| arb_element(children, tag, attrs))
    })
}

fn arb_foreign_shell() -> impl Strategy<Value = MarkupNode> {
    let foreign = prop::sample::select(vec!["div", "span", "section", "font", "article"]);
    let leaf = prop_oneof![
        foreign.clone().prop_map(|tag| MarkupNode::from(el(tag))),
        "[a-z]{0,5}".prop_map(MarkupNode::Comment),
    ];
    leaf.prop_recursive(4, 32, 4, move |inner| {
        (foreign.clone(), prop::collection::vec(inner, 0..4))
            .prop_map(|(tag, children)| MarkupNode::from(el(tag).with_children(children)))
    })
}

proptest! {
    #[test]
    fn prop_no_foreign_elements_survive(tree in arb_tree(), preserve_links in any::<bool>()) {
        let sanitized = sanitize_and_unwrap(tree, preserve_links);
        let mut foreign = Vec::new();
        sanitized.for_each_element(|element| {
            if policy::classify(element.name()) == TagClass::Foreign {
                foreign.push(element.name().to_string());
            }
        });
        prop_assert!(foreign.is_empty(), "Foreign elements survived: {:?}", foreign);
    }

    #[test]
    fn prop_text_content_is_preserved(tree in arb_tree(), preserve_links in any::<bool>()) {
        let mut expected = String::new();
        visible_text(&tree, &mut expected);
        let sanitized = sanitize_and_unwrap(tree, preserve_links);
        prop_assert_eq!(sanitized.text_content(), expected);
    }

    #[test]
    fn prop_only_allow_listed_attributes_survive(
        tree in arb_tree(),
        preserve_links in any::<bool>(),
    ) {
        let sanitized = sanitize_and_unwrap(tree, preserve_links);
        let mut violations = Vec::new();
        sanitized.for_each_element(|element| {
            for attr in element.attrs() {
                let allowed = match (element.name(), attr.name.as_str()) {
                    ("a", "href") => preserve_links,
                    ("img", "src" | "alt") => true,
                    _ => false,
                };
                if !allowed {
                    violations.push(format!("{}[{}]", element.name(), attr.name));
                }
            }
        });
        prop_assert!(violations.is_empty(), "Attributes survived: {:?}", violations);
    }

    #[test]
    fn prop_anchors_vanish_without_link_preservation(tree in arb_tree()) {
        let sanitized = sanitize_and_unwrap(tree, false);
        let mut anchors = 0usize;
        sanitized.for_each_element(|element| {
            if element.name() == "a" {
                anchors += 1;
            }
        });
        prop_assert_eq!(anchors, 0);
    }

    #[test]
    fn prop_empty_foreign_shells_leave_nothing(tree in arb_foreign_shell()) {
        let sanitized = sanitize_and_unwrap(tree, false);
        prop_assert!(sanitized.is_empty(), "left behind: {:?}", sanitized);
    }

    #[test]
    fn prop_pipeline_output_is_clean_fixpoint(
        tree in arb_tree(),
        preserve_links in any::<bool>(),
    ) {
        let sanitized = sanitize_and_unwrap(tree, preserve_links);
        let markdown = render_and_clean(&sanitized, preserve_links);
        prop_assert_eq!(post_process(&markdown, preserve_links, 0, ""), markdown);
    }

    #[test]
    fn prop_budget_bounds_output(
        tree in arb_tree(),
        max_length in 1i64..200,
    ) {
        let hint = continuation_notice("https://news.example/a");
        let raw = MarkdownRenderer::new().render(&sanitize_and_unwrap(tree, false));
        let unbounded = post_process(&raw, false, 0, "");
        let bounded = post_process(&raw, false, max_length, &hint);

        let limit = max_length as usize + hint.chars().count();
        prop_assert!(bounded.chars().count() <= limit);
        if unbounded.chars().count() > max_length as usize {
            prop_assert!(bounded.ends_with(&hint));
        } else {
            prop_assert_eq!(bounded, unbounded);
        }
    }
}
