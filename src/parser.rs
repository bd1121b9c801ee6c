//! HTML5 parser using html5ever
//!
//! Parses article markup with html5ever, which implements the WHATWG parsing
//! algorithm, and converts the document body into the owned tree from
//! [`crate::node`]. Malformed markup (unclosed tags, misnesting, broken
//! attributes) is repaired the way browsers repair it.
//!
//! # Examples
//!
//! ```rust
//! use article_markdown_converter::parser::parse_html;
//!
//! // Fragment without html/body tags
//! let fragment = parse_html("<div><p>Content</p></div>").expect("parsed");
//! assert_eq!(fragment.text_content(), "Content");
//!
//! // Missing closing tags
//! let fragment = parse_html("<h1>Hello").expect("parser repairs markup");
//! assert_eq!(fragment.nodes()[0].as_element().map(|e| e.name()), Some("h1"));
//! ```
//!
//! # Conversion
//!
//! - Only the `<body>` subtree is kept; `<head>` content is not article text
//! - Text and comments are copied, doctypes and processing instructions dropped
//! - Element and attribute names arrive lowercase from the tokenizer
//! - Elements nested deeper than [`MAX_NESTING_DEPTH`](crate::security::MAX_NESTING_DEPTH)
//!   are rejected

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use tracing::{debug, trace};

use crate::error::ConversionError;
use crate::node::{Element, Fragment, MarkupNode};
use crate::security::SecurityValidator;

/// Parse markup text into a fragment holding the document body
///
/// # Errors
///
/// - `ConversionError::InvalidInput`: the input is empty or nested too deeply
/// - `ConversionError::InvariantViolation`: the DOM has a document node below
///   an element
pub fn parse_html(html: &str) -> Result<Fragment, ConversionError> {
    if html.is_empty() {
        return Err(ConversionError::InvalidInput(
            "HTML input is empty".to_string(),
        ));
    }

    let dom = parse_document(RcDom::default(), Default::default()).one(html);
    fragment_from_dom(&dom)
}

/// Parse UTF-8 encoded markup
///
/// # Errors
///
/// `ConversionError::EncodingError` if the bytes are not valid UTF-8, plus
/// everything [`parse_html`] returns.
///
/// # Examples
///
/// ```rust
/// use article_markdown_converter::parser::parse_html_bytes;
/// use article_markdown_converter::ConversionError;
///
/// let fragment = parse_html_bytes(b"<p>\xE2\x9C\x93 Unicode</p>").expect("valid UTF-8");
/// assert_eq!(fragment.text_content(), "\u{2713} Unicode");
///
/// assert!(matches!(
///     parse_html_bytes(b"\xFF\xFE<p>x</p>"),
///     Err(ConversionError::EncodingError(_))
/// ));
/// ```
pub fn parse_html_bytes(html: &[u8]) -> Result<Fragment, ConversionError> {
    if html.is_empty() {
        return Err(ConversionError::InvalidInput(
            "HTML input is empty".to_string(),
        ));
    }

    let text = std::str::from_utf8(html).map_err(|e| {
        ConversionError::EncodingError(format!(
            "Invalid UTF-8 at byte position {}: {}",
            e.valid_up_to(),
            e
        ))
    })?;

    parse_html(text)
}

/// Convert a parsed DOM into a fragment
///
/// The fragment holds the children of `<body>`; a DOM without a body
/// contributes the document's own children.
pub fn fragment_from_dom(dom: &RcDom) -> Result<Fragment, ConversionError> {
    let builder = TreeBuilder::new(SecurityValidator::new());
    let root = find_body(&dom.document).unwrap_or_else(|| dom.document.clone());

    let mut nodes = Vec::new();
    for child in root.children.borrow().iter() {
        builder.append_node(child, 1, &mut nodes)?;
    }

    debug!(top_level_nodes = nodes.len(), "converted DOM to fragment");
    Ok(Fragment::new(nodes))
}

fn find_body(document: &Handle) -> Option<Handle> {
    let children = document.children.borrow();
    let html = children.iter().find(|child| is_element(child, "html"))?;
    let body = html
        .children
        .borrow()
        .iter()
        .find(|child| is_element(child, "body"))
        .cloned();
    body
}

fn is_element(handle: &Handle, tag: &str) -> bool {
    matches!(handle.data, NodeData::Element { ref name, .. } if name.local.as_ref() == tag)
}

struct TreeBuilder {
    validator: SecurityValidator,
}

impl TreeBuilder {
    fn new(validator: SecurityValidator) -> Self {
        Self { validator }
    }

    /// Convert one DOM node and append the result to `out`
    fn append_node(
        &self,
        handle: &Handle,
        depth: usize,
        out: &mut Vec<MarkupNode>,
    ) -> Result<(), ConversionError> {
        match handle.data {
            NodeData::Text { ref contents } => {
                out.push(MarkupNode::Text(contents.borrow().to_string()));
            }
            NodeData::Comment { ref contents } => {
                out.push(MarkupNode::Comment(contents.to_string()));
            }
            NodeData::Element {
                ref name,
                ref attrs,
                ..
            } => {
                self.validator
                    .validate_depth(depth)
                    .map_err(ConversionError::InvalidInput)?;

                let mut children = Vec::new();
                for child in handle.children.borrow().iter() {
                    self.append_node(child, depth + 1, &mut children)?;
                }

                match Element::new(name.local.as_ref()) {
                    Ok(element) => {
                        let element = attrs
                            .borrow()
                            .iter()
                            .fold(element, |element, attr| {
                                element.with_attr(attr.name.local.as_ref(), attr.value.to_string())
                            })
                            .with_children(children);
                        out.push(MarkupNode::Element(element));
                    }
                    Err(_) => {
                        // The tokenizer accepts names like `p<b`; keep the content
                        trace!(tag = name.local.as_ref(), "splicing element with unusable name");
                        out.extend(children);
                    }
                }
            }
            NodeData::Document => {
                return Err(ConversionError::InvariantViolation(
                    "document node nested inside the document tree".to_string(),
                ));
            }
            NodeData::Doctype { .. } | NodeData::ProcessingInstruction { .. } => {}
        }
        Ok(())
    }
}
