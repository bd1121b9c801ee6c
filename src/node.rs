//! Owned markup tree
//!
//! The tree handed between pipeline stages. Every node is owned by exactly one
//! parent, children keep document order, and element names are stored in
//! lowercase. Stages consume a tree and build a new one instead of mutating
//! nodes in place.
//!
//! # Examples
//!
//! ```rust
//! use article_markdown_converter::node::{Element, Fragment, MarkupNode};
//!
//! let tree = Element::new("DIV")?
//!     .with_attr("class", "lead")
//!     .with_child(MarkupNode::text("Hello"));
//!
//! assert_eq!(tree.name(), "div");
//! assert_eq!(tree.text_content(), "Hello");
//!
//! let fragment = Fragment::from(tree);
//! assert_eq!(fragment.nodes().len(), 1);
//! # Ok::<(), article_markdown_converter::ConversionError>(())
//! ```

use crate::error::ConversionError;

/// Characters that can never appear in an element or attribute name
const FORBIDDEN_NAME_CHARS: &[char] = &['<', '>', '/', '"', '\'', '='];

/// A single `name="value"` pair on an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name, lowercase
    pub name: String,
    /// Attribute value, verbatim
    pub value: String,
}

/// A node in the markup tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    /// An element with attributes and children
    Element(Element),
    /// Character data
    Text(String),
    /// A markup comment; carries no content
    Comment(String),
}

impl MarkupNode {
    /// Create a text node
    pub fn text(text: impl Into<String>) -> Self {
        MarkupNode::Text(text.into())
    }

    /// Create a comment node
    pub fn comment(text: impl Into<String>) -> Self {
        MarkupNode::Comment(text.into())
    }

    /// Returns the element if this node is one
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            MarkupNode::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Append all descendant character data to `output`, in document order.
    /// Comments contribute nothing.
    pub fn collect_text(&self, output: &mut String) {
        match self {
            MarkupNode::Element(element) => {
                for child in &element.children {
                    child.collect_text(output);
                }
            }
            MarkupNode::Text(text) => output.push_str(text),
            MarkupNode::Comment(_) => {}
        }
    }

    /// Concatenated descendant text
    pub fn text_content(&self) -> String {
        let mut output = String::new();
        self.collect_text(&mut output);
        output
    }

    /// Returns true if any descendant text is not whitespace
    pub fn has_significant_text(&self) -> bool {
        match self {
            MarkupNode::Element(element) => {
                element.children.iter().any(MarkupNode::has_significant_text)
            }
            MarkupNode::Text(text) => !text.trim().is_empty(),
            MarkupNode::Comment(_) => false,
        }
    }
}

impl From<Element> for MarkupNode {
    fn from(element: Element) -> Self {
        MarkupNode::Element(element)
    }
}

/// An element node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attrs: Vec<Attribute>,
    children: Vec<MarkupNode>,
}

impl Element {
    /// Create an element, normalizing the tag name to lowercase
    ///
    /// # Errors
    ///
    /// Returns `ConversionError::InvariantViolation` if the name is empty or
    /// contains whitespace or markup delimiters. Such a name can only come from
    /// a broken parser and is rejected rather than repaired.
    pub fn new(name: &str) -> Result<Self, ConversionError> {
        validate_name(name, "element")?;
        Ok(Self {
            name: name.to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        })
    }

    /// Construct from parts that are already known to be valid
    pub(crate) fn from_parts(
        name: String,
        attrs: Vec<Attribute>,
        children: Vec<MarkupNode>,
    ) -> Self {
        Self {
            name,
            attrs,
            children,
        }
    }

    /// A bare `<br>` element
    pub fn line_break() -> Self {
        Self::from_parts("br".to_string(), Vec::new(), Vec::new())
    }

    /// Add an attribute (name normalized to lowercase)
    ///
    /// Attributes whose names could not have come out of a tokenizer are ignored.
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        if validate_name(name, "attribute").is_ok() {
            self.attrs.push(Attribute {
                name: name.to_ascii_lowercase(),
                value: value.into(),
            });
        }
        self
    }

    /// Append a child node
    pub fn with_child(mut self, child: impl Into<MarkupNode>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append several child nodes
    pub fn with_children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<MarkupNode>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Lowercase tag name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attributes in source order
    pub fn attrs(&self) -> &[Attribute] {
        &self.attrs
    }

    /// Look up an attribute value by (case-insensitive) name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
            .map(|attr| attr.value.as_str())
    }

    /// Children in document order
    pub fn children(&self) -> &[MarkupNode] {
        &self.children
    }

    /// Take the element apart
    pub fn into_parts(self) -> (String, Vec<Attribute>, Vec<MarkupNode>) {
        (self.name, self.attrs, self.children)
    }

    /// Concatenated descendant text
    pub fn text_content(&self) -> String {
        let mut output = String::new();
        for child in &self.children {
            child.collect_text(&mut output);
        }
        output
    }
}

fn validate_name(name: &str, kind: &str) -> Result<(), ConversionError> {
    if name.is_empty() {
        return Err(ConversionError::InvariantViolation(format!(
            "{kind} name is empty"
        )));
    }
    if name
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || FORBIDDEN_NAME_CHARS.contains(&c))
    {
        return Err(ConversionError::InvariantViolation(format!(
            "{kind} name {name:?} contains characters a tokenizer never emits"
        )));
    }
    Ok(())
}

/// Document root: the ordered top-level nodes of a parsed fragment
///
/// A fragment has no tag of its own, so a Foreign element at the top of a
/// tree can still be unwrapped into it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    nodes: Vec<MarkupNode>,
}

impl Fragment {
    /// Create a fragment from top-level nodes
    pub fn new(nodes: Vec<MarkupNode>) -> Self {
        Self { nodes }
    }

    /// Top-level nodes in document order
    pub fn nodes(&self) -> &[MarkupNode] {
        &self.nodes
    }

    /// Take the top-level nodes
    pub fn into_nodes(self) -> Vec<MarkupNode> {
        self.nodes
    }

    /// Returns true if there are no top-level nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Concatenated text of the whole fragment
    pub fn text_content(&self) -> String {
        let mut output = String::new();
        for node in &self.nodes {
            node.collect_text(&mut output);
        }
        output
    }

    /// Visit every element in the fragment, depth first
    pub fn for_each_element<F: FnMut(&Element)>(&self, mut visit: F) {
        fn walk<F: FnMut(&Element)>(node: &MarkupNode, visit: &mut F) {
            if let MarkupNode::Element(element) = node {
                visit(element);
                for child in element.children() {
                    walk(child, visit);
                }
            }
        }
        for node in &self.nodes {
            walk(node, &mut visit);
        }
    }
}

impl From<MarkupNode> for Fragment {
    fn from(node: MarkupNode) -> Self {
        Self { nodes: vec![node] }
    }
}

impl From<Element> for Fragment {
    fn from(element: Element) -> Self {
        Self::from(MarkupNode::Element(element))
    }
}

impl From<Vec<MarkupNode>> for Fragment {
    fn from(nodes: Vec<MarkupNode>) -> Self {
        Self { nodes }
    }
}
