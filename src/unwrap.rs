//! Structural unwrapper - reduces a markup tree to Markdown-native elements
//!
//! The unwrapper rebuilds the tree bottom-up. Every child list is processed
//! before its parent is evaluated, and the result is a new owned tree: nodes
//! are moved from the old tree into the new one, never edited in place.
//!
//! # Rules
//!
//! For each node, in document order:
//!
//! 1. Comments are dropped.
//! 2. Non-content elements (scripts, styles, embeds) are dropped with their
//!    subtree.
//! 3. With link preservation disabled, an anchor becomes a single text node
//!    holding the text left after its children are sanitized; an anchor
//!    without text disappears.
//! 4. A Foreign element with no children (after its own children were
//!    processed) disappears. Otherwise its children are spliced into the
//!    parent in its place. If it is block-level and holds non-whitespace text,
//!    a `<br>` goes in front of the spliced children when the previous element
//!    sibling is block-level, and behind them when the next element sibling is.
//! 5. Surviving elements keep only the attributes the policy table allows.
//!
//! # Example
//!
//! ```rust
//! use article_markdown_converter::node::{Element, MarkupNode};
//! use article_markdown_converter::unwrap::sanitize_and_unwrap;
//!
//! let tree = Element::new("div")?
//!     .with_child(Element::new("p")?.with_child(MarkupNode::text("One")))
//!     .with_child(Element::new("div")?.with_child(MarkupNode::text("Two")));
//!
//! let fragment = sanitize_and_unwrap(tree, false);
//! let names: Vec<_> = fragment
//!     .nodes()
//!     .iter()
//!     .map(|node| node.as_element().map(|e| e.name().to_string()))
//!     .collect();
//!
//! assert_eq!(names, vec![Some("p".to_string()), Some("br".to_string()), None]);
//! # Ok::<(), article_markdown_converter::ConversionError>(())
//! ```

use crate::node::{Element, Fragment, MarkupNode};
use crate::policy::{self, TagClass};
use crate::security::{SanitizeAction, SecurityValidator};
use tracing::{debug, trace};

/// Sanitize a tree and unwrap every Foreign element
///
/// Total: never fails for any tree the node constructors accept.
pub fn sanitize_and_unwrap(tree: impl Into<Fragment>, preserve_links: bool) -> Fragment {
    StructuralUnwrapper::new(preserve_links).run(tree.into())
}

/// Counters collected during one unwrap pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UnwrapStats {
    /// Foreign elements replaced by their children
    pub unwrapped: usize,
    /// Foreign elements dropped because nothing was left inside
    pub dropped_empty: usize,
    /// Non-content elements dropped with their subtree
    pub removed_non_content: usize,
    /// Anchors flattened to text (or dropped when empty)
    pub links_flattened: usize,
    /// Comment nodes dropped
    pub comments_dropped: usize,
    /// Synthetic `<br>` elements inserted between block fragments
    pub breaks_inserted: usize,
}

/// Rebuilds a tree so that only Native elements remain
#[derive(Debug)]
pub struct StructuralUnwrapper {
    preserve_links: bool,
    validator: SecurityValidator,
    stats: UnwrapStats,
}

impl StructuralUnwrapper {
    /// Create an unwrapper for one document
    pub fn new(preserve_links: bool) -> Self {
        Self {
            preserve_links,
            validator: SecurityValidator::new(),
            stats: UnwrapStats::default(),
        }
    }

    /// Counters from the passes run so far
    pub fn stats(&self) -> UnwrapStats {
        self.stats
    }

    /// Unwrap a whole fragment
    pub fn run(&mut self, fragment: Fragment) -> Fragment {
        let nodes = self.process_children(fragment.into_nodes());
        debug!(
            preserve_links = self.preserve_links,
            unwrapped = self.stats.unwrapped,
            dropped_empty = self.stats.dropped_empty,
            removed_non_content = self.stats.removed_non_content,
            links_flattened = self.stats.links_flattened,
            comments_dropped = self.stats.comments_dropped,
            breaks_inserted = self.stats.breaks_inserted,
            "unwrapped markup tree"
        );
        Fragment::new(nodes)
    }

    /// Build the new child list of one parent
    fn process_children(&mut self, children: Vec<MarkupNode>) -> Vec<MarkupNode> {
        let next_is_block = self.next_sibling_block_flags(&children);
        let mut output = Vec::with_capacity(children.len());

        for (child, next_is_block) in children.into_iter().zip(next_is_block) {
            match child {
                MarkupNode::Comment(_) => self.stats.comments_dropped += 1,
                MarkupNode::Text(text) => output.push(MarkupNode::Text(text)),
                MarkupNode::Element(element) => {
                    self.process_element(element, next_is_block, &mut output)
                }
            }
        }

        output
    }

    /// For each position, whether the next element sibling in the original
    /// list is block-level (`false` when there is none).
    ///
    /// Siblings that never reach the classifier (removed non-content elements,
    /// anchors flattened to text) are not elements for this purpose.
    fn next_sibling_block_flags(&self, children: &[MarkupNode]) -> Vec<bool> {
        let mut flags = vec![false; children.len()];
        let mut next_is_block = false;

        for (index, child) in children.iter().enumerate().rev() {
            flags[index] = next_is_block;
            if let MarkupNode::Element(element) = child
                && self.reaches_classifier(element)
            {
                next_is_block = policy::is_block(element.name());
            }
        }

        flags
    }

    fn reaches_classifier(&self, element: &Element) -> bool {
        self.validator.check_element(element.name()) == SanitizeAction::Keep
            && (self.preserve_links || element.name() != "a")
    }

    fn process_element(
        &mut self,
        element: Element,
        next_is_block: bool,
        output: &mut Vec<MarkupNode>,
    ) {
        if self.validator.check_element(element.name()) == SanitizeAction::Remove {
            trace!(tag = element.name(), "removing non-content element");
            self.stats.removed_non_content += 1;
            return;
        }

        // Anchors are flattened before classification, so a stripped link
        // never goes through the generic unwrap path. The label comes from the
        // sanitized children: scripts inside a link are not link text.
        if !self.preserve_links && element.name() == "a" {
            self.stats.links_flattened += 1;
            let (_, _, children) = element.into_parts();
            let mut text = String::new();
            for child in self.process_children(children) {
                child.collect_text(&mut text);
            }
            if !text.is_empty() {
                output.push(MarkupNode::Text(text));
            }
            return;
        }

        let (name, attrs, children) = element.into_parts();
        let children = self.process_children(children);

        match policy::classify(&name) {
            TagClass::Native => {
                let attrs = attrs
                    .into_iter()
                    .filter(|attr| {
                        policy::is_attribute_allowed(&name, &attr.name, self.preserve_links)
                    })
                    .collect();
                output.push(MarkupNode::Element(Element::from_parts(
                    name, attrs, children,
                )));
            }
            TagClass::Foreign => self.splice_foreign(&name, children, next_is_block, output),
        }
    }

    fn splice_foreign(
        &mut self,
        name: &str,
        children: Vec<MarkupNode>,
        next_is_block: bool,
        output: &mut Vec<MarkupNode>,
    ) {
        if children.is_empty() {
            trace!(tag = name, "dropping empty foreign element");
            self.stats.dropped_empty += 1;
            return;
        }

        let spaced =
            policy::is_block(name) && children.iter().any(MarkupNode::has_significant_text);

        if spaced && previous_element_is_block(output) {
            output.push(MarkupNode::Element(Element::line_break()));
            self.stats.breaks_inserted += 1;
        }

        output.extend(children);

        if spaced && next_is_block {
            output.push(MarkupNode::Element(Element::line_break()));
            self.stats.breaks_inserted += 1;
        }

        self.stats.unwrapped += 1;
    }
}

/// Whether the last element already placed in `output` is block-level
fn previous_element_is_block(output: &[MarkupNode]) -> bool {
    output
        .iter()
        .rev()
        .find_map(MarkupNode::as_element)
        .is_some_and(|element| policy::is_block(element.name()))
}
