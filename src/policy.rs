//! Tag classification and attribute allow-listing
//!
//! One declarative table decides, per tag name, whether the Markdown renderer
//! understands the element (Native) or it has to be unwrapped (Foreign),
//! whether it starts a visual block, and which attributes survive
//! sanitization. The unwrapper and the attribute sanitizer both read this
//! table and nothing else.
//!
//! All lookups are case-insensitive and total: an unknown tag is Foreign,
//! inline, and keeps no attributes.
//!
//! # Examples
//!
//! ```
//! use article_markdown_converter::policy::{self, TagClass};
//!
//! assert_eq!(policy::classify("P"), TagClass::Native);
//! assert_eq!(policy::classify("div"), TagClass::Foreign);
//! assert!(policy::is_block("div"));
//! assert!(!policy::is_block("span"));
//!
//! assert_eq!(policy::allowed_attributes("a", true), &["href"]);
//! assert!(policy::allowed_attributes("a", false).is_empty());
//! assert_eq!(policy::allowed_attributes("img", false), &["src", "alt"]);
//! ```

/// Whether the renderer can express an element directly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass {
    /// Rendered as-is
    Native,
    /// No Markdown equivalent; unwrapped into its parent
    Foreign,
}

/// Which attributes an element keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttributePolicy {
    /// Strip everything
    None,
    /// Keep these regardless of configuration
    Always(&'static [&'static str]),
    /// Keep these only when links are preserved
    WithLinks(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
struct TagPolicy {
    name: &'static str,
    class: TagClass,
    block: bool,
    attributes: AttributePolicy,
}

const fn native(name: &'static str, block: bool) -> TagPolicy {
    TagPolicy {
        name,
        class: TagClass::Native,
        block,
        attributes: AttributePolicy::None,
    }
}

const fn native_with(name: &'static str, block: bool, attributes: AttributePolicy) -> TagPolicy {
    TagPolicy {
        name,
        class: TagClass::Native,
        block,
        attributes,
    }
}

const fn foreign_block(name: &'static str) -> TagPolicy {
    TagPolicy {
        name,
        class: TagClass::Foreign,
        block: true,
        attributes: AttributePolicy::None,
    }
}

const NONE: &[&str] = &[];

const TAG_POLICIES: &[TagPolicy] = &[
    // Headings
    native("h1", true),
    native("h2", true),
    native("h3", true),
    native("h4", true),
    native("h5", true),
    native("h6", true),
    // Text blocks and breaks
    native("p", true),
    native("br", true),
    native("hr", true),
    native("blockquote", true),
    native("pre", true),
    // Inline formatting
    native("strong", false),
    native("b", false),
    native("em", false),
    native("i", false),
    native("u", false),
    native("s", false),
    native("del", false),
    native("ins", false),
    native("code", false),
    // Links and media
    native_with("a", false, AttributePolicy::WithLinks(&["href"])),
    native_with("img", false, AttributePolicy::Always(&["src", "alt"])),
    // Lists
    native("ul", true),
    native("ol", true),
    native("li", true),
    native("dl", true),
    native("dt", true),
    native("dd", true),
    // Tables
    native("table", true),
    native("thead", true),
    native("tbody", true),
    native("tr", true),
    native("th", true),
    native("td", true),
    // Layout containers
    foreign_block("div"),
    foreign_block("section"),
    foreign_block("article"),
    foreign_block("header"),
    foreign_block("footer"),
    foreign_block("main"),
    foreign_block("aside"),
    foreign_block("nav"),
    foreign_block("form"),
    foreign_block("fieldset"),
    foreign_block("legend"),
    foreign_block("details"),
    foreign_block("summary"),
    foreign_block("figure"),
    foreign_block("figcaption"),
    foreign_block("address"),
    foreign_block("hgroup"),
    foreign_block("tfoot"),
];

fn lookup(name: &str) -> Option<&'static TagPolicy> {
    TAG_POLICIES
        .iter()
        .find(|policy| policy.name.eq_ignore_ascii_case(name))
}

/// Classify a tag name as Native or Foreign
pub fn classify(name: &str) -> TagClass {
    lookup(name).map_or(TagClass::Foreign, |policy| policy.class)
}

/// Returns true if the renderer understands the tag directly
pub fn is_native(name: &str) -> bool {
    classify(name) == TagClass::Native
}

/// Returns true if the tag conventionally starts a new visual block
///
/// Only used for spacing decisions; independent of Native/Foreign.
pub fn is_block(name: &str) -> bool {
    lookup(name).is_some_and(|policy| policy.block)
}

/// Attribute names that survive sanitization for `name`
pub fn allowed_attributes(name: &str, preserve_links: bool) -> &'static [&'static str] {
    match lookup(name).map(|policy| policy.attributes) {
        Some(AttributePolicy::Always(attrs)) => attrs,
        Some(AttributePolicy::WithLinks(attrs)) if preserve_links => attrs,
        _ => NONE,
    }
}

/// Returns true if attribute `attr` may stay on element `tag`
pub fn is_attribute_allowed(tag: &str, attr: &str, preserve_links: bool) -> bool {
    allowed_attributes(tag, preserve_links)
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(attr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NATIVE_TAGS: &[&str] = &[
        "h1", "h2", "h3", "h4", "h5", "h6", "p", "br", "hr", "strong", "b", "em", "i", "u", "s",
        "del", "ins", "a", "img", "ul", "ol", "li", "blockquote", "pre", "code", "table", "thead",
        "tbody", "tr", "th", "td", "dl", "dt", "dd",
    ];

    #[test]
    fn test_native_set() {
        for tag in NATIVE_TAGS {
            assert_eq!(classify(tag), TagClass::Native, "{tag} should be Native");
        }
    }

    #[test]
    fn test_is_native_matches_classify() {
        assert!(is_native("blockquote"));
        assert!(is_native("IMG"));
        assert!(!is_native("div"));
        assert!(!is_native("custom-widget"));
    }

    #[test]
    fn test_containers_are_foreign() {
        for tag in ["div", "section", "article", "span", "font", "figure", "tfoot", "main"] {
            assert_eq!(classify(tag), TagClass::Foreign, "{tag} should be Foreign");
        }
    }

    #[test]
    fn test_classification_is_case_insensitive() {
        assert_eq!(classify("TABLE"), TagClass::Native);
        assert_eq!(classify("Div"), TagClass::Foreign);
        assert!(is_block("SECTION"));
        assert_eq!(allowed_attributes("IMG", false), &["src", "alt"]);
    }

    #[test]
    fn test_block_set() {
        for tag in ["div", "section", "header", "p", "h3", "li", "tr", "br", "hr", "tfoot"] {
            assert!(is_block(tag), "{tag} should be block-level");
        }
        for tag in ["span", "a", "b", "img", "code", "font", "unknown"] {
            assert!(!is_block(tag), "{tag} should be inline");
        }
    }

    #[test]
    fn test_anchor_href_depends_on_link_preservation() {
        assert!(is_attribute_allowed("a", "href", true));
        assert!(!is_attribute_allowed("a", "href", false));
        assert!(!is_attribute_allowed("a", "title", true));
    }

    #[test]
    fn test_image_keeps_src_and_alt() {
        for preserve_links in [true, false] {
            assert!(is_attribute_allowed("img", "src", preserve_links));
            assert!(is_attribute_allowed("img", "ALT", preserve_links));
            assert!(!is_attribute_allowed("img", "width", preserve_links));
        }
    }

    #[test]
    fn test_everything_else_strips_attributes() {
        assert!(allowed_attributes("p", true).is_empty());
        assert!(allowed_attributes("div", true).is_empty());
        assert!(allowed_attributes("td", true).is_empty());
    }

    #[test]
    fn test_table_has_no_duplicates() {
        for (i, policy) in TAG_POLICIES.iter().enumerate() {
            assert!(
                TAG_POLICIES[i + 1..]
                    .iter()
                    .all(|other| other.name != policy.name),
                "duplicate policy for {}",
                policy.name
            );
        }
    }

    proptest! {
        #[test]
        fn prop_unknown_tags_are_foreign_with_no_attributes(
            name in "x-[a-z]{1,12}",
            preserve_links in any::<bool>(),
        ) {
            prop_assert_eq!(classify(&name), TagClass::Foreign);
            prop_assert!(!is_block(&name));
            prop_assert!(allowed_attributes(&name, preserve_links).is_empty());
        }
    }
}
