//! Article Markdown Converter
//!
//! Normalizes messy article markup (news bodies scraped from arbitrary sites)
//! into compact Markdown for summarizers and length-limited message payloads.
//!
//! # Architecture
//!
//! The library is structured into several modules:
//! - `parser`: HTML5 parsing using html5ever, body converted to an owned tree
//! - `node`: the owned markup tree passed between stages
//! - `policy`: tag classification and attribute allow-lists
//! - `security`: non-content removal, URL safety, nesting limits
//! - `unwrap`: sanitizes a tree down to Markdown-native elements
//! - `renderer`: Markdown generation from a sanitized tree
//! - `postprocess`: text cleanup rules and the size budget
//! - `converter`: the whole pipeline behind one set of options
//!
//! # Example
//!
//! ```rust
//! use article_markdown_converter::{ConversionOptions, MarkdownConverter};
//!
//! let converter = MarkdownConverter::with_options(ConversionOptions {
//!     max_length: 20,
//!     continuation_hint: " [...]".to_string(),
//!     ..Default::default()
//! });
//! let markdown = converter
//!     .convert("<section><h2>Budget</h2><p>Lawmakers passed the budget late on Friday.</p></section>")
//!     .expect("conversion succeeds");
//! assert_eq!(markdown, "## Budget\n\nLawmakers [...]");
//! ```

pub mod converter;
pub mod error;
pub mod node;
pub mod parser;
pub mod policy;
pub mod postprocess;
pub mod renderer;
pub mod security;
pub mod unwrap;

// Re-export main types for convenience
pub use converter::{ConversionOptions, MarkdownConverter};
pub use error::ConversionError;
pub use node::{Element, Fragment, MarkupNode};
pub use parser::parse_html;
pub use postprocess::post_process;
pub use unwrap::sanitize_and_unwrap;
