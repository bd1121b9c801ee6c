//! Article converter - markup in, compact Markdown out
//!
//! Runs the whole pipeline with one set of options:
//!
//! 1. **Parse**: html5ever DOM, body converted to an owned [`Fragment`]
//! 2. **Sanitize and unwrap**: non-content removed, Foreign elements unwrapped,
//!    attributes stripped ([`crate::unwrap`])
//! 3. **Render**: raw Markdown ([`crate::renderer`])
//! 4. **Clean up**: text rules and size budget ([`crate::postprocess`])
//!
//! Each stage consumes the previous stage's output and nothing else, so a
//! converter can be shared across threads and documents converted in
//! parallel.
//!
//! # Examples
//!
//! ```rust
//! use article_markdown_converter::converter::MarkdownConverter;
//!
//! let converter = MarkdownConverter::new();
//! let markdown = converter
//!     .convert("<div><p>Hello <b>world</b></p><div>Bye</div></div>")
//!     .expect("conversion succeeds");
//! assert_eq!(markdown, "Hello **world**\n\nBye");
//! ```
//!
//! ## Link Preservation and Budget
//!
//! ```rust
//! use article_markdown_converter::converter::{ConversionOptions, MarkdownConverter};
//!
//! let options = ConversionOptions {
//!     preserve_links: true,
//!     ..ConversionOptions::for_source_url("https://news.example/a/1")
//! };
//! let converter = MarkdownConverter::with_options(options);
//! let markdown = converter
//!     .convert(r#"<p>Read <a href="https://x.example/" class="ext">more</a></p>"#)
//!     .expect("conversion succeeds");
//! assert_eq!(markdown, "Read [more](https://x.example/)");
//! ```

use markup5ever_rcdom::RcDom;
use tracing::debug;

use crate::error::ConversionError;
use crate::node::Fragment;
use crate::parser;
use crate::postprocess::{self, CleanupOptions, MarkdownPostProcessor};
use crate::renderer::MarkdownRenderer;
use crate::unwrap::sanitize_and_unwrap;

/// Conversion options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Keep anchors and their `href`; otherwise links are flattened to text
    pub preserve_links: bool,
    /// Size budget in characters; zero or negative disables it
    pub max_length: i64,
    /// Appended when the budget cuts the output
    pub continuation_hint: String,
}

impl ConversionOptions {
    /// Default options with the standard "full content" hint for `url`
    ///
    /// # Examples
    ///
    /// ```rust
    /// use article_markdown_converter::converter::ConversionOptions;
    ///
    /// let options = ConversionOptions::for_source_url("https://news.example/a/1");
    /// assert!(options.continuation_hint.ends_with("https://news.example/a/1]"));
    /// assert!(!options.preserve_links);
    /// ```
    pub fn for_source_url(url: &str) -> Self {
        Self {
            continuation_hint: postprocess::continuation_notice(url),
            ..Self::default()
        }
    }

    fn cleanup_options(&self) -> CleanupOptions {
        CleanupOptions::new(
            self.preserve_links,
            self.max_length,
            self.continuation_hint.clone(),
        )
    }
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            preserve_links: false,
            max_length: postprocess::DEFAULT_MAX_LENGTH as i64,
            continuation_hint: String::new(),
        }
    }
}

/// Converts article markup to Markdown
#[derive(Debug, Clone, Default)]
pub struct MarkdownConverter {
    options: ConversionOptions,
    renderer: MarkdownRenderer,
    post_processor: MarkdownPostProcessor,
}

impl MarkdownConverter {
    /// Create a converter with default options
    ///
    /// Links are flattened, the budget is
    /// [`DEFAULT_MAX_LENGTH`](postprocess::DEFAULT_MAX_LENGTH) characters and
    /// no continuation hint is appended.
    pub fn new() -> Self {
        Self::with_options(ConversionOptions::default())
    }

    /// Create a converter with custom options
    pub fn with_options(options: ConversionOptions) -> Self {
        let post_processor = MarkdownPostProcessor::new(options.cleanup_options());
        Self {
            options,
            renderer: MarkdownRenderer::new(),
            post_processor,
        }
    }

    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    /// Parse and convert markup text
    ///
    /// # Errors
    ///
    /// Only the parse step can fail; see [`parser::parse_html`].
    pub fn convert(&self, html: &str) -> Result<String, ConversionError> {
        let fragment = parser::parse_html(html)?;
        let markdown = self.convert_fragment(fragment);
        debug!(
            input_bytes = html.len(),
            output_bytes = markdown.len(),
            "converted article markup"
        );
        Ok(markdown)
    }

    /// Parse and convert UTF-8 encoded markup
    ///
    /// # Errors
    ///
    /// `ConversionError::EncodingError` for invalid UTF-8, plus everything
    /// [`convert`](Self::convert) returns.
    pub fn convert_bytes(&self, html: &[u8]) -> Result<String, ConversionError> {
        let fragment = parser::parse_html_bytes(html)?;
        let markdown = self.convert_fragment(fragment);
        debug!(
            input_bytes = html.len(),
            output_bytes = markdown.len(),
            "converted article markup"
        );
        Ok(markdown)
    }

    /// Convert a DOM the caller already parsed
    pub fn convert_dom(&self, dom: &RcDom) -> Result<String, ConversionError> {
        let fragment = parser::fragment_from_dom(dom)?;
        Ok(self.convert_fragment(fragment))
    }

    /// Sanitize, render and clean an already-built tree
    ///
    /// Total: every stage after parsing accepts any tree.
    pub fn convert_fragment(&self, fragment: Fragment) -> String {
        let sanitized = sanitize_and_unwrap(fragment, self.options.preserve_links);
        let raw = self.renderer.render(&sanitized);
        let markdown = self.post_processor.process(&raw);
        debug!(
            raw_chars = raw.len(),
            final_chars = markdown.len(),
            "rendered and cleaned markdown"
        );
        markdown
    }
}
