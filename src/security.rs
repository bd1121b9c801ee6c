//! Non-content removal, URL safety and nesting limits
//!
//! Article bodies scraped from news sites carry scripts, tracking embeds and
//! style blocks next to the text. None of that is article content, so those
//! elements are dropped together with their subtree before the unwrapper
//! classifies anything. Link and image targets with executable schemes are
//! never emitted by the renderer.
//!
//! # Defense Layers
//!
//! 1. **Element removal**: script, style, embeds and other non-content elements
//! 2. **URL sanitization**: javascript:, data:, vbscript:, file:, about: targets
//! 3. **Nesting limit**: bounded recursion depth for the tree stages

/// Maximum allowed nesting depth for HTML elements
/// Prevents stack overflow from deeply nested structures
pub const MAX_NESTING_DEPTH: usize = 1000;

/// Elements whose content is never article text
const NON_CONTENT_ELEMENTS: &[&str] = &[
    "script",   // JavaScript execution
    "style",    // CSS
    "noscript", // Alternative content for script-less browsers
    "iframe",   // Embedded players and widgets
    "object",   // Plugins
    "embed",    // Plugins
    "applet",   // Legacy Java applets
    "link",     // External stylesheets
    "base",     // Base URL changes
];

/// Dangerous URL schemes that should be blocked
const DANGEROUS_URL_SCHEMES: &[&str] = &[
    "javascript:", // JavaScript execution
    "data:",       // Can contain executable content
    "vbscript:",   // VBScript execution (legacy IE)
    "file:",       // Local file access
    "about:",      // Browser internal URLs
];

/// Action to take for an element before classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizeAction {
    /// Hand the element to the classifier
    Keep,
    /// Remove the element and all its children
    Remove,
}

/// Security validator for markup trees
#[derive(Debug, Clone)]
pub struct SecurityValidator {
    /// Maximum allowed nesting depth
    max_depth: usize,
}

impl SecurityValidator {
    /// Create a new security validator with default settings
    pub fn new() -> Self {
        Self {
            max_depth: MAX_NESTING_DEPTH,
        }
    }

    /// Create a security validator with custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Decide whether an element survives to classification
    ///
    /// # Examples
    ///
    /// ```
    /// use article_markdown_converter::security::{SecurityValidator, SanitizeAction};
    ///
    /// let validator = SecurityValidator::new();
    /// assert_eq!(validator.check_element("script"), SanitizeAction::Remove);
    /// assert_eq!(validator.check_element("STYLE"), SanitizeAction::Remove);
    /// assert_eq!(validator.check_element("div"), SanitizeAction::Keep);
    /// ```
    pub fn check_element(&self, tag_name: &str) -> SanitizeAction {
        if NON_CONTENT_ELEMENTS
            .iter()
            .any(|name| name.eq_ignore_ascii_case(tag_name))
        {
            SanitizeAction::Remove
        } else {
            SanitizeAction::Keep
        }
    }

    /// Check if a URL uses a dangerous scheme
    ///
    /// # Examples
    ///
    /// ```
    /// use article_markdown_converter::security::SecurityValidator;
    ///
    /// let validator = SecurityValidator::new();
    /// assert!(validator.is_dangerous_url("javascript:alert('xss')"));
    /// assert!(validator.is_dangerous_url("  DATA:text/html,x"));
    /// assert!(!validator.is_dangerous_url("https://example.com"));
    /// assert!(!validator.is_dangerous_url("/relative/path"));
    /// ```
    pub fn is_dangerous_url(&self, url: &str) -> bool {
        let url_lower = url.trim().to_lowercase();
        DANGEROUS_URL_SCHEMES
            .iter()
            .any(|scheme| url_lower.starts_with(scheme))
    }

    /// Returns `None` if the URL is dangerous or blank, `Some(url)` otherwise
    pub fn sanitize_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        let trimmed = url.trim();
        if trimmed.is_empty() || self.is_dangerous_url(trimmed) {
            None
        } else {
            Some(trimmed)
        }
    }

    /// Validate nesting depth to prevent stack overflow
    ///
    /// # Examples
    ///
    /// ```
    /// use article_markdown_converter::security::SecurityValidator;
    ///
    /// let validator = SecurityValidator::with_max_depth(100);
    /// assert!(validator.validate_depth(50).is_ok());
    /// assert!(validator.validate_depth(150).is_err());
    /// ```
    pub fn validate_depth(&self, depth: usize) -> Result<(), String> {
        if depth > self.max_depth {
            Err(format!(
                "HTML nesting depth {} exceeds maximum allowed depth {}",
                depth, self.max_depth
            ))
        } else {
            Ok(())
        }
    }
}

impl Default for SecurityValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_non_content_elements() {
        let validator = SecurityValidator::new();

        for tag in ["script", "style", "noscript", "iframe", "object", "embed"] {
            assert_eq!(validator.check_element(tag), SanitizeAction::Remove, "{tag}");
        }
        for tag in ["div", "p", "a", "span", "img"] {
            assert_eq!(validator.check_element(tag), SanitizeAction::Keep, "{tag}");
        }
    }

    #[test]
    fn test_dangerous_urls() {
        let validator = SecurityValidator::new();

        assert!(validator.is_dangerous_url("javascript:alert('xss')"));
        assert!(validator.is_dangerous_url("JavaScript:alert('xss')"));
        assert!(validator.is_dangerous_url("vbscript:msgbox('xss')"));
        assert!(validator.is_dangerous_url("file:///etc/passwd"));

        assert!(!validator.is_dangerous_url("https://example.com"));
        assert!(!validator.is_dangerous_url("../parent/path"));
        assert!(!validator.is_dangerous_url("#anchor"));
    }

    #[test]
    fn test_sanitize_url() {
        let validator = SecurityValidator::new();

        assert_eq!(validator.sanitize_url("javascript:alert('xss')"), None);
        assert_eq!(validator.sanitize_url("   "), None);
        assert_eq!(
            validator.sanitize_url(" https://example.com "),
            Some("https://example.com")
        );
    }

    #[test]
    fn test_depth_validation() {
        let validator = SecurityValidator::with_max_depth(100);

        assert!(validator.validate_depth(100).is_ok());
        assert!(validator.validate_depth(101).is_err());
        assert!(SecurityValidator::new().validate_depth(MAX_NESTING_DEPTH).is_ok());
    }

    proptest! {
        #[test]
        fn prop_dangerous_url_schemes_are_rejected(
            leading_ws in "[ \\t\\n\\r]{0,3}",
            payload in "[A-Za-z0-9_/?=&:%#.-]{0,64}",
            uppercase in any::<bool>(),
        ) {
            let validator = SecurityValidator::new();

            for scheme in DANGEROUS_URL_SCHEMES {
                let scheme_variant = if uppercase {
                    scheme.to_uppercase()
                } else {
                    scheme.to_string()
                };
                let candidate = format!("{leading_ws}{scheme_variant}{payload}");

                prop_assert!(validator.is_dangerous_url(&candidate));
                prop_assert_eq!(validator.sanitize_url(&candidate), None);
            }
        }
    }
}
