//! Markdown cleanup and size budget
//!
//! Raw renderer output still carries noise: tags that leaked through, link
//! syntax when links are not wanted, runs of blank lines, emphasis markers
//! left dangling inside brackets. The post-processor removes that noise with a
//! fixed, ordered table of text rules and then enforces the size budget.
//!
//! # Rules
//!
//! | # | Rule | Applies |
//! |---|------|---------|
//! | 1 | strip markup comments and leaked tags | always |
//! | 2 | flatten links, drop reference definitions and empty `[]` | links stripped |
//! | 3 | LF line endings, at most one blank line, single spaces | always |
//! | 4 | no blank line before list items and table rows | always |
//! | 5 | collapse remaining double blank lines | always |
//! | 6 | drop `[ * ]` artifacts and dangling `*` before `]` | always |
//! | 7 | trim | always |
//! | 8 | keep the first `max_length` characters and append the continuation hint | budget set |
//!
//! Rules 1-7 run as a sequence until a pass changes nothing. Every rule only
//! shortens the text (rule 3 also rewrites `\r` and tabs in place), so the loop ends, and
//! its result is a fixpoint: cleaning it again is a no-op.
//!
//! # Example
//!
//! ```rust
//! use article_markdown_converter::postprocess::post_process;
//!
//! let cleaned = post_process("See [here](http://x) and [][ref]", false, 0, "");
//! assert_eq!(cleaned, "See here and");
//!
//! let cut = post_process("abcdefghijklmnopqrst", false, 10, "...more");
//! assert_eq!(cut, "abcdefghij...more");
//! ```

use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, trace};

/// Default size budget in characters
pub const DEFAULT_MAX_LENGTH: usize = 80_000;

/// Standard continuation hint pointing readers at the full article
///
/// # Examples
///
/// ```
/// use article_markdown_converter::postprocess::continuation_notice;
///
/// assert_eq!(
///     continuation_notice("https://news.example/a/1"),
///     "\n\n[Truncated, for full content, please visit: https://news.example/a/1]"
/// );
/// ```
pub fn continuation_notice(url: &str) -> String {
    format!("\n\n[Truncated, for full content, please visit: {url}]")
}

/// When a cleanup rule runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleCondition {
    /// On every pass
    Always,
    /// Only when link preservation is disabled
    LinksStripped,
}

/// One numbered text rewrite
#[derive(Debug, Clone, Copy)]
pub struct CleanupRule {
    /// Position in the fixed order
    pub number: u8,
    /// Short name for logs
    pub name: &'static str,
    /// When the rule applies
    pub condition: RuleCondition,
    /// The rewrite itself; pure and total
    pub apply: fn(&str) -> String,
}

impl CleanupRule {
    /// Returns true if the rule runs for this link setting
    pub fn applies(&self, preserve_links: bool) -> bool {
        match self.condition {
            RuleCondition::Always => true,
            RuleCondition::LinksStripped => !preserve_links,
        }
    }
}

/// Rules 1-7 in application order
pub const CLEANUP_RULES: &[CleanupRule] = &[
    CleanupRule {
        number: 1,
        name: "strip-markup",
        condition: RuleCondition::Always,
        apply: strip_markup,
    },
    CleanupRule {
        number: 2,
        name: "flatten-links",
        condition: RuleCondition::LinksStripped,
        apply: flatten_links,
    },
    CleanupRule {
        number: 3,
        name: "normalize-whitespace",
        condition: RuleCondition::Always,
        apply: normalize_whitespace,
    },
    CleanupRule {
        number: 4,
        name: "tighten-lists",
        condition: RuleCondition::Always,
        apply: tighten_lists,
    },
    CleanupRule {
        number: 5,
        name: "collapse-blank-lines",
        condition: RuleCondition::Always,
        apply: collapse_blank_lines,
    },
    CleanupRule {
        number: 6,
        name: "strip-emphasis-artifacts",
        condition: RuleCondition::Always,
        apply: strip_emphasis_artifacts,
    },
    CleanupRule {
        number: 7,
        name: "trim",
        condition: RuleCondition::Always,
        apply: trim,
    },
];

/// Cleanup configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupOptions {
    /// Keep link syntax instead of flattening it to text
    pub preserve_links: bool,
    /// Size budget in characters; `None` means unlimited
    pub max_length: Option<usize>,
    /// Appended verbatim when the budget cuts the text
    pub continuation_hint: String,
}

impl CleanupOptions {
    /// Build options from the caller-facing integer budget
    ///
    /// A budget of zero or less means "no limit".
    pub fn new(preserve_links: bool, max_length: i64, continuation_hint: impl Into<String>) -> Self {
        Self {
            preserve_links,
            max_length: usize::try_from(max_length).ok().filter(|&max| max > 0),
            continuation_hint: continuation_hint.into(),
        }
    }
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            preserve_links: false,
            max_length: Some(DEFAULT_MAX_LENGTH),
            continuation_hint: String::new(),
        }
    }
}

/// Clean raw Markdown and enforce the size budget
///
/// Pure and total. `max_length <= 0` disables the budget; the hint is only
/// appended when the text is cut.
pub fn post_process(
    raw: &str,
    preserve_links: bool,
    max_length: i64,
    continuation_hint: &str,
) -> String {
    MarkdownPostProcessor::new(CleanupOptions::new(
        preserve_links,
        max_length,
        continuation_hint,
    ))
    .process(raw)
}

/// Applies the cleanup rules and the budget for one configuration
#[derive(Debug, Clone, Default)]
pub struct MarkdownPostProcessor {
    options: CleanupOptions,
}

impl MarkdownPostProcessor {
    pub fn new(options: CleanupOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CleanupOptions {
        &self.options
    }

    /// Rules 1-8
    pub fn process(&self, raw: &str) -> String {
        if let Some(max) = self.options.max_length
            && self.is_already_truncated(raw, max)
        {
            trace!("input already carries the continuation hint");
            return raw.to_string();
        }

        let cleaned = self.clean(raw);

        match self.options.max_length {
            Some(max) => self.apply_budget(cleaned, max),
            None => cleaned,
        }
    }

    /// Rules 1-7, repeated until a pass changes nothing
    pub fn clean(&self, raw: &str) -> String {
        let mut current = raw.to_string();
        let mut passes = 0usize;

        loop {
            passes += 1;
            let next = self.clean_once(&current);
            if next == current {
                break;
            }
            current = next;
        }

        debug!(
            passes,
            input_len = raw.len(),
            output_len = current.len(),
            "cleaned markdown"
        );
        current
    }

    fn clean_once(&self, text: &str) -> String {
        let mut current = text.to_string();
        for rule in CLEANUP_RULES {
            if rule.applies(self.options.preserve_links) {
                let next = (rule.apply)(&current);
                if next != current {
                    trace!(rule = rule.number, name = rule.name, "cleanup rule rewrote text");
                }
                current = next;
            }
        }
        current
    }

    /// Output of an earlier run: a clean body within budget followed by the hint
    fn is_already_truncated(&self, text: &str, max: usize) -> bool {
        let hint = self.options.continuation_hint.as_str();
        if hint.is_empty() {
            return false;
        }
        match text.strip_suffix(hint) {
            Some(body) => {
                let clean_body = body.trim_end();
                body.chars().count() <= max && self.clean_once(clean_body) == clean_body
            }
            None => false,
        }
    }

    /// Rule 8
    ///
    /// Keeps exactly `max` characters. Whitespace at the cut is dropped only
    /// when the hint is empty or starts with whitespace itself, so the result
    /// never ends in whitespace a second cleanup pass would trim.
    fn apply_budget(&self, text: String, max: usize) -> String {
        let cut = text.char_indices().nth(max).map(|(index, _)| index);
        let Some(cut) = cut else {
            return text;
        };

        let hint = self.options.continuation_hint.as_str();
        let kept = &text[..cut];
        let kept = if hint.is_empty() || hint.starts_with(char::is_whitespace) {
            kept.trim_end()
        } else {
            kept
        };
        let mut truncated = kept.to_string();
        truncated.push_str(&self.options.continuation_hint);
        debug!(
            max_length = max,
            original_chars = max + text[cut..].chars().count(),
            "truncated markdown to budget"
        );
        truncated
    }
}

fn regex(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn replace(re: Option<&Regex>, text: &str, replacement: &str) -> String {
    match re {
        Some(re) => re.replace_all(text, replacement).into_owned(),
        None => text.to_string(),
    }
}

fn until_stable(text: &str, step: impl Fn(&str) -> String) -> String {
    let mut current = text.to_string();
    loop {
        let next = step(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Rule 1: markup comments and tags the renderer passed through
pub fn strip_markup(text: &str) -> String {
    static COMMENT: OnceLock<Option<Regex>> = OnceLock::new();
    static TAG: OnceLock<Option<Regex>> = OnceLock::new();

    until_stable(text, |current| {
        let without_comments = replace(regex(&COMMENT, r"(?s)<!--.*?-->"), current, "");
        replace(regex(&TAG, r"<[^>]+>"), &without_comments, "")
    })
}

/// Rule 2: links become their text; image syntax is left alone
pub fn flatten_links(text: &str) -> String {
    static INLINE_LINK: OnceLock<Option<Regex>> = OnceLock::new();
    static REFERENCE_LINK: OnceLock<Option<Regex>> = OnceLock::new();
    static REFERENCE_DEFINITION: OnceLock<Option<Regex>> = OnceLock::new();
    static EMPTY_BRACKETS: OnceLock<Option<Regex>> = OnceLock::new();

    until_stable(text, |current| {
        let flattened = replace(
            regex(&INLINE_LINK, r"(^|[^!])\[([^\]]*)\]\([^)]*\)"),
            current,
            "${1}${2}",
        );
        let flattened = replace(
            regex(&REFERENCE_LINK, r"(^|[^!])\[([^\]]*)\]\[[^\]]*\]"),
            &flattened,
            "${1}${2}",
        );
        let flattened = replace(
            regex(&REFERENCE_DEFINITION, r"(?m)^[ \t]*\[[^\]]+\]:[ \t]+\S+.*$"),
            &flattened,
            "",
        );
        replace(regex(&EMPTY_BRACKETS, r"(^|[^!])\[\s*\]"), &flattened, "${1}")
    })
}

/// Rule 3: LF line endings, at most one blank line, single spaces
pub fn normalize_whitespace(text: &str) -> String {
    static BLANK_RUN: OnceLock<Option<Regex>> = OnceLock::new();
    static SPACE_RUN: OnceLock<Option<Regex>> = OnceLock::new();

    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = replace(regex(&BLANK_RUN, r"\n{3,}"), &text, "\n\n");
    replace(regex(&SPACE_RUN, r"[ \t]{2,}|\t"), &text, " ")
}

/// Rule 4: list items and table rows directly follow the previous line
pub fn tighten_lists(text: &str) -> String {
    static BULLET: OnceLock<Option<Regex>> = OnceLock::new();
    static ORDERED: OnceLock<Option<Regex>> = OnceLock::new();
    static TABLE_ROW: OnceLock<Option<Regex>> = OnceLock::new();

    let text = replace(
        regex(&BULLET, r"\n{2,}([ \t]*[-*+][ \t])"),
        text,
        "\n${1}",
    );
    let text = replace(
        regex(&ORDERED, r"\n{2,}([ \t]*\d+\.[ \t])"),
        &text,
        "\n${1}",
    );
    replace(regex(&TABLE_ROW, r"\n{2,}([ \t]*\|)"), &text, "\n${1}")
}

/// Rule 5: two blank lines (possibly holding spaces) become one
pub fn collapse_blank_lines(text: &str) -> String {
    static DOUBLE_BLANK: OnceLock<Option<Regex>> = OnceLock::new();

    replace(regex(&DOUBLE_BLANK, r"\n\s*\n\s*\n"), text, "\n\n")
}

/// Rule 6: `[ * ]` and `*` dangling before `]`
pub fn strip_emphasis_artifacts(text: &str) -> String {
    static STAR_BRACKETS: OnceLock<Option<Regex>> = OnceLock::new();
    static DANGLING_STAR: OnceLock<Option<Regex>> = OnceLock::new();

    until_stable(text, |current| {
        let cleaned = replace(regex(&STAR_BRACKETS, r"\[\s*\*\s*\]"), current, "");
        replace(regex(&DANGLING_STAR, r"\*\s*\]"), &cleaned, "]")
    })
}

/// Rule 7
pub fn trim(text: &str) -> String {
    text.trim().to_string()
}
