//! Markdown renderer for sanitized trees
//!
//! Turns a Native-only [`Fragment`] into raw Markdown. The output is not yet
//! normalized: block elements are separated generously and the cleanup pass
//! in [`crate::postprocess`] collapses the surplus.
//!
//! # Supported Elements
//!
//! - Headings (h1-h6) as ATX headings
//! - Paragraphs, line breaks and horizontal rules
//! - Bold (`**`), italic (`*`), strikethrough (`~~`); u/ins render as plain text
//! - Links `[text](href)` and images `![alt](src)`
//! - Unordered (`-`) and ordered (`1.`) lists, nested with two-space indents
//! - Blockquotes, fenced code blocks and inline code
//! - GFM tables and definition lists
//!
//! Anything else renders its children, so text is never lost even when a tree
//! skipped the unwrapper.
//!
//! # Security
//!
//! Link and image targets with executable schemes are dropped; the link text
//! is kept, the image is not rendered.

use crate::node::{Element, Fragment, MarkupNode};
use crate::policy;
use crate::security::SecurityValidator;
use tracing::warn;

/// Renders markup trees to Markdown
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    validator: SecurityValidator,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self {
            validator: SecurityValidator::new(),
        }
    }

    /// Create a renderer with a custom nesting limit
    pub fn with_validator(validator: SecurityValidator) -> Self {
        Self { validator }
    }

    /// Render a fragment to raw Markdown
    ///
    /// # Examples
    ///
    /// ```
    /// use article_markdown_converter::node::{Element, Fragment, MarkupNode};
    /// use article_markdown_converter::renderer::MarkdownRenderer;
    ///
    /// let fragment = Fragment::from(
    ///     Element::new("h2")?.with_child(MarkupNode::text("Headline")),
    /// );
    /// assert_eq!(MarkdownRenderer::new().render(&fragment), "## Headline\n\n");
    /// # Ok::<(), article_markdown_converter::ConversionError>(())
    /// ```
    pub fn render(&self, fragment: &Fragment) -> String {
        let mut output = String::new();
        for node in fragment.nodes() {
            self.render_node(node, &mut output, 0);
        }
        output
    }

    fn render_node(&self, node: &MarkupNode, output: &mut String, depth: usize) {
        match node {
            MarkupNode::Element(element) => self.render_element(element, output, depth),
            MarkupNode::Text(text) => push_text(output, text),
            MarkupNode::Comment(_) => {}
        }
    }

    fn render_children(&self, element: &Element, output: &mut String, depth: usize) {
        for child in element.children() {
            self.render_node(child, output, depth + 1);
        }
    }

    fn render_element(&self, element: &Element, output: &mut String, depth: usize) {
        if let Err(message) = self.validator.validate_depth(depth) {
            warn!(tag = element.name(), "{message}; subtree not rendered");
            return;
        }

        match element.name() {
            "h1" => self.render_heading(element, 1, output, depth),
            "h2" => self.render_heading(element, 2, output, depth),
            "h3" => self.render_heading(element, 3, output, depth),
            "h4" => self.render_heading(element, 4, output, depth),
            "h5" => self.render_heading(element, 5, output, depth),
            "h6" => self.render_heading(element, 6, output, depth),
            "p" => {
                block_break(output);
                self.render_children(element, output, depth);
                block_break(output);
            }
            "br" => {
                trim_trailing_spaces(output);
                output.push('\n');
            }
            "hr" => {
                block_break(output);
                output.push_str("---");
                block_break(output);
            }
            "strong" | "b" => self.render_wrapped(element, "**", output, depth),
            "em" | "i" => self.render_wrapped(element, "*", output, depth),
            "s" | "del" => self.render_wrapped(element, "~~", output, depth),
            "a" => self.render_link(element, output),
            "img" => self.render_image(element, output),
            "ul" => self.render_list(element, output, depth, 0, false),
            "ol" => self.render_list(element, output, depth, 0, true),
            "li" => {
                ensure_line_start(output);
                self.render_list_item(element, "- ", output, depth, 0);
            }
            "blockquote" => self.render_blockquote(element, output, depth),
            "pre" => render_code_block(element, output),
            "code" => render_inline_code(element, output),
            "table" => self.render_table(element, output, depth),
            "dl" => self.render_definition_list(element, output, depth),
            "th" | "td" => {
                self.render_children(element, output, depth);
                push_separator(output);
            }
            // u, ins, stray table sections and anything not handled above
            name => {
                let block = policy::is_block(name);
                if block {
                    block_break(output);
                }
                self.render_children(element, output, depth);
                if block {
                    block_break(output);
                }
            }
        }
    }

    fn render_heading(&self, element: &Element, level: usize, output: &mut String, depth: usize) {
        let mut inner = String::new();
        self.render_children(element, &mut inner, depth);
        let text = collapse_whitespace(&inner);
        if text.is_empty() {
            return;
        }

        block_break(output);
        output.push_str(&"#".repeat(level));
        output.push(' ');
        output.push_str(&text);
        block_break(output);
    }

    /// Inline formatting: render into a scratch buffer, wrap the trimmed
    /// content, and put the surrounding spaces back outside the markers.
    fn render_wrapped(&self, element: &Element, marker: &str, output: &mut String, depth: usize) {
        let mut inner = String::new();
        self.render_children(element, &mut inner, depth);
        push_delimited(output, &inner, marker, marker);
    }

    fn render_link(&self, element: &Element, output: &mut String) {
        let text = element.text_content();
        let label = collapse_whitespace(&text);
        if label.is_empty() {
            return;
        }

        match element.attr("href").and_then(|href| self.validator.sanitize_url(href)) {
            Some(href) => {
                let lead = if text.starts_with(char::is_whitespace) { " " } else { "" };
                let trail = if text.ends_with(char::is_whitespace) { " " } else { "" };
                let closing = format!("]({href})");
                push_delimited(output, &format!("{lead}{label}{trail}"), "[", &closing);
            }
            None => push_text(output, &text),
        }
    }

    fn render_image(&self, element: &Element, output: &mut String) {
        let Some(src) = element
            .attr("src")
            .and_then(|src| self.validator.sanitize_url(src))
        else {
            return;
        };
        let alt = collapse_whitespace(element.attr("alt").unwrap_or_default());

        output.push_str("![");
        output.push_str(&alt);
        output.push_str("](");
        output.push_str(src);
        output.push(')');
    }

    /// `level` is the list nesting used for indentation
    fn render_list(
        &self,
        element: &Element,
        output: &mut String,
        depth: usize,
        level: usize,
        ordered: bool,
    ) {
        if level == 0 {
            block_break(output);
        } else {
            ensure_line_start(output);
        }

        let mut number = 1usize;
        for child in element.children() {
            match child {
                MarkupNode::Element(item) if item.name() == "li" => {
                    let marker = list_marker(ordered, number);
                    self.render_list_item(item, &marker, output, depth + 1, level);
                    number += 1;
                }
                MarkupNode::Element(nested) if matches!(nested.name(), "ul" | "ol") => {
                    let nested_ordered = nested.name() == "ol";
                    self.render_list(nested, output, depth + 1, level + 1, nested_ordered);
                }
                other if other.has_significant_text() => {
                    let marker = list_marker(ordered, number);
                    let mut line = String::new();
                    self.render_node(other, &mut line, depth + 1);
                    push_list_line(output, level, &marker, &collapse_whitespace(&line));
                    number += 1;
                }
                _ => {}
            }
        }

        if level == 0 {
            block_break(output);
        }
    }

    fn render_list_item(
        &self,
        item: &Element,
        marker: &str,
        output: &mut String,
        depth: usize,
        level: usize,
    ) {
        let mut line = String::new();
        let mut nested = Vec::new();

        for child in item.children() {
            match child {
                MarkupNode::Element(list) if matches!(list.name(), "ul" | "ol") => {
                    nested.push(list)
                }
                other => self.render_node(other, &mut line, depth + 1),
            }
        }

        push_list_line(output, level, marker, &collapse_whitespace(&line));

        for list in nested {
            let ordered = list.name() == "ol";
            self.render_list(list, output, depth + 1, level + 1, ordered);
        }
    }

    fn render_blockquote(&self, element: &Element, output: &mut String, depth: usize) {
        let mut inner = String::new();
        self.render_children(element, &mut inner, depth);
        let content = inner.trim();
        if content.is_empty() {
            return;
        }

        block_break(output);
        for line in content.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                output.push_str(">\n");
            } else {
                output.push_str("> ");
                output.push_str(line);
                output.push('\n');
            }
        }
        block_break(output);
    }

    fn render_table(&self, element: &Element, output: &mut String, depth: usize) {
        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut stray = String::new();
        self.collect_table_rows(element, &mut rows, &mut stray, depth);

        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        if columns > 0 {
            block_break(output);
            for (index, row) in rows.iter().enumerate() {
                write_table_row(output, row, columns);
                if index == 0 {
                    write_table_separator(output, columns);
                }
            }
            block_break(output);
        }

        let stray = collapse_whitespace(&stray);
        if !stray.is_empty() {
            block_break(output);
            output.push_str(&stray);
            block_break(output);
        }
    }

    /// Rows from the table and its sections, in document order
    fn collect_table_rows(
        &self,
        element: &Element,
        rows: &mut Vec<Vec<String>>,
        stray: &mut String,
        depth: usize,
    ) {
        for child in element.children() {
            match child {
                MarkupNode::Element(section)
                    if matches!(section.name(), "thead" | "tbody" | "tfoot") =>
                {
                    self.collect_table_rows(section, rows, stray, depth + 1);
                }
                MarkupNode::Element(row) if row.name() == "tr" => {
                    let cells = self.table_cells(row, depth + 1);
                    if !cells.is_empty() {
                        rows.push(cells);
                    }
                }
                other => self.render_node(other, stray, depth + 1),
            }
        }
    }

    fn table_cells(&self, row: &Element, depth: usize) -> Vec<String> {
        row.children()
            .iter()
            .filter_map(MarkupNode::as_element)
            .filter(|cell| matches!(cell.name(), "th" | "td"))
            .map(|cell| {
                let mut inner = String::new();
                self.render_children(cell, &mut inner, depth + 1);
                collapse_whitespace(&inner).replace('|', "\\|")
            })
            .collect()
    }

    fn render_definition_list(&self, element: &Element, output: &mut String, depth: usize) {
        block_break(output);
        for child in element.children() {
            let prefix = match child.as_element().map(Element::name) {
                Some("dt") => "",
                Some("dd") => ": ",
                _ => {
                    self.render_node(child, output, depth + 1);
                    continue;
                }
            };

            let mut inner = String::new();
            self.render_node(child, &mut inner, depth + 1);
            let text = collapse_whitespace(&inner);
            if text.is_empty() {
                continue;
            }
            ensure_line_start(output);
            output.push_str(prefix);
            output.push_str(&text);
            output.push('\n');
        }
        block_break(output);
    }
}

fn list_marker(ordered: bool, number: usize) -> String {
    if ordered {
        format!("{number}. ")
    } else {
        "- ".to_string()
    }
}

fn push_list_line(output: &mut String, level: usize, marker: &str, text: &str) {
    output.push_str(&"  ".repeat(level));
    output.push_str(marker);
    output.push_str(text);
    output.push('\n');
}

fn render_code_block(element: &Element, output: &mut String) {
    let code = element.text_content();
    let code = code.trim_matches('\n');
    if code.trim().is_empty() {
        return;
    }

    block_break(output);
    output.push_str("```\n");
    output.push_str(code);
    output.push_str("\n```");
    block_break(output);
}

fn render_inline_code(element: &Element, output: &mut String) {
    let code = element.text_content().replace(['\r', '\n'], " ");
    if code.trim().is_empty() {
        return;
    }
    output.push('`');
    output.push_str(&code);
    output.push('`');
}

fn write_table_row(output: &mut String, cells: &[String], columns: usize) {
    output.push('|');
    for index in 0..columns {
        output.push(' ');
        if let Some(cell) = cells.get(index) {
            output.push_str(cell);
        }
        output.push_str(" |");
    }
    output.push('\n');
}

fn write_table_separator(output: &mut String, columns: usize) {
    output.push('|');
    for _ in 0..columns {
        output.push_str(" --- |");
    }
    output.push('\n');
}

/// Words of `text` joined by single spaces
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn needs_space(output: &str) -> bool {
    !output.is_empty() && !output.ends_with(char::is_whitespace)
}

fn push_separator(output: &mut String) {
    if needs_space(output) {
        output.push(' ');
    }
}

/// Append text with its whitespace runs collapsed, keeping one space at
/// either edge where the source had whitespace
fn push_text(output: &mut String, text: &str) {
    let collapsed = collapse_whitespace(text);
    if collapsed.is_empty() {
        if !text.is_empty() {
            push_separator(output);
        }
        return;
    }

    if text.starts_with(char::is_whitespace) {
        push_separator(output);
    }
    output.push_str(&collapsed);
    if text.ends_with(char::is_whitespace) {
        output.push(' ');
    }
}

/// Wrap rendered inline content in delimiters, moving edge spaces outside
fn push_delimited(output: &mut String, inner: &str, open: &str, close: &str) {
    let content = inner.trim();
    if content.is_empty() {
        if !inner.is_empty() {
            push_separator(output);
        }
        return;
    }

    if inner.starts_with(char::is_whitespace) {
        push_separator(output);
    }
    output.push_str(open);
    output.push_str(content);
    output.push_str(close);
    if inner.ends_with(char::is_whitespace) {
        output.push(' ');
    }
}

fn trim_trailing_spaces(output: &mut String) {
    let trimmed = output.trim_end_matches([' ', '\t']).len();
    output.truncate(trimmed);
}

fn ensure_line_start(output: &mut String) {
    trim_trailing_spaces(output);
    if !output.is_empty() && !output.ends_with('\n') {
        output.push('\n');
    }
}

/// Leave the output at the start of a new block (one blank line after any
/// previous content)
fn block_break(output: &mut String) {
    trim_trailing_spaces(output);
    if output.is_empty() {
        return;
    }
    while !output.ends_with("\n\n") {
        output.push('\n');
    }
}
