#[cfg(test)]
mod tests;

use std::sync::LazyLock;

use fancy_regex::Regex;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use scraper::{ElementRef, Html};

static TRAILING_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+\n").expect("valid regex"));
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));
static INLINE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \r\n\t]+").expect("valid regex"));

/// Elements whose text never reaches the extracted output
const SKIPPED_ELEMENTS: &[&str] = &["head", "script", "style", "noscript", "template"];

/// Elements that start a new paragraph
const BLOCK_ELEMENTS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "dd",
    "details",
    "div",
    "dl",
    "dt",
    "figcaption",
    "figure",
    "footer",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "summary",
    "table",
    "ul",
];

/// Elements that only start a new line
const LINE_ELEMENTS: &[&str] = &["br", "li", "tr"];

/// Flatten markdown into plain text with paragraphs separated by blank lines
#[inline]
pub fn markdown_to_text(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut text = String::new();
    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Start(tag) => match tag {
                Tag::Heading { .. }
                | Tag::Paragraph
                | Tag::CodeBlock(_)
                | Tag::BlockQuote(_)
                | Tag::List(_)
                | Tag::Table(_) => start_paragraph(&mut text),
                Tag::Item => {
                    start_line(&mut text);
                    text.push_str("- ");
                }
                _ => {}
            },
            Event::End(tag_end) => match tag_end {
                TagEnd::Heading(_)
                | TagEnd::Paragraph
                | TagEnd::CodeBlock
                | TagEnd::BlockQuote(_)
                | TagEnd::List(_)
                | TagEnd::Table => start_paragraph(&mut text),
                TagEnd::TableCell => text.push(' '),
                TagEnd::TableHead | TagEnd::TableRow | TagEnd::Item => start_line(&mut text),
                _ => {}
            },
            Event::Text(content) | Event::Code(content) => text.push_str(&content),
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            Event::Rule => start_paragraph(&mut text),
            _ => {}
        }
    }

    normalize_whitespace(&text)
}

/// Extract the visible text of an HTML document
#[inline]
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut text = String::new();
    collect_text(document.root_element(), false, &mut text);
    normalize_whitespace(&text)
}

fn collect_text(element: ElementRef<'_>, preformatted: bool, out: &mut String) {
    let name = element.value().name();
    if SKIPPED_ELEMENTS.contains(&name) {
        return;
    }

    let is_block = BLOCK_ELEMENTS.contains(&name);
    let is_line = LINE_ELEMENTS.contains(&name);
    let preformatted = preformatted || name == "pre";

    if is_block {
        start_paragraph(out);
    } else if is_line {
        start_line(out);
    }

    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            collect_text(child_element, preformatted, out);
        } else if let Some(content) = child.value().as_text() {
            if preformatted {
                out.push_str(content);
            } else {
                let collapsed = INLINE_WHITESPACE.replace_all(content, " ");
                if out.is_empty() || out.ends_with(char::is_whitespace) {
                    out.push_str(collapsed.trim_start());
                } else {
                    out.push_str(&collapsed);
                }
            }
        }
    }

    if is_block {
        start_paragraph(out);
    } else if name == "td" || name == "th" {
        out.push(' ');
    }
}

fn start_paragraph(text: &mut String) {
    if !text.is_empty() && !text.ends_with("\n\n") {
        text.push_str(if text.ends_with('\n') { "\n" } else { "\n\n" });
    }
}

fn start_line(text: &mut String) {
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
}

/// Strip trailing spaces and collapse runs of blank lines into a single paragraph break.
/// Leading indentation only survives from preformatted text and code blocks.
fn normalize_whitespace(text: &str) -> String {
    let text = TRAILING_SPACE.replace_all(text, "\n");
    let text = BLANK_LINES.replace_all(&text, "\n\n");
    text.trim_start_matches(['\n', '\r']).trim_end().to_string()
}
