//! HTML to text rendering
//!
//! Pages are reduced to readable text before anything else looks at them.
//! Anchors are kept as `[label](href)` so links can still be extracted from the
//! rendered text and the oracle can read link labels in context.

use scraper::{ElementRef, Html, Node};

/// Elements whose content is never rendered
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "svg", "head"];

/// Elements rendered on their own line
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "section", "article", "header", "footer", "nav", "main", "aside", "li", "ul",
    "ol", "table", "tr", "h1", "h2", "h3", "h4", "h5", "h6", "br", "hr", "address", "blockquote",
    "pre", "form", "dl", "dt", "dd",
];

/// Renders an HTML document to link-preserving plain text
///
/// # Example
///
/// ```
/// use prospector::crawler::render_html;
///
/// let html = r#"<html><head><title>T</title></head><body><p>Hello</p><a href="/kontakt">Contact</a></body></html>"#;
/// let text = render_html(html);
/// assert!(text.contains("Hello"));
/// assert!(text.contains("[Contact](/kontakt)"));
/// ```
pub fn render_html(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::new();

    render_element(document.root_element(), &mut out);

    tidy(&out)
}

fn render_element(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();

    if SKIPPED_ELEMENTS.contains(&name) {
        return;
    }

    if name == "a" {
        let mut label = String::new();
        render_children(element, &mut label);
        let label = collapse_spaces(&label);

        match element.value().attr("href").map(str::trim) {
            Some(href) if !href.is_empty() => {
                out.push_str(&format!(" [{}]({}) ", label, href));
            }
            _ => out.push_str(&label),
        }
        return;
    }

    let is_block = BLOCK_ELEMENTS.contains(&name);
    if is_block {
        out.push('\n');
    }
    render_children(element, out);
    if is_block {
        out.push('\n');
    }
}

fn render_children(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    render_element(child, out);
                }
            }
            _ => {}
        }
    }
}

fn collapse_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapses whitespace within lines and drops empty lines
fn tidy(text: &str) -> String {
    text.lines()
        .map(collapse_spaces)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
