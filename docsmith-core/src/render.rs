//! HTML serialization of a processed tree, plus the table of contents.

use crate::tree::{NodeId, NodeKind, Tree};
use docsmith_types::Section;
use serde_json::Value;

const VOID_ELEMENTS: &[&str] = &["img", "br", "hr", "input"];

/// Elements rendered on lines of their own
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "pre", "blockquote", "ul", "ol", "li", "table",
    "thead", "tbody", "tr", "hr",
];

/// Containers whose opening tag is followed by a newline
const CONTAINER_ELEMENTS: &[&str] = &["blockquote", "ul", "ol", "table", "thead", "tbody", "tr"];

/// Render the tree as an HTML fragment. ESM statements are not part of the
/// body and are skipped.
pub fn render_html(tree: &Tree) -> String {
    let mut html = String::new();
    for &child in tree.children(tree.root()) {
        render_node(tree, child, &mut html);
    }
    html
}

fn render_node(tree: &Tree, id: NodeId, html: &mut String) {
    let node = tree.node(id);
    match node.kind {
        NodeKind::Root => {
            for &child in node.children() {
                render_node(tree, child, html);
            }
        }
        NodeKind::Text => html.push_str(&html_escape(node.value.as_deref().unwrap_or(""))),
        NodeKind::Raw => {
            html.push_str(node.value.as_deref().unwrap_or(""));
            if node.parent() == Some(tree.root()) && !html.ends_with('\n') {
                html.push('\n');
            }
        }
        NodeKind::Esm => {}
        NodeKind::Element => {
            let tag = node.tag.as_deref().unwrap_or("div");
            html.push('<');
            html.push_str(tag);
            for (name, value) in attributes(tree, id) {
                match value {
                    Some(value) => html.push_str(&format!(" {}=\"{}\"", name, html_escape(&value))),
                    None => html.push_str(&format!(" {}", name)),
                }
            }
            html.push('>');

            if VOID_ELEMENTS.contains(&tag) {
                if BLOCK_ELEMENTS.contains(&tag) {
                    html.push('\n');
                }
                return;
            }
            if CONTAINER_ELEMENTS.contains(&tag) {
                html.push('\n');
            }

            for &child in node.children() {
                render_node(tree, child, html);
            }

            html.push_str("</");
            html.push_str(tag);
            html.push('>');
            if BLOCK_ELEMENTS.contains(&tag) || node.parent() == Some(tree.root()) {
                html.push('\n');
            }
        }
    }
}

/// HTML attributes for an element, in a stable order. `None` means a bare
/// boolean attribute.
fn attributes(tree: &Tree, id: NodeId) -> Vec<(String, Option<String>)> {
    let node = tree.node(id);
    let mut attrs = Vec::new();

    for (key, value) in &node.properties {
        match key.as_str() {
            // Raw source is kept for tooling, not for markup
            "code" => {}
            "className" => {
                let classes = node.class_names().join(" ");
                if !classes.is_empty() {
                    attrs.push(("class".to_string(), Some(classes)));
                }
            }
            "language" => push_value(&mut attrs, "data-language".to_string(), value),
            "annotation" => {
                if let Value::Object(entries) = value {
                    for (name, entry) in entries {
                        push_value(&mut attrs, format!("data-{}", kebab_case(name)), entry);
                    }
                }
            }
            _ => push_value(&mut attrs, key.clone(), value),
        }
    }

    attrs
}

fn push_value(attrs: &mut Vec<(String, Option<String>)>, name: String, value: &Value) {
    match value {
        Value::Bool(true) => attrs.push((name, None)),
        Value::Bool(false) | Value::Null => {}
        Value::String(s) => attrs.push((name, Some(s.clone()))),
        other => attrs.push((name, Some(other.to_string()))),
    }
}

fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else if ch.is_alphanumeric() || ch == '-' {
            out.push(ch);
        } else {
            out.push('-');
        }
    }
    out
}

/// Render an outline as a nested navigation list. An empty outline renders
/// nothing.
pub fn render_toc(sections: &[Section]) -> String {
    if sections.is_empty() {
        return String::new();
    }
    let mut html = String::from(r#"<nav class="toc-nav"><h3>Contents</h3>"#);
    render_toc_list(sections, 2, "toc-list", &mut html);
    html.push_str("</nav>");
    html
}

fn render_toc_list(sections: &[Section], level: usize, class: &str, html: &mut String) {
    html.push_str(&format!(r#"<ul class="{}">"#, class));
    for section in sections {
        html.push_str(&format!(
            r##"<li class="toc-level-{}"><a href="#{}">{}</a>"##,
            level,
            html_escape(&section.id),
            html_escape(&section.title)
        ));
        if let Some(children) = section.children.as_deref().filter(|c| !c.is_empty()) {
            render_toc_list(children, level + 1, "toc-sublist", html);
        }
        html.push_str("</li>");
    }
    html.push_str("</ul>");
}

pub(crate) fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
