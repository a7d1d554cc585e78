//! Builds the page outline from `h2`/`h3` headings.

use crate::tree::{NodeId, NodeKind, Tree};
use docsmith_types::Section;
use serde_json::{Map, Value};

/// Walk the tree in document order and collect `h2` sections with their
/// `h3` children.
///
/// Headings nested in wrapper elements are found too. An `h3` before the
/// first `h2` has nowhere to go and is dropped.
pub fn extract_sections(tree: &Tree) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    for &child in tree.children(tree.root()) {
        visit(tree, child, &mut sections);
    }
    sections
}

fn visit(tree: &Tree, id: NodeId, sections: &mut Vec<Section>) {
    let node = tree.node(id);
    if node.kind != NodeKind::Element {
        return;
    }

    if node.is_element("h2") {
        sections.push(Section::top(tree.text_content(id), heading_id(tree, id)).with_annotation(annotation(tree, id)));
        return;
    }

    if node.is_element("h3") {
        if let Some(open) = sections.last_mut().and_then(|s| s.children.as_mut()) {
            open.push(Section::leaf(tree.text_content(id), heading_id(tree, id)).with_annotation(annotation(tree, id)));
            return;
        }
    }

    for &child in node.children() {
        visit(tree, child, sections);
    }
}

fn heading_id(tree: &Tree, id: NodeId) -> String {
    tree.node(id).prop_str("id").unwrap_or_default().to_string()
}

fn annotation(tree: &Tree, id: NodeId) -> Map<String, Value> {
    match tree.node(id).prop("annotation") {
        Some(Value::Object(object)) => object.clone(),
        _ => Map::new(),
    }
}
