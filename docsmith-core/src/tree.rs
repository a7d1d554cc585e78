//! Arena-backed document tree.
//!
//! Nodes live in a single `Vec` and refer to each other by [`NodeId`].
//! Passes take `&mut Tree` for their whole run, so there is exactly one
//! writer at a time and no shared node handles to juggle.

use serde_json::Value;
use std::collections::BTreeMap;

/// Index of a node inside its [`Tree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Element,
    Text,
    /// Pre-rendered HTML, emitted verbatim
    Raw,
    /// Module-level `import`/`export` statement
    Esm,
}

/// String-keyed element properties
pub type Properties = BTreeMap<String, Value>;

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub tag: Option<String>,
    pub properties: Properties,
    /// Text, raw HTML or ESM source
    pub value: Option<String>,
    /// Evaluated value of an ESM statement, when known
    pub expression: Option<Value>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            tag: None,
            properties: Properties::new(),
            value: None,
            expression: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// True for an element with the given tag name
    pub fn is_element(&self, tag: &str) -> bool {
        self.kind == NodeKind::Element && self.tag.as_deref() == Some(tag)
    }

    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    pub fn set_prop(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(key.into(), value.into());
    }

    /// `className` entries, in order
    pub fn class_names(&self) -> Vec<&str> {
        match self.properties.get("className") {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(s)) => s.split_whitespace().collect(),
            _ => Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// A parsed document: root node plus everything below it
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Root)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1 && self.nodes[0].children.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    fn push(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn append_element(&mut self, parent: NodeId, tag: impl Into<String>) -> NodeId {
        let mut node = Node::new(NodeKind::Element);
        node.tag = Some(tag.into());
        self.push(parent, node)
    }

    /// Append text, merging into the previous sibling when it is also text
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        if let Some(&last) = self.nodes[parent.0].children.last() {
            let node = &mut self.nodes[last.0];
            if node.kind == NodeKind::Text {
                node.value.get_or_insert_with(String::new).push_str(text);
                return last;
            }
        }
        let mut node = Node::new(NodeKind::Text);
        node.value = Some(text.to_string());
        self.push(parent, node)
    }

    pub fn append_raw(&mut self, parent: NodeId, html: impl Into<String>) -> NodeId {
        let mut node = Node::new(NodeKind::Raw);
        node.value = Some(html.into());
        self.push(parent, node)
    }

    pub fn append_esm(
        &mut self,
        parent: NodeId,
        source: impl Into<String>,
        expression: Option<Value>,
    ) -> NodeId {
        let mut node = Node::new(NodeKind::Esm);
        node.value = Some(source.into());
        node.expression = expression;
        self.push(parent, node)
    }

    /// Turn a text node into raw HTML in place
    pub fn replace_with_raw(&mut self, id: NodeId, html: impl Into<String>) {
        let node = &mut self.nodes[id.0];
        node.kind = NodeKind::Raw;
        node.value = Some(html.into());
    }

    /// Detach all children of a node (the detached nodes stay in the arena)
    pub fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    /// All nodes reachable from the root, in document (pre-)order
    pub fn walk(&self) -> Vec<NodeId> {
        self.descendants(self.root())
    }

    /// `id` and everything below it, in document (pre-)order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            order.push(next);
            stack.extend(self.nodes[next.0].children.iter().rev().copied());
        }
        order
    }

    /// Flattened text content of a node
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node_id in self.descendants(id) {
            let node = &self.nodes[node_id.0];
            if node.kind == NodeKind::Text {
                if let Some(value) = &node.value {
                    out.push_str(value);
                }
            }
        }
        out
    }

    /// First element with the given tag, in document order
    pub fn find_first(&self, tag: &str) -> Option<NodeId> {
        self.walk()
            .into_iter()
            .find(|id| self.nodes[id.0].is_element(tag))
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_walk_order() {
        let mut tree = Tree::new();
        let root = tree.root();
        let h2 = tree.append_element(root, "h2");
        tree.append_text(h2, "Title");
        let p = tree.append_element(root, "p");
        tree.append_text(p, "Body");

        let tags: Vec<_> = tree
            .walk()
            .into_iter()
            .map(|id| tree.node(id).tag.clone().unwrap_or_default())
            .collect();
        assert_eq!(tags, vec!["", "h2", "", "p", ""]);
        assert_eq!(tree.parent(h2), Some(root));
    }

    #[test]
    fn test_adjacent_text_merges() {
        let mut tree = Tree::new();
        let code = tree.append_element(tree.root(), "code");
        let first = tree.append_text(code, "fn main() {\n");
        let second = tree.append_text(code, "}\n");

        assert_eq!(first, second);
        assert_eq!(tree.children(code).len(), 1);
        assert_eq!(tree.text_content(code), "fn main() {\n}\n");
    }

    #[test]
    fn test_text_content_flattens_nested() {
        let mut tree = Tree::new();
        let h2 = tree.append_element(tree.root(), "h2");
        tree.append_text(h2, "Using ");
        let code = tree.append_element(h2, "code");
        tree.append_text(code, "cargo");
        tree.append_text(h2, " today");

        assert_eq!(tree.text_content(h2), "Using cargo today");
    }

    #[test]
    fn test_class_names() {
        let mut tree = Tree::new();
        let code = tree.append_element(tree.root(), "code");
        tree.node_mut(code)
            .set_prop("className", serde_json::json!(["language-rust", "extra"]));

        assert_eq!(tree.node(code).class_names(), vec!["language-rust", "extra"]);
    }

    #[test]
    fn test_clear_children_detaches() {
        let mut tree = Tree::new();
        let img = tree.append_element(tree.root(), "img");
        let alt = tree.append_text(img, "alt");
        tree.clear_children(img);

        assert!(tree.children(img).is_empty());
        assert_eq!(tree.parent(alt), None);
        assert_eq!(tree.walk().len(), 2);
    }
}
