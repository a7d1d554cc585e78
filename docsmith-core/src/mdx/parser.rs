//! Building a [`Tree`] from MDX source.

use super::esm::{split_segments, Segment};
use crate::tree::{NodeId, Tree};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use serde_json::{json, Value};
use std::sync::OnceLock;

static OPEN_TAG: OnceLock<Regex> = OnceLock::new();
static CLOSE_TAG: OnceLock<Regex> = OnceLock::new();
static ATTRIBUTE: OnceLock<Regex> = OnceLock::new();

fn open_tag_regex() -> &'static Regex {
    OPEN_TAG.get_or_init(|| Regex::new(r"^<([A-Za-z][\w.:-]*)((?:\s[^<>]*)?)>$").unwrap())
}

fn close_tag_regex() -> &'static Regex {
    CLOSE_TAG.get_or_init(|| Regex::new(r"^</([A-Za-z][\w.:-]*)\s*>$").unwrap())
}

fn attribute_regex() -> &'static Regex {
    ATTRIBUTE.get_or_init(|| {
        Regex::new(
            r#"([A-Za-z_:][\w.:-]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|\{([^}]*)\}|([^\s"'=<>`]+)))?"#,
        )
        .unwrap()
    })
}

/// Markdown extensions enabled for content pages
pub fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    // Heading attributes stay off: `{{ ... }}` annotations would be
    // mistaken for `{#id .class}` blocks.
    options
}

/// Parse an MDX body (frontmatter already removed) into a document tree
pub fn parse_mdx(source: &str) -> Tree {
    let mut tree = Tree::new();
    let mut builder = TreeBuilder::new(&mut tree);

    for segment in split_segments(source) {
        match segment {
            Segment::Esm(src) => builder.push_esm(src),
            Segment::Markdown(markdown) => builder.push_markdown(&markdown),
        }
    }

    tree
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Root,
    /// Opened by a Markdown start event; closed by its end event
    Markdown,
    /// Opened by a standalone HTML/JSX tag; closed by the matching tag
    Wrapper,
    /// Structural helper (`code` in `pre`, `tbody`, header row)
    Implicit,
}

struct TreeBuilder<'t> {
    tree: &'t mut Tree,
    stack: Vec<(NodeId, Frame)>,
    in_table_head: bool,
    html_block: Option<String>,
}

impl<'t> TreeBuilder<'t> {
    fn new(tree: &'t mut Tree) -> Self {
        let root = tree.root();
        Self {
            tree,
            stack: vec![(root, Frame::Root)],
            in_table_head: false,
            html_block: None,
        }
    }

    fn current(&self) -> NodeId {
        self.stack
            .last()
            .map(|(id, _)| *id)
            .unwrap_or_else(|| self.tree.root())
    }

    fn push_esm(&mut self, source: String) {
        let root = self.tree.root();
        self.tree.append_esm(root, source, None);
    }

    fn push_markdown(&mut self, markdown: &str) {
        for event in Parser::new_ext(markdown, markdown_options()) {
            self.event(event);
        }
    }

    fn open(&mut self, tag: &str, frame: Frame) -> NodeId {
        let parent = self.current();
        let id = self.tree.append_element(parent, tag);
        self.stack.push((id, frame));
        id
    }

    /// Close the innermost Markdown frame along with anything opened inside it
    fn close_markdown(&mut self) {
        while self.stack.len() > 1 {
            if let Some((_, Frame::Markdown)) = self.stack.pop() {
                break;
            }
        }
    }

    fn event(&mut self, event: Event<'_>) {
        let current = self.current();
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) | Event::InlineMath(text) | Event::DisplayMath(text) => {
                self.tree.append_text(current, &text);
            }
            Event::Code(text) => {
                let code = self.tree.append_element(current, "code");
                self.tree.append_text(code, &text);
            }
            Event::Html(html) => match self.html_block.as_mut() {
                Some(buffer) => buffer.push_str(&html),
                None => {
                    self.tree.append_raw(current, html.to_string());
                }
            },
            Event::InlineHtml(html) => {
                self.tree.append_raw(current, html.to_string());
            }
            Event::FootnoteReference(label) => {
                let sup = self.tree.append_element(current, "sup");
                let link = self.tree.append_element(sup, "a");
                self.tree
                    .node_mut(link)
                    .set_prop("href", format!("#{}", label));
                self.tree.append_text(link, &label);
            }
            Event::SoftBreak => {
                self.tree.append_text(current, "\n");
            }
            Event::HardBreak => {
                self.tree.append_element(current, "br");
            }
            Event::Rule => {
                self.tree.append_element(current, "hr");
            }
            Event::TaskListMarker(checked) => {
                let input = self.tree.append_element(current, "input");
                let node = self.tree.node_mut(input);
                node.set_prop("type", "checkbox");
                node.set_prop("disabled", true);
                node.set_prop("checked", checked);
            }
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                self.open("p", Frame::Markdown);
            }
            Tag::Heading {
                level,
                id,
                classes,
                attrs,
            } => {
                let heading = self.open(&format!("h{}", level as usize), Frame::Markdown);
                let node = self.tree.node_mut(heading);
                if let Some(id) = id {
                    node.set_prop("id", id.to_string());
                }
                if !classes.is_empty() {
                    let classes: Vec<String> = classes.iter().map(|c| c.to_string()).collect();
                    node.set_prop("className", classes);
                }
                for (key, value) in attrs {
                    let value = value.map_or(Value::Bool(true), |v| Value::String(v.to_string()));
                    node.set_prop(key.to_string(), value);
                }
            }
            Tag::BlockQuote(_) => {
                self.open("blockquote", Frame::Markdown);
            }
            Tag::CodeBlock(kind) => {
                self.open("pre", Frame::Markdown);
                let code = self.open("code", Frame::Implicit);
                if let CodeBlockKind::Fenced(info) = kind {
                    if let Some(language) = info.split_whitespace().next() {
                        self.tree
                            .node_mut(code)
                            .set_prop("className", json!([format!("language-{}", language)]));
                    }
                }
            }
            Tag::HtmlBlock => {
                self.html_block = Some(String::new());
            }
            Tag::List(Some(start)) => {
                let list = self.open("ol", Frame::Markdown);
                if start != 1 {
                    self.tree.node_mut(list).set_prop("start", start);
                }
            }
            Tag::List(None) => {
                self.open("ul", Frame::Markdown);
            }
            Tag::Item => {
                self.open("li", Frame::Markdown);
            }
            Tag::FootnoteDefinition(label) => {
                let def = self.open("div", Frame::Markdown);
                let node = self.tree.node_mut(def);
                node.set_prop("id", label.to_string());
                node.set_prop("className", json!(["footnote-definition"]));
            }
            Tag::Table(_) => {
                self.open("table", Frame::Markdown);
            }
            Tag::TableHead => {
                self.in_table_head = true;
                self.open("thead", Frame::Markdown);
                self.open("tr", Frame::Implicit);
            }
            Tag::TableRow => {
                if self.tree.node(self.current()).is_element("table") {
                    self.open("tbody", Frame::Implicit);
                }
                self.open("tr", Frame::Markdown);
            }
            Tag::TableCell => {
                let cell = if self.in_table_head { "th" } else { "td" };
                self.open(cell, Frame::Markdown);
            }
            Tag::Emphasis => {
                self.open("em", Frame::Markdown);
            }
            Tag::Strong => {
                self.open("strong", Frame::Markdown);
            }
            Tag::Strikethrough => {
                self.open("del", Frame::Markdown);
            }
            Tag::Superscript => {
                self.open("sup", Frame::Markdown);
            }
            Tag::Subscript => {
                self.open("sub", Frame::Markdown);
            }
            Tag::Link {
                dest_url, title, ..
            } => {
                let link = self.open("a", Frame::Markdown);
                let node = self.tree.node_mut(link);
                node.set_prop("href", dest_url.to_string());
                if !title.is_empty() {
                    node.set_prop("title", title.to_string());
                }
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let image = self.open("img", Frame::Markdown);
                let node = self.tree.node_mut(image);
                node.set_prop("src", dest_url.to_string());
                if !title.is_empty() {
                    node.set_prop("title", title.to_string());
                }
            }
            Tag::DefinitionList => {
                self.open("dl", Frame::Markdown);
            }
            Tag::DefinitionListTitle => {
                self.open("dt", Frame::Markdown);
            }
            Tag::DefinitionListDefinition => {
                self.open("dd", Frame::Markdown);
            }
            Tag::MetadataBlock(_) => {
                self.open("div", Frame::Markdown);
            }
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::HtmlBlock => {
                let html = self.html_block.take().unwrap_or_default();
                self.finish_html_block(&html);
            }
            TagEnd::Image => {
                // Alt text arrives as child events; fold it into the attribute
                let image = self.current();
                let alt = self.tree.text_content(image);
                self.tree.clear_children(image);
                self.tree.node_mut(image).set_prop("alt", alt);
                self.close_markdown();
            }
            TagEnd::TableHead => {
                self.in_table_head = false;
                self.close_markdown();
            }
            _ => self.close_markdown(),
        }
    }

    fn finish_html_block(&mut self, html: &str) {
        let trimmed = html.trim();

        if self.open_wrapper(trimmed) || self.close_tag(trimmed) {
            return;
        }

        // A wrapper written without blank lines around its content arrives
        // as one block: `<Note>`, the body, then an optional `</Note>`
        let lines: Vec<&str> = trimmed.lines().collect();
        if lines.len() > 1 && self.open_wrapper(lines[0].trim()) {
            let mut body = &lines[1..];
            let mut closing = Vec::new();
            while let Some((last, rest)) = body.split_last() {
                if !close_tag_regex().is_match(last.trim()) {
                    break;
                }
                closing.push(last.trim());
                body = rest;
            }

            if !body.is_empty() {
                let mut markdown = body.join("\n");
                markdown.push('\n');
                self.push_markdown(&markdown);
            }
            for tag in closing.into_iter().rev() {
                if !self.close_tag(tag) {
                    let current = self.current();
                    self.tree.append_raw(current, tag.to_string());
                }
            }
            return;
        }

        let current = self.current();
        self.tree.append_raw(current, html.trim_end().to_string());
    }

    /// Open a wrapper if `line` is a lone opening tag
    fn open_wrapper(&mut self, line: &str) -> bool {
        if line.ends_with("/>") {
            return false;
        }
        let Some(caps) = open_tag_regex().captures(line) else {
            return false;
        };
        let tag = caps[1].to_string();
        let attrs = caps.get(2).map_or("", |m| m.as_str()).to_string();
        let wrapper = self.open(&tag, Frame::Wrapper);
        apply_attributes(self.tree, wrapper, &attrs);
        true
    }

    /// Close the wrapper named by `line` if it is a lone closing tag
    fn close_tag(&mut self, line: &str) -> bool {
        let Some(caps) = close_tag_regex().captures(line) else {
            return false;
        };
        if self.close_wrapper(&caps[1]) {
            return true;
        }
        tracing::debug!("Unmatched closing tag </{}> kept as raw HTML", &caps[1]);
        false
    }

    /// Close the innermost open wrapper named `tag`, if one is open in the
    /// current Markdown container
    fn close_wrapper(&mut self, tag: &str) -> bool {
        for index in (1..self.stack.len()).rev() {
            let (id, frame) = self.stack[index];
            match frame {
                Frame::Wrapper if self.tree.node(id).tag.as_deref() == Some(tag) => {
                    self.stack.truncate(index);
                    return true;
                }
                Frame::Markdown | Frame::Root => return false,
                _ => {}
            }
        }
        false
    }
}

fn apply_attributes(tree: &mut Tree, id: NodeId, attrs: &str) {
    let node = tree.node_mut(id);
    for caps in attribute_regex().captures_iter(attrs) {
        let name = &caps[1];
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .or_else(|| caps.get(5))
            .map(|m| m.as_str().trim().to_string());

        match (name, value) {
            ("class" | "className", Some(value)) => {
                let classes: Vec<&str> = value.split_whitespace().collect();
                node.set_prop("className", classes);
            }
            (name, Some(value)) => node.set_prop(name, value),
            (name, None) => node.set_prop(name, true),
        }
    }
}
