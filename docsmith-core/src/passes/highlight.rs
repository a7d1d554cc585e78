//! Syntax highlighting for code blocks.

use super::Pass;
use crate::highlight::Highlighter;
use crate::pipeline::PipelineError;
use crate::tree::{NodeKind, Tree};

/// For each `pre > code` block, keep the raw source in `pre.code` and, when
/// `pre.language` is set, replace the code text with highlighted HTML.
///
/// Blocks are handled one at a time in document order. An unknown language
/// aborts the pass.
pub fn highlight_code_blocks(tree: &mut Tree, highlighter: &Highlighter) -> Result<usize, PipelineError> {
    let mut count = 0;

    for id in tree.walk() {
        let node = tree.node(id);
        if !node.is_element("pre") {
            continue;
        }
        let Some(&code) = node.children().first() else {
            continue;
        };
        if !tree.node(code).is_element("code") {
            continue;
        }

        let text = tree
            .children(code)
            .first()
            .copied()
            .filter(|child| tree.node(*child).kind == NodeKind::Text);

        let Some(text) = text else {
            // Empty block, or already highlighted
            if node.prop("code").is_none() {
                tree.node_mut(id).set_prop("code", "");
            }
            continue;
        };

        let source = tree.node(text).value.clone().unwrap_or_default();
        let language = node.prop_str("language").map(str::to_string);
        tree.node_mut(id).set_prop("code", source.clone());

        if let Some(language) = language {
            let html = highlighter.highlight_lines(&source, &language)?;
            tree.replace_with_raw(text, html);
            count += 1;
        }
    }

    Ok(count)
}

pub struct HighlightPass<'h> {
    highlighter: &'h Highlighter,
}

impl<'h> HighlightPass<'h> {
    pub fn new(highlighter: &'h Highlighter) -> Self {
        Self { highlighter }
    }
}

impl Pass for HighlightPass<'_> {
    fn name(&self) -> &'static str {
        "highlight"
    }

    fn run(&mut self, tree: &mut Tree) -> Result<(), PipelineError> {
        let count = highlight_code_blocks(tree, self.highlighter)?;
        tracing::debug!("Highlighted {} code blocks with {}", count, self.highlighter.theme_name());
        Ok(())
    }
}
