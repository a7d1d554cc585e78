//! Records each code block's declared language on its `pre` element.

use super::Pass;
use crate::pipeline::PipelineError;
use crate::tree::Tree;

/// Language recorded when a code block declares none
pub const DEFAULT_LANGUAGE: &str = "txt";

const LANGUAGE_PREFIX: &str = "language-";

/// For every `code` element inside a `pre`, set `pre.language` from the
/// first `language-*` class name, or to `"txt"` when there is no class.
///
/// Inline `code` (outside `pre`) is left alone.
pub fn tag_code_blocks(tree: &mut Tree) -> usize {
    let mut count = 0;

    for id in tree.walk() {
        if !tree.node(id).is_element("code") {
            continue;
        }
        let Some(parent) = tree.parent(id) else {
            continue;
        };
        if !tree.node(parent).is_element("pre") {
            continue;
        }

        let language = tree
            .node(id)
            .class_names()
            .first()
            .copied()
            .map(|class| class.strip_prefix(LANGUAGE_PREFIX).unwrap_or(class).to_string())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        tree.node_mut(parent).set_prop("language", language);
        count += 1;
    }

    count
}

pub struct CodeBlockPass;

impl Pass for CodeBlockPass {
    fn name(&self) -> &'static str {
        "code-blocks"
    }

    fn run(&mut self, tree: &mut Tree) -> Result<(), PipelineError> {
        let count = tag_code_blocks(tree);
        tracing::debug!("Tagged {} code blocks", count);
        Ok(())
    }
}
