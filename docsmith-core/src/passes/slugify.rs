//! Assigns unique ids to `h2`/`h3` headings.

use super::Pass;
use crate::pipeline::PipelineError;
use crate::slug::SlugCounter;
use crate::tree::{NodeId, Tree};

fn is_outline_heading(tree: &Tree, id: NodeId) -> bool {
    let node = tree.node(id);
    node.is_element("h2") || node.is_element("h3")
}

fn has_id(tree: &Tree, id: NodeId) -> bool {
    tree.node(id)
        .prop_str("id")
        .is_some_and(|value| !value.is_empty())
}

/// Give every `h2`/`h3` without an id a slug of its text, unique within
/// this run of `slugs`. Authored ids are left untouched.
pub fn slugify_headings(tree: &mut Tree, slugs: &mut SlugCounter) -> usize {
    let mut count = 0;

    for id in tree.walk() {
        if !is_outline_heading(tree, id) || has_id(tree, id) {
            continue;
        }
        let slug = slugs.slug(&tree.text_content(id));
        tree.node_mut(id).set_prop("id", slug);
        count += 1;
    }

    count
}

/// Heading slugifier with a counter scoped to one document
#[derive(Default)]
pub struct SlugPass {
    slugs: SlugCounter,
}

impl SlugPass {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Pass for SlugPass {
    fn name(&self) -> &'static str {
        "slugify"
    }

    fn run(&mut self, tree: &mut Tree) -> Result<(), PipelineError> {
        self.slugs.reset();
        let count = slugify_headings(tree, &mut self.slugs);
        tracing::debug!("Assigned {} heading ids", count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdx::parse_mdx;

    fn heading_ids(tree: &Tree) -> Vec<String> {
        tree.walk()
            .into_iter()
            .filter(|id| is_outline_heading(tree, *id))
            .filter_map(|id| tree.node(id).prop_str("id").map(str::to_string))
            .collect()
    }

    #[test]
    fn test_duplicate_headings_disambiguated() {
        let mut tree = parse_mdx("## Setup\n\n## Setup\n\n### Overview\n\n### Overview\n");
        slugify_headings(&mut tree, &mut SlugCounter::new());

        assert_eq!(heading_ids(&tree), vec!["setup", "setup-1", "overview", "overview-1"]);
    }

    #[test]
    fn test_manual_ids_preserved() {
        let mut tree = Tree::new();
        let h2 = tree.append_element(tree.root(), "h2");
        tree.node_mut(h2).set_prop("id", "custom");
        tree.append_text(h2, "Setup");
        let h3 = tree.append_element(tree.root(), "h3");
        tree.append_text(h3, "Custom");

        slugify_headings(&mut tree, &mut SlugCounter::new());
        // Manual ids are trusted and never registered with the counter
        assert_eq!(heading_ids(&tree), vec!["custom", "custom"]);
    }

    #[test]
    fn test_other_levels_ignored() {
        let mut tree = parse_mdx("# Title\n\n#### Deep\n");
        assert_eq!(slugify_headings(&mut tree, &mut SlugCounter::new()), 0);
    }

    #[test]
    fn test_pass_resets_between_documents() {
        let mut pass = SlugPass::new();
        let mut first = parse_mdx("## Intro\n");
        let mut second = parse_mdx("## Intro\n");
        pass.run(&mut first).unwrap();
        pass.run(&mut second).unwrap();

        assert_eq!(heading_ids(&second), vec!["intro"]);
    }

    #[test]
    fn test_heading_with_inline_code() {
        let mut tree = parse_mdx("## Using `docsmith build`\n");
        slugify_headings(&mut tree, &mut SlugCounter::new());
        assert_eq!(heading_ids(&tree), vec!["using-docsmith-build"]);
    }
}
