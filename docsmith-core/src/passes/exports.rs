//! Injects computed metadata as module-level `export const` statements.

use super::sections::extract_sections;
use super::Pass;
use crate::pipeline::PipelineError;
use crate::tree::{NodeKind, Tree};
use docsmith_types::Section;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

static EXPORT_CONST: OnceLock<Regex> = OnceLock::new();

fn export_const_re() -> &'static Regex {
    EXPORT_CONST.get_or_init(|| Regex::new(r"export\s+const\s+([A-Za-z_$][\w$]*)\s*=").unwrap())
}

/// Serialize an outline to the array-of-objects expression used for the
/// `sections` export
pub fn serialize_sections(sections: &[Section]) -> String {
    Value::Array(sections.iter().map(Section::to_export_value).collect()).to_string()
}

/// The exports computed for a processed tree: currently just `sections`
pub fn sections_exports(tree: &Tree) -> Vec<(String, String)> {
    vec![("sections".to_string(), serialize_sections(&extract_sections(tree)))]
}

/// `(name, right-hand side)` for each `export const` in one ESM statement
pub(crate) fn export_bindings(source: &str) -> Vec<(String, &str)> {
    export_const_re()
        .captures_iter(source)
        .filter_map(|caps| {
            let end = caps.get(0)?.end();
            Some((caps[1].to_string(), &source[end..]))
        })
        .collect()
}

/// Names bound by `export const` in the root-level ESM statements
fn declared_exports(tree: &Tree) -> Vec<String> {
    tree.children(tree.root())
        .iter()
        .map(|id| tree.node(*id))
        .filter(|node| node.kind == NodeKind::Esm)
        .filter_map(|node| node.value.as_deref())
        .flat_map(|source| export_bindings(source).into_iter().map(|(name, _)| name))
        .collect()
}

/// Append `export const <name> = <expr>` for each entry the document does
/// not already declare. Returns the number of statements injected.
///
/// Each entry is checked on its own, so an author-declared `sections` does
/// not stop other exports from being injected.
pub fn inject_exports(tree: &mut Tree, exports: &[(String, String)]) -> Result<usize, PipelineError> {
    let declared = declared_exports(tree);
    let mut count = 0;

    for (name, expression) in exports {
        if declared.iter().any(|existing| existing == name) {
            tracing::debug!("Keeping author-declared export `{}`", name);
            continue;
        }

        let value: Value = serde_json::from_str(expression).map_err(|source| PipelineError::Export {
            name: name.clone(),
            source,
        })?;
        let root = tree.root();
        tree.append_esm(root, format!("export const {} = {}", name, expression), Some(value));
        count += 1;
    }

    Ok(count)
}

/// Export injector fed by a function computing `(name, expression)` pairs
/// from the processed tree
pub struct ExportPass<F> {
    exports: F,
}

impl<F> ExportPass<F>
where
    F: Fn(&Tree) -> Vec<(String, String)>,
{
    pub fn new(exports: F) -> Self {
        Self { exports }
    }
}

impl ExportPass<fn(&Tree) -> Vec<(String, String)>> {
    /// Injector for the `sections` outline
    pub fn sections() -> Self {
        Self::new(sections_exports)
    }
}

impl<F> Pass for ExportPass<F>
where
    F: Fn(&Tree) -> Vec<(String, String)>,
{
    fn name(&self) -> &'static str {
        "exports"
    }

    fn run(&mut self, tree: &mut Tree) -> Result<(), PipelineError> {
        let exports = (self.exports)(tree);
        let count = inject_exports(tree, &exports)?;
        tracing::debug!("Injected {} of {} exports", count, exports.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdx::parse_mdx;
    use crate::passes::{slugify_headings, Pass};
    use crate::slug::SlugCounter;
    use serde_json::json;

    fn esm_sources(tree: &Tree) -> Vec<String> {
        tree.children(tree.root())
            .iter()
            .map(|id| tree.node(*id))
            .filter(|node| node.kind == NodeKind::Esm)
            .filter_map(|node| node.value.clone())
            .collect()
    }

    #[test]
    fn test_injects_sections_with_parsed_value() {
        let mut tree = parse_mdx("## Setup\n\n### Install\n");
        slugify_headings(&mut tree, &mut SlugCounter::new());
        let exports = sections_exports(&tree);
        assert_eq!(inject_exports(&mut tree, &exports).unwrap(), 1);

        let last = *tree.children(tree.root()).last().unwrap();
        let node = tree.node(last);
        assert_eq!(node.kind, NodeKind::Esm);
        assert!(node.value.as_deref().unwrap().starts_with("export const sections = ["));
        assert_eq!(
            node.expression,
            Some(json!([{
                "title": "Setup",
                "id": "setup",
                "children": [{ "title": "Install", "id": "install" }]
            }]))
        );
    }

    #[test]
    fn test_author_declared_export_wins() {
        let source = "export const sections = [{ title: 'Custom', id: 'custom' }]\n\n## Setup\n";
        let mut tree = parse_mdx(source);
        let before = esm_sources(&tree);

        let mut pass = ExportPass::sections();
        pass.run(&mut tree).unwrap();
        pass.run(&mut tree).unwrap();

        assert_eq!(esm_sources(&tree), before);
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let mut tree = parse_mdx("## Only\n");
        let mut pass = ExportPass::sections();
        pass.run(&mut tree).unwrap();
        let after_first = esm_sources(&tree);
        pass.run(&mut tree).unwrap();

        assert_eq!(after_first.len(), 1);
        assert_eq!(esm_sources(&tree), after_first);
    }

    #[test]
    fn test_skip_is_per_entry() {
        let mut tree = parse_mdx("export const sections = []\n");
        let exports = vec![
            ("sections".to_string(), "[]".to_string()),
            ("meta".to_string(), r#"{"draft":false}"#.to_string()),
        ];
        assert_eq!(inject_exports(&mut tree, &exports).unwrap(), 1);
        assert_eq!(
            esm_sources(&tree),
            vec!["export const sections = []", r#"export const meta = {"draft":false}"#]
        );
    }

    #[test]
    fn test_similar_name_does_not_block() {
        let mut tree = parse_mdx("export const sectionsLegacy = []\n");
        assert_eq!(declared_exports(&tree), vec!["sectionsLegacy"]);
        let exports = sections_exports(&tree);
        assert_eq!(inject_exports(&mut tree, &exports).unwrap(), 1);
    }

    #[test]
    fn test_unparsable_expression_fails() {
        let mut tree = Tree::new();
        let exports = vec![("broken".to_string(), "[1, 2".to_string())];
        let err = inject_exports(&mut tree, &exports).unwrap_err();
        assert!(matches!(err, PipelineError::Export { ref name, .. } if name == "broken"));
    }

    #[test]
    fn test_annotation_spread_into_export() {
        let mut section = Section::top("Create", "create");
        section.annotation.insert("tag".to_string(), json!("POST"));
        assert_eq!(
            serialize_sections(&[section]),
            r#"[{"title":"Create","id":"create","children":[],"tag":"POST"}]"#
        );
    }
}
