//! Document compilation pipeline
//!
//! Flow: Source → Frontmatter → Parse (MDX) → Passes → Render
//!
//! The passes run strictly in order, each with exclusive access to the tree:
//! - annotations: trailing `{{ ... }}` literals become properties
//! - code blocks: `pre.language` from the fence class
//! - highlight: syntect HTML for each tagged block
//! - slugify: unique heading ids
//! - exports: the `sections` outline as a module export

use crate::frontmatter::{parse_frontmatter, Frontmatter, FrontmatterError};
use crate::highlight::{HighlightError, Highlighter};
use crate::mdx::annotation::AnnotationError;
use crate::mdx::parse_mdx;
use crate::passes::exports::export_bindings;
use crate::passes::{
    extract_sections, serialize_sections, AnnotationPass, CodeBlockPass, ExportPass,
    HighlightPass, Pass, SlugPass,
};
use crate::render::{render_html, render_toc};
use crate::tree::{NodeKind, Tree};
use docsmith_types::Section;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// A module-level export of a compiled document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleExport {
    pub name: String,
    /// The full statement source
    pub source: String,
    /// Evaluated value, when the right-hand side is plain data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Output of compiling one document
#[derive(Debug, Clone, Serialize)]
pub struct CompiledDocument {
    pub frontmatter: Frontmatter,
    pub title: Option<String>,
    pub html: String,
    pub toc_html: String,
    pub sections: Vec<Section>,
    pub exports: Vec<ModuleExport>,
}

/// Runs the pass chain over documents with a shared highlighter
pub struct DocumentPipeline {
    highlighter: Arc<Highlighter>,
}

impl DocumentPipeline {
    pub fn new(highlighter: Arc<Highlighter>) -> Self {
        Self { highlighter }
    }

    pub fn highlighter(&self) -> &Arc<Highlighter> {
        &self.highlighter
    }

    /// Run every pass over an already parsed tree and return its outline
    pub fn run_passes(&self, tree: &mut Tree) -> Result<Vec<Section>, PipelineError> {
        let mut passes: Vec<Box<dyn Pass + '_>> = vec![
            Box::new(AnnotationPass),
            Box::new(CodeBlockPass),
            Box::new(HighlightPass::new(&self.highlighter)),
            Box::new(SlugPass::new()),
        ];

        for pass in passes.iter_mut() {
            tracing::trace!("Running pass {}", pass.name());
            pass.run(tree)?;
        }

        // The outline is extracted once and shared with the export step
        let sections = extract_sections(tree);
        let expression = serialize_sections(&sections);
        let mut exports =
            ExportPass::new(|_: &Tree| vec![("sections".to_string(), expression.clone())]);
        tracing::trace!("Running pass {}", exports.name());
        exports.run(tree)?;

        Ok(sections)
    }

    /// Compile MDX source (with optional frontmatter) into HTML and metadata
    pub fn compile(&self, source: &str) -> Result<CompiledDocument, PipelineError> {
        let (frontmatter, body) = parse_frontmatter(source)?;
        let mut tree = parse_mdx(&body);

        let mut sections = self.run_passes(&mut tree)?;
        let exports = collect_exports(&tree);

        // An author-declared outline replaces the extracted one
        if let Some(declared) = exports
            .iter()
            .find(|export| export.name == "sections")
            .and_then(|export| export.value.as_ref())
            .and_then(outline_from_value)
        {
            sections = declared;
        }

        let title = frontmatter.title.clone().or_else(|| first_h1(&tree));

        Ok(CompiledDocument {
            frontmatter,
            title,
            html: render_html(&tree),
            toc_html: render_toc(&sections),
            sections,
            exports,
        })
    }
}

fn first_h1(tree: &Tree) -> Option<String> {
    let h1 = tree.find_first("h1")?;
    let text = tree.text_content(h1).trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn outline_from_value(value: &Value) -> Option<Vec<Section>> {
    value
        .as_array()?
        .iter()
        .map(Section::from_export_value)
        .collect()
}

/// Every `export const` at the root, in document order
fn collect_exports(tree: &Tree) -> Vec<ModuleExport> {
    let mut exports = Vec::new();
    for &id in tree.children(tree.root()) {
        let node = tree.node(id);
        if node.kind != NodeKind::Esm {
            continue;
        }
        let source = node.value.as_deref().unwrap_or("");

        for (name, rhs) in export_bindings(source) {
            // Injected statements carry their parsed value already
            let value = node.expression.clone().or_else(|| leading_json(rhs));
            exports.push(ModuleExport {
                name,
                source: source.to_string(),
                value,
            });
        }
    }
    exports
}

/// The JSON value at the start of an authored right-hand side, if any
fn leading_json(rhs: &str) -> Option<Value> {
    serde_json::Deserializer::from_str(rhs)
        .into_iter::<Value>()
        .next()?
        .ok()
}

/// Errors that can occur while compiling a document
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Frontmatter error: {0}")]
    Frontmatter(#[from] FrontmatterError),

    #[error("Invalid annotation on <{tag}>: {source}")]
    Annotation {
        tag: String,
        #[source]
        source: AnnotationError,
    },

    #[error("Highlight error: {0}")]
    Highlight(#[from] HighlightError),

    #[error("Could not parse export `{name}`: {source}")]
    Export {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HighlightConfig;

    fn pipeline() -> DocumentPipeline {
        let highlighter = Highlighter::new(&HighlightConfig::default(), None).unwrap();
        DocumentPipeline::new(Arc::new(highlighter))
    }

    #[test]
    fn test_simple_document() {
        let doc = pipeline()
            .compile("# Hello World\n\nThis is a *test* document.\n")
            .unwrap();

        assert_eq!(doc.title.as_deref(), Some("Hello World"));
        assert!(doc.html.contains("<em>test</em>"));
        assert!(doc.sections.is_empty());
        assert_eq!(doc.toc_html, "");
    }

    #[test]
    fn test_frontmatter_title_wins() {
        let doc = pipeline()
            .compile("---\ntitle: Install\n---\n# Installing docsmith\n")
            .unwrap();
        assert_eq!(doc.title.as_deref(), Some("Install"));
    }

    #[test]
    fn test_sections_export_injected() {
        let doc = pipeline().compile("## Setup\n\n## Setup\n").unwrap();

        assert_eq!(doc.exports.len(), 1);
        let export = &doc.exports[0];
        assert_eq!(export.name, "sections");
        assert_eq!(
            export.value,
            Some(serde_json::json!([
                { "title": "Setup", "id": "setup", "children": [] },
                { "title": "Setup", "id": "setup-1", "children": [] }
            ]))
        );
        assert!(doc.toc_html.contains(r##"href="#setup-1""##));
    }

    #[test]
    fn test_run_passes_outline_matches_injected_export() {
        let mut tree = parse_mdx("## One\n\n### Two\n");
        let sections = pipeline().run_passes(&mut tree).unwrap();

        let last = *tree.children(tree.root()).last().unwrap();
        let injected = tree.node(last).expression.clone().unwrap();
        assert_eq!(injected, serde_json::to_value(&sections).unwrap());
        assert_eq!(sections[0].children.as_ref().unwrap()[0].id, "two");
    }

    #[test]
    fn test_declared_sections_replace_outline() {
        let source = "export const sections = [{\"title\": \"Custom\", \"id\": \"custom\"}]\n\n## Setup\n";
        let doc = pipeline().compile(source).unwrap();

        assert_eq!(doc.exports.len(), 1);
        assert_eq!(doc.sections, vec![Section::leaf("Custom", "custom")]);
    }

    #[test]
    fn test_declared_non_json_export_has_no_value() {
        let source = "export const meta = { tags: ['a'] }\n\n## Setup\n";
        let doc = pipeline().compile(source).unwrap();

        let names: Vec<_> = doc.exports.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["meta", "sections"]);
        assert!(doc.exports[0].value.is_none());
        assert_eq!(doc.sections[0].id, "setup");
    }

    #[test]
    fn test_unknown_language_fails_document() {
        let err = pipeline()
            .compile("```klingon\nqapla'\n```\n")
            .unwrap_err();
        assert!(matches!(err, PipelineError::Highlight(HighlightError::UnknownLanguage { .. })));
    }

    #[test]
    fn test_bad_frontmatter_fails_document() {
        let err = pipeline().compile("---\ntitle: [unclosed\n---\nBody\n").unwrap_err();
        assert!(matches!(err, PipelineError::Frontmatter(_)));
    }
}
