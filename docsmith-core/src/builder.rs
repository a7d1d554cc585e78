//! Site building logic - discovers pages, compiles them, writes output.

use crate::{
    config::Config,
    highlight::{HighlightError, Highlighter},
    pipeline::{CompiledDocument, DocumentPipeline, ModuleExport, PipelineError},
};
use docsmith_types::{Manifest, PageEntry, Section, SiteInfo};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use walkdir::WalkDir;

const CONTENT_EXTENSIONS: &[&str] = &["md", "mdx"];

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to initialize highlighter: {0}")]
    Highlight(#[from] HighlightError),

    #[error("Failed to compile {path:?}: {source}")]
    Compile {
        path: PathBuf,
        #[source]
        source: PipelineError,
    },
}

/// A page that could not be built
#[derive(Debug, Clone)]
pub struct PageFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of a site build
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub pages: Vec<PageEntry>,
    pub failures: Vec<PageFailure>,
    pub manifest_path: PathBuf,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Per-page module written next to the HTML body
#[derive(Serialize)]
struct PageModule<'a> {
    route: &'a str,
    title: Option<&'a str>,
    description: Option<&'a str>,
    sections: &'a [Section],
    exports: &'a [ModuleExport],
    toc_html: &'a str,
}

/// Main site builder
pub struct SiteBuilder {
    config: Config,
    highlighter: OnceCell<Arc<Highlighter>>,
}

impl SiteBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            highlighter: OnceCell::new(),
        }
    }

    /// Builder that reuses an already loaded highlighter
    pub fn with_highlighter(config: Config, highlighter: Arc<Highlighter>) -> Self {
        Self {
            config,
            highlighter: OnceCell::with_value(highlighter),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The shared highlighter, loaded on first use
    pub fn highlighter(&self) -> Result<&Arc<Highlighter>, HighlightError> {
        self.highlighter.get_or_try_init(|| {
            tracing::debug!("Loading syntax highlighter");
            Highlighter::from_config(&self.config).map(Arc::new)
        })
    }

    pub fn pipeline(&self) -> Result<DocumentPipeline, HighlightError> {
        Ok(DocumentPipeline::new(Arc::clone(self.highlighter()?)))
    }

    /// Compile a single content file
    pub fn compile_file(&self, path: &Path) -> Result<CompiledDocument, BuildError> {
        let source = fs::read_to_string(path)?;
        self.pipeline()?
            .compile(&source)
            .map_err(|source| BuildError::Compile {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Build the entire site
    ///
    /// A page that fails to compile is logged and reported; the remaining
    /// pages are still written.
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        let content_dir = self.config.content_dir();
        let output_dir = self.config.output_dir();
        fs::create_dir_all(&output_dir)?;

        let files = self.discover_content_files()?;
        tracing::info!("Found {} content files", files.len());

        let pipeline = self.pipeline()?;
        let mut pages = Vec::new();
        let mut failures = Vec::new();

        for path in &files {
            let rel = relative_path(path, &content_dir);
            let compiled = fs::read_to_string(path)
                .map_err(BuildError::from)
                .and_then(|source| {
                    pipeline.compile(&source).map_err(|source| BuildError::Compile {
                        path: path.clone(),
                        source,
                    })
                });

            let doc = match compiled {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::error!("Failed to build {}: {}", rel, e);
                    failures.push(PageFailure {
                        path: path.clone(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            if doc.frontmatter.draft {
                tracing::debug!("Skipping draft {}", rel);
                continue;
            }

            let route = route_for(&rel);
            self.write_page(&output_dir, &route, &doc)?;
            tracing::debug!("Built {} -> {}", rel, route);

            pages.push(PageEntry {
                route,
                source: rel,
                title: doc.title,
                description: doc.frontmatter.description,
                order: doc.frontmatter.order,
                sections: doc.sections,
            });
        }

        pages.sort_by(|a, b| {
            (a.order.is_none(), a.order, &a.route).cmp(&(b.order.is_none(), b.order, &b.route))
        });

        let manifest = Manifest {
            site: SiteInfo {
                title: self.config.site.title.clone(),
                base_url: self.config.normalized_base_url(),
            },
            generated_at: chrono::Utc::now().to_rfc3339(),
            pages,
        };
        let manifest_path = output_dir.join("manifest.json");
        fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)?;

        tracing::info!(
            "Built {} pages ({} failed)",
            manifest.pages.len(),
            failures.len()
        );

        Ok(BuildReport {
            pages: manifest.pages,
            failures,
            manifest_path,
        })
    }

    fn write_page(&self, output_dir: &Path, route: &str, doc: &CompiledDocument) -> Result<(), BuildError> {
        let stem = output_stem(output_dir, route);
        if let Some(parent) = stem.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(with_suffix(&stem, "html"), &doc.html)?;

        let module = PageModule {
            route,
            title: doc.title.as_deref(),
            description: doc.frontmatter.description.as_deref(),
            sections: &doc.sections,
            exports: &doc.exports,
            toc_html: &doc.toc_html,
        };
        fs::write(with_suffix(&stem, "json"), serde_json::to_string_pretty(&module)?)?;
        Ok(())
    }

    /// Discover all content files, sorted by path
    fn discover_content_files(&self) -> Result<Vec<PathBuf>, BuildError> {
        let content_dir = self.config.content_dir();
        let ignore_patterns = compile_ignore_patterns(&self.config.ignore_patterns);
        let mut files = Vec::new();

        for entry in WalkDir::new(&content_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let is_content = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| CONTENT_EXTENSIONS.contains(&ext));
            if !is_content {
                continue;
            }

            let rel = relative_path(entry.path(), &content_dir);
            if should_ignore(&rel, &ignore_patterns) {
                tracing::debug!("Ignoring {} due to ignore_patterns", rel);
                continue;
            }
            files.push(entry.path().to_path_buf());
        }

        files.sort();
        Ok(files)
    }
}

/// Path relative to the content directory, with `/` separators
fn relative_path(path: &Path, content_dir: &Path) -> String {
    path.strip_prefix(content_dir)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Route for a content file: extension dropped, `index` collapsed
/// into its directory
pub fn route_for(rel: &str) -> String {
    let without_ext = match rel.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => rel,
    };
    let trimmed = without_ext
        .strip_suffix("/index")
        .or_else(|| (without_ext == "index").then_some(""))
        .unwrap_or(without_ext);
    format!("/{}", trimmed.trim_matches('/'))
}

fn output_stem(output_dir: &Path, route: &str) -> PathBuf {
    match route.trim_matches('/') {
        "" => output_dir.join("index"),
        path => output_dir.join(path),
    }
}

/// `stem` plus an extension, keeping any dots already in the route
fn with_suffix(stem: &Path, extension: &str) -> PathBuf {
    let mut path = stem.as_os_str().to_owned();
    path.push(".");
    path.push(extension);
    PathBuf::from(path)
}

/// Turn `*`/`?` glob patterns into anchored regexes
fn compile_ignore_patterns(patterns: &[String]) -> Vec<Regex> {
    let mut compiled = Vec::new();
    for pat in patterns {
        let source = regex::escape(pat).replace(r"\*", ".*").replace(r"\?", ".");
        match Regex::new(&format!("^{}$", source)) {
            Ok(re) => compiled.push(re),
            Err(err) => tracing::warn!("Invalid ignore pattern '{}': {}", pat, err),
        }
    }
    compiled
}

fn should_ignore(path: &str, ignores: &[Regex]) -> bool {
    ignores.iter().any(|re| re.is_match(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes() {
        assert_eq!(route_for("index.mdx"), "/");
        assert_eq!(route_for("docs/index.mdx"), "/docs");
        assert_eq!(route_for("docs/getting-started.md"), "/docs/getting-started");
        assert_eq!(route_for("reindex.mdx"), "/reindex");
    }

    #[test]
    fn test_output_stem() {
        let out = Path::new("dist");
        assert_eq!(output_stem(out, "/"), Path::new("dist/index"));
        assert_eq!(output_stem(out, "/docs/setup"), Path::new("dist/docs/setup"));
        assert_eq!(
            with_suffix(&output_stem(out, "/releases/v1.2"), "html"),
            Path::new("dist/releases/v1.2.html")
        );
    }

    #[test]
    fn test_ignore_globs() {
        let patterns = compile_ignore_patterns(&["drafts/*".to_string(), "*.tmp.md".to_string()]);
        assert!(should_ignore("drafts/wip.mdx", &patterns));
        assert!(should_ignore("notes.tmp.md", &patterns));
        assert!(!should_ignore("docs/drafts.mdx", &patterns));
    }
}
