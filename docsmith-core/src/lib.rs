//! # docsmith-core
//!
//! Core library for the docsmith documentation builder.
//!
//! This crate parses MDX pages into an arena-backed tree, runs the
//! rewriting passes (annotations, code-block languages, syntax
//! highlighting, heading slugs, outline export) and renders the result.
//! [`SiteBuilder`] drives that over a whole content directory.

pub mod builder;
pub mod config;
pub mod frontmatter;
pub mod highlight;
pub mod mdx;
pub mod passes;
pub mod pipeline;
pub mod render;
pub mod slug;
pub mod tree;

pub use builder::{route_for, BuildError, BuildReport, PageFailure, SiteBuilder};
pub use config::Config;
pub use frontmatter::Frontmatter;
pub use highlight::{HighlightError, Highlighter};
pub use mdx::parse_mdx;
pub use pipeline::{CompiledDocument, DocumentPipeline, ModuleExport, PipelineError};
pub use render::{render_html, render_toc};
pub use slug::{slugify, SlugCounter};
pub use tree::{Node, NodeId, NodeKind, Tree};
