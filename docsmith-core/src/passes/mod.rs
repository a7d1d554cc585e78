//! Tree-rewriting passes.
//!
//! Each pass takes exclusive access to the tree for its whole run and hands
//! it back to the pipeline afterwards. Order matters: later passes read
//! properties written by earlier ones.

pub mod annotations;
pub mod code_blocks;
pub mod exports;
pub mod highlight;
pub mod sections;
pub mod slugify;

use crate::pipeline::PipelineError;
use crate::tree::Tree;

pub use annotations::{annotate, AnnotationPass};
pub use code_blocks::{tag_code_blocks, CodeBlockPass, DEFAULT_LANGUAGE};
pub use exports::{inject_exports, sections_exports, serialize_sections, ExportPass};
pub use highlight::{highlight_code_blocks, HighlightPass};
pub use sections::extract_sections;
pub use slugify::{slugify_headings, SlugPass};

/// One stage of the build pipeline
pub trait Pass {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn run(&mut self, tree: &mut Tree) -> Result<(), PipelineError>;
}
