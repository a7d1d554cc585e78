//! MDX front end: source text to document tree.

pub mod annotation;
pub mod esm;
pub mod parser;

pub use parser::{markdown_options, parse_mdx};
