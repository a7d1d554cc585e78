//! Compile a single page to stdout.

use crate::CompileFormat;
use anyhow::{Context, Result};
use docsmith_core::{Config, SiteBuilder};
use std::path::Path;

/// Compile `file` and print it in the requested format.
///
/// The config file is optional here; without one the defaults apply.
pub fn compile_file(config_path: &Path, file: &Path, format: CompileFormat) -> Result<()> {
    let config = if config_path.exists() {
        Config::from_file(config_path).context("Failed to load configuration")?
    } else {
        tracing::debug!("No config at {:?}, using defaults", config_path);
        Config::default()
    };

    let builder = SiteBuilder::new(config);
    let doc = builder
        .compile_file(file)
        .with_context(|| format!("Failed to compile {:?}", file))?;

    let output = match format {
        CompileFormat::Html => doc.html,
        CompileFormat::Json => serde_json::to_string_pretty(&doc)?,
        CompileFormat::Sections => serde_json::to_string_pretty(&doc.sections)?,
        CompileFormat::Toc => doc.toc_html,
    };
    println!("{}", output.trim_end());
    Ok(())
}
