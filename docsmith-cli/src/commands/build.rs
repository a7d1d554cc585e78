//! Build command implementation.

use anyhow::{bail, Context, Result};
use docsmith_core::{BuildReport, Config, SiteBuilder};
use std::path::Path;
use std::time::Instant;

/// Build the site described by the config file
pub fn build_site(config_path: &Path) -> Result<()> {
    tracing::info!("Loading config from {:?}", config_path);
    let config = Config::from_file(config_path).context("Failed to load configuration")?;
    let builder = SiteBuilder::new(config);
    let report = run_build(&builder)?;
    check_report(&report)
}

/// One build pass with a summary line; shared with `watch`
pub fn run_build(builder: &SiteBuilder) -> Result<BuildReport> {
    tracing::info!("Building site: {}", builder.config().site.title);
    let started = Instant::now();

    let report = builder.build().context("Failed to build site")?;

    println!(
        "✓ Built {} pages into {:?} in {:.2?}",
        report.pages.len(),
        builder.config().output_dir(),
        started.elapsed()
    );
    for failure in &report.failures {
        eprintln!("✗ {}: {}", failure.path.display(), failure.message);
    }
    Ok(report)
}

fn check_report(report: &BuildReport) -> Result<()> {
    if !report.is_success() {
        bail!("{} page(s) failed to build", report.failures.len());
    }
    Ok(())
}
