//! Init command implementation.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = include_str!("../../../docsmith.yml.example");

/// Initialize a new docsmith project
pub fn init_project(path: Option<&Path>) -> Result<()> {
    let root = path.unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(root).with_context(|| format!("Failed to create {:?}", root))?;

    write_config(root)?;
    scaffold_content(root)?;

    println!("✓ docsmith initialized in {:?}", root);
    println!("  - Edit docsmith.yml to customize site metadata");
    println!("  - Write pages in content/ and run `docsmith build`");
    Ok(())
}

fn write_config(root: &Path) -> Result<()> {
    let config_path = root.join("docsmith.yml");
    if config_path.exists() {
        println!("docsmith.yml already exists at {:?}", config_path);
        return Ok(());
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {:?}", config_path))?;
    println!("Created {:?}", config_path);
    Ok(())
}

fn scaffold_content(root: &Path) -> Result<()> {
    let content = root.join("content");
    fs::create_dir_all(&content).with_context(|| format!("Failed to create {:?}", content))?;

    let sample = content.join("index.mdx");
    if !sample.exists() {
        fs::write(&sample, SAMPLE_PAGE).with_context(|| format!("Failed to write {:?}", sample))?;
        println!("Created {:?}", sample);
    }
    Ok(())
}

const SAMPLE_PAGE: &str = r#"---
title: Welcome
description: Quick start guide
order: 1
---

# Welcome

This page was generated by `docsmith init`.

## Building

Run the build from the project root:

```bash
docsmith build
```

### Output

Each page becomes an HTML body plus a JSON module with its outline.

## Annotations {{ tag: 'NEW' }}

A trailing `{{ ... }}` on a heading is attached to its outline entry.
"#;
