use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;

#[test]
fn init_then_build_writes_manifest() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    #[allow(deprecated)]
    Command::cargo_bin("docsmith")?
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("docsmith initialized"));

    assert!(dir.path().join("docsmith.yml").exists());
    assert!(dir.path().join("content/index.mdx").exists());

    #[allow(deprecated)]
    Command::cargo_bin("docsmith")?
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("Built 1 pages"));

    let manifest: Value = serde_json::from_str(&fs::read_to_string(dir.path().join("dist/manifest.json"))?)?;
    let page = &manifest["pages"][0];
    assert_eq!(page["route"], "/");
    assert_eq!(page["title"], "Welcome");
    assert_eq!(page["sections"][0]["id"], "building");
    assert_eq!(page["sections"][0]["children"][0]["id"], "output");
    assert_eq!(page["sections"][1]["tag"], "NEW");
    assert!(page["sections"][1].get("annotation").is_none());
    assert!(dir.path().join("dist/index.html").exists());
    Ok(())
}

#[test]
fn build_fails_when_a_page_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("docsmith.yml"), "site:\n  title: \"Broken\"\n")?;
    fs::create_dir_all(dir.path().join("content"))?;
    fs::write(dir.path().join("content/good.mdx"), "## Fine\n")?;
    fs::write(dir.path().join("content/bad.mdx"), "```klingon\nqapla'\n```\n")?;

    #[allow(deprecated)]
    Command::cargo_bin("docsmith")?
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("klingon"));

    // The good page is still written
    assert!(dir.path().join("dist/good.html").exists());
    Ok(())
}

#[test]
fn compile_prints_sections_without_config() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(
        dir.path().join("page.mdx"),
        "## Getting Started\n\n### Step One\n\n### Step Two\n\n## Advanced\n",
    )?;

    #[allow(deprecated)]
    let assert = Command::cargo_bin("docsmith")?
        .current_dir(dir.path())
        .args(["compile", "page.mdx", "--format", "sections"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    let sections: Value = serde_json::from_str(&stdout)?;
    assert_eq!(
        sections,
        serde_json::json!([
            {
                "title": "Getting Started",
                "id": "getting-started",
                "children": [
                    { "title": "Step One", "id": "step-one" },
                    { "title": "Step Two", "id": "step-two" }
                ]
            },
            { "title": "Advanced", "id": "advanced", "children": [] }
        ])
    );
    Ok(())
}

#[test]
fn compile_html_has_heading_ids() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("page.md"), "## Setup\n\n## Setup\n")?;

    #[allow(deprecated)]
    Command::cargo_bin("docsmith")?
        .current_dir(dir.path())
        .args(["compile", "page.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"<h2 id="setup">Setup</h2>"#))
        .stdout(predicate::str::contains(r#"<h2 id="setup-1">Setup</h2>"#));
    Ok(())
}
