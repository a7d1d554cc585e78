//! Rebuild the site when content changes.

use super::build::run_build;
use anyhow::{Context, Result};
use docsmith_core::{Config, SiteBuilder};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;

/// Events arriving within this window are folded into one rebuild
const DEBOUNCE: Duration = Duration::from_millis(200);

pub async fn watch_site(config_path: &Path) -> Result<()> {
    let config = Config::from_file(config_path).context("Failed to load configuration")?;
    let content_dir = config.content_dir();

    // One builder for the whole session so the highlighter loads once
    let builder = SiteBuilder::new(config);
    if let Err(e) = rebuild(&builder) {
        tracing::error!("Initial build failed: {:#}", e);
    }

    println!("Watching {:?} for changes (Ctrl+C to stop)...", content_dir);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = tx.send(res);
        },
        notify::Config::default(),
    )
    .context("Failed to initialize watcher")?;

    watcher
        .watch(&content_dir, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {:?}", content_dir))?;

    while let Some(event) = rx.recv().await {
        let mut relevant = is_relevant(&event);

        // Drain the burst that usually follows a save
        while let Ok(Some(next)) = tokio::time::timeout(DEBOUNCE, rx.recv()).await {
            relevant |= is_relevant(&next);
        }

        if !relevant {
            continue;
        }
        if let Err(e) = rebuild(&builder) {
            tracing::error!("Rebuild failed: {:#}", e);
        }
    }

    Ok(())
}

/// Builds are blocking file I/O; keep them off the async worker
fn rebuild(builder: &SiteBuilder) -> Result<()> {
    tokio::task::block_in_place(|| run_build(builder)).map(|_| ())
}

fn is_relevant(event: &notify::Result<Event>) -> bool {
    match event {
        Ok(ev) => {
            let kind = describe_event(&ev.kind);
            ev.paths.iter().any(|path| {
                let content = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext == "md" || ext == "mdx");
                if content {
                    tracing::debug!("{} {:?}", kind, path);
                }
                content && kind != "unknown"
            })
        }
        Err(err) => {
            tracing::warn!("Watcher error: {}", err);
            false
        }
    }
}

fn describe_event(kind: &EventKind) -> &'static str {
    use notify::event::ModifyKind;

    match kind {
        EventKind::Create(_) => "create",
        EventKind::Modify(ModifyKind::Name(_)) => "rename",
        EventKind::Modify(_) => "modify",
        EventKind::Remove(_) => "remove",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind};
    use std::path::PathBuf;

    fn event(kind: EventKind, path: &str) -> notify::Result<Event> {
        Ok(Event::new(kind).add_path(PathBuf::from(path)))
    }

    #[test]
    fn test_content_changes_are_relevant() {
        assert!(is_relevant(&event(EventKind::Create(CreateKind::File), "content/a.mdx")));
        assert!(is_relevant(&event(EventKind::Modify(ModifyKind::Any), "content/b.md")));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_rebuild_from_async_context() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("docsmith.yml"), "site:\n  title: \"Watch\"\n").unwrap();
        std::fs::create_dir_all(dir.path().join("content")).unwrap();
        std::fs::write(dir.path().join("content/index.mdx"), "## Hi\n").unwrap();

        let config = Config::from_file(dir.path().join("docsmith.yml")).unwrap();
        let builder = SiteBuilder::new(config);
        rebuild(&builder).unwrap();
        assert!(dir.path().join("dist/index.html").exists());
    }

    #[test]
    fn test_other_files_ignored() {
        assert!(!is_relevant(&event(EventKind::Modify(ModifyKind::Any), "content/logo.png")));
        assert!(!is_relevant(&event(EventKind::Access(notify::event::AccessKind::Any), "content/a.mdx")));
    }
}
