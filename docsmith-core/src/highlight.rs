//! Code syntax highlighting using syntect.
//!
//! A [`Highlighter`] owns the loaded grammars and theme. Loading them is the
//! expensive part, so build one per site build and share it behind an `Arc`.

use crate::config::{Config, HighlightConfig};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use thiserror::Error;

/// Aliases for fence languages that syntect's bundled grammars name differently
const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("ts", "js"),
    ("tsx", "js"),
    ("jsx", "js"),
    ("typescript", "js"),
    ("mjs", "js"),
    ("cjs", "js"),
    ("sh", "bash"),
    ("shell", "bash"),
    ("shellscript", "bash"),
    ("zsh", "bash"),
    ("console", "bash"),
    ("jsonc", "json"),
    ("text", "txt"),
    ("plaintext", "txt"),
    ("plain", "txt"),
];

#[derive(Error, Debug)]
pub enum HighlightError {
    #[error("Unknown theme: {0}")]
    UnknownTheme(String),

    #[error("Failed to load theme {path:?}: {source}")]
    ThemeLoad {
        path: PathBuf,
        #[source]
        source: syntect::LoadingError,
    },

    #[error("Unknown code block language: {language}")]
    UnknownLanguage { language: String },

    #[error("Highlighting failed: {0}")]
    Syntect(#[from] syntect::Error),
}

/// Loaded grammars plus one theme
pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
    theme_name: String,
    aliases: HashMap<String, String>,
}

impl Highlighter {
    /// Load grammars and the configured theme
    ///
    /// `theme_path` overrides the named theme when given.
    pub fn new(config: &HighlightConfig, theme_path: Option<&Path>) -> Result<Self, HighlightError> {
        let (theme, theme_name) = match theme_path {
            Some(path) => {
                let theme = ThemeSet::get_theme(path).map_err(|source| HighlightError::ThemeLoad {
                    path: path.to_path_buf(),
                    source,
                })?;
                (theme, path.display().to_string())
            }
            None => {
                let mut theme_set = ThemeSet::load_defaults();
                let theme = theme_set
                    .themes
                    .remove(&config.theme)
                    .ok_or_else(|| HighlightError::UnknownTheme(config.theme.clone()))?;
                (theme, config.theme.clone())
            }
        };

        let mut aliases: HashMap<String, String> = DEFAULT_ALIASES
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect();
        for (from, to) in &config.aliases {
            aliases.insert(from.to_lowercase(), to.clone());
        }

        tracing::debug!("Loaded highlighter with theme {}", theme_name);

        Ok(Self {
            syntax_set: SyntaxSet::load_defaults_nonewlines(),
            theme,
            theme_name,
            aliases,
        })
    }

    /// Build from the site config, resolving the theme path against it
    pub fn from_config(config: &Config) -> Result<Self, HighlightError> {
        let theme_path = config.theme_path();
        Self::new(&config.highlight, theme_path.as_deref())
    }

    pub fn theme_name(&self) -> &str {
        &self.theme_name
    }

    /// Find the grammar for a fence language, following aliases
    pub fn resolve_language(&self, language: &str) -> Option<&SyntaxReference> {
        let lowered = language.trim().to_lowercase();
        let token = self
            .aliases
            .get(&lowered)
            .map(String::as_str)
            .unwrap_or(lowered.as_str());

        self.syntax_set
            .find_syntax_by_token(token)
            .or_else(|| self.syntax_set.find_syntax_by_extension(token))
    }

    pub fn supports(&self, language: &str) -> bool {
        self.resolve_language(language).is_some()
    }

    /// Render `code` as themed HTML, one `<span>` per line.
    ///
    /// Lines are joined with `\n`; a single trailing newline in `code` does
    /// not produce an extra empty line.
    pub fn highlight_lines(&self, code: &str, language: &str) -> Result<String, HighlightError> {
        let syntax = self
            .resolve_language(language)
            .ok_or_else(|| HighlightError::UnknownLanguage {
                language: language.to_string(),
            })?;

        let mut highlighter = HighlightLines::new(syntax, &self.theme);
        let source = code.strip_suffix('\n').unwrap_or(code);

        let mut lines = Vec::new();
        for line in source.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            let ranges = highlighter.highlight_line(line, &self.syntax_set)?;
            let html = styled_line_to_highlighted_html(&ranges, IncludeBackground::No)?;
            lines.push(format!("<span>{}</span>", html));
        }

        Ok(lines.join("\n"))
    }
}

impl std::fmt::Debug for Highlighter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Highlighter")
            .field("theme", &self.theme_name)
            .field("aliases", &self.aliases.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn highlighter() -> Highlighter {
        Highlighter::new(&HighlightConfig::default(), None).unwrap()
    }

    #[test]
    fn test_rust_lines_are_wrapped() {
        let html = highlighter()
            .highlight_lines("fn main() {}\n", "rust")
            .unwrap();

        assert!(html.starts_with("<span>"));
        assert!(html.ends_with("</span>"));
        assert!(html.contains("main"));
        assert!(html.contains("style=\"color:#"));
        assert!(!html.contains('\n'));
    }

    #[test]
    fn test_multiline_joined_with_newline() {
        let html = highlighter()
            .highlight_lines("let a = 1;\nlet b = 2;", "rust")
            .unwrap();

        assert_eq!(html.lines().count(), 2);
        assert!(html.lines().all(|l| l.starts_with("<span>") && l.ends_with("</span>")));
    }

    #[test]
    fn test_text_is_escaped() {
        let html = highlighter().highlight_lines("<div>&</div>", "txt").unwrap();
        assert!(html.contains("&lt;div&gt;&amp;&lt;/div&gt;"));
    }

    #[test]
    fn test_aliases_resolve() {
        let h = highlighter();
        assert!(h.supports("txt"));
        assert!(h.supports("tsx"));
        assert!(h.supports("shell"));
        assert!(h.supports("Python"));
    }

    #[test]
    fn test_configured_alias() {
        let mut config = HighlightConfig::default();
        config.aliases.insert("rs2".into(), "rust".into());
        let h = Highlighter::new(&config, None).unwrap();
        assert!(h.supports("rs2"));
    }

    #[test]
    fn test_unknown_language_is_error() {
        let err = highlighter()
            .highlight_lines("x", "definitely-not-a-language")
            .unwrap_err();
        assert!(matches!(err, HighlightError::UnknownLanguage { .. }));
    }

    #[test]
    fn test_unknown_theme_is_error() {
        let config = HighlightConfig {
            theme: "no-such-theme".into(),
            ..HighlightConfig::default()
        };
        assert!(matches!(
            Highlighter::new(&config, None),
            Err(HighlightError::UnknownTheme(_))
        ));
    }
}
