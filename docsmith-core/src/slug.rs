//! Slug generation and per-document de-duplication.

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

static HYPHEN_RUNS: OnceLock<Regex> = OnceLock::new();
static CAMEL_BOUNDARY: OnceLock<Regex> = OnceLock::new();
static ACRONYM_BOUNDARY: OnceLock<Regex> = OnceLock::new();

fn hyphen_runs() -> &'static Regex {
    HYPHEN_RUNS.get_or_init(|| Regex::new(r"-+").unwrap())
}

/// `imageZoom` -> `image Zoom`
fn camel_boundary() -> &'static Regex {
    CAMEL_BOUNDARY.get_or_init(|| Regex::new(r"([a-z\d])([A-Z])").unwrap())
}

/// `HTMLParser` -> `HTML Parser`
fn acronym_boundary() -> &'static Regex {
    ACRONYM_BOUNDARY.get_or_init(|| Regex::new(r"([A-Z]+)([A-Z][a-z\d]+)").unwrap())
}

/// Base used when a heading slugifies to nothing (e.g. `## ???`)
const EMPTY_SLUG_FALLBACK: &str = "section";

/// Convert a string to a URL-safe slug
///
/// Rules:
/// - Split camelCase words and spell out `&` as `and`
/// - Lowercase
/// - Replace whitespace with hyphens
/// - Remove special characters (except hyphens)
/// - Collapse multiple hyphens
/// - Trim leading/trailing hyphens
///
/// # Examples
///
/// ```
/// use docsmith_core::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("Rust & Safety"), "rust-and-safety");
/// assert_eq!(slugify("C++ Programming"), "c-programming");
/// ```
pub fn slugify(input: &str) -> String {
    let split = camel_boundary().replace_all(input, "$1 $2");
    let split = acronym_boundary().replace_all(&split, "$1 $2");
    let lowercased = split.replace('&', " and ").to_lowercase();

    let with_hyphens = lowercased
        .graphemes(true)
        .map(|g| match g {
            " " | "_" | "\t" | "\n" | "\r\n" => "-",
            _ => g,
        })
        .collect::<String>();

    // Keep ascii alphanumerics, hyphens and unicode letters
    let cleaned = with_hyphens
        .graphemes(true)
        .filter_map(|g| {
            let c = g.chars().next()?;
            if c.is_ascii_alphanumeric() || c == '-' || c.is_alphabetic() {
                Some(g)
            } else {
                None
            }
        })
        .collect::<String>();

    let collapsed = hyphen_runs().replace_all(&cleaned, "-");

    collapsed.trim_matches('-').to_string()
}

/// Hands out unique slugs within one document.
///
/// The first occurrence of a base slug is returned bare; later ones get
/// `-1`, `-2`, … appended. Create a fresh counter per document.
///
/// ```
/// use docsmith_core::slug::SlugCounter;
///
/// let mut slugs = SlugCounter::new();
/// assert_eq!(slugs.slug("Overview"), "overview");
/// assert_eq!(slugs.slug("Overview"), "overview-1");
/// ```
#[derive(Debug, Default)]
pub struct SlugCounter {
    occurrences: HashMap<String, usize>,
    issued: HashSet<String>,
}

impl SlugCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slugify `text` and make the result unique among slugs issued so far
    pub fn slug(&mut self, text: &str) -> String {
        let mut base = slugify(text);
        if base.is_empty() {
            base = EMPTY_SLUG_FALLBACK.to_string();
        }

        let count = self.occurrences.entry(base.clone()).or_insert(0);
        let mut candidate = if *count == 0 {
            base.clone()
        } else {
            format!("{}-{}", base, count)
        };
        *count += 1;

        // "Setup", "Setup", "Setup 1" must not collide on "setup-1"
        while self.issued.contains(&candidate) {
            let count = self.occurrences.entry(base.clone()).or_insert(0);
            candidate = format!("{}-{}", base, count);
            *count += 1;
        }

        self.issued.insert(candidate.clone());
        candidate
    }

    pub fn reset(&mut self) {
        self.occurrences.clear();
        self.issued.clear();
    }
}
