//! Slugs for tab and post identifiers.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

static HYPHEN_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").expect("valid hyphen regex"));

/// Convert a tab or item key into a URL-safe slug
///
/// Rules:
/// - Lowercase
/// - Whitespace and underscores become hyphens
/// - Punctuation is dropped, unicode letters (e.g. CJK titles) are kept
/// - Hyphen runs collapse and are trimmed from both ends
///
/// # Examples
///
/// ```
/// use folio_core::slugify;
///
/// assert_eq!(slugify("About Me"), "about-me");
/// assert_eq!(slugify("Projects & Talks"), "projects-talks");
/// assert_eq!(slugify("关于"), "关于");
/// ```
pub fn slugify(input: &str) -> String {
    let cleaned = input
        .to_lowercase()
        .graphemes(true)
        .filter_map(|g| match g {
            " " | "_" | "\t" | "\n" => Some("-"),
            _ => {
                let c = g.chars().next()?;
                (c.is_alphanumeric() || c == '-').then_some(g)
            }
        })
        .collect::<String>();

    HYPHEN_RUNS
        .replace_all(&cleaned, "-")
        .trim_matches('-')
        .to_string()
}
