//! Language label normalization and the per-item language fallback chain.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;

/// Canonical lowercase language code such as `en` or `zh-tw`.
pub type LanguageCode = String;

/// Reserved bucket name used by older unified configs.
pub const DEFAULT_BUCKET: &str = "default";

/// Canonical English code, always tried after the site default.
pub const ENGLISH: &str = "en";

static ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let table: &[(&str, &[&str])] = &[
        ("en", &["en", "en-us", "en-gb", "english", "英文", "英語", "영어"]),
        (
            "zh",
            &[
                "zh", "zh-cn", "zh-hans", "zh-sg", "chinese", "中文", "简体中文", "簡體中文", "汉语",
            ],
        ),
        (
            "zh-tw",
            &["zh-tw", "zh-hk", "zh-mo", "zh-hant", "繁體中文", "繁体中文", "正體中文"],
        ),
        ("ja", &["ja", "ja-jp", "jp", "japanese", "日本語", "日本语"]),
        ("ko", &["ko", "ko-kr", "korean", "한국어"]),
        ("fr", &["fr", "fr-fr", "french", "français", "francais"]),
        ("de", &["de", "de-de", "german", "deutsch"]),
        ("es", &["es", "es-es", "spanish", "español", "espanol"]),
        ("ru", &["ru", "ru-ru", "russian", "русский"]),
    ];

    let mut map = HashMap::new();
    for (code, labels) in table {
        for label in *labels {
            map.insert(*label, *code);
        }
    }
    map
});

static CODE_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]{2}(-[a-z]{2})?$").expect("valid language code regex"));

/// Map any user-facing language label or code to a canonical code.
///
/// Known aliases (including endonyms such as `中文` or `日本語`) resolve
/// through a static table; code-shaped tokens pass through lowercased, and
/// anything else comes back trimmed and lowercased. The result is always
/// a fixed point: `normalize(&normalize(x)) == normalize(x)`.
///
/// ```
/// use folio_core::lang::normalize;
///
/// assert_eq!(normalize("English"), "en");
/// assert_eq!(normalize("zh_TW"), "zh-tw");
/// assert_eq!(normalize("PT-BR"), "pt-br");
/// ```
pub fn normalize(label: &str) -> LanguageCode {
    let lowered = label.trim().to_lowercase();
    let hyphenated = lowered.replace('_', "-");

    if let Some(code) = ALIASES.get(hyphenated.as_str()) {
        return (*code).to_string();
    }
    if CODE_SHAPE.is_match(&hyphenated) {
        return hyphenated;
    }
    lowered
}

/// Ordered language candidates for one resolution step.
///
/// Duplicates are removed so that e.g. a site default of `en` is only
/// tried once.
pub fn fallback_order(requested: &str, site_default: &str) -> Vec<LanguageCode> {
    let mut order: Vec<LanguageCode> = Vec::with_capacity(4);
    for candidate in [
        normalize(requested),
        normalize(site_default),
        ENGLISH.to_string(),
        DEFAULT_BUCKET.to_string(),
    ] {
        if !candidate.is_empty() && !order.contains(&candidate) {
            order.push(candidate);
        }
    }
    order
}

/// Pick the language bucket of an item node.
///
/// `usable` decides which entries of the node are language buckets that
/// can actually be resolved (item-level metadata keys are not). Walks
/// [`fallback_order`] and then falls back to the first usable bucket in
/// declaration order, so an item with at least one usable bucket always
/// resolves.
pub fn select_bucket<'a>(
    node: &'a Mapping,
    requested: &str,
    site_default: &str,
    usable: impl Fn(&str, &Value) -> bool,
) -> Option<(LanguageCode, &'a Value)> {
    let buckets: Vec<(&str, &Value)> = node
        .iter()
        .filter_map(|(k, v)| k.as_str().map(|k| (k, v)))
        .filter(|(k, v)| !is_empty_value(v) && usable(k, v))
        .collect();

    for wanted in fallback_order(requested, site_default) {
        if let Some((key, value)) = buckets.iter().find(|(k, _)| normalize(k) == wanted) {
            return Some((normalize(key), *value));
        }
    }

    buckets
        .first()
        .map(|(key, value)| (normalize(key), *value))
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Sequence(seq) => seq.is_empty(),
        Value::Mapping(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_aliases() {
        assert_eq!(normalize("English"), "en");
        assert_eq!(normalize("中文"), "zh");
        assert_eq!(normalize("繁體中文"), "zh-tw");
        assert_eq!(normalize("日本語"), "ja");
        assert_eq!(normalize(" EN-us "), "en");
        assert_eq!(normalize("zh_HK"), "zh-tw");
    }

    #[test]
    fn test_passthrough() {
        assert_eq!(normalize("pt-BR"), "pt-br");
        assert_eq!(normalize("it"), "it");
        assert_eq!(normalize(" Default "), "default");
        assert_eq!(normalize("Klingon"), "klingon");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_idempotent() {
        let labels = [
            "English", "en", "zh_TW", "中文", "繁體中文", "日本語", "한국어", "Français", "pt-BR",
            "default", "Klingon", "  spaced  ", "x_y_z", "EN_GB", "",
        ];
        for label in labels {
            let once = normalize(label);
            assert_eq!(normalize(&once), once, "label {label:?}");
        }
    }

    #[test]
    fn test_fallback_order_dedupes() {
        assert_eq!(fallback_order("English", "en"), vec!["en", "default"]);
        assert_eq!(
            fallback_order("ja", "zh"),
            vec!["ja", "zh", "en", "default"]
        );
    }

    #[test]
    fn test_select_requested_then_default() {
        let item = node("en: a.md\nzh: b.md\n");
        let any = |_: &str, _: &Value| true;

        let (lang, value) = select_bucket(&item, "中文", "en", any).unwrap();
        assert_eq!(lang, "zh");
        assert_eq!(value.as_str(), Some("b.md"));

        let (lang, _) = select_bucket(&item, "fr", "en", any).unwrap();
        assert_eq!(lang, "en");
    }

    #[test]
    fn test_select_default_bucket_and_first_declared() {
        let legacy = node("default: a.md\nja: b.md\n");
        let (lang, _) = select_bucket(&legacy, "fr", "de", |_, _| true).unwrap();
        assert_eq!(lang, "default");

        let only_others = node("ko: k.md\nja: j.md\n");
        let (lang, _) = select_bucket(&only_others, "fr", "de", |_, _| true).unwrap();
        assert_eq!(lang, "ko");
    }

    #[test]
    fn test_select_skips_non_buckets_and_empty_values() {
        let item = node("tag: rust\nen: ''\nzh: b.md\n");
        let (lang, _) = select_bucket(&item, "en", "en", |k, _| k != "tag").unwrap();
        assert_eq!(lang, "zh");

        let nothing = node("tag: rust\n");
        assert!(select_bucket(&nothing, "en", "en", |k, _| k != "tag").is_none());
    }
}
