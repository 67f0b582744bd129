//! Content canonicalization.
//!
//! Strips volatile fragments from fetched HTML so that only meaningful edits
//! register as drift, then fingerprints the result.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

/// Placeholder substituted for ISO-8601 instants
pub const TIMESTAMP_PLACEHOLDER: &str = "TIMESTAMP";

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

fn rule(pattern: &str, replacement: &'static str) -> Rule {
    Rule { pattern: Regex::new(pattern).expect("normalizer pattern is a valid literal"), replacement }
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        rule(r"(?s)<!--.*?-->", ""),
        rule(r"(?is)<script\b[^>]*>.*?</script\s*>", ""),
        rule(r"(?is)<style\b[^>]*>.*?</style\s*>", ""),
        rule(r"[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}(\.[0-9]+)?Z?", TIMESTAMP_PLACEHOLDER),
        rule(r#"(?i)<meta\b[^>]*name\s*=\s*["']csrf-token["'][^>]*>"#, ""),
        rule(r#"(?i)\s*data-timestamp\s*=\s*["'][^"']*["']"#, ""),
        rule(
            r#"(?is)<div\b[^>]*\b(?:class|id)\s*=\s*["'][^"']*\b(?:ad|advertisement|banner)\b[^"']*["'][^>]*>.*?</div\s*>"#,
            "",
        ),
    ]
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Canonicalize raw HTML.
///
/// Removes comments, scripts, styles, CSRF meta tags, `data-timestamp`
/// attributes and ad containers, replaces ISO-8601 instants with
/// [`TIMESTAMP_PLACEHOLDER`], then collapses whitespace. The result is a
/// fixpoint: normalizing it again yields the same string.
///
/// Removing a fragment can splice its neighbours into a new match, so the
/// rules are reapplied until nothing changes. Every rewrite shortens the
/// text, which bounds the loop.
pub fn normalize(raw: &str) -> String {
    let mut current = collapse(&apply_rules(raw));
    loop {
        let next = collapse(&apply_rules(&current));
        if next == current {
            return current;
        }
        current = next;
    }
}

fn apply_rules(input: &str) -> String {
    RULES.iter().fold(input.to_string(), |text, rule| {
        rule.pattern.replace_all(&text, rule.replacement).into_owned()
    })
}

fn collapse(input: &str) -> String {
    WHITESPACE.replace_all(input, " ").trim().to_string()
}

/// Lowercase hex SHA-256 of the UTF-8 bytes of `content`
pub fn hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_volatile_fragments() {
        let raw = r#"<html>
            <head>
                <meta name="csrf-token" content="abc123">
                <style>body { color: red; }</style>
                <script type="text/javascript">var now = Date.now();</script>
            </head>
            <body>
                <!-- rendered by node 7 -->
                <p data-timestamp="1700000000">Hello</p>
                <div class="ad top">Buy now</div>
                <span>Updated 2024-01-15T10:30:00.123Z</span>
            </body>
        </html>"#;

        let canonical = normalize(raw);

        assert!(!canonical.contains("csrf"));
        assert!(!canonical.contains("color: red"));
        assert!(!canonical.contains("Date.now"));
        assert!(!canonical.contains("rendered by"));
        assert!(!canonical.contains("data-timestamp"));
        assert!(!canonical.contains("Buy now"));
        assert!(canonical.contains("<p>Hello</p>"));
        assert!(canonical.contains("Updated TIMESTAMP"));
        assert!(!canonical.contains('\n'));
    }

    #[test]
    fn test_ad_classes_match_whole_words_only() {
        let kept = normalize(r#"<div class="header">Title</div><div id="loading">x</div>"#);
        assert!(kept.contains("Title"));
        assert!(kept.contains("x"));

        let removed = normalize(r#"<div id="banner">Promo</div><p>Body</p>"#);
        assert_eq!(removed, "<p>Body</p>");
    }

    #[test]
    fn test_timestamps_without_fraction_or_zone() {
        assert_eq!(normalize("at 2023-12-31T23:59:59 now"), "at TIMESTAMP now");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "",
            "   plain   text  ",
            "<scr<script>x</script>ipt>alert(1)</script>",
            "<!-<!-- a -->- b -->tail",
            r#"<div class="ad"><div class="ad">nested</div></div>end"#,
            "2024-01-15T10:30:00Z <style>a{}</style>\n\n<p>x</p>",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_deeply_nested_comments_reach_fixpoint() {
        let mut raw = "<!-- core -->".to_string();
        for layer in 0..12 {
            raw = format!("<!-{raw}- layer{layer} -->");
        }
        raw.push_str("<p>kept</p>");

        let once = normalize(&raw);

        assert_eq!(once, "<p>kept</p>");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_hash_is_stable_hex_sha256() {
        assert_eq!(hash(""), "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
        assert_eq!(hash("abc"), hash("abc"));
        assert_ne!(hash("abc"), hash("abd"));
        assert_eq!(hash("abc").len(), 64);
    }

    #[test]
    fn test_equal_content_after_noise_hashes_equal() {
        let a = normalize("<p>Hi</p><script>1</script> <!-- x -->");
        let b = normalize("<p>Hi</p>\n<script>2</script>");
        assert_eq!(hash(&a), hash(&b));
    }

    #[test]
    fn test_pages_differing_only_in_timestamp_hash_equal() {
        let a = normalize("<p>Last updated 2024-01-15T10:30:00Z</p>");
        let b = normalize("<p>Last updated 2025-06-01T00:00:00.5Z</p>");
        assert_eq!(a, "<p>Last updated TIMESTAMP</p>");
        assert_eq!(hash(&a), hash(&b));
    }

    #[test]
    fn test_pages_differing_only_in_data_timestamp_hash_equal() {
        let a = normalize(r#"<span data-timestamp="1700000000">Status</span>"#);
        let b = normalize(r#"<span data-timestamp="1800000000">Status</span>"#);
        assert_eq!(a, "<span>Status</span>");
        assert_eq!(hash(&a), hash(&b));
    }
}
