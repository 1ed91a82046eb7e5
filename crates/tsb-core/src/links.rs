//! Share-link recognition and canonicalization.
//!
//! Pure text processing: no network, no store. The conversion pipeline feeds
//! the resulting canonical URLs to the shortening service one by one.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::CanonicalLink;

/// Path fragment identifying a share-link as eligible for conversion.
pub const MARKER_SEGMENT: &str = "/s/";

static URL_RE: OnceLock<Regex> = OnceLock::new();

fn url_regex() -> &'static Regex {
    URL_RE.get_or_init(|| Regex::new(r"https?://\S+").expect("failed to compile url regex"))
}

/// Extract every share-link from `text` and rewrite it into its canonical
/// form, in order of appearance.
///
/// Recognition keys on the `/s/` marker segment alone; URLs without it are
/// silently dropped. The canonical form replaces everything up to and
/// including the first marker with `redirect_base` (which carries its own
/// `?url=` query prefix), so
/// `https://example.com/s/abc123` + base `https://redirect.example/?url=`
/// becomes `https://redirect.example/?url=abc123`.
///
/// An empty result is a valid outcome, not an error; the caller renders a
/// guidance reply.
pub fn extract_and_canonicalize(text: &str, redirect_base: &str) -> Vec<CanonicalLink> {
    url_regex()
        .find_iter(text)
        .map(|m| m.as_str())
        .filter_map(|raw| {
            let (_, rest) = raw.split_once(MARKER_SEGMENT)?;
            Some(CanonicalLink {
                raw: raw.to_string(),
                canonical: format!("{redirect_base}{rest}"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://redirect.example/?url=";

    #[test]
    fn canonicalizes_with_literal_substitution() {
        let links = extract_and_canonicalize("check this https://example.com/s/abc123 out", BASE);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].raw, "https://example.com/s/abc123");
        assert_eq!(links[0].canonical, "https://redirect.example/?url=abc123");
    }

    #[test]
    fn drops_urls_without_marker() {
        let links =
            extract_and_canonicalize("https://example.com/watch?v=1 and https://other.io/x", BASE);
        assert!(links.is_empty());
    }

    #[test]
    fn no_links_yields_empty_result() {
        assert!(extract_and_canonicalize("no links here at all", BASE).is_empty());
        assert!(extract_and_canonicalize("", BASE).is_empty());
    }

    #[test]
    fn keeps_all_qualifying_links_in_input_order() {
        let text = "first https://a.example/s/one then https://plain.example/page \
                    then http://b.example/dir/s/two done";
        let links = extract_and_canonicalize(text, BASE);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].canonical, "https://redirect.example/?url=one");
        assert_eq!(links[1].canonical, "https://redirect.example/?url=two");
    }

    #[test]
    fn marker_split_uses_first_occurrence() {
        let links = extract_and_canonicalize("https://a.example/s/x/s/y", BASE);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].canonical, "https://redirect.example/?url=x/s/y");
    }
}
