//! Free-text normalization for post titles, bodies, and comments.
//!
//! [`clean_text`] is the single cleaning primitive applied while building
//! block projections. It is pure, total, and idempotent: running it twice
//! yields the same string as running it once. The step order matters
//! (lowercasing happens before URL stripping, punctuation removal before
//! whitespace collapsing) and must not be reordered without re-validating
//! idempotence.

use once_cell::sync::Lazy;
use regex::Regex;

/// `scheme://` up to the next whitespace.
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+://\S+").unwrap());

/// Anything that is neither a word character nor whitespace.
static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());

/// Escape characters collapsed to a single space.
static ESCAPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\n\r\t\f\v]").unwrap());

/// Runs of whitespace.
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Normalize free text for downstream analysis.
///
/// Steps, in order: lowercase, strip URL tokens, strip punctuation, replace
/// escape characters with spaces, collapse whitespace runs, trim.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(clean_text("Visit http://x.co NOW!!"), "visit now");
/// ```
pub fn clean_text(text: &str) -> String {
    let text = text.to_lowercase();
    let text = URL_RE.replace_all(&text, "");
    let text = NON_WORD_RE.replace_all(&text, "");
    let text = ESCAPE_RE.replace_all(&text, " ");
    let text = WHITESPACE_RE.replace_all(&text, " ");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_strips_punctuation() {
        assert_eq!(clean_text("Hello, World!"), "hello world");
        assert_eq!(clean_text("C.E.O. said: 'buy'"), "ceo said buy");
    }

    #[test]
    fn test_strips_url_tokens() {
        assert_eq!(clean_text("Visit http://x.co NOW!!"), "visit now");
        assert_eq!(
            clean_text("see https://example.com/a?b=1#c for details"),
            "see for details"
        );
        // Bare hostnames without a scheme are plain text, not URLs.
        assert_eq!(clean_text("ask on reddit.com maybe"), "ask on redditcom maybe");
    }

    #[test]
    fn test_collapses_escape_characters_and_whitespace() {
        assert_eq!(clean_text("line one\nline two\r\n\tend"), "line one line two end");
        assert_eq!(clean_text("a\x0cb\x0bc"), "a b c");
        assert_eq!(clean_text("  spaced   out  "), "spaced out");
    }

    #[test]
    fn test_total_on_empty_and_degenerate_input() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("   \n\t  "), "");
        assert_eq!(clean_text("!!!???"), "");
        assert_eq!(clean_text("https://only.a.url/here"), "");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "Visit http://x.co NOW!!",
            "Mixed CASE with\nnewlines\tand URLs https://a.b/c",
            "already clean text",
            "",
            "émojis 🚀 and açcénts",
        ];
        for input in inputs {
            let once = clean_text(input);
            assert_eq!(clean_text(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_preserves_unicode_word_characters() {
        // \w is unicode-aware; accented letters and digits survive.
        assert_eq!(clean_text("Café №5 — open"), "café 5 open");
    }
}
