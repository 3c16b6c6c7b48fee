//! Text sanitization for speech
//!
//! Markup is stripped before any length check, so text that is only long
//! because of markup is never rejected.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

type Pattern = Lazy<Option<Regex>>;

static HEADING: Pattern = Lazy::new(|| Regex::new(r"#{1,6}\s").ok());
static IMAGE: Pattern = Lazy::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").ok());
static LINK: Pattern = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").ok());
static CODE: Pattern = Lazy::new(|| Regex::new(r"`{1,3}[^`]*`{1,3}").ok());
static BOLD: Pattern = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*|__(.+?)__").ok());
static STAR_ITALIC: Pattern = Lazy::new(|| Regex::new(r"\*([^*\s](?:[^*]*[^*\s])?)\*").ok());
static UNDERSCORE_ITALIC: Pattern =
    Lazy::new(|| Regex::new(r"(^|[^\w])_([^_\s](?:[^_]*[^_\s])?)_($|[^\w])").ok());
static MARKER_RUNS: Pattern = Lazy::new(|| Regex::new(r"\*{2,}|_{2,}").ok());
static SYMBOLS: Pattern = Lazy::new(|| Regex::new(r"[\\^{}\[\]|~$]").ok());
static ENTITIES: Pattern = Lazy::new(|| Regex::new(r"&lt;|&gt;|&amp;").ok());
static LIST_NUMBER: Pattern = Lazy::new(|| Regex::new(r"(\d+)\.(\s|$)").ok());
static WHITESPACE: Pattern = Lazy::new(|| Regex::new(r"\s+").ok());

/// Apply one pattern; a pattern that failed to compile leaves the text as is
fn apply<'t>(pattern: &Pattern, text: &'t str, rep: &str) -> Cow<'t, str> {
    match pattern.as_ref() {
        Some(re) => re.replace_all(text, rep),
        None => {
            tracing::warn!("sanitizer pattern unavailable, skipping");
            Cow::Borrowed(text)
        }
    }
}

/// Strip markdown, LaTeX-like symbols and HTML entities; collapse whitespace
///
/// Only paired emphasis markers are removed, so `ph_scale` and `2*3` survive.
#[must_use]
pub fn sanitize(text: &str) -> String {
    let text = apply(&HEADING, text, "");
    let text = apply(&IMAGE, &text, "");
    let text = apply(&LINK, &text, "$1");
    let text = apply(&CODE, &text, "");
    let text = apply(&BOLD, &text, "$1$2");
    let text = apply(&STAR_ITALIC, &text, "$1");
    let text = apply(&UNDERSCORE_ITALIC, &text, "$1$2$3");
    let text = apply(&MARKER_RUNS, &text, "");
    let text = apply(&SYMBOLS, &text, "");
    let text = apply(&ENTITIES, &text, "");
    let text = apply(&LIST_NUMBER, &text, "$1 ");
    apply(&WHITESPACE, &text, " ").trim().to_string()
}

/// Cap text at `max_chars` characters, preferring the last word boundary
#[must_use]
pub fn truncate(text: &str, max_chars: usize) -> String {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };
    let head = &text[..cut];
    match head.rfind(char::is_whitespace) {
        Some(space) if space > 0 => head[..space].trim_end().to_string(),
        _ => head.to_string(),
    }
}

/// Sanitize, then cap
#[must_use]
pub fn prepare(text: &str, max_chars: usize) -> String {
    truncate(&sanitize(text), max_chars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_markdown_markers() {
        assert_eq!(
            sanitize("## Result\n\n**Zinc** reacts with *dilute* HCl."),
            "Result Zinc reacts with dilute HCl."
        );
    }

    #[test]
    fn links_keep_their_text() {
        assert_eq!(
            sanitize("See [the pH scale](https://example.org/ph_scale) for details"),
            "See the pH scale for details"
        );
    }

    #[test]
    fn removes_code_and_latex_symbols() {
        assert_eq!(
            sanitize("Use `set_ph(7)` then $H^{+}$ &amp; [OH]"),
            "Use then H+ OH"
        );
    }

    #[test]
    fn numbered_lists_become_spoken_numbers() {
        assert_eq!(sanitize("1. Add acid\n2. Stir"), "1 Add acid 2 Stir");
        assert_eq!(sanitize("pH 7.5 is basic"), "pH 7.5 is basic");
    }

    #[test]
    fn lone_markers_are_kept() {
        assert_eq!(sanitize("Open ph_scale and compute 2*3"), "Open ph_scale and compute 2*3");
        assert_eq!(sanitize("__Heat__ the _copper sulphate_ crystals"), "Heat the copper sulphate crystals");
    }

    #[test]
    fn every_pattern_compiles() {
        for pattern in [
            &HEADING,
            &IMAGE,
            &LINK,
            &CODE,
            &BOLD,
            &STAR_ITALIC,
            &UNDERSCORE_ITALIC,
            &MARKER_RUNS,
            &SYMBOLS,
            &ENTITIES,
            &LIST_NUMBER,
            &WHITESPACE,
        ] {
            assert!(pattern.is_some());
        }
    }

    #[test]
    fn markup_only_text_becomes_empty() {
        assert_eq!(sanitize("** __ `` $$"), "");
    }

    #[test]
    fn truncate_prefers_word_boundary() {
        assert_eq!(truncate("alpha beta gamma", 12), "alpha beta");
        assert_eq!(truncate("alpha", 12), "alpha");
        assert_eq!(truncate("abcdefgh", 4), "abcd");
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(truncate("नमस्ते दुनिया", 6), "नमस्ते");
    }

    #[test]
    fn length_cap_applies_after_sanitization() {
        let marked = format!("**{}**", "a".repeat(10));
        assert_eq!(prepare(&marked, 10), "a".repeat(10));
    }
}
