//! Language hints and locale mapping

use std::fmt;

/// Fallback locale for unknown languages
pub const DEFAULT_LOCALE: &str = "en-IN";

/// Internal language codes with a regional voice
const REGIONAL: &[(&str, &str)] = &[
    ("en", "en-IN"),
    ("hi", "hi-IN"),
    ("kn", "kn-IN"),
    ("ml", "ml-IN"),
    ("ta", "ta-IN"),
    ("te", "te-IN"),
    ("mr", "mr-IN"),
    ("gu", "gu-IN"),
    ("bn", "bn-IN"),
    ("pa", "pa-IN"),
];

/// Language the caller wants speech in (`hi`, `en-IN`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageHint(String);

impl LanguageHint {
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_string())
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Language family (`hi` for `hi-IN`), lowercased
    #[must_use]
    pub fn family(&self) -> String {
        self.0
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    /// Locale-specific voice code for the TTS proxy
    #[must_use]
    pub fn locale(&self) -> String {
        voice_language_code(&self.0)
    }
}

impl Default for LanguageHint {
    fn default() -> Self {
        Self::new("en")
    }
}

impl fmt::Display for LanguageHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LanguageHint {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Map an internal language code to a locale voice code
///
/// Already-regional codes (`xx-YY`) pass through; unknown codes map to `en-IN`.
#[must_use]
pub fn voice_language_code(code: &str) -> String {
    let code = code.trim();
    if let Some((lang, region)) = code.split_once(['-', '_']) {
        if !lang.is_empty() && !region.is_empty() {
            return format!("{}-{}", lang.to_ascii_lowercase(), region.to_ascii_uppercase());
        }
    }
    let lower = code.to_ascii_lowercase();
    REGIONAL
        .iter()
        .find(|(lang, _)| *lang == lower)
        .map_or(DEFAULT_LOCALE, |(_, locale)| locale)
        .to_string()
}
