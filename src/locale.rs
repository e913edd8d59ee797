//! Locale tags and the policies that pick one for a context text.

use std::fmt;
use std::fmt::Debug;
use tracing::debug;
use whatlang::Lang;

/// Languages with a localized instruction template. `En` is the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    #[default]
    En,
    Fr,
    Ar,
}

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::En, Locale::Fr, Locale::Ar];

    /// Resolve a language tag such as `fr`, `fr-CA` or `AR`. Unsupported tags
    /// fall back to the default locale.
    pub fn from_tag(tag: &str) -> Self {
        let primary = tag
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "fr" => Self::Fr,
            "ar" => Self::Ar,
            _ => Self::En,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
            Self::Ar => "ar",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Policy deciding which locale's template to use for a given context.
pub trait LocaleResolver: Send + Sync + Debug {
    fn resolve(&self, text: &str) -> Locale;
}

/// Explicit override: ignores the text.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocale(pub Locale);

impl LocaleResolver for FixedLocale {
    fn resolve(&self, _text: &str) -> Locale {
        self.0
    }
}

/// Auto-detection through `whatlang`. Only French and Arabic have their own
/// template; every other detected language, and text too short to classify,
/// uses the default locale.
#[derive(Debug, Clone, Copy, Default)]
pub struct LanguageDetector;

impl LanguageDetector {
    /// Map a detected language onto the templates we ship.
    pub fn locale_for(lang: Lang) -> Locale {
        match lang {
            Lang::Fra => Locale::Fr,
            Lang::Ara => Locale::Ar,
            _ => Locale::En,
        }
    }
}

impl LocaleResolver for LanguageDetector {
    fn resolve(&self, text: &str) -> Locale {
        match whatlang::detect(text) {
            Some(info) => {
                let locale = Self::locale_for(info.lang());
                debug!(lang = info.lang().code(), confidence = info.confidence(), %locale, "Detected context language");
                locale
            }
            None => Locale::default(),
        }
    }
}
