//! Trilingual text fields.

use serde::{Deserialize, Serialize};

/// A language a localized field can be read in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    /// Russian, the primary data-entry language.
    #[default]
    Ru,
    /// Tajik.
    Tj,
    /// English.
    En,
}

/// A name stored in Russian, Tajik and English.
///
/// Only the Russian text is mandatory; the other translations fall back to it.
///
/// # Example
///
/// ```
/// use pmmis::models::{Language, LocalizedText};
///
/// let name = LocalizedText::new("Школа", "Мактаб", "");
/// assert_eq!(name.resolve(Language::Tj), "Мактаб");
/// assert_eq!(name.resolve(Language::En), "Школа");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    /// Russian text.
    pub ru: String,
    /// Tajik text.
    #[serde(default)]
    pub tj: String,
    /// English text.
    #[serde(default)]
    pub en: String,
}

impl LocalizedText {
    /// Creates a localized text from its three translations.
    pub fn new(ru: impl Into<String>, tj: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            ru: ru.into(),
            tj: tj.into(),
            en: en.into(),
        }
    }

    /// Returns the text for `language`, falling back to Russian when empty.
    pub fn resolve(&self, language: Language) -> &str {
        let text = match language {
            Language::Ru => &self.ru,
            Language::Tj => &self.tj,
            Language::En => &self.en,
        };
        if text.trim().is_empty() { &self.ru } else { text }
    }

    /// True when the mandatory Russian text is blank.
    pub fn is_blank(&self) -> bool {
        self.ru.trim().is_empty()
    }
}
