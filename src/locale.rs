//! Active locale preferences.
//!
//! Only the language tags matter to the editing core: they decide which of a
//! definition's names a newly inserted reference is spelled with.

use serde::{Deserialize, Serialize};

/// Preferred languages, most preferred first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locales {
    languages: Vec<String>,
}

impl Locales {
    pub fn new<I, S>(languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            languages: languages.into_iter().map(Into::into).collect(),
        }
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Rank of a language tag; lower is more preferred
    pub fn rank(&self, language: &str) -> Option<usize> {
        self.languages
            .iter()
            .position(|preferred| preferred.eq_ignore_ascii_case(language))
    }
}

impl Default for Locales {
    fn default() -> Self {
        Self::new(["en"])
    }
}
