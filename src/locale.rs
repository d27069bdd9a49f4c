use std::fmt;

use serde::{Deserialize, Serialize};

/// Display language. Only selects strings from the external localization
/// table; nothing in scoring or session flow reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    El,
    En,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Self::El => "el",
            Self::En => "en",
        }
    }

    /// Parse a two-letter code, falling back to the default language.
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(|c| c.trim().to_ascii_lowercase()).as_deref() {
            Some("el") => Self::El,
            Some("en") => Self::En,
            _ => Self::default(),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
