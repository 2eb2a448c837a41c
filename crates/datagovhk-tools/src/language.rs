//! Response languages offered by data.gov.hk.

use std::fmt;
use std::str::FromStr;

/// A data.gov.hk content language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Language {
    /// English.
    #[default]
    En,
    /// Traditional Chinese.
    Tc,
    /// Simplified Chinese.
    Sc,
}

impl Language {
    /// All supported languages.
    pub const ALL: [Language; 3] = [Language::En, Language::Tc, Language::Sc];

    /// Code used in upstream URLs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Tc => "tc",
            Self::Sc => "sc",
        }
    }

    /// Parse a language code, falling back to English for anything unknown.
    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|_| {
            tracing::warn!(language = %raw, "unsupported language, using en");
            Self::En
        })
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by strict parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLanguage(pub String);

impl fmt::Display for UnknownLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown language '{}', expected one of en, tc, sc", self.0)
    }
}

impl std::error::Error for UnknownLanguage {}

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "tc" => Ok(Self::Tc),
            "sc" => Ok(Self::Sc),
            _ => Err(UnknownLanguage(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        for lang in Language::ALL {
            assert_eq!(Language::parse_lenient(lang.as_str()), lang);
        }
        assert_eq!(Language::parse_lenient(" TC "), Language::Tc);
    }

    #[test]
    fn test_unknown_falls_back_to_en() {
        for raw in ["zz", "", "english", "zh-HK"] {
            assert_eq!(Language::parse_lenient(raw), Language::En);
        }
    }

    #[test]
    fn test_strict_parse_rejects_unknown() {
        let err = "fr".parse::<Language>().unwrap_err();
        assert!(err.to_string().contains("fr"));
    }
}
