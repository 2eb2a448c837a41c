//! URL table for the data.gov.hk API.

use crate::error::FetchError;
use crate::language::Language;

/// Page size used by the dataset search endpoint.
pub const DATASETS_PAGE_SIZE: u32 = 12;

/// Upstream endpoints rooted at a configurable base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    /// Create the table for `base_url` (e.g. `https://data.gov.hk`).
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| FetchError::Client(format!("invalid base URL '{}': {}", base_url, e)))?;
        if parsed.cannot_be_a_base() {
            return Err(FetchError::Client(format!(
                "invalid base URL '{}': not a hierarchical URL",
                base_url
            )));
        }
        Ok(Self {
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without a trailing slash.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Dataset search API.
    pub fn datasets(&self) -> String {
        format!("{}/api/v1/datasets", self.base)
    }

    /// Provider list for a language.
    pub fn providers(&self, language: Language) -> String {
        format!("{}/filestore/json/providers_{}.json", self.base, language)
    }

    /// Category list for a language.
    pub fn categories(&self, language: Language) -> String {
        format!("{}/filestore/json/categories_{}.json", self.base, language)
    }

    /// CKAN `package_show` action for a language.
    pub fn package_show(&self, language: Language) -> String {
        format!("{}/{}-data/api/3/action/package_show", self.base, language)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            base: "https://data.gov.hk".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_urls() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.datasets(), "https://data.gov.hk/api/v1/datasets");
        assert_eq!(
            endpoints.providers(Language::Tc),
            "https://data.gov.hk/filestore/json/providers_tc.json"
        );
        assert_eq!(
            endpoints.categories(Language::Sc),
            "https://data.gov.hk/filestore/json/categories_sc.json"
        );
        assert_eq!(
            endpoints.package_show(Language::En),
            "https://data.gov.hk/en-data/api/3/action/package_show"
        );
    }

    #[test]
    fn test_base_with_path_and_trailing_slash() {
        let endpoints = Endpoints::new("http://127.0.0.1:9999/mirror/").unwrap();
        assert_eq!(
            endpoints.providers(Language::En),
            "http://127.0.0.1:9999/mirror/filestore/json/providers_en.json"
        );
    }

    #[test]
    fn test_invalid_base() {
        assert!(Endpoints::new("not a url").is_err());
        assert!(Endpoints::new("mailto:someone@example.com").is_err());
    }
}
