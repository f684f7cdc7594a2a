use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocaleParseError {
    #[error("Empty locale tag")]
    Empty,
    #[error("Invalid locale tag: {0}")]
    Invalid(String),
}

/// Language plus optional country, written as `ll_CC` (for example `en_US`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale {
    language: String,
    country: String,
}

impl Locale {
    pub fn new(language: &str, country: &str) -> Self {
        Self {
            language: language.to_ascii_lowercase(),
            country: country.to_ascii_uppercase(),
        }
    }

    /// `en_US`
    pub fn us() -> Self {
        Self::new("en", "US")
    }

    /// Locale of the running process, read from `LC_ALL` then `LANG`.
    ///
    /// The POSIX locales (`C`, `POSIX`) and unparsable values resolve to `en_US`.
    pub fn system() -> Self {
        ["LC_ALL", "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find_map(|value| Self::from_env_value(&value))
            .unwrap_or_else(Self::us)
    }

    /// Parse a locale environment value; `None` for POSIX locales in any
    /// encoding (`C`, `C.UTF-8`, `POSIX`) and for anything unparsable.
    pub fn from_env_value(value: &str) -> Option<Self> {
        let tag = strip_suffixes(value);
        if tag.is_empty() || tag == "C" || tag == "POSIX" {
            return None;
        }
        value.parse().ok()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn country(&self) -> &str {
        &self.country
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::us()
    }
}

/// Drop encoding and modifier suffixes: `de_DE.UTF-8@euro` -> `de_DE`
fn strip_suffixes(value: &str) -> &str {
    value.split(['.', '@']).next().unwrap_or_default().trim()
}

impl FromStr for Locale {
    type Err = LocaleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = strip_suffixes(s);
        if tag.is_empty() {
            return Err(LocaleParseError::Empty);
        }

        let mut parts = tag.split(['_', '-']);
        let language = parts.next().unwrap_or_default();
        let country = parts.next().unwrap_or_default();

        let well_formed = !language.is_empty()
            && language.chars().all(|c| c.is_ascii_alphabetic())
            && country.chars().all(|c| c.is_ascii_alphanumeric());
        if !well_formed {
            return Err(LocaleParseError::Invalid(s.to_string()));
        }

        Ok(Self::new(language, country))
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.country.is_empty() {
            write!(f, "{}", self.language)
        } else {
            write!(f, "{}_{}", self.language, self.country)
        }
    }
}

impl TryFrom<String> for Locale {
    type Error = LocaleParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variants() {
        assert_eq!("en_US".parse::<Locale>().unwrap(), Locale::us());
        assert_eq!("en-us".parse::<Locale>().unwrap(), Locale::us());
        assert_eq!("zh_CN.UTF-8".parse::<Locale>().unwrap(), Locale::new("zh", "CN"));
        assert_eq!("de_DE.UTF-8@euro".parse::<Locale>().unwrap().to_string(), "de_DE");
        assert_eq!("fr".parse::<Locale>().unwrap().to_string(), "fr");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!("".parse::<Locale>(), Err(LocaleParseError::Empty));
        assert!("12_34".parse::<Locale>().is_err());
        assert!("e n_US".parse::<Locale>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Locale::new("ja", "JP")).unwrap();
        assert_eq!(json, "\"ja_JP\"");

        let locale: Locale = serde_json::from_str("\"ru_RU\"").unwrap();
        assert_eq!(locale.language(), "ru");
        assert_eq!(locale.country(), "RU");

        assert!(serde_json::from_str::<Locale>("42").is_err());
    }

    #[test]
    fn test_posix_env_values_are_skipped() {
        assert_eq!(Locale::from_env_value("C"), None);
        assert_eq!(Locale::from_env_value("C.UTF-8"), None);
        assert_eq!(Locale::from_env_value("C.utf8"), None);
        assert_eq!(Locale::from_env_value("POSIX"), None);
        assert_eq!(Locale::from_env_value(""), None);
        assert_eq!(Locale::from_env_value("pt_BR.UTF-8"), Some(Locale::new("pt", "BR")));
    }
}
