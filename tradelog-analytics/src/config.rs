//! Journal configuration — a TOML file with one section per collaborator.
//!
//! Every section has defaults, so a missing file or a partial file is valid.
//! Values are injected where they are used (the repository path, the email
//! whitelist, the quote source) and nothing reads the environment except
//! `RUST_LOG` overriding the log level.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tradelog_core::StaticQuoteSource;

use crate::metrics::DEFAULT_TOP_SYMBOLS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    pub journal: JournalSection,
    pub access: AccessConfig,
    pub analytics: AnalyticsSection,
    pub quotes: QuoteSection,
    pub logging: LoggingConfig,
}

impl JournalConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Parse from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalSection {
    /// Where the JSON trade journal lives.
    pub data_file: PathBuf,
}

impl Default for JournalSection {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("trades.json"),
        }
    }
}

/// Email whitelist for the journal's sign-in gate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub allowed_emails: Vec<String>,
}

impl AccessConfig {
    /// Build from a comma-separated list such as `"a@x.com, b@y.com"`.
    pub fn from_list(list: &str) -> Self {
        Self {
            allowed_emails: list
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(String::from)
                .collect(),
        }
    }

    /// Case-insensitive, whitespace-trimmed membership test. An empty email
    /// is never allowed.
    pub fn is_email_allowed(&self, email: &str) -> bool {
        let email = email.trim();
        if email.is_empty() {
            return false;
        }
        self.allowed_emails
            .iter()
            .any(|allowed| allowed.trim().eq_ignore_ascii_case(email))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsSection {
    /// How many symbol buckets the charting subset keeps.
    pub top_symbols: usize,
}

impl Default for AnalyticsSection {
    fn default() -> Self {
        Self {
            top_symbols: DEFAULT_TOP_SYMBOLS,
        }
    }
}

/// Manually entered prices, used when no live provider is configured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteSection {
    pub manual: BTreeMap<String, f64>,
}

impl QuoteSection {
    pub fn source(&self) -> StaticQuoteSource {
        StaticQuoteSource::from_prices("manual", self.manual.iter().map(|(s, p)| (s.clone(), *p)))
    }
}

/// Log level and output format. `RUST_LOG` overrides `level`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradelog_core::QuoteSource;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg = JournalConfig::from_toml("").unwrap();
        assert_eq!(cfg, JournalConfig::default());
        assert_eq!(cfg.journal.data_file, PathBuf::from("trades.json"));
        assert_eq!(cfg.analytics.top_symbols, 10);
        assert_eq!(cfg.logging.level, "info");
        assert!(!cfg.logging.is_json());
    }

    #[test]
    fn full_toml() {
        let cfg = JournalConfig::from_toml(
            r#"
[journal]
data_file = "/var/lib/journal/trades.json"

[access]
allowed_emails = ["Me@Example.com"]

[analytics]
top_symbols = 5

[quotes]
manual = { AAPL = 190.5, MSFT = 410.0 }

[logging]
level = "debug"
format = "json"
"#,
        )
        .unwrap();
        assert_eq!(cfg.journal.data_file, PathBuf::from("/var/lib/journal/trades.json"));
        assert_eq!(cfg.analytics.top_symbols, 5);
        assert_eq!(cfg.quotes.manual.len(), 2);
        assert!(cfg.logging.is_json());
        assert!(cfg.access.is_email_allowed("me@example.COM"));
    }

    #[test]
    fn partial_sections_fill_in() {
        let cfg = JournalConfig::from_toml("[logging]\nformat = \"json\"\n").unwrap();
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.logging.is_json());
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let err = JournalConfig::from_toml("[analytics]\ntop_symbols = \"ten\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let cfg = JournalConfig::from_file(Path::new("/nonexistent/tradelog.toml")).unwrap();
        assert_eq!(cfg, JournalConfig::default());
    }

    #[test]
    fn toml_roundtrip() {
        let mut cfg = JournalConfig::default();
        cfg.quotes.manual.insert("SPY".into(), 500.25);
        let back = JournalConfig::from_toml(&cfg.to_toml().unwrap()).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn email_whitelist() {
        let access = AccessConfig::from_list(" a@x.com , B@Y.com,, ");
        assert_eq!(access.allowed_emails, ["a@x.com", "B@Y.com"]);
        assert!(access.is_email_allowed("A@X.COM"));
        assert!(access.is_email_allowed("  b@y.com "));
        assert!(!access.is_email_allowed("c@z.com"));
        assert!(!access.is_email_allowed(""));
        assert!(!AccessConfig::default().is_email_allowed("a@x.com"));
    }

    #[test]
    fn manual_quotes_feed_a_source() {
        let cfg = JournalConfig::from_toml("[quotes]\nmanual = { AAPL = 190.5 }").unwrap();
        let source = cfg.quotes.source();
        assert_eq!(source.quote("AAPL").unwrap().price, 190.5);
        assert!(source.quote("MSFT").is_err());
    }
}
