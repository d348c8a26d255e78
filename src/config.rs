use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::header::HeaderValue;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Entity type name used by the current storefront schema.
pub const PRIMARY_TYPE_NAME: &str = "vehicle_fitment";
/// Entity type name from before the schema rename.
pub const FALLBACK_TYPE_NAME: &str = "vehicle";

const MAX_PAGE_SIZE: u32 = 250;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("storefront access token is not configured")]
    MissingCredential,
    #[error("storefront access token is not a valid header value")]
    InvalidCredential,
    #[error("store domain is not configured")]
    MissingStoreDomain,
    #[error("store domain {0:?} is not a valid URL host")]
    InvalidStoreDomain(String),
    #[error("no vehicle type names configured")]
    MissingTypeNames,
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub store_domain: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Catalog segment the handoff navigates to
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Candidate entity type names, tried in order
    #[serde(default = "default_type_names")]
    pub type_names: Vec<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default = "default_filter_param")]
    pub filter_param: String,
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_domain: None,
            access_token: None,
            api_version: default_api_version(),
            collection: default_collection(),
            type_names: default_type_names(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            filter_param: default_filter_param(),
            storage_path: default_storage_path(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_api_version() -> String {
    "2024-10".to_string()
}

fn default_collection() -> String {
    "all".to_string()
}

fn default_type_names() -> Vec<String> {
    vec![PRIMARY_TYPE_NAME.to_string(), FALLBACK_TYPE_NAME.to_string()]
}

fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

fn default_max_pages() -> u32 {
    200
}

fn default_filter_param() -> String {
    "filter.p.m.custom.vehicle".to_string()
}

fn default_storage_path() -> PathBuf {
    PathBuf::from(".fitment/storage.json")
}

fn default_cache_ttl_secs() -> u64 {
    180
}

impl Config {
    /// Read the JSON config at `path` (if any) and apply `FITMENT_*` env overrides.
    ///
    /// A missing file falls back to defaults so env-only setups work; a file
    /// that exists but does not parse is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::read(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        debug!("config {:?}", config.redacted());
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("config {} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("FITMENT_STORE_DOMAIN") {
            self.store_domain = Some(v);
        }
        if let Some(v) = var("FITMENT_ACCESS_TOKEN") {
            self.access_token = Some(v);
        }
        if let Some(v) = var("FITMENT_API_VERSION") {
            self.api_version = v;
        }
        if let Some(v) = var("FITMENT_COLLECTION") {
            self.collection = v;
        }
        if let Some(v) = var("FITMENT_STORAGE_PATH") {
            self.storage_path = PathBuf::from(v);
        }
    }

    /// Check everything a catalog load needs before any request is made.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store_url()?;
        self.access_token()?;
        if self.type_names.is_empty() {
            return Err(ConfigError::MissingTypeNames);
        }
        Ok(())
    }

    pub fn access_token(&self) -> Result<&str, ConfigError> {
        let token = self
            .access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingCredential)?;
        if HeaderValue::from_str(token).is_err() {
            return Err(ConfigError::InvalidCredential);
        }
        Ok(token)
    }

    pub fn store_domain(&self) -> Result<&str, ConfigError> {
        self.store_domain
            .as_deref()
            .map(|d| d.trim().trim_end_matches('/'))
            .filter(|d| !d.is_empty())
            .ok_or(ConfigError::MissingStoreDomain)
    }

    /// Base URL of the storefront; a bare host is assumed to be https.
    pub fn store_url(&self) -> Result<Url, ConfigError> {
        let domain = self.store_domain()?;
        let base = if domain.contains("://") {
            domain.to_string()
        } else {
            format!("https://{domain}")
        };
        match Url::parse(&base) {
            Ok(url) if url.has_host() => Ok(url),
            _ => Err(ConfigError::InvalidStoreDomain(domain.to_string())),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages.max(1)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.access_token.is_some() {
            config.access_token = Some("***".to_string());
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults_from_partial_json() {
        let config: Config =
            serde_json::from_str(r#"{"storeDomain": "parts.example.com", "accessToken": "tok"}"#)
                .unwrap();
        assert_eq!(config.api_version, "2024-10");
        assert_eq!(config.collection, "all");
        assert_eq!(config.type_names, vec!["vehicle_fitment", "vehicle"]);
        assert_eq!(config.page_size(), 250);
        assert_eq!(config.max_pages(), 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        let test_cases = vec![
            ("missing token", Some("parts.example.com"), None, "access token is not configured"),
            ("blank token", Some("parts.example.com"), Some("  "), "access token is not configured"),
            ("newline in token", Some("parts.example.com"), Some("a\nb"), "not a valid header value"),
            ("missing domain", None, Some("tok"), "store domain is not configured"),
        ];

        for (name, domain, token, expected) in test_cases {
            let config = Config {
                store_domain: domain.map(String::from),
                access_token: token.map(String::from),
                ..Default::default()
            };
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains(expected), "{}: {}", name, err);
        }
    }

    #[test]
    fn test_store_url() {
        let test_cases = vec![
            ("parts.example.com", Some("https://parts.example.com/")),
            ("parts.example.com/", Some("https://parts.example.com/")),
            ("http://localhost:8080", Some("http://localhost:8080/")),
            ("https://", None),
        ];

        for (domain, expected) in test_cases {
            let config = Config {
                store_domain: Some(domain.to_string()),
                ..Default::default()
            };
            let url = config.store_url().ok().map(|u| u.to_string());
            assert_eq!(url.as_deref(), expected, "{}", domain);
        }
    }

    #[test]
    fn test_page_size_is_clamped() {
        let config = Config {
            page_size: 1000,
            max_pages: 0,
            ..Default::default()
        };
        assert_eq!(config.page_size(), 250);
        assert_eq!(config.max_pages(), 1);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"storeDomain": "old.example.com", "accessToken": "file-token", "collection": "wheels"}}"#
        )
        .unwrap();

        let mut config = Config::read(file.path()).unwrap();
        let env = HashMap::from([
            ("FITMENT_STORE_DOMAIN", "new.example.com"),
            ("FITMENT_ACCESS_TOKEN", "env-token"),
        ]);
        config.apply_env(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.store_domain().unwrap(), "new.example.com");
        assert_eq!(config.access_token().unwrap(), "env-token");
        assert_eq!(config.collection, "wheels");
    }

    #[test]
    fn test_missing_file_is_default_but_malformed_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::read(&dir.path().join("absent.json")).unwrap();
        assert!(config.access_token.is_none());

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Config::read(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
