use std::path::PathBuf;
use std::time::Duration;

use agentdash_core::catalog::MetricCatalog;
use agentdash_core::error::CatalogError;
use url::Url;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("AGENTDASH_UPSTREAM_URL must be set")]
    MissingUpstreamUrl,
    #[error("AGENTDASH_UPSTREAM_URL is not a valid URL: {0}")]
    InvalidUpstreamUrl(#[from] url::ParseError),
    #[error("failed to read catalog file {path}: {source}")]
    CatalogRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid catalog file {path}: {source}")]
    Catalog { path: PathBuf, source: CatalogError },
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub upstream_url: Url,
    pub upstream_timeout: Duration,
    pub port: u16,
    pub require_https: bool,
    pub catalog_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = lookup("AGENTDASH_UPSTREAM_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingUpstreamUrl)?;
        let upstream_url = Url::parse(raw_url.trim())?;

        let upstream_timeout = Duration::from_secs(
            lookup("AGENTDASH_UPSTREAM_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        );

        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let require_https = lookup("AGENTDASH_REQUIRE_HTTPS")
            .map(|v| v == "true")
            .unwrap_or(false);

        let catalog_path = lookup("AGENTDASH_CATALOG_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            upstream_url,
            upstream_timeout,
            port,
            require_https,
            catalog_path,
        })
    }

    /// The configured catalog file, or the built-in catalog.
    pub fn load_catalog(&self) -> Result<MetricCatalog, ConfigError> {
        let Some(path) = &self.catalog_path else {
            return Ok(MetricCatalog::builtin().clone());
        };

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::CatalogRead {
            path: path.clone(),
            source,
        })?;
        MetricCatalog::from_json_str(&raw).map_err(|source| ConfigError::Catalog {
            path: path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::{Config, ConfigError};

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn upstream_url_is_required() {
        assert!(matches!(config(&[]), Err(ConfigError::MissingUpstreamUrl)));
        assert!(matches!(
            config(&[("AGENTDASH_UPSTREAM_URL", "  ")]),
            Err(ConfigError::MissingUpstreamUrl)
        ));
        assert!(matches!(
            config(&[("AGENTDASH_UPSTREAM_URL", "not a url")]),
            Err(ConfigError::InvalidUpstreamUrl(_))
        ));
    }

    #[test]
    fn defaults_apply() {
        let config = config(&[("AGENTDASH_UPSTREAM_URL", "https://n8n.example/webhook/agents")])
            .unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.upstream_timeout, Duration::from_secs(30));
        assert!(!config.require_https);
        assert!(config.catalog_path.is_none());
        assert_eq!(config.load_catalog().unwrap().metric_count(), 16);
    }

    #[test]
    fn overrides_are_read() {
        let config = config(&[
            ("AGENTDASH_UPSTREAM_URL", "https://n8n.example/webhook/agents"),
            ("PORT", "8080"),
            ("AGENTDASH_REQUIRE_HTTPS", "true"),
            ("AGENTDASH_UPSTREAM_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.require_https);
        assert_eq!(config.upstream_timeout, Duration::from_secs(5));
    }

    #[test]
    fn missing_catalog_file_is_reported() {
        let config = config(&[
            ("AGENTDASH_UPSTREAM_URL", "https://n8n.example/webhook/agents"),
            ("AGENTDASH_CATALOG_PATH", "/definitely/not/here.json"),
        ])
        .unwrap();
        assert!(matches!(
            config.load_catalog(),
            Err(ConfigError::CatalogRead { .. })
        ));
    }
}
