//! Transport configuration.
//!
//! Both configurations load from environment variables or explicit
//! construction. Custom `Debug` implementations redact the API token.

use url::Url;
use zeroize::Zeroizing;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`HttpTransport`](crate::HttpTransport).
#[derive(Clone)]
pub struct HttpTransportConfig {
    /// Base URL every route path is appended to.
    pub base_url: Url,
    /// Optional bearer token sent as `Authorization`.
    pub api_token: Option<Zeroizing<String>>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for HttpTransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransportConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl HttpTransportConfig {
    /// Configuration for `base_url` with no token and the default timeout.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_url("base_url", base_url)?,
            api_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `LINECALL_BASE_URL` (required)
    /// - `LINECALL_API_TOKEN` (optional)
    /// - `LINECALL_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(None)
    }

    /// Like [`from_env`](Self::from_env), but an explicit `base_url` takes
    /// precedence over `LINECALL_BASE_URL`.
    pub fn from_env_with(base_url: Option<&str>) -> Result<Self, ConfigError> {
        let base_url = match base_url {
            Some(raw) => parse_url("base_url", raw)?,
            None => {
                let raw = std::env::var("LINECALL_BASE_URL")
                    .map_err(|_| ConfigError::Missing("LINECALL_BASE_URL"))?;
                parse_url("LINECALL_BASE_URL", &raw)?
            }
        };
        Ok(Self {
            base_url,
            api_token: env_token(),
            timeout_secs: env_timeout(),
        })
    }

    /// A configuration pointing at a local mock server (for testing).
    pub fn local_mock(uri: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            timeout_secs: 5,
            ..Self::new(uri)?
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(Zeroizing::new(token.into()));
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Configuration for [`MeshTransport`](crate::MeshTransport) with a
/// [`StaticResolver`](crate::StaticResolver).
#[derive(Clone)]
pub struct MeshTransportConfig {
    /// Logical name of the target service.
    pub service: String,
    /// Instance base URLs; may be empty, in which case every call fails
    /// with `Unavailable`.
    pub instances: Vec<Url>,
    pub api_token: Option<Zeroizing<String>>,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for MeshTransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshTransportConfig")
            .field("service", &self.service)
            .field(
                "instances",
                &self.instances.iter().map(Url::as_str).collect::<Vec<_>>(),
            )
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl MeshTransportConfig {
    pub fn new(service: impl Into<String>, instances: &[&str]) -> Result<Self, ConfigError> {
        let service = service.into();
        if service.trim().is_empty() {
            return Err(ConfigError::Missing("service"));
        }
        Ok(Self {
            service,
            instances: parse_instances("instances", instances.iter().copied())?,
            api_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `LINECALL_MESH_SERVICE` (required)
    /// - `LINECALL_MESH_INSTANCES` (comma separated URLs, default: none)
    /// - `LINECALL_API_TOKEN` (optional)
    /// - `LINECALL_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(None, &[])
    }

    /// Like [`from_env`](Self::from_env), but an explicit `service` and a
    /// non-empty `instances` list take precedence over their variables.
    pub fn from_env_with(service: Option<&str>, instances: &[&str]) -> Result<Self, ConfigError> {
        let service = service
            .map(str::to_string)
            .or_else(|| std::env::var("LINECALL_MESH_SERVICE").ok())
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("LINECALL_MESH_SERVICE"))?;
        let instances = if instances.is_empty() {
            let raw = std::env::var("LINECALL_MESH_INSTANCES").unwrap_or_default();
            parse_instances("LINECALL_MESH_INSTANCES", raw.split(','))?
        } else {
            parse_instances("instances", instances.iter().copied())?
        };
        Ok(Self {
            service,
            instances,
            api_token: env_token(),
            timeout_secs: env_timeout(),
        })
    }

    /// A configuration pointing at local mock servers (for testing).
    pub fn local_mock(service: &str, uris: &[&str]) -> Result<Self, ConfigError> {
        Ok(Self {
            timeout_secs: 5,
            ..Self::new(service, uris)?
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(Zeroizing::new(token.into()));
        self
    }
}

fn parse_url(source: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl(source.to_string(), e.to_string()))
}

fn parse_instances<'a>(
    source: &str,
    raw: impl Iterator<Item = &'a str>,
) -> Result<Vec<Url>, ConfigError> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_url(source, s))
        .collect()
}

fn env_token() -> Option<Zeroizing<String>> {
    std::env::var("LINECALL_API_TOKEN")
        .ok()
        .filter(|t| !t.is_empty())
        .map(Zeroizing::new)
}

fn env_timeout() -> u64 {
    std::env::var("LINECALL_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TIMEOUT_SECS)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("cannot build HTTP client: {0}")]
    Client(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_mock_builds_valid_config() {
        let cfg = HttpTransportConfig::local_mock("http://127.0.0.1:9000").unwrap();
        assert_eq!(cfg.base_url.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(cfg.timeout_secs, 5);
        assert!(cfg.api_token.is_none());
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = HttpTransportConfig::new("https://api.example.com")
            .unwrap()
            .with_token("super-secret");
        let dbg = format!("{cfg:?}");
        assert!(dbg.contains("[REDACTED]"));
        assert!(!dbg.contains("super-secret"));

        let mesh = MeshTransportConfig::new("orders", &["http://10.0.0.1:8080"])
            .unwrap()
            .with_token("mesh-secret");
        assert!(!format!("{mesh:?}").contains("mesh-secret"));
    }

    #[test]
    fn mesh_instances_skip_blanks_and_reject_bad_urls() {
        let cfg = MeshTransportConfig::new("orders", &["http://a:1", " ", "http://b:2"]).unwrap();
        assert_eq!(cfg.instances.len(), 2);
        assert!(matches!(
            MeshTransportConfig::new("orders", &["not a url"]),
            Err(ConfigError::InvalidUrl(..))
        ));
        assert!(matches!(
            MeshTransportConfig::new(" ", &[]),
            Err(ConfigError::Missing("service"))
        ));
    }

    #[test]
    fn env_loading_reads_all_variables() {
        std::env::set_var("LINECALL_BASE_URL", "https://api.example.com/v1");
        std::env::set_var("LINECALL_API_TOKEN", "tok");
        std::env::set_var("LINECALL_TIMEOUT_SECS", "12");
        std::env::set_var("LINECALL_MESH_SERVICE", "orders");
        std::env::set_var("LINECALL_MESH_INSTANCES", "http://a:1,http://b:2");

        let http = HttpTransportConfig::from_env();
        let mesh = MeshTransportConfig::from_env();

        for var in [
            "LINECALL_BASE_URL",
            "LINECALL_API_TOKEN",
            "LINECALL_TIMEOUT_SECS",
            "LINECALL_MESH_SERVICE",
            "LINECALL_MESH_INSTANCES",
        ] {
            std::env::remove_var(var);
        }

        let http = http.unwrap();
        assert_eq!(http.base_url.as_str(), "https://api.example.com/v1");
        assert_eq!(http.api_token.as_deref().map(String::as_str), Some("tok"));
        assert_eq!(http.timeout_secs, 12);

        let mesh = mesh.unwrap();
        assert_eq!(mesh.service, "orders");
        assert_eq!(mesh.instances.len(), 2);
        assert_eq!(mesh.timeout_secs, 12);
    }

    #[test]
    fn explicit_values_take_precedence_over_missing_variables() {
        let http = HttpTransportConfig::from_env_with(Some("http://127.0.0.1:9000")).unwrap();
        assert_eq!(http.base_url.as_str(), "http://127.0.0.1:9000/");

        let mesh = MeshTransportConfig::from_env_with(Some("orders"), &["http://a:1"]).unwrap();
        assert_eq!(mesh.service, "orders");
        assert_eq!(mesh.instances.len(), 1);
        assert!(matches!(
            MeshTransportConfig::from_env_with(Some(" "), &[]),
            Err(ConfigError::Missing("LINECALL_MESH_SERVICE"))
        ));
    }
}
