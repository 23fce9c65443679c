//! Configuration for the CloudCache client

use crate::CloudCacheError;
use crate::auth::Credential;
use serde::Deserialize;
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: EndpointConfig,
    pub credentials: CredentialConfig,
}

/// Where the service lives and how to talk to it
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// URL scheme (`http` or `https`)
    pub protocol: String,

    pub host: String,

    pub port: u16,

    /// Value of the `User-Agent` header
    pub user_agent: String,

    /// Whole-request timeout in seconds (0 = transport default)
    pub timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            protocol: "http".to_string(),
            host: "cloudcache.ws".to_string(),
            port: 80,
            user_agent: crate::protocol::USER_AGENT.to_string(),
            timeout_secs: 0,
        }
    }
}

impl EndpointConfig {
    /// Service root, e.g. `http://cloudcache.ws/`
    pub fn base_url(&self) -> crate::Result<Url> {
        let raw = format!("{}://{}:{}/", self.protocol, self.host, self.port);
        let url = Url::parse(&raw)
            .map_err(|e| CloudCacheError::Config(format!("Invalid endpoint {raw:?}: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(CloudCacheError::Config(format!(
                "Endpoint {raw:?} cannot carry a path"
            )));
        }
        Ok(url)
    }
}

/// Access key pair
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct CredentialConfig {
    pub access_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl CredentialConfig {
    pub fn to_credential(&self) -> Credential {
        Credential::new(self.access_key.clone(), self.secret_key.clone())
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CloudCacheError::Config(format!("Failed to read config file: {e}"))
        })?;

        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> crate::Result<Self> {
        toml::from_str(contents)
            .map_err(|e| CloudCacheError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load configuration from environment variables or use defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(protocol) = std::env::var("CLOUDCACHE_PROTOCOL") {
            config.endpoint.protocol = protocol;
        }

        if let Ok(host) = std::env::var("CLOUDCACHE_HOST") {
            config.endpoint.host = host;
        }

        if let Ok(port) = std::env::var("CLOUDCACHE_PORT")
            && let Ok(n) = port.parse()
        {
            config.endpoint.port = n;
        }

        if let Ok(agent) = std::env::var("CLOUDCACHE_USER_AGENT") {
            config.endpoint.user_agent = agent;
        }

        if let Ok(key) = std::env::var("CLOUDCACHE_ACCESS_KEY") {
            config.credentials.access_key = key;
        }

        if let Ok(secret) = std::env::var("CLOUDCACHE_SECRET_KEY") {
            config.credentials.secret_key = secret;
        }

        config
    }

    /// Fail early when no credential has been configured
    pub fn validate(&self) -> crate::Result<()> {
        if self.credentials.access_key.is_empty() || self.credentials.secret_key.is_empty() {
            return Err(CloudCacheError::Config(
                "access_key and secret_key are required".to_string(),
            ));
        }
        self.endpoint.base_url().map(|_| ())
    }
}
