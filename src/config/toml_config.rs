use crate::domain::ports::ConfigProvider;
use crate::utils::error::{RegistrationError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const DEFAULT_BASE_URL: &str = "https://api.sandbox.mangopay.com";
pub const DEFAULT_API_VERSION: &str = "v2.01";
pub const DEFAULT_TAG: &str = "cardreg";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub transport: TransportConfig,
}

/// Payment API endpoint and identity.
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_version")]
    pub version: String,
    pub client_id: String,
    pub client_secret: String,
    pub user_id: String,
    #[serde(default = "default_tag")]
    pub tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Origin the client runs on; unset means every request is cross-origin.
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default = "default_true")]
    pub cross_origin_supported: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_tag() -> String {
    DEFAULT_TAG.to_string()
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn default_true() -> bool {
    true
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            origin: None,
            cross_origin_supported: true,
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("version", &self.version)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("tag", &self.tag)
            .finish()
    }
}

impl ClientConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Parses TOML after replacing `${VAR}` with environment values.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RegistrationError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }
}

/// Unset variables are left as written so validation can point at them.
fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RegistrationError::ConfigError {
        message: format!("Invalid substitution pattern: {}", e),
    })?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    });

    Ok(result.to_string())
}

impl Validate for ClientConfig {
    fn validate(&self) -> Result<()> {
        self.api.validate()?;
        self.transport.validate()
    }
}

impl Validate for ApiConfig {
    fn validate(&self) -> Result<()> {
        validate_url("api.base_url", &self.base_url)?;
        validate_non_empty_string("api.version", &self.version)?;
        validate_non_empty_string("api.client_id", &self.client_id)?;
        if self.client_secret.trim().is_empty() {
            return Err(RegistrationError::InvalidConfigValueError {
                field: "api.client_secret".to_string(),
                value: String::new(),
                reason: "Value cannot be empty or whitespace-only".to_string(),
            });
        }
        validate_non_empty_string("api.user_id", &self.user_id)?;
        Ok(())
    }
}

impl Validate for TransportConfig {
    fn validate(&self) -> Result<()> {
        validate_positive_number("transport.timeout_seconds", self.timeout_seconds, 1)?;
        if let Some(origin) = &self.origin {
            validate_url("transport.origin", origin)?;
        }
        Ok(())
    }
}

impl ConfigProvider for ApiConfig {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_version(&self) -> &str {
        &self.version
    }

    fn client_id(&self) -> &str {
        &self.client_id
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn tag(&self) -> &str {
        &self.tag
    }
}
