//! Connection and behaviour settings for a `MovieClient`.
//!
//! Nothing here opens a connection. A `ClientConfig` is built by the caller
//! (directly, from the environment, or from command-line flags) and handed to
//! `DynamoStore::connect`.

use crate::error::{ClientError, Result};

pub const DEFAULT_TABLE_NAME: &str = "Movies";
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000";
pub const DEFAULT_REGION: &str = "us-east-1";

pub const ENV_TABLE: &str = "MOVIETABLE_TABLE";
pub const ENV_ENDPOINT: &str = "MOVIETABLE_ENDPOINT";
pub const ENV_REGION: &str = "AWS_REGION";
pub const ENV_PAGE_SIZE: &str = "MOVIETABLE_PAGE_SIZE";
pub const ENV_STRICT_UPDATES: &str = "MOVIETABLE_STRICT_UPDATES";

/// Settings shared by every operation against the Movies table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub table_name: String,
    /// `None` uses the regional AWS endpoint.
    pub endpoint_url: Option<String>,
    pub region: String,
    /// Maximum items evaluated per scan request. `None` lets the service decide.
    pub page_size: Option<usize>,
    /// Fail updates against absent keys instead of creating them.
    pub strict_updates: bool,
    /// Sign requests with fixed dummy credentials (DynamoDB Local accepts any).
    pub local_credentials: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            endpoint_url: Some(DEFAULT_ENDPOINT.to_string()),
            region: DEFAULT_REGION.to_string(),
            page_size: None,
            strict_updates: false,
            local_credentials: true,
        }
    }
}

impl ClientConfig {
    /// Build a config from process environment variables, falling back to
    /// the defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(table) = lookup(ENV_TABLE) {
            config.table_name = table;
        }
        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            config = config.with_endpoint(endpoint);
        }
        if let Some(region) = lookup(ENV_REGION) {
            config.region = region;
        }
        if let Some(size) = lookup(ENV_PAGE_SIZE) {
            let size = size.parse::<usize>().map_err(|e| {
                ClientError::Config(format!("{ENV_PAGE_SIZE}='{size}' is not a page size: {e}"))
            })?;
            config.page_size = Some(size);
        }
        if let Some(flag) = lookup(ENV_STRICT_UPDATES) {
            config.strict_updates = parse_flag(ENV_STRICT_UPDATES, &flag)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = name.into();
        self
    }

    /// Point at `endpoint` with local credentials. An empty value selects the
    /// regional AWS service and its default credential chain.
    pub fn with_endpoint(self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        let local = !endpoint.is_empty();
        self.with_endpoint_url(local.then_some(endpoint))
            .with_local_credentials(local)
    }

    pub fn with_endpoint_url(mut self, endpoint: Option<String>) -> Self {
        self.endpoint_url = endpoint;
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_page_size(mut self, page_size: Option<usize>) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_strict_updates(mut self, strict: bool) -> Self {
        self.strict_updates = strict;
        self
    }

    pub fn with_local_credentials(mut self, local: bool) -> Self {
        self.local_credentials = local;
        self
    }

    /// Check the settings against DynamoDB's naming rules and basic sanity.
    pub fn validate(&self) -> Result<()> {
        let name = &self.table_name;
        if name.len() < 3 || name.len() > 255 {
            return Err(ClientError::Config(format!(
                "table name '{name}' must be between 3 and 255 characters"
            )));
        }
        if let Some(bad) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
        {
            return Err(ClientError::Config(format!(
                "table name '{name}' contains invalid character '{bad}'"
            )));
        }
        if let Some(endpoint) = &self.endpoint_url
            && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ClientError::Config(format!(
                "endpoint '{endpoint}' must start with http:// or https://"
            )));
        }
        if self.region.is_empty() {
            return Err(ClientError::Config("region must not be empty".to_string()));
        }
        if self.page_size == Some(0) {
            return Err(ClientError::Config("page size must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ClientError::Config(format!(
            "{name}='{value}' is not a boolean"
        ))),
    }
}
