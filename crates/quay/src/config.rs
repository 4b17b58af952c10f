// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Client configuration
//!
//! Holds the backend location and the values that used to be read from the
//! browser environment (request domain and origin). Resolving those from the
//! ambient environment is the caller's job; the client only sees explicit
//! values.

use api_client::ApiError;
use config::{Config, ConfigError, Environment as ConfigEnv, File};
use serde::{Deserialize, Serialize};
use url::Url;

const DEFAULT_USER_AGENT: &str = concat!("quay-client/", env!("CARGO_PKG_VERSION"));

/// Configuration for [`crate::QuayClient`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuayConfig {
    /// Base URL of the Quay backend, without a trailing endpoint
    pub backend_url: String,
    /// Previously obtained session token to bind at construction
    pub session: Option<String>,
    /// Default SIWE domain when a call does not supply one
    pub domain: Option<String>,
    /// Default SIWE URI (request origin) when a call does not supply one
    pub origin: Option<String>,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for QuayConfig {
    fn default() -> Self {
        Self {
            backend_url: String::new(),
            session: None,
            domain: None,
            origin: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl QuayConfig {
    /// Create a configuration pointing at `backend_url`
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            ..Self::default()
        }
    }

    /// Bind a previously obtained session token
    #[must_use]
    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }

    /// Set the default SIWE domain and origin
    #[must_use]
    pub fn with_site(mut self, domain: impl Into<String>, origin: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self.origin = Some(origin.into());
        self
    }

    /// Create configuration from environment variables and optional configuration files
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Configuration` if configuration cannot be loaded.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::load().map_err(|e| ApiError::Configuration {
            message: format!("failed to load configuration: {e}"),
        })
    }

    /// Load configuration using the config crate with hierarchical sources
    ///
    /// Later sources override earlier ones:
    /// 1. Default values
    /// 2. Configuration file (quay.json)
    /// 3. Environment-specific file (quay.{env}.json, env from `QUAY_ENVIRONMENT`)
    /// 4. Environment variables with the `QUAY_` prefix, e.g. `QUAY_BACKEND_URL`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("QUAY_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            .set_default("backend_url", "")?
            .set_default("user_agent", DEFAULT_USER_AGENT)?
            .add_source(File::with_name("quay.json").required(false))
            .add_source(File::with_name(&format!("quay.{}.json", env.to_lowercase())).required(false))
            .add_source(
                ConfigEnv::with_prefix("QUAY")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Validate the backend URL and return it normalized
    ///
    /// The returned URL has no trailing slash so endpoint paths can be
    /// appended directly.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Precondition` if the backend URL is missing, is not
    /// an absolute http(s) URL, or carries a query or fragment that endpoint
    /// paths could not be appended to.
    pub fn backend_base(&self) -> Result<String, ApiError> {
        let raw = self.backend_url.trim();
        if raw.is_empty() {
            return Err(ApiError::precondition("backend URL is not configured"));
        }

        let url = Url::parse(raw)
            .map_err(|e| ApiError::precondition(format!("invalid backend URL {raw}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ApiError::precondition(format!(
                "backend URL must use http or https, got {}",
                url.scheme()
            )));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(ApiError::precondition(format!(
                "backend URL must not carry a query or fragment: {raw}"
            )));
        }

        Ok(raw.trim_end_matches('/').to_string())
    }
}
