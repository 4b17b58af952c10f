// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP access to the Quay backend
//!
//! Stateless request/response helpers. No timeouts or retries are applied
//! here; callers wrap calls in their own deadlines and own their retry policy.

use api_client::{ApiError, AuthStatus, AuthenticateRequest, VerifyRequest};
use reqwest::{Client, Response, StatusCode, header::SET_COOKIE};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use shared_types::SessionToken;
use tracing::{debug, warn};
use url::Url;

use crate::config::QuayConfig;

/// Raw answer of `GET /nonce`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonceResponse {
    /// Response body, the nonce itself
    pub nonce: String,
    /// Token taken from the `Set-Cookie` header, if the backend set one
    pub session: Option<SessionToken>,
}

/// Handle to the Quay backend
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Backend {
    client: Client,
    base_url: String,
}

fn network_error(error: &reqwest::Error) -> ApiError {
    ApiError::Network {
        message: error.to_string(),
    }
}

impl Backend {
    /// Create a backend handle from configuration
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Precondition` if the backend URL is missing or
    /// invalid, and `ApiError::Configuration` if the HTTP client cannot be built
    pub fn new(config: &QuayConfig) -> Result<Self, ApiError> {
        let base_url = config.backend_base()?;

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ApiError::Configuration {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { client, base_url })
    }

    /// Base URL every endpoint is appended to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of an endpoint path such as `nonce` or `listings`
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Precondition` if the resulting URL does not parse
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Url::parse(&raw).map_err(|e| ApiError::precondition(format!("invalid endpoint {raw}: {e}")))
    }

    /// Fetch a fresh nonce and the session cookie paired with it
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the request does not complete,
    /// `ApiError::Http` on a non-success status and
    /// `ApiError::InvalidResponse` if the body is empty
    pub async fn nonce(&self) -> Result<NonceResponse, ApiError> {
        let url = self.endpoint("nonce")?;
        debug!(%url, "requesting nonce");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network_error(&e))?;
        let response = Self::check_status(response).await?;

        let session = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(SessionToken::from_set_cookie);

        let nonce = response.text().await.map_err(|e| network_error(&e))?;
        if nonce.is_empty() {
            return Err(ApiError::invalid_response("backend returned an empty nonce"));
        }

        debug!(has_session = session.is_some(), "nonce issued");
        Ok(NonceResponse { nonce, session })
    }

    /// Submit a signed SIWE message for verification
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Authentication` if the backend refuses the signature
    /// with 401/403, otherwise the usual transport and response errors
    pub async fn verify(&self, request: &VerifyRequest) -> Result<Value, ApiError> {
        self.post_json("verify", request).await
    }

    /// Ask the backend whether a session is authenticated
    ///
    /// A 401 or 403 answer is reported as an unverified status rather than
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns transport and unexpected response errors
    pub async fn authenticate(&self, session: Option<&SessionToken>) -> Result<AuthStatus, ApiError> {
        let request = AuthenticateRequest {
            session: session.cloned(),
        };

        match self.post_json::<_, Value>("authenticate", &request).await {
            Ok(payload) => Ok(AuthStatus::from_payload(payload)),
            Err(ApiError::Authentication { message }) => {
                debug!(reason = %message, "backend refused session");
                Ok(AuthStatus::rejected())
            }
            Err(error) => Err(error),
        }
    }

    /// `GET` a URL and decode the JSON body
    ///
    /// # Errors
    ///
    /// Returns transport, status and decoding errors
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| network_error(&e))?;

        Self::decode(Self::check_status(response).await?).await
    }

    /// `POST` a JSON body to an endpoint path and decode the JSON answer
    ///
    /// # Errors
    ///
    /// Returns transport, status and decoding errors
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| network_error(&e))?;

        Self::decode(Self::check_status(response).await?).await
    }

    async fn check_status(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!(status = status.as_u16(), "backend rejected authentication");
                Err(ApiError::Authentication { message })
            }
            status => {
                warn!("Quay backend error: {} - {}", status.as_u16(), message);
                Err(ApiError::Http {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let bytes = response.bytes().await.map_err(|e| network_error(&e))?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::invalid_response(e.to_string()))
    }
}
