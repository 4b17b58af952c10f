// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Sign-In with Ethereum handshake and session binding
//!
//! One handshake runs `nonce -> message -> sign -> verify -> bind`:
//!
//! 1. `GET /nonce` returns a nonce and a session cookie that pairs the nonce
//!    with a pending challenge on the backend.
//! 2. The nonce is embedded in an EIP-4361 message together with the domain,
//!    origin, address, chain and version.
//! 3. The wallet signs the message.
//! 4. `POST /verify` checks the signature against the pending challenge.
//! 5. On success the session is stored on the [`AuthSession`] and used for
//!    every later privileged call.
//!
//! A failed handshake never touches the stored session.

use alloy_primitives::Address;
use api_client::{ApiError, AuthStatus, Signer, VerifyRequest, is_affirmative};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::SessionToken;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::{backend::Backend, config::QuayConfig, siwe::SiweMessage};

/// Progress of the handshake on one [`AuthSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthPhase {
    /// No handshake has completed
    Unauthenticated,
    /// A nonce was issued and no signature has been requested yet
    ChallengeIssued,
    /// The message is waiting on the signer
    SignaturePending,
    /// The last completed handshake succeeded
    Verified,
}

/// One authentication attempt in progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChallenge {
    /// Server issued nonce, echoed verbatim into the message
    pub nonce: String,
    /// Token pairing the nonce with the backend's pending challenge
    pub session_token: Option<SessionToken>,
}

/// Message ready to be signed, with the session it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignIn {
    /// Canonical SIWE text
    pub message: String,
    /// Session token from the challenge, untouched
    pub session: Option<SessionToken>,
}

/// Result of a completed handshake
#[derive(Debug, Clone, PartialEq)]
pub struct VerifyOutcome {
    /// Payload returned by `POST /verify`
    pub response: Value,
    /// Session now bound to the [`AuthSession`]
    pub session: Option<SessionToken>,
}

/// Per-call message parameters
///
/// `domain` and `origin` fall back to the values from [`QuayConfig`] when not
/// set here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiweParams {
    /// Statement shown to the user
    pub statement: String,
    /// Requesting domain
    pub domain: Option<String>,
    /// Requesting origin, used as the message URI
    pub origin: Option<String>,
    /// Message version
    pub version: u32,
    /// Chain the signer is on
    pub chain_id: u64,
}

impl SiweParams {
    /// Create parameters that rely on the configured domain and origin
    pub fn new(statement: impl Into<String>, version: u32, chain_id: u64) -> Self {
        Self {
            statement: statement.into(),
            domain: None,
            origin: None,
            version,
            chain_id,
        }
    }

    /// Override the domain and origin for this call
    #[must_use]
    pub fn with_site(mut self, domain: impl Into<String>, origin: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self.origin = Some(origin.into());
        self
    }
}

#[derive(Debug)]
struct SessionState {
    phase: AuthPhase,
    session: Option<SessionToken>,
    verified: bool,
}

/// Owner of the sign-in handshake and of the resulting session
///
/// `verify` calls on one instance are serialized; a second call waits for the
/// first to finish. The stored session is written only when a handshake
/// succeeds.
#[derive(Debug)]
pub struct AuthSession {
    backend: Backend,
    domain: Option<String>,
    origin: Option<String>,
    state: RwLock<SessionState>,
    handshake: Mutex<()>,
}

impl AuthSession {
    /// Create a session bound to `backend`
    ///
    /// A session token present in `config` is bound immediately, but the
    /// instance still starts out unauthenticated until a handshake succeeds.
    pub fn new(backend: Backend, config: &QuayConfig) -> Self {
        let session = config
            .session
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .map(SessionToken::new);

        Self {
            backend,
            domain: config.domain.clone(),
            origin: config.origin.clone(),
            state: RwLock::new(SessionState {
                phase: AuthPhase::Unauthenticated,
                session,
                verified: false,
            }),
            handshake: Mutex::new(()),
        }
    }

    /// Current handshake phase
    pub async fn phase(&self) -> AuthPhase {
        self.state.read().await.phase
    }

    /// Session currently bound to this instance
    pub async fn session(&self) -> Option<SessionToken> {
        self.state.read().await.session.clone()
    }

    /// Whether a handshake on this instance has succeeded
    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.verified
    }

    /// Request a nonce and its session token from the backend
    ///
    /// Moves an unauthenticated instance to [`AuthPhase::ChallengeIssued`].
    /// A verified instance stays [`AuthPhase::Verified`]: a challenge that is
    /// never signed cannot be told apart from an abandoned one, and the
    /// verified session stays in force until a new handshake succeeds.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the request does not complete, or a
    /// response error if the backend answers with an error status or an
    /// empty nonce
    pub async fn request_challenge(&self) -> Result<AuthChallenge, ApiError> {
        let challenge = self.fetch_challenge().await?;

        let mut state = self.state.write().await;
        if !state.verified {
            state.phase = AuthPhase::ChallengeIssued;
        }

        Ok(challenge)
    }

    /// Request a challenge and build the message to sign for `address`
    ///
    /// The message is stamped with the current time as its issuance time.
    /// Phase handling follows [`request_challenge`](Self::request_challenge).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Precondition` before any request if no domain or
    /// origin is available, otherwise the errors of
    /// [`request_challenge`](Self::request_challenge)
    pub async fn sign_in(&self, address: &str, params: &SiweParams) -> Result<SignIn, ApiError> {
        let (domain, origin) = self.resolve_site(params)?;
        let challenge = self.request_challenge().await?;

        Ok(Self::compose(address, params, domain, origin, challenge))
    }

    /// Run the full handshake with `signer` and bind the resulting session
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Signer` if the signer fails or the user declines,
    /// `ApiError::Authentication` if the backend does not verify the
    /// signature, and the precondition, network and response errors of the
    /// individual steps. The stored session is left untouched on error.
    pub async fn verify<S: Signer>(
        &self,
        signer: &S,
        params: &SiweParams,
    ) -> Result<VerifyOutcome, ApiError> {
        let _handshake = self.handshake.lock().await;

        let result = self.run_handshake(signer, params).await;

        let mut state = self.state.write().await;
        match result {
            Ok(outcome) => {
                state.session.clone_from(&outcome.session);
                state.verified = true;
                state.phase = AuthPhase::Verified;
                info!(has_session = outcome.session.is_some(), "sign-in verified");
                Ok(outcome)
            }
            Err(error) => {
                state.phase = if state.verified {
                    AuthPhase::Verified
                } else {
                    AuthPhase::Unauthenticated
                };
                warn!(error = %error, "sign-in handshake failed");
                Err(error)
            }
        }
    }

    /// Ask the backend whether `session` is authenticated
    ///
    /// Tokens the backend does not know come back unverified.
    ///
    /// # Errors
    ///
    /// Returns transport errors and unexpected response errors
    pub async fn is_verified(&self, session: &SessionToken) -> Result<AuthStatus, ApiError> {
        let status = self.backend.authenticate(Some(session)).await?;
        debug!(verified = status.verified, "session probed");
        Ok(status)
    }

    async fn run_handshake<S: Signer>(
        &self,
        signer: &S,
        params: &SiweParams,
    ) -> Result<VerifyOutcome, ApiError> {
        let (domain, origin) = self.resolve_site(params)?;

        let address: Address = signer.address().await.map_err(ApiError::signer)?;
        let challenge = self.fetch_challenge().await?;
        self.set_phase(AuthPhase::ChallengeIssued).await;

        let SignIn { message, session } = Self::compose(
            &address.to_checksum(None),
            params,
            domain,
            origin,
            challenge,
        );

        self.set_phase(AuthPhase::SignaturePending).await;
        let signature = signer
            .sign_message(&message)
            .await
            .map_err(ApiError::signer)?;

        let request = VerifyRequest {
            session,
            message,
            signature,
        };
        let response = self.backend.verify(&request).await?;
        if !is_affirmative(&response) {
            return Err(ApiError::authentication(
                "backend did not verify the signature",
            ));
        }

        Ok(VerifyOutcome {
            response,
            session: request.session,
        })
    }

    async fn fetch_challenge(&self) -> Result<AuthChallenge, ApiError> {
        let response = self.backend.nonce().await?;

        Ok(AuthChallenge {
            nonce: response.nonce,
            session_token: response.session,
        })
    }

    fn compose(
        address: &str,
        params: &SiweParams,
        domain: String,
        origin: String,
        challenge: AuthChallenge,
    ) -> SignIn {
        let message = SiweMessage::new(
            address,
            params.statement.as_str(),
            domain,
            origin,
            params.version,
            params.chain_id,
            challenge.nonce,
        )
        .with_issued_at(Utc::now())
        .prepare();

        SignIn {
            message,
            session: challenge.session_token,
        }
    }

    fn resolve_site(&self, params: &SiweParams) -> Result<(String, String), ApiError> {
        let domain = params
            .domain
            .as_ref()
            .or(self.domain.as_ref())
            .ok_or_else(|| ApiError::precondition("no SIWE domain supplied or configured"))?;
        let origin = params
            .origin
            .as_ref()
            .or(self.origin.as_ref())
            .ok_or_else(|| ApiError::precondition("no SIWE origin supplied or configured"))?;

        Ok((domain.clone(), origin.clone()))
    }

    async fn set_phase(&self, phase: AuthPhase) {
        self.state.write().await.phase = phase;
    }
}
