// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Collaborator traits and error taxonomy for the Quay client
//!
//! The Quay client glues three parties together: a wallet that can sign, an
//! order protocol that produces signed orders, and the Quay backend. This crate
//! defines the seams to the first two and the errors every operation reports.
//!
//! # Core Abstractions
//!
//! - **`Signer` Trait**: wallet capability providing an address and message signatures
//! - **`OrderAction` Trait**: a pending order from the order protocol that can be executed into a signed order
//! - **Error Handling**: `ApiError` classified into network, auth, precondition and response failures
//! - **Wire Types**: request and response payloads of the backend endpoints

use std::fmt;

use alloy_primitives::{Address, Bytes};
use serde::Serialize;
use thiserror::Error;

pub mod types;

pub use types::*;

/// Wallet capability used during the sign-in handshake
///
/// Implementations are borrowed for the duration of one handshake. Errors are
/// opaque to the client and are reported back to the caller untouched.
pub trait Signer: Send + Sync {
    /// Address of the account that will sign
    ///
    /// # Errors
    ///
    /// Returns an error if the wallet cannot provide an account
    fn address(&self) -> impl Future<Output = anyhow::Result<Address>> + Send;

    /// Sign a human readable message (EIP-191 personal sign)
    ///
    /// # Errors
    ///
    /// Returns an error if the wallet refuses or fails to sign, for example
    /// when the user declines the request
    fn sign_message(&self, message: &str) -> impl Future<Output = anyhow::Result<Bytes>> + Send;
}

/// A pending order produced by the order protocol
///
/// Executing the action runs every approval and signing step the protocol
/// needs and yields the signed order, which the client forwards to the
/// backend without inspecting it.
pub trait OrderAction: Send {
    /// Signed order produced by the protocol
    type Order: Serialize + Send;

    /// Run all outstanding actions and return the signed order
    ///
    /// # Errors
    ///
    /// Returns an error if any protocol step fails
    fn execute_all_actions(self) -> impl Future<Output = anyhow::Result<Self::Order>> + Send;
}

/// Broad classification of an [`ApiError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The transport call did not complete
    Network,
    /// The signer declined or the backend rejected the session
    Auth,
    /// The operation was refused before any network call
    Precondition,
    /// The backend answered with something unusable
    Response,
    /// Failure reported by an external collaborator
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Auth => write!(f, "auth"),
            Self::Precondition => write!(f, "precondition"),
            Self::Response => write!(f, "response"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Errors reported by Quay client operations
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ApiError {
    /// Transport failure on an HTTP call
    #[error("Network error: {message}")]
    Network { message: String },

    /// Backend rejected the signature or the session
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Signer failed or the user declined to sign
    #[error("Signer rejected the request: {error}")]
    Signer {
        #[source]
        error: anyhow::Error,
    },

    /// Operation attempted without its prerequisites
    #[error("Precondition failed: {message}")]
    Precondition { message: String },

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Backend answered with an unexpected status
    #[error("Backend returned {status}: {message}")]
    Http { status: u16, message: String },

    /// Backend answered with a body that could not be used
    #[error("Invalid response format: {message}")]
    InvalidResponse { message: String },

    /// Error raised by an external collaborator such as the order protocol
    #[error(transparent)]
    Custom { error: anyhow::Error },
}

impl ApiError {
    /// Create a precondition error
    pub fn precondition<T: ToString>(message: T) -> Self {
        Self::Precondition {
            message: message.to_string(),
        }
    }

    /// Create an authentication error
    pub fn authentication<T: ToString>(message: T) -> Self {
        Self::Authentication {
            message: message.to_string(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response<T: ToString>(message: T) -> Self {
        Self::InvalidResponse {
            message: message.to_string(),
        }
    }

    /// Wrap an error raised by the signer
    pub fn signer(error: anyhow::Error) -> Self {
        Self::Signer { error }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } => ErrorKind::Network,
            Self::Authentication { .. } | Self::Signer { .. } => ErrorKind::Auth,
            Self::Precondition { .. } | Self::Configuration { .. } => ErrorKind::Precondition,
            Self::Http { .. } | Self::InvalidResponse { .. } => ErrorKind::Response,
            Self::Custom { .. } => ErrorKind::Other,
        }
    }

    /// Check whether this is an authentication failure
    pub fn is_auth(&self) -> bool {
        self.kind() == ErrorKind::Auth
    }
}
