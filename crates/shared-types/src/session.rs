// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Backend session tokens
//!
//! The backend pairs every issued nonce with a pending-challenge record and
//! hands the client an opaque identifier for it through a `Set-Cookie` header.
//! The client never interprets the token; it only echoes it back.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque session identifier issued by the backend
///
/// Serializes transparently as the raw string. `Debug` output is redacted so
/// tokens do not end up in logs by accident.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a raw token value
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Extract the token from a `Set-Cookie` header value
    ///
    /// The token is the first `;`-delimited segment of the header, for example
    /// `sid=xyz; Path=/` yields `sid=xyz`. Returns `None` when that segment is
    /// blank.
    pub fn from_set_cookie(header: &str) -> Option<Self> {
        let first = header.split(';').next()?.trim();
        if first.is_empty() {
            None
        } else {
            Some(Self(first.to_string()))
        }
    }

    /// Borrow the raw token
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the raw token
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
