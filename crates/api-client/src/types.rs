// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Request and response payloads of the Quay backend

use alloy_primitives::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::SessionToken;

/// Body of `POST /verify`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRequest {
    /// Session token paired with the nonce embedded in `message`
    pub session: Option<SessionToken>,
    /// The signed SIWE message
    pub message: String,
    /// Signature over `message`, hex encoded with a `0x` prefix
    pub signature: Bytes,
}

/// Body of `POST /authenticate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticateRequest {
    /// Session token to probe
    pub session: Option<SessionToken>,
}

/// Body of `POST /listings` and `POST /offers`
///
/// The signed order travels as a JSON encoded string inside the JSON body,
/// for both listings and offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSubmission {
    /// Session the order is submitted under
    pub session: Option<SessionToken>,
    /// Signed order, serialized to JSON text
    pub listing: String,
}

/// Outcome of a session probe against `POST /authenticate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Whether the backend considers the session authenticated
    pub verified: bool,
    /// Raw payload returned by the backend
    pub payload: Value,
}

impl AuthStatus {
    /// Interpret a backend payload
    pub fn from_payload(payload: Value) -> Self {
        Self {
            verified: is_affirmative(&payload),
            payload,
        }
    }

    /// Status reported for a session the backend refused outright
    pub fn rejected() -> Self {
        Self {
            verified: false,
            payload: Value::Bool(false),
        }
    }
}

/// Decide whether a backend payload means "yes"
///
/// Objects carrying a boolean `verified` or `authenticated` field are decided
/// by that field. Every other payload follows JSON truthiness: `null`,
/// `false`, `0` and `""` are negative, everything else is positive.
pub fn is_affirmative(payload: &Value) -> bool {
    match payload {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) => true,
        Value::Object(fields) => ["verified", "authenticated"]
            .iter()
            .find_map(|key| fields.get(*key).and_then(Value::as_bool))
            .unwrap_or(true),
    }
}
