// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Sign-In with Ethereum (EIP-4361) message construction
//!
//! The message is plain text and every field is embedded verbatim, so a
//! signature over it commits the wallet to the domain, origin, chain and the
//! server issued nonce. Construction is a pure function of the fields.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

const HEADER_SUFFIX: &str = " wants you to sign in with your Ethereum account:";

/// Fields of a SIWE message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiweMessage {
    /// Domain requesting the sign-in
    pub domain: String,
    /// Account performing the sign-in
    pub address: String,
    /// Human readable statement, omitted when empty
    pub statement: Option<String>,
    /// Origin of the request, the URI claim of the message
    pub uri: String,
    /// Message version
    pub version: u32,
    /// EIP-155 chain identifier
    pub chain_id: u64,
    /// Server issued nonce
    pub nonce: String,
    /// Time the message was issued
    pub issued_at: Option<DateTime<Utc>>,
    /// Time after which the signed message is no longer valid
    pub expiration_time: Option<DateTime<Utc>>,
    /// Time before which the signed message is not yet valid
    pub not_before: Option<DateTime<Utc>>,
    /// System specific request identifier
    pub request_id: Option<String>,
    /// Resources the user wishes to have resolved as part of the sign-in
    pub resources: Vec<String>,
}

impl SiweMessage {
    /// Create a message from the fields every sign-in carries
    ///
    /// Optional EIP-4361 fields start empty and can be set with the `with_*`
    /// helpers.
    pub fn new(
        address: impl Into<String>,
        statement: impl Into<String>,
        domain: impl Into<String>,
        uri: impl Into<String>,
        version: u32,
        chain_id: u64,
        nonce: impl Into<String>,
    ) -> Self {
        let statement = statement.into();
        Self {
            domain: domain.into(),
            address: address.into(),
            statement: (!statement.is_empty()).then_some(statement),
            uri: uri.into(),
            version,
            chain_id,
            nonce: nonce.into(),
            issued_at: None,
            expiration_time: None,
            not_before: None,
            request_id: None,
            resources: Vec::new(),
        }
    }

    /// Set the issuance time
    #[must_use]
    pub fn with_issued_at(mut self, issued_at: DateTime<Utc>) -> Self {
        self.issued_at = Some(issued_at);
        self
    }

    /// Set the expiration time
    #[must_use]
    pub fn with_expiration_time(mut self, expiration_time: DateTime<Utc>) -> Self {
        self.expiration_time = Some(expiration_time);
        self
    }

    /// Set the not-before time
    #[must_use]
    pub fn with_not_before(mut self, not_before: DateTime<Utc>) -> Self {
        self.not_before = Some(not_before);
        self
    }

    /// Set the request identifier
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Append a resource URI
    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resources.push(resource.into());
        self
    }

    /// Serialize the message in its canonical text form
    pub fn prepare(&self) -> String {
        self.to_string()
    }
}

fn timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl fmt::Display for SiweMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}{HEADER_SUFFIX}", self.domain)?;
        writeln!(f, "{}", self.address)?;
        writeln!(f)?;
        match self.statement.as_deref() {
            Some(statement) if !statement.is_empty() => {
                writeln!(f, "{statement}")?;
                writeln!(f)?;
            }
            _ => writeln!(f)?,
        }

        writeln!(f, "URI: {}", self.uri)?;
        writeln!(f, "Version: {}", self.version)?;
        writeln!(f, "Chain ID: {}", self.chain_id)?;
        write!(f, "Nonce: {}", self.nonce)?;

        if let Some(issued_at) = &self.issued_at {
            write!(f, "\nIssued At: {}", timestamp(issued_at))?;
        }
        if let Some(expiration_time) = &self.expiration_time {
            write!(f, "\nExpiration Time: {}", timestamp(expiration_time))?;
        }
        if let Some(not_before) = &self.not_before {
            write!(f, "\nNot Before: {}", timestamp(not_before))?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, "\nRequest ID: {request_id}")?;
        }
        if !self.resources.is_empty() {
            write!(f, "\nResources:")?;
            for resource in &self.resources {
                write!(f, "\n- {resource}")?;
            }
        }

        Ok(())
    }
}

/// Build the canonical SIWE text for the given fields
///
/// Deterministic: identical inputs always produce byte-identical output.
pub fn build_message(
    address: &str,
    statement: &str,
    domain: &str,
    origin: &str,
    version: u32,
    chain_id: u64,
    nonce: &str,
) -> String {
    SiweMessage::new(address, statement, domain, origin, version, chain_id, nonce).prepare()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const ADDRESS: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    fn position(haystack: &str, needle: &str) -> usize {
        haystack.find(needle).unwrap()
    }

    #[test]
    fn canonical_layout_with_statement() {
        let message = build_message(
            ADDRESS,
            "Sign in to Quay",
            "app.quay.xyz",
            "https://app.quay.xyz",
            1,
            137,
            "32891756",
        );

        let expected = format!(
            "app.quay.xyz wants you to sign in with your Ethereum account:\n\
             {ADDRESS}\n\
             \n\
             Sign in to Quay\n\
             \n\
             URI: https://app.quay.xyz\n\
             Version: 1\n\
             Chain ID: 137\n\
             Nonce: 32891756"
        );
        assert_eq!(message, expected);
    }

    #[test]
    fn empty_statement_collapses() {
        let message = build_message(ADDRESS, "", "app.quay.xyz", "https://app.quay.xyz", 1, 1, "n0nce");

        let expected = format!(
            "app.quay.xyz wants you to sign in with your Ethereum account:\n\
             {ADDRESS}\n\
             \n\
             \n\
             URI: https://app.quay.xyz\n\
             Version: 1\n\
             Chain ID: 1\n\
             Nonce: n0nce"
        );
        assert_eq!(message, expected);
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let first = build_message("0xABC", "Sign in", "example.com", "https://example.com", 1, 1, "abc123");
        let second = build_message("0xABC", "Sign in", "example.com", "https://example.com", 1, 1, "abc123");
        assert_eq!(first, second);
    }

    #[test]
    fn contains_nonce_and_address() {
        for (address, nonce) in [("0xABC", "abc123"), (ADDRESS, "Zy8kPq1Lm0"), ("0x0", "n")] {
            let message = build_message(address, "hi", "example.com", "https://example.com", 2, 10, nonce);
            assert!(message.contains(address));
            assert!(message.contains(nonce));
        }
    }

    #[test]
    fn field_order() {
        let message = build_message("0xABC", "Sign in", "example.com", "https://example.com", 3, 42161, "abc123");

        let order = [
            position(&message, "example.com wants"),
            position(&message, "0xABC"),
            position(&message, "Sign in\n"),
            position(&message, "URI: https://example.com"),
            position(&message, "Version: 3"),
            position(&message, "Chain ID: 42161"),
            position(&message, "Nonce: abc123"),
        ];
        assert!(order.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn optional_fields_follow_nonce() {
        let issued = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let expires = Utc.with_ymd_and_hms(2024, 5, 1, 12, 10, 0).unwrap();

        let message = SiweMessage::new(ADDRESS, "Sign in", "app.quay.xyz", "https://app.quay.xyz", 1, 1, "abc123")
            .with_issued_at(issued)
            .with_expiration_time(expires)
            .with_request_id("req-7")
            .with_resource("https://app.quay.xyz/terms")
            .with_resource("ipfs://bafybeiemxf5abjwjbikoz4mc3a3dla6ual3jsgpdr4cjr3oz3evfyavhwq")
            .prepare();

        assert!(message.ends_with(
            "Nonce: abc123\n\
             Issued At: 2024-05-01T12:00:00.000Z\n\
             Expiration Time: 2024-05-01T12:10:00.000Z\n\
             Request ID: req-7\n\
             Resources:\n\
             - https://app.quay.xyz/terms\n\
             - ipfs://bafybeiemxf5abjwjbikoz4mc3a3dla6ual3jsgpdr4cjr3oz3evfyavhwq"
        ));
        assert!(!message.contains("Not Before"));
    }
}
