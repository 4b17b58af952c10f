// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Client for the Quay NFT order backend
//!
//! This crate authenticates a wallet against the backend with Sign-In with
//! Ethereum, keeps the resulting session, forwards signed orders produced by
//! the order protocol, and queries stored listings and offers.
//!
//! # Architecture
//!
//! - **Handshake**: [`auth::AuthSession`] - nonce, message, signature, verification and session binding
//! - **Messages**: [`siwe`] - canonical EIP-4361 text
//! - **Queries**: [`query::OrderQuery`] - filters and limits for the order collections
//! - **Facade**: [`client::QuayClient`] - composes the above with an order-protocol handle
//! - **Transport**: [`backend::Backend`] - stateless HTTP calls, no timeouts or retries
//!
//! # Features
//!
//! - **Session Binding**: a verified session is remembered and reused for privileged calls
//! - **Atomic Handshakes**: a failed sign-in never clears a previously verified session
//! - **Serialized Verification**: concurrent `verify` calls on one instance run one at a time
//! - **Testing Support**: integration tests simulate the backend with wiremock

pub mod auth;
pub mod backend;
pub mod client;
pub mod config;
pub mod query;
pub mod siwe;

pub use auth::*;
pub use backend::{Backend, NonceResponse};
pub use client::QuayClient;
pub use config::QuayConfig;
pub use query::{OrderFilter, OrderQuery};
pub use siwe::{SiweMessage, build_message};
