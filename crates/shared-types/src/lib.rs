// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared types for the Quay client workspace
//!
//! This crate provides the small value types that both the collaborator seams
//! in `api-client` and the client in `quay` agree on, avoiding circular
//! dependencies.

pub mod order_kind;
pub mod session;

pub use order_kind::{OrderKind, OrderKindParseError};
pub use session::SessionToken;
