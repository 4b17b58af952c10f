// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Order collections exposed by the backend

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The two order collections the backend stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    /// Sell-side orders
    Listing,
    /// Buy-side orders
    Offer,
}

impl OrderKind {
    /// Path segment of the collection endpoint
    pub const fn path(self) -> &'static str {
        match self {
            Self::Listing => "listings",
            Self::Offer => "offers",
        }
    }

    /// Returns both collections
    pub const fn all() -> &'static [Self] {
        &[Self::Listing, Self::Offer]
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Listing => write!(f, "listing"),
            Self::Offer => write!(f, "offer"),
        }
    }
}

/// Error returned when parsing an unknown order kind
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown order kind: {0}")]
pub struct OrderKindParseError(pub String);

impl FromStr for OrderKind {
    type Err = OrderKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "listing" | "listings" => Ok(Self::Listing),
            "offer" | "offers" => Ok(Self::Offer),
            _ => Err(OrderKindParseError(s.to_string())),
        }
    }
}
