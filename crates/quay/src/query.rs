// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Query construction for the listing and offer collections

use alloy_primitives::{Address, U256};
use api_client::ApiError;
use serde::{Deserialize, Serialize};
use shared_types::OrderKind;
use url::Url;

use crate::backend::Backend;

/// Which orders to select; the groups are mutually exclusive
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "by")]
pub enum OrderFilter {
    /// Every order in the collection
    #[default]
    All,
    /// Orders made by one account
    Offerer {
        /// Account that created the orders
        offerer: Address,
    },
    /// Orders for any token of one contract
    Contract {
        /// NFT contract
        contract: Address,
    },
    /// Orders for specific tokens of one contract
    TokenIds {
        /// NFT contract
        contract: Address,
        /// Tokens to match; an order matching any of them is returned
        token_ids: Vec<U256>,
    },
}

/// A query against `GET /listings` or `GET /offers`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderQuery {
    /// Selection filter
    pub filter: OrderFilter,
    /// Maximum number of orders; `None` and `Some(0)` both mean no limit
    pub limit: Option<u32>,
}

impl OrderQuery {
    /// Select every order
    pub fn all() -> Self {
        Self::default()
    }

    /// Select orders made by `offerer`
    pub fn by_offerer(offerer: Address) -> Self {
        Self {
            filter: OrderFilter::Offerer { offerer },
            limit: None,
        }
    }

    /// Select orders on any token of `contract`
    pub fn by_contract(contract: Address) -> Self {
        Self {
            filter: OrderFilter::Contract { contract },
            limit: None,
        }
    }

    /// Select orders on specific tokens of `contract`
    pub fn by_token_ids<I, T>(contract: Address, token_ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<U256>,
    {
        Self {
            filter: OrderFilter::TokenIds {
                contract,
                token_ids: token_ids.into_iter().map(Into::into).collect(),
            },
            limit: None,
        }
    }

    /// Cap the number of returned orders
    #[must_use]
    pub fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    /// Query parameters in the order they are sent
    ///
    /// Token ids are joined with commas. A zero limit is dropped entirely.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = match &self.filter {
            OrderFilter::All => Vec::new(),
            OrderFilter::Offerer { offerer } => vec![("offerer", offerer.to_checksum(None))],
            OrderFilter::Contract { contract } => vec![("contract", contract.to_checksum(None))],
            OrderFilter::TokenIds {
                contract,
                token_ids,
            } => {
                let ids = token_ids
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                vec![("contract", contract.to_checksum(None)), ("tokenIds", ids)]
            }
        };

        if let Some(limit) = self.limit.filter(|limit| *limit > 0) {
            params.push(("limit", limit.to_string()));
        }

        params
    }

    /// Absolute URL of this query against the `kind` collection
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Precondition` if the endpoint URL cannot be built
    pub fn url(&self, backend: &Backend, kind: OrderKind) -> Result<Url, ApiError> {
        let mut url = backend.endpoint(kind.path())?;

        let params = self.params();
        if !params.is_empty() {
            let query = params
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(Some(&query));
        }

        Ok(url)
    }
}
