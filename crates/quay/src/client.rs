// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Convenience client over the Quay backend
//!
//! [`QuayClient`] holds the order-protocol handle next to the backend and the
//! authenticated session instead of extending the protocol client. Orders are
//! created through [`QuayClient::protocol`] and handed back to
//! [`QuayClient::make_listing`] / [`QuayClient::make_offer`].

use alloy_primitives::{Address, U256};
use api_client::{ApiError, AuthStatus, OrderAction, OrderSubmission, Signer};
use serde_json::Value;
use shared_types::{OrderKind, SessionToken};
use tracing::{debug, info};

use crate::{
    auth::{AuthPhase, AuthSession, SiweParams, VerifyOutcome},
    backend::Backend,
    config::QuayConfig,
    query::OrderQuery,
};

/// Client for the Quay order backend
#[derive(Debug)]
pub struct QuayClient<P = ()> {
    backend: Backend,
    auth: AuthSession,
    protocol: P,
}

impl QuayClient {
    /// Create a client without an order-protocol handle
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Precondition` if the backend URL is missing or invalid
    pub fn new(config: &QuayConfig) -> Result<Self, ApiError> {
        Self::with_protocol(config, ())
    }
}

impl<P> QuayClient<P> {
    /// Create a client that carries `protocol` for order creation
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Precondition` if the backend URL is missing or invalid
    pub fn with_protocol(config: &QuayConfig, protocol: P) -> Result<Self, ApiError> {
        let backend = Backend::new(config)?;
        let auth = AuthSession::new(backend.clone(), config);

        info!(backend = backend.base_url(), "Quay client ready");

        Ok(Self {
            backend,
            auth,
            protocol,
        })
    }

    /// Order-protocol handle used to create orders
    pub fn protocol(&self) -> &P {
        &self.protocol
    }

    /// Authentication state of this client
    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    /// Backend handle
    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Session currently bound to this client
    pub async fn session(&self) -> Option<SessionToken> {
        self.auth.session().await
    }

    /// Current handshake phase
    pub async fn phase(&self) -> AuthPhase {
        self.auth.phase().await
    }

    /// Sign in with `signer` and bind the resulting session to this client
    ///
    /// # Errors
    ///
    /// See [`AuthSession::verify`]
    pub async fn verify<S: Signer>(
        &self,
        signer: &S,
        params: &SiweParams,
    ) -> Result<VerifyOutcome, ApiError> {
        self.auth.verify(signer, params).await
    }

    /// Ask the backend whether `session` is authenticated
    ///
    /// # Errors
    ///
    /// See [`AuthSession::is_verified`]
    pub async fn is_verified(&self, session: &SessionToken) -> Result<AuthStatus, ApiError> {
        self.auth.is_verified(session).await
    }

    /// Execute `order` and store it as a listing
    ///
    /// # Errors
    ///
    /// See [`submit_order`](Self::submit_order)
    pub async fn make_listing<O: OrderAction>(&self, order: O) -> Result<Value, ApiError> {
        self.submit_order(OrderKind::Listing, order, None).await
    }

    /// Execute `order` and store it as an offer
    ///
    /// # Errors
    ///
    /// See [`submit_order`](Self::submit_order)
    pub async fn make_offer<O: OrderAction>(&self, order: O) -> Result<Value, ApiError> {
        self.submit_order(OrderKind::Offer, order, None).await
    }

    /// Execute `order` and store it in the `kind` collection
    ///
    /// Uses the bound session unless `session` overrides it. The session is
    /// checked with the backend before the order is executed.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Precondition` without any request if no session is
    /// available, `ApiError::Authentication` if the backend does not accept
    /// the session, `ApiError::Custom` if the order protocol fails, and the
    /// usual transport and response errors
    pub async fn submit_order<O: OrderAction>(
        &self,
        kind: OrderKind,
        order: O,
        session: Option<&SessionToken>,
    ) -> Result<Value, ApiError> {
        let session = match session {
            Some(session) => session.clone(),
            None => self.auth.session().await.ok_or_else(|| {
                ApiError::precondition(format!("no verified session, unable to submit {kind}"))
            })?,
        };

        let status = self.auth.is_verified(&session).await?;
        if !status.verified {
            return Err(ApiError::authentication(format!(
                "invalid session, unable to submit {kind}"
            )));
        }

        let signed = order
            .execute_all_actions()
            .await
            .map_err(|error| ApiError::Custom { error })?;
        let listing = serde_json::to_string(&signed)
            .map_err(|e| ApiError::Custom { error: e.into() })?;

        let submission = OrderSubmission {
            session: Some(session),
            listing,
        };

        let response = self.backend.post_json(kind.path(), &submission).await?;
        info!(%kind, "order submitted");
        Ok(response)
    }

    /// Run an order query against the `kind` collection
    ///
    /// # Errors
    ///
    /// Returns transport and response errors, including a non-array body
    pub async fn retrieve_orders(
        &self,
        kind: OrderKind,
        query: &OrderQuery,
    ) -> Result<Vec<Value>, ApiError> {
        let url = query.url(&self.backend, kind)?;
        let orders: Vec<Value> = self.backend.get_json(url).await?;
        debug!(%kind, count = orders.len(), "orders retrieved");
        Ok(orders)
    }

    /// Listings, optionally capped at `limit`
    ///
    /// # Errors
    ///
    /// See [`retrieve_orders`](Self::retrieve_orders)
    pub async fn retrieve_listings(&self, limit: Option<u32>) -> Result<Vec<Value>, ApiError> {
        self.retrieve_orders(OrderKind::Listing, &OrderQuery::all().with_limit(limit))
            .await
    }

    /// Listings created by `offerer`
    ///
    /// # Errors
    ///
    /// See [`retrieve_orders`](Self::retrieve_orders)
    pub async fn retrieve_listings_by_offerer(
        &self,
        offerer: Address,
        limit: Option<u32>,
    ) -> Result<Vec<Value>, ApiError> {
        let query = OrderQuery::by_offerer(offerer).with_limit(limit);
        self.retrieve_orders(OrderKind::Listing, &query).await
    }

    /// Listings on any token of `contract`
    ///
    /// # Errors
    ///
    /// See [`retrieve_orders`](Self::retrieve_orders)
    pub async fn retrieve_listings_by_contract(
        &self,
        contract: Address,
        limit: Option<u32>,
    ) -> Result<Vec<Value>, ApiError> {
        let query = OrderQuery::by_contract(contract).with_limit(limit);
        self.retrieve_orders(OrderKind::Listing, &query).await
    }

    /// Listings on any of `token_ids` of `contract`
    ///
    /// # Errors
    ///
    /// See [`retrieve_orders`](Self::retrieve_orders)
    pub async fn retrieve_listings_by_token_ids(
        &self,
        contract: Address,
        token_ids: &[U256],
        limit: Option<u32>,
    ) -> Result<Vec<Value>, ApiError> {
        let query = OrderQuery::by_token_ids(contract, token_ids.iter().copied()).with_limit(limit);
        self.retrieve_orders(OrderKind::Listing, &query).await
    }

    /// Offers, optionally capped at `limit`
    ///
    /// # Errors
    ///
    /// See [`retrieve_orders`](Self::retrieve_orders)
    pub async fn retrieve_offers(&self, limit: Option<u32>) -> Result<Vec<Value>, ApiError> {
        self.retrieve_orders(OrderKind::Offer, &OrderQuery::all().with_limit(limit))
            .await
    }

    /// Offers created by `offerer`
    ///
    /// # Errors
    ///
    /// See [`retrieve_orders`](Self::retrieve_orders)
    pub async fn retrieve_offers_by_offerer(
        &self,
        offerer: Address,
        limit: Option<u32>,
    ) -> Result<Vec<Value>, ApiError> {
        let query = OrderQuery::by_offerer(offerer).with_limit(limit);
        self.retrieve_orders(OrderKind::Offer, &query).await
    }

    /// Offers on any token of `contract`
    ///
    /// # Errors
    ///
    /// See [`retrieve_orders`](Self::retrieve_orders)
    pub async fn retrieve_offers_by_contract(
        &self,
        contract: Address,
        limit: Option<u32>,
    ) -> Result<Vec<Value>, ApiError> {
        let query = OrderQuery::by_contract(contract).with_limit(limit);
        self.retrieve_orders(OrderKind::Offer, &query).await
    }

    /// Offers on any of `token_ids` of `contract`
    ///
    /// # Errors
    ///
    /// See [`retrieve_orders`](Self::retrieve_orders)
    pub async fn retrieve_offers_by_token_ids(
        &self,
        contract: Address,
        token_ids: &[U256],
        limit: Option<u32>,
    ) -> Result<Vec<Value>, ApiError> {
        let query = OrderQuery::by_token_ids(contract, token_ids.iter().copied()).with_limit(limit);
        self.retrieve_orders(OrderKind::Offer, &query).await
    }
}
