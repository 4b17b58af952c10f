// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Quay command line client
//!
//! Read-only access to the Quay backend: nonces, session probes, SIWE message
//! previews and order queries. Configuration comes from `quay.json` and
//! `QUAY_*` environment variables.

use alloy_primitives::{Address, U256};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use quay::{OrderQuery, QuayClient, QuayConfig, build_message};
use serde_json::{Value, json};
use shared_types::{OrderKind, SessionToken};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "quay", version, about = "Query the Quay NFT order backend")]
struct Cli {
    /// Backend URL, overrides the configured one
    #[arg(long, global = true)]
    backend: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Request a fresh nonce and its session cookie
    Nonce,
    /// Ask the backend whether a session token is authenticated
    Session {
        /// Session token, as returned by `nonce`
        token: String,
    },
    /// Print the SIWE message a wallet would be asked to sign
    Message(MessageArgs),
    /// List stored listings
    Listings(QueryArgs),
    /// List stored offers
    Offers(QueryArgs),
}

#[derive(Debug, Args)]
struct MessageArgs {
    /// Signing account
    address: Address,
    /// Nonce to embed
    nonce: String,
    /// Statement shown to the user
    #[arg(long, default_value = "")]
    statement: String,
    /// Chain the signer is on
    #[arg(long, default_value_t = 1)]
    chain_id: u64,
    /// Message version
    #[arg(long, default_value_t = 1)]
    message_version: u32,
}

#[derive(Debug, Args)]
struct QueryArgs {
    /// Only orders created by this account
    #[arg(long, conflicts_with_all = ["contract", "token_ids"])]
    offerer: Option<Address>,
    /// Only orders on this NFT contract
    #[arg(long)]
    contract: Option<Address>,
    /// Only orders on these tokens, comma separated
    #[arg(long, value_delimiter = ',', requires = "contract")]
    token_ids: Vec<U256>,
    /// Maximum number of orders, 0 for no limit
    #[arg(long)]
    limit: Option<u32>,
}

impl QueryArgs {
    fn query(&self) -> OrderQuery {
        let query = match (self.offerer, self.contract) {
            (Some(offerer), _) => OrderQuery::by_offerer(offerer),
            (None, Some(contract)) if !self.token_ids.is_empty() => {
                OrderQuery::by_token_ids(contract, self.token_ids.iter().copied())
            }
            (None, Some(contract)) => OrderQuery::by_contract(contract),
            (None, None) => OrderQuery::all(),
        };
        query.with_limit(self.limit)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = QuayConfig::from_env()?;
    if let Some(backend) = cli.backend {
        config.backend_url = backend;
    }

    let output = run(cli.command, &config).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

async fn run(command: Command, config: &QuayConfig) -> Result<Value> {
    let client = || QuayClient::new(config);

    let output = match command {
        Command::Nonce => {
            let challenge = client()?.auth().request_challenge().await?;
            json!({
                "nonce": challenge.nonce,
                "session": challenge.session_token.as_ref().map(SessionToken::as_str),
            })
        }
        Command::Session { token } => {
            let status = client()?.is_verified(&SessionToken::new(token)).await?;
            json!({
                "verified": status.verified,
                "payload": status.payload,
            })
        }
        Command::Message(args) => preview_message(&args, config)?,
        Command::Listings(args) => orders(&client()?, OrderKind::Listing, &args).await?,
        Command::Offers(args) => orders(&client()?, OrderKind::Offer, &args).await?,
    };

    Ok(output)
}

async fn orders(client: &QuayClient, kind: OrderKind, args: &QueryArgs) -> Result<Value> {
    let orders = client.retrieve_orders(kind, &args.query()).await?;
    info!(%kind, count = orders.len(), "orders fetched");
    Ok(Value::Array(orders))
}

fn preview_message(args: &MessageArgs, config: &QuayConfig) -> Result<Value> {
    let domain = config
        .domain
        .as_deref()
        .context("no SIWE domain configured, set QUAY_DOMAIN")?;
    let origin = config
        .origin
        .as_deref()
        .context("no SIWE origin configured, set QUAY_ORIGIN")?;

    let message = build_message(
        &args.address.to_checksum(None),
        &args.statement,
        domain,
        origin,
        args.message_version,
        args.chain_id,
        &args.nonce,
    );

    Ok(Value::String(message))
}
