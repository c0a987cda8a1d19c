//! FM chain probe - prints the chain head and, optionally, the state of one
//! account.
//!
//! Usage: `fmchain-client [ADDRESS [TOKEN_CONTRACT]]`

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use fmchain_client::chain::ChainReader;
use fmchain_client::codec::Address;
use fmchain_client::config::Settings;
use fmchain_client::tx::NonceSequencer;
use fmchain_client::{metrics, BlockTag, RpcClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    info!("Starting FM chain probe v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = Settings::load()?;
    info!(
        "Loaded configuration: api {}, rpc {}",
        settings.client.base_url,
        settings.client.rpc_url()
    );

    // Fail early on a malformed API key; the probe itself sends nothing encrypted
    if settings
        .auth
        .encryptor()
        .context("Invalid auth.api_public_key")?
        .is_some()
    {
        info!("auth.api_public_key is a valid RSA public key");
    }

    let rpc = Arc::new(RpcClient::from_settings(&settings)?);
    let reader = ChainReader::new(rpc);

    let height = reader.block_number().await?;
    info!("Chain head at block {}", height);

    let block = reader.block_by_number(height).await?;
    info!(
        "Block {} has {} transactions",
        block.height,
        block.transactions.len()
    );

    let mut args = std::env::args().skip(1);
    if let Some(arg) = args.next() {
        let address = Address::parse(&arg).with_context(|| format!("Invalid address {}", arg))?;

        let balance = reader.balance(&address).await?;
        info!("Balance of {}: {}", address.to_fm(), balance);

        let sequencer = NonceSequencer::new(reader.clone());
        let next = sequencer.next_nonce(&address).await?;
        info!("Next nonce for {}: {}", address.to_fm(), next);

        match reader.is_node_account(&address).await {
            Ok(held) => info!("Held by node: {}", held),
            Err(e) => warn!("Could not list node accounts: {}", e),
        }

        if let Some(contract) = args.next() {
            let tag: BlockTag = settings.tx.block_tag.parse()?;
            let tokens = reader.token_balance(&address, &contract, tag).await?;
            info!("Token balance at {} ({}): {}", contract, tag, tokens);
        }
    }

    let status = reader.txpool_status().await?;
    info!("Txpool: {} pending, {} queued", status.pending, status.queued);

    debug!("Metrics:\n{}", metrics::gather_text()?);

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,fmchain_client=debug,hyper=warn,reqwest=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .init();
}
