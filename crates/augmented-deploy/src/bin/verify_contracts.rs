use std::path::PathBuf;

use clap::Parser;
use eyre::{eyre, Result};

use augmented_config::network::Network;
use augmented_deploy::{
    env::DeployEnv,
    setup::{build_context, SetupOptions, DEFAULT_DB_PATH},
    verify::verify_all_contracts,
};

/// Submits every contract recorded in the deployment registry for source
/// verification, and every proxy for implementation detection.
#[derive(Parser)]
#[command(name = "verify-contracts")]
struct Args {
    #[arg(long, env = "AUGMENTED_NETWORK")]
    network: String,
    #[arg(long, default_value = "augmented")]
    pool: String,
    /// Shard index of this invocation.
    #[arg(long, default_value_t = 0)]
    batch_index: usize,
    /// Total number of parallel verification shards.
    #[arg(long, default_value_t = 1)]
    batch_count: usize,
    #[arg(long, env = "RPC_URL")]
    rpc_url: Option<String>,
    #[arg(long, default_value = DEFAULT_DB_PATH)]
    db: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let network: Network = args.network.parse()?;

    let env = DeployEnv::load()?;
    let key = env
        .etherscan_key
        .clone()
        .ok_or_else(|| eyre!("ETHERSCAN_KEY is required"))?;

    let ctx = build_context(SetupOptions {
        network,
        pool: args.pool,
        rpc_url: args.rpc_url,
        db_path: args.db,
        verify: true,
        upgrade: false,
        gas_price_gwei: None,
    })
    .await?;

    verify_all_contracts(&ctx, &key, args.batch_index, args.batch_count).await
}
