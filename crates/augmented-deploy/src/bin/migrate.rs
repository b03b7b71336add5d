use std::path::PathBuf;

use clap::Parser;
use eyre::{eyre, Result};
use tracing::{error, info};

use augmented_config::network::Network;
use augmented_deploy::{
    env::DeployEnv,
    setup::{build_context, SetupOptions, DEFAULT_DB_PATH},
    steps::run_migration,
    verify::verify_all_contracts,
};

/// Runs the full market deployment pipeline against a network, end to end:
/// address provider, lending pool, oracles, reserves, stake tokens, reward
/// contracts, access test, smoke test.
#[derive(Parser)]
#[command(name = "migrate")]
struct Args {
    /// Target network name, e.g. "main", "kovan", "local".
    #[arg(long, env = "AUGMENTED_NETWORK", default_value = "local")]
    network: String,
    /// Named pool configuration to deploy.
    #[arg(long, default_value = "augmented")]
    pool: String,
    /// Submit contract verification to the block explorer after a
    /// successful deployment.
    #[arg(long)]
    verify: bool,
    /// Redeploy and swap in new implementation contracts when continuing
    /// against an existing installation.
    #[arg(long)]
    upgrade: bool,
    /// Override the RPC endpoint instead of deriving it from the network.
    #[arg(long, env = "RPC_URL")]
    rpc_url: Option<String>,
    /// Gas price override in gwei.
    #[arg(long)]
    gas_price: Option<u64>,
    /// Path of the deployment registry file.
    #[arg(long, default_value = DEFAULT_DB_PATH)]
    db: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let network: Network = args.network.parse()?;

    let mut ctx = build_context(SetupOptions {
        network,
        pool: args.pool.clone(),
        rpc_url: args.rpc_url,
        db_path: args.db,
        verify: args.verify,
        upgrade: args.upgrade,
        gas_price_gwei: args.gas_price,
    })
    .await?;

    info!(
        network = %network,
        pool = args.pool.as_str(),
        deployer = ?ctx.deployer(),
        phase = ?ctx.phase,
        "starting migration"
    );
    if let Err(err) = run_migration(&mut ctx).await {
        error!("migration failed: {:#}", err);
        std::process::exit(1);
    }

    if ctx.verify {
        let env = DeployEnv::load()?;
        let key = env
            .etherscan_key
            .ok_or_else(|| eyre!("ETHERSCAN_KEY is required with --verify"))?;
        if let Err(err) = verify_all_contracts(&ctx, &key, 0, 1).await {
            error!("verification failed: {:#}", err);
            std::process::exit(1);
        }
    }

    Ok(())
}
