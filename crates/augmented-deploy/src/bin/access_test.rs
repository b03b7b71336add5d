use std::path::PathBuf;

use clap::Parser;
use eyre::Result;
use tracing::error;

use augmented_config::network::Network;
use augmented_deploy::{
    setup::{build_context, SetupOptions, DEFAULT_DB_PATH},
    steps::access_test,
};

/// Runs the black-box mutable-access audit against an already-deployed
/// market.
#[derive(Parser)]
#[command(name = "access-test")]
struct Args {
    #[arg(long, env = "AUGMENTED_NETWORK")]
    network: String,
    #[arg(long, default_value = "augmented")]
    pool: String,
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

    let mut ctx = build_context(SetupOptions {
        network,
        pool: args.pool,
        rpc_url: args.rpc_url,
        db_path: args.db,
        verify: false,
        upgrade: false,
        gas_price_gwei: None,
    })
    .await?;

    if let Err(err) = access_test::run(&mut ctx).await {
        error!("{:#}", err);
        std::process::exit(1);
    }
    Ok(())
}
