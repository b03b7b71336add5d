use std::path::PathBuf;

use clap::Parser;
use eyre::Result;

use augmented_config::network::Network;
use augmented_deploy::{
    context::collect_addresses,
    registry::{summarize, JsonFileRegistry},
    setup::DEFAULT_DB_PATH,
};

/// Prints the recorded deployment for a network: the named contract table
/// and the core address snapshot as JSON.
#[derive(Parser)]
#[command(name = "inspect")]
struct Args {
    #[arg(long, env = "AUGMENTED_NETWORK")]
    network: String,
    #[arg(long, default_value = DEFAULT_DB_PATH)]
    db: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let network: Network = args.network.parse()?;
    let registry = JsonFileRegistry::new(args.db, network.name());

    let summary = summarize(&registry);
    for (id, entry) in &summary.rows {
        println!("{:40} {:?} (count: {})", id, entry.address, entry.count);
    }
    for warning in &summary.warnings {
        println!("warning: {}", warning);
    }

    let addresses = collect_addresses(&registry);
    println!("{}", serde_json::to_string_pretty(&addresses)?);

    Ok(())
}
