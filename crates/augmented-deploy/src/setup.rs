use std::{path::PathBuf, sync::Arc};

use ethers::{signers::LocalWallet, types::U256, utils::keccak256};
use eyre::Result;

use augmented_config::{network::Network, pool::load_pool_config};

use crate::{
    chain::{Chain, ForkConfig},
    context::{detect_phase, DeployContext},
    env::DeployEnv,
    registry::JsonFileRegistry,
};

pub const DEFAULT_DB_PATH: &str = "deployed-contracts.json";

lazy_static! {
    /// The role-less account the access auditor calls from when the
    /// environment provides no secondary account.
    static ref UNPRIVILEGED: LocalWallet =
        LocalWallet::from_bytes(&keccak256("augmented.unprivileged")).unwrap();
}

/// Options common to every binary.
#[derive(Clone, Debug)]
pub struct SetupOptions {
    pub network: Network,
    pub pool: String,
    pub rpc_url: Option<String>,
    pub db_path: PathBuf,
    pub verify: bool,
    pub upgrade: bool,
    pub gas_price_gwei: Option<u64>,
}

/// Builds the deploy context: environment, chain client, registry handle,
/// pool configuration, and the phase for this run.
pub async fn build_context(options: SetupOptions) -> Result<DeployContext> {
    let env = DeployEnv::load()?;
    let pool = load_pool_config(&options.pool)?;
    let keys = env.provider_keys();

    // Dev networks run against an in-process anvil node, optionally
    // forking mainnet state.
    let rpc_url = match options.rpc_url {
        Some(url) => Some(url),
        None => match options.network {
            Network::Local | Network::Fork => None,
            other => Some(other.rpc_url(&keys)?),
        },
    };
    let fork = if env.mainnet_fork && rpc_url.is_none() {
        Some(ForkConfig {
            url: Network::Mainnet.rpc_url(&keys)?,
            block_number: env.mainnet_fork_block_number,
        })
    } else {
        None
    };
    let chain = Arc::new(Chain::connect(rpc_url, fork).await?);

    let deployer = env.wallet(0)?;
    let unprivileged = env.wallet(1).unwrap_or_else(|_| UNPRIVILEGED.clone());
    let client = chain.client(deployer).await?;

    let registry = Box::new(JsonFileRegistry::new(
        options.db_path,
        options.network.name(),
    ));
    let phase = detect_phase(registry.as_ref(), options.upgrade);

    let gas_price_gwei = options
        .gas_price_gwei
        .or(env.gas_price)
        .or_else(|| options.network.default_gas_price_gwei());
    let gas_price = gas_price_gwei.map(|gwei| U256::from(gwei) * U256::exp10(9));

    Ok(DeployContext {
        chain,
        client,
        unprivileged,
        network: options.network,
        mainnet_fork: env.mainnet_fork,
        pool,
        phase,
        registry,
        verify: options.verify,
        gas_price,
        artifacts_dir: env.artifacts_dir(),
    })
}
