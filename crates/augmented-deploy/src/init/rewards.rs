use ethers::types::Address;
use eyre::Result;
use tracing::info;

use augmented_config::rewards::RewardShare;
use augmented_wrappers::wrappers::reward_configurator::{PoolInitData, RewardConfigurator};

use crate::{context::DeployContext, deploy::send_call};

pub const REWARD_CHUNK: usize = 4;
const CHUNK_GAS: u64 = 5_000_000;

/// One reward pool: the token whose holders accrue rewards, and its share
/// of the market's emission.
#[derive(Clone, Debug)]
pub struct RewardPoolInput {
    pub pool_name: String,
    /// The tracked deposit, debt, or stake token.
    pub provider: Address,
    pub share: RewardShare,
}

/// Creates reward pools that do not exist yet. Pools are looked up by name
/// so re-runs only add the missing ones.
pub async fn init_reward_pools(
    ctx: &DeployContext,
    configurator: Address,
    inputs: &[RewardPoolInput],
) -> Result<()> {
    let configurator = RewardConfigurator::new(configurator, ctx.client.clone());

    let mut pending = Vec::new();
    for input in inputs {
        let existing: Address = configurator
            .get_pool_by_name(input.pool_name.clone())
            .call()
            .await?;
        if existing != Address::zero() {
            info!(pool = input.pool_name.as_str(), "reward pool exists, skipping");
            continue;
        }
        pending.push(input.clone());
    }

    for chunk in pending.chunks(REWARD_CHUNK) {
        let entries: Vec<PoolInitData> = chunk
            .iter()
            .map(|pool| PoolInitData {
                provider: pool.provider,
                pool_name: pool.pool_name.clone(),
                base_points: pool.share.base_points,
                boost_factor: pool.share.boost_factor as u32,
            })
            .collect();
        let names: Vec<&str> = chunk.iter().map(|pool| pool.pool_name.as_str()).collect();
        let receipt = send_call(
            configurator.batch_init_reward_pools(entries).gas(CHUNK_GAS),
            ctx.gas_price,
        )
        .await?;
        info!(?names, gas = ?receipt.gas_used, "initialized reward pools");
    }

    Ok(())
}
