use ethers::types::Address;
use eyre::Result;
use tracing::info;

use augmented_config::stake::StakeParams;
use augmented_wrappers::wrappers::stake_configurator::{InitStakeData, StakeConfigurator};

use crate::{context::DeployContext, deploy::send_call};

pub const STAKE_CHUNK: usize = 4;
const CHUNK_GAS: u64 = 5_000_000;

/// One stake token, resolved to the token it wraps.
#[derive(Clone, Debug)]
pub struct StakeInput {
    pub symbol: &'static str,
    /// The deposit token or raw underlying being staked.
    pub staked_token: Address,
    pub decimals: u8,
    pub params: StakeParams,
}

/// Creates stake tokens for the assets that do not have one yet.
pub async fn init_stake_tokens(
    ctx: &DeployContext,
    configurator: Address,
    stake_token_impl: Address,
    inputs: &[StakeInput],
) -> Result<()> {
    let configurator = StakeConfigurator::new(configurator, ctx.client.clone());

    let mut pending = Vec::new();
    for input in inputs {
        let existing: Address = configurator
            .stake_token_of(input.staked_token)
            .call()
            .await?;
        if existing != Address::zero() {
            info!(symbol = input.symbol, stake_token = ?existing, "stake token exists, skipping");
            continue;
        }
        pending.push(input.clone());
    }

    for chunk in pending.chunks(STAKE_CHUNK) {
        let input: Vec<InitStakeData> = chunk
            .iter()
            .map(|stake| InitStakeData {
                stake_token_impl,
                staked_token: stake.staked_token,
                name: format!("Staked Augmented {}", stake.symbol),
                symbol: format!("stkag{}", stake.symbol),
                cooldown_period: stake.params.cooldown_period,
                unstake_period: stake.params.unstake_period,
                max_slashable: stake.params.max_slash,
                staked_token_decimals: stake.decimals,
            })
            .collect();
        let symbols: Vec<&str> = chunk.iter().map(|stake| stake.symbol).collect();
        let receipt = send_call(
            configurator.batch_init_stake_tokens(input).gas(CHUNK_GAS),
            ctx.gas_price,
        )
        .await?;
        info!(?symbols, gas = ?receipt.gas_used, "initialized stake tokens");
    }

    Ok(())
}
