use ethers::types::Address;
use eyre::{bail, Result};
use tracing::info;

use augmented_wrappers::wrappers::{
    agf_token::AgfToken, ierc20_detailed::IERC20Detailed, lending_pool::LendingPool,
    oracle_router::OracleRouter, reward_controller::RewardController,
    stake_configurator::StakeConfigurator,
};

use crate::{
    context::{ids, ContractId, DeployContext},
    steps::resolve_reserve_assets,
};

/// Read-only post-deploy checks: every configured reserve is registered,
/// priced, staked, and rewarded the way the configuration says.
pub async fn run(ctx: &mut DeployContext) -> Result<()> {
    let assets = resolve_reserve_assets(ctx).await?;
    let pool = ctx.pool.clone();

    let lending_pool = LendingPool::new(ctx.named_address(ids::LENDING_POOL)?, ctx.client.clone());
    if lending_pool.is_paused().call().await? {
        bail!("lending pool is paused after deployment");
    }
    let reserves: Vec<Address> = lending_pool.get_reserves_list().call().await?;
    for (symbol, asset) in &assets {
        if !reserves.contains(asset) {
            bail!("reserve {} ({}) is not registered with the pool", symbol, asset);
        }
    }

    // A decimals mismatch between config and chain points at a wrong asset
    // address.
    for (symbol, asset) in &assets {
        let Some(params) = pool.reserves.get(symbol) else {
            continue;
        };
        let decimals = IERC20Detailed::new(*asset, ctx.client.clone())
            .decimals()
            .call()
            .await?;
        if decimals != params.decimals {
            bail!(
                "reserve {} has {} decimals on-chain, {} configured",
                symbol,
                decimals,
                params.decimals
            );
        }
    }

    let router = OracleRouter::new(
        ctx.require_registered(ContractId::OracleRouter)?,
        ctx.client.clone(),
    );
    for (symbol, asset) in &assets {
        let price = router.get_asset_price(*asset).call().await?;
        if price.is_zero() {
            bail!("oracle returns no price for {}", symbol);
        }
    }

    let stake_configurator = StakeConfigurator::new(
        ctx.named_address(ids::STAKE_CONFIGURATOR)?,
        ctx.client.clone(),
    );
    for (symbol, params) in &pool.stake_tokens {
        if params.optional {
            continue;
        }
        let Some(asset) = assets.get(symbol) else {
            continue;
        };
        let stake_token: Address = stake_configurator.stake_token_of(*asset).call().await?;
        if stake_token == Address::zero() {
            bail!("stake token missing for {}", symbol);
        }
    }

    let agf = AgfToken::new(ctx.named_address(ids::AGF_TOKEN)?, ctx.client.clone());
    let agf_symbol: String = agf.symbol().call().await?;
    if agf_symbol != pool.reward_token_symbol {
        bail!(
            "reward token reports symbol {}, expected {}",
            agf_symbol,
            pool.reward_token_symbol
        );
    }

    let booster = RewardController::new(
        ctx.named_address(ids::REWARD_CONTROLLER)?,
        ctx.client.clone(),
    );
    let reward_pools: Vec<Address> = booster.get_pools().call().await?;
    if reward_pools.is_empty() {
        bail!("reward controller has no pools");
    }
    if booster.get_boost_pool().call().await? == Address::zero() {
        bail!("boost pool is not wired");
    }

    info!(
        reserves = reserves.len(),
        reward_pools = reward_pools.len(),
        "smoke test passed"
    );
    Ok(())
}
