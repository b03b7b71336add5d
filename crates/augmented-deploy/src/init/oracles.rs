use ethers::types::{Address, U256};
use eyre::Result;
use tracing::info;

use augmented_wrappers::wrappers::{
    lending_rate_oracle::LendingRateOracle, oracle_router::OracleRouter,
    static_price_oracle::StaticPriceOracle,
};

use crate::{context::DeployContext, deploy::send_call};

/// Wires per-asset price sources into the router in a single call.
pub async fn set_price_sources(
    ctx: &DeployContext,
    router: Address,
    entries: &[(Address, Address)],
) -> Result<()> {
    if entries.is_empty() {
        return Ok(());
    }
    let router = OracleRouter::new(router, ctx.client.clone());
    let assets: Vec<Address> = entries.iter().map(|(asset, _)| *asset).collect();
    let sources: Vec<Address> = entries.iter().map(|(_, source)| *source).collect();
    let receipt = send_call(router.set_asset_sources(assets, sources), ctx.gas_price).await?;
    info!(sources = entries.len(), gas = ?receipt.gas_used, "set oracle sources");
    Ok(())
}

/// Seeds the static oracle with fixed prices, one asset per transaction.
pub async fn set_static_prices(
    ctx: &DeployContext,
    oracle: Address,
    entries: &[(Address, U256)],
) -> Result<()> {
    let oracle = StaticPriceOracle::new(oracle, ctx.client.clone());
    for (asset, price) in entries {
        send_call(oracle.set_asset_price(*asset, *price), ctx.gas_price).await?;
    }
    info!(prices = entries.len(), "seeded static oracle");
    Ok(())
}

/// Sets the initial market borrow rates, one asset per transaction; the
/// rate oracle rejects batched updates.
pub async fn set_borrow_rates(
    ctx: &DeployContext,
    rate_oracle: Address,
    entries: &[(Address, U256)],
) -> Result<()> {
    let rate_oracle = LendingRateOracle::new(rate_oracle, ctx.client.clone());
    for (asset, rate) in entries {
        let receipt = send_call(
            rate_oracle.set_market_borrow_rate(*asset, *rate),
            ctx.gas_price,
        )
        .await?;
        info!(asset = ?asset, gas = ?receipt.gas_used, "set market borrow rate");
    }
    Ok(())
}
