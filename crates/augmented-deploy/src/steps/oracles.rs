use ethers::{
    abi::Token,
    types::{Address, U256},
};
use eyre::Result;
use tracing::warn;

use augmented_config::flags::AddressSlot;

use crate::{
    context::{ContractId, DeployContext},
    deploy::{deploy_unique, send_call},
    init::oracles::{set_borrow_rates, set_price_sources, set_static_prices},
    steps::resolve_reserve_assets,
};

pub async fn run(ctx: &mut DeployContext) -> Result<()> {
    let controller_address = ctx.require_registered(ContractId::MarketAccessController)?;
    let assets = resolve_reserve_assets(ctx).await?;
    let pool = ctx.pool.clone();

    // Price sources: chainlink aggregators on live networks, a static
    // oracle seeded from the config on test networks.
    let mut sources: Vec<(Address, Address)> = Vec::new();
    if ctx.network.is_test() {
        let static_oracle = deploy_unique(ctx, ContractId::StaticPriceOracle, vec![]).await?;
        let mut prices = Vec::new();
        for (symbol, asset) in &assets {
            match pool.mock_prices.get(symbol) {
                Some(price) => {
                    prices.push((*asset, *price));
                    sources.push((*asset, static_oracle));
                }
                None => warn!(symbol, "no mock price configured"),
            }
        }
        set_static_prices(ctx, static_oracle, &prices).await?;
    } else {
        let chainlink = pool
            .chainlink_sources
            .get(ctx.network, ctx.mainnet_fork)
            .cloned()
            .unwrap_or_default();
        for (symbol, asset) in &assets {
            match chainlink.get(symbol) {
                Some(source) => sources.push((*asset, *source)),
                // The base asset prices itself; everything else needs a feed.
                None if *symbol == "WETH" => {}
                None => warn!(symbol, "no price feed configured"),
            }
        }
    }

    let router = deploy_unique(
        ctx,
        ContractId::OracleRouter,
        vec![Token::Address(controller_address)],
    )
    .await?;
    set_price_sources(ctx, router, &sources).await?;

    let rate_oracle = deploy_unique(
        ctx,
        ContractId::LendingRateOracle,
        vec![Token::Address(controller_address)],
    )
    .await?;
    let rates: Vec<(Address, U256)> = pool
        .reserves
        .iter()
        .filter(|(_, params)| params.borrowing_enabled)
        .filter_map(|(symbol, params)| {
            assets
                .get(symbol)
                .map(|asset| (*asset, params.strategy.stable_slope1))
        })
        .collect();
    set_borrow_rates(ctx, rate_oracle, &rates).await?;

    let controller = ctx.controller()?;
    send_call(
        controller.set_address(AddressSlot::PriceOracle.to_u256(), router),
        ctx.gas_price,
    )
    .await?;
    send_call(
        controller.set_address(AddressSlot::LendingRateOracle.to_u256(), rate_oracle),
        ctx.gas_price,
    )
    .await?;

    Ok(())
}
