use std::collections::BTreeMap;

use ethers::{abi::Token, types::Address};
use eyre::Result;

use augmented_config::flags::AddressSlot;

use crate::{
    artifacts::load_artifact,
    context::{ids, ContractId, DeployContext},
    deploy::{deploy, deploy_unique, deploy_unique_with_id, encode_call, install_or_attach, send_call},
    init::reserves::{init_reserves, ReserveInput, TokenImpls},
    steps::resolve_reserve_assets,
};

pub async fn run(ctx: &mut DeployContext) -> Result<()> {
    let controller_address = ctx.require_registered(ContractId::MarketAccessController)?;
    let pool = ctx.pool.clone();

    // Token implementations are shared across every reserve and exist
    // exactly once per network.
    let impls = TokenImpls {
        deposit: deploy_unique(ctx, ContractId::DepositTokenImpl, vec![]).await?,
        variable_debt: deploy_unique(ctx, ContractId::VariableDebtTokenImpl, vec![]).await?,
        stable_debt: deploy_unique(ctx, ContractId::StableDebtTokenImpl, vec![]).await?,
    };

    let treasury_impl = if ctx.phase.redeploys_implementations() {
        deploy(ctx, ContractId::TreasuryImpl, vec![]).await?
    } else {
        deploy_unique(ctx, ContractId::TreasuryImpl, vec![]).await?
    };
    let treasury_abi =
        load_artifact(&ctx.artifacts_dir, ContractId::TreasuryImpl.artifact_name())?.abi;
    let treasury = install_or_attach(
        ctx,
        AddressSlot::Treasury,
        ids::TREASURY,
        treasury_impl,
        encode_call(&treasury_abi, "initialize", &[Token::Address(controller_address)])?,
        false,
    )
    .await?;

    // One strategy contract per distinct parameter set, shared by the
    // reserves that reference it.
    let mut strategies: BTreeMap<&'static str, Address> = BTreeMap::new();
    for params in pool.reserves.values() {
        let strategy = &params.strategy;
        if strategies.contains_key(strategy.name) {
            continue;
        }
        let address = deploy_unique_with_id(
            ctx,
            ContractId::RateStrategy,
            &format!("RateStrategy-{}", strategy.name),
            vec![
                Token::Address(controller_address),
                Token::Uint(strategy.optimal_utilization),
                Token::Uint(strategy.base_variable_rate),
                Token::Uint(strategy.variable_slope1),
                Token::Uint(strategy.variable_slope2),
                Token::Uint(strategy.stable_slope1),
                Token::Uint(strategy.stable_slope2),
            ],
        )
        .await?;
        strategies.insert(strategy.name, address);
    }

    let assets = resolve_reserve_assets(ctx).await?;
    let inputs: Vec<ReserveInput> = pool
        .reserves
        .iter()
        .filter_map(|(&symbol, params)| {
            let asset = assets.get(symbol)?;
            Some(ReserveInput {
                symbol,
                asset: *asset,
                params: params.clone(),
                strategy: strategies[params.strategy.name],
            })
        })
        .collect();

    let pool_address = ctx.named_address(ids::LENDING_POOL)?;
    let configurator_address = ctx.named_address(ids::LENDING_POOL_CONFIGURATOR)?;
    init_reserves(
        ctx,
        pool_address,
        configurator_address,
        treasury,
        &impls,
        &inputs,
    )
    .await?;

    if let Some(weth) = assets.get("WETH").copied() {
        let gateway = deploy_unique(
            ctx,
            ContractId::WethGateway,
            vec![Token::Address(controller_address), Token::Address(weth)],
        )
        .await?;
        let controller = ctx.controller()?;
        send_call(
            controller.set_address(AddressSlot::WethGateway.to_u256(), gateway),
            ctx.gas_price,
        )
        .await?;
    }

    Ok(())
}
