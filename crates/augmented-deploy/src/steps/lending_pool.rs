use ethers::abi::Token;
use eyre::Result;

use augmented_config::flags::AddressSlot;

use crate::{
    artifacts::load_artifact,
    context::{ids, ContractId, DeployContext},
    deploy::{deploy, deploy_unique, encode_call, install_or_attach, send_call},
};

pub async fn run(ctx: &mut DeployContext) -> Result<()> {
    let controller_address = ctx.require_registered(ContractId::MarketAccessController)?;

    // The pool and configurator implementations are NOT updated for
    // existing installations unless this is an upgrade run.
    let pool_impl = if ctx.phase.redeploys_implementations() {
        deploy(ctx, ContractId::LendingPoolImpl, vec![]).await?
    } else {
        deploy_unique(ctx, ContractId::LendingPoolImpl, vec![]).await?
    };
    let pool_abi = load_artifact(&ctx.artifacts_dir, ContractId::LendingPoolImpl.artifact_name())?.abi;
    let init_data = encode_call(&pool_abi, "initialize", &[Token::Address(controller_address)])?;
    install_or_attach(
        ctx,
        AddressSlot::LendingPool,
        ids::LENDING_POOL,
        pool_impl,
        init_data,
        false,
    )
    .await?;

    let configurator_impl = if ctx.phase.redeploys_implementations() {
        deploy(ctx, ContractId::LendingPoolConfiguratorImpl, vec![]).await?
    } else {
        deploy_unique(ctx, ContractId::LendingPoolConfiguratorImpl, vec![]).await?
    };
    let configurator_abi = load_artifact(
        &ctx.artifacts_dir,
        ContractId::LendingPoolConfiguratorImpl.artifact_name(),
    )?
    .abi;
    let init_data = encode_call(
        &configurator_abi,
        "initialize",
        &[Token::Address(controller_address)],
    )?;
    install_or_attach(
        ctx,
        AddressSlot::LendingPoolConfigurator,
        ids::LENDING_POOL_CONFIGURATOR,
        configurator_impl,
        init_data,
        false,
    )
    .await?;

    // The data helper is stateless and is always refreshed.
    let data_helper = deploy(
        ctx,
        ContractId::ProtocolDataProvider,
        vec![Token::Address(controller_address)],
    )
    .await?;
    let controller = ctx.controller()?;
    send_call(
        controller.set_address(AddressSlot::DataHelper.to_u256(), data_helper),
        ctx.gas_price,
    )
    .await?;

    Ok(())
}
