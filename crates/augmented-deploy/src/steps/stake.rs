use ethers::{abi::Token, types::Address};
use eyre::Result;
use tracing::warn;

use augmented_config::{flags::AddressSlot, stake::StakeMode};
use augmented_wrappers::wrappers::protocol_data_provider::ProtocolDataProvider;

use crate::{
    artifacts::load_artifact,
    context::{ids, ContractId, DeployContext},
    deploy::{deploy, deploy_unique, encode_call, install_or_attach},
    init::stake::{init_stake_tokens, StakeInput},
    steps::resolve_reserve_assets,
};

pub async fn run(ctx: &mut DeployContext) -> Result<()> {
    let controller_address = ctx.require_registered(ContractId::MarketAccessController)?;
    let pool = ctx.pool.clone();
    let assets = resolve_reserve_assets(ctx).await?;

    // The stake configurator is always updated, including on continuation
    // runs against an existing installation.
    let configurator_impl = deploy(ctx, ContractId::StakeConfiguratorImpl, vec![]).await?;
    let configurator_abi = load_artifact(
        &ctx.artifacts_dir,
        ContractId::StakeConfiguratorImpl.artifact_name(),
    )?
    .abi;
    let configurator = install_or_attach(
        ctx,
        AddressSlot::StakeConfigurator,
        ids::STAKE_CONFIGURATOR,
        configurator_impl,
        encode_call(
            &configurator_abi,
            "initialize",
            &[Token::Address(controller_address)],
        )?,
        true,
    )
    .await?;

    let stake_token_impl = deploy_unique(ctx, ContractId::StakeTokenImpl, vec![]).await?;

    let data_helper = ProtocolDataProvider::new(
        ctx.require_registered(ContractId::ProtocolDataProvider)?,
        ctx.client.clone(),
    );
    let mut inputs = Vec::new();
    for (&symbol, params) in &pool.stake_tokens {
        let Some(asset) = assets.get(symbol) else {
            if params.optional {
                warn!(symbol, "no asset for optional stake token, skipping");
                continue;
            }
            eyre::bail!("stake token {} has no resolved asset", symbol);
        };
        let staked_token = match params.mode {
            StakeMode::Underlying => *asset,
            StakeMode::DepositToken => {
                let (deposit_token, _, _): (Address, Address, Address) = data_helper
                    .get_reserve_tokens_addresses(*asset)
                    .call()
                    .await?;
                deposit_token
            }
        };
        let decimals = pool
            .reserves
            .get(symbol)
            .map(|reserve| reserve.decimals)
            .unwrap_or(18);
        inputs.push(StakeInput {
            symbol,
            staked_token,
            decimals,
            params: params.clone(),
        });
    }

    init_stake_tokens(ctx, configurator, stake_token_impl, &inputs).await?;

    Ok(())
}
