use ethers::{abi::Token, types::Address};
use eyre::Result;
use tracing::warn;

use augmented_config::flags::AddressSlot;
use augmented_wrappers::wrappers::{
    protocol_data_provider::ProtocolDataProvider, reward_controller::RewardController,
    stake_configurator::StakeConfigurator,
};

use crate::{
    artifacts::load_artifact,
    context::{ids, ContractId, DeployContext},
    deploy::{deploy, encode_call, install_or_attach, send_call},
    init::rewards::{init_reward_pools, RewardPoolInput},
    steps::resolve_reserve_assets,
};

/// Deploys the reward subsystem. Every contract here is in the
/// always-updated set: continuation runs redeploy the implementations and
/// upgrade the proxies in place.
pub async fn run(ctx: &mut DeployContext) -> Result<()> {
    let controller_address = ctx.require_registered(ContractId::MarketAccessController)?;
    let pool = ctx.pool.clone();
    let assets = resolve_reserve_assets(ctx).await?;

    let agf_impl = deploy(ctx, ContractId::AgfTokenImpl, vec![]).await?;
    let agf_abi = load_artifact(&ctx.artifacts_dir, ContractId::AgfTokenImpl.artifact_name())?.abi;
    let agf = install_or_attach(
        ctx,
        AddressSlot::RewardToken,
        ids::AGF_TOKEN,
        agf_impl,
        encode_call(
            &agf_abi,
            "initialize",
            &[
                Token::Address(controller_address),
                Token::String(pool.reward_token_name.to_string()),
                Token::String(pool.reward_token_symbol.to_string()),
            ],
        )?,
        true,
    )
    .await?;

    let controller_impl = deploy(ctx, ContractId::RewardControllerImpl, vec![]).await?;
    let controller_abi = load_artifact(
        &ctx.artifacts_dir,
        ContractId::RewardControllerImpl.artifact_name(),
    )?
    .abi;
    let reward_controller = install_or_attach(
        ctx,
        AddressSlot::RewardController,
        ids::REWARD_CONTROLLER,
        controller_impl,
        encode_call(
            &controller_abi,
            "initialize",
            &[Token::Address(controller_address)],
        )?,
        true,
    )
    .await?;

    let configurator_impl = deploy(ctx, ContractId::RewardConfiguratorImpl, vec![]).await?;
    let configurator_abi = load_artifact(
        &ctx.artifacts_dir,
        ContractId::RewardConfiguratorImpl.artifact_name(),
    )?
    .abi;
    let reward_configurator = install_or_attach(
        ctx,
        AddressSlot::RewardConfigurator,
        ids::REWARD_CONFIGURATOR,
        configurator_impl,
        encode_call(
            &configurator_abi,
            "initialize",
            &[Token::Address(controller_address)],
        )?,
        true,
    )
    .await?;

    let xagf_impl = deploy(ctx, ContractId::XAgfTokenImpl, vec![]).await?;
    let xagf_abi =
        load_artifact(&ctx.artifacts_dir, ContractId::XAgfTokenImpl.artifact_name())?.abi;
    let xagf = install_or_attach(
        ctx,
        AddressSlot::RewardStakeToken,
        ids::XAGF_TOKEN,
        xagf_impl,
        encode_call(
            &xagf_abi,
            "initialize",
            &[
                Token::Address(controller_address),
                Token::Address(agf),
                Token::String(pool.reward_stake_token_name.to_string()),
                Token::String(pool.reward_stake_token_symbol.to_string()),
                Token::Uint(pool.reward_stake.cooldown_period.into()),
                Token::Uint(pool.reward_stake.unstake_period.into()),
            ],
        )?,
        true,
    )
    .await?;

    // Reward pools track deposit tokens, debt tokens, and stake tokens per
    // the configured shares; the xAGF boost pool rides on top.
    let data_helper = ProtocolDataProvider::new(
        ctx.require_registered(ContractId::ProtocolDataProvider)?,
        ctx.client.clone(),
    );
    let stake_configurator = StakeConfigurator::new(
        ctx.named_address(ids::STAKE_CONFIGURATOR)?,
        ctx.client.clone(),
    );
    let mut inputs = Vec::new();
    for (symbol, rewards) in &pool.reserve_rewards {
        let Some(asset) = assets.get(symbol) else {
            warn!(symbol, "no resolved asset for reward entry, skipping");
            continue;
        };
        let (deposit_token, variable_debt_token, stable_debt_token): (Address, Address, Address) =
            data_helper
                .get_reserve_tokens_addresses(*asset)
                .call()
                .await?;
        if let Some(share) = rewards.deposit {
            inputs.push(RewardPoolInput {
                pool_name: format!("ag{}", symbol),
                provider: deposit_token,
                share,
            });
        }
        if let Some(share) = rewards.variable_debt {
            inputs.push(RewardPoolInput {
                pool_name: format!("vd{}", symbol),
                provider: variable_debt_token,
                share,
            });
        }
        if let Some(share) = rewards.stable_debt {
            inputs.push(RewardPoolInput {
                pool_name: format!("sd{}", symbol),
                provider: stable_debt_token,
                share,
            });
        }
        if let Some(share) = rewards.stake {
            let stake_token: Address = stake_configurator.stake_token_of(*asset).call().await?;
            if stake_token == Address::zero() {
                warn!(symbol, "no stake token for stake reward entry, skipping");
            } else {
                inputs.push(RewardPoolInput {
                    pool_name: format!("stkag{}", symbol),
                    provider: stake_token,
                    share,
                });
            }
        }
    }
    init_reward_pools(ctx, reward_configurator, &inputs).await?;

    let booster = RewardController::new(reward_controller, ctx.client.clone());
    send_call(booster.set_boost_pool(xagf), ctx.gas_price).await?;
    send_call(
        booster.update_baseline(pool.reward_params.emission_per_second),
        ctx.gas_price,
    )
    .await?;

    Ok(())
}
