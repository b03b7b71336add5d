use eyre::{bail, Result};
use tracing::info;

use crate::{
    artifacts::load_artifact,
    audit::{audit_contract, market_exceptions},
    context::{ids, ContractId, DeployContext},
};

/// Black-box audit of the deployed market: every mutable function of the
/// core contracts must reject an unprivileged caller the way the exception
/// tables predict. Runs in check-all mode so one failure does not mask the
/// rest.
pub async fn run(ctx: &mut DeployContext) -> Result<()> {
    let client = ctx.chain.client(ctx.unprivileged.clone()).await?;
    let caller = client.address();
    let tables = market_exceptions();

    let targets: [(&str, ContractId, &str); 5] = [
        ("LendingPool", ContractId::LendingPoolImpl, ids::LENDING_POOL),
        (
            "LendingPoolConfigurator",
            ContractId::LendingPoolConfiguratorImpl,
            ids::LENDING_POOL_CONFIGURATOR,
        ),
        (
            "StakeConfigurator",
            ContractId::StakeConfiguratorImpl,
            ids::STAKE_CONFIGURATOR,
        ),
        (
            "RewardBooster",
            ContractId::RewardControllerImpl,
            ids::REWARD_CONTROLLER,
        ),
        (
            "OracleRouter",
            ContractId::OracleRouter,
            ContractId::OracleRouter.as_str(),
        ),
    ];

    let mut errors = Vec::new();
    for (label, abi_source, named) in targets {
        let address = ctx.named_address(named)?;
        let abi = load_artifact(&ctx.artifacts_dir, abi_source.artifact_name())?.abi;
        audit_contract(
            client.as_ref(),
            caller,
            label,
            address,
            &abi,
            tables.get(label),
            &mut errors,
            true,
        )
        .await?;
    }

    if !errors.is_empty() {
        bail!("access test found {} violations", errors.len());
    }
    info!("access test passed");
    Ok(())
}
