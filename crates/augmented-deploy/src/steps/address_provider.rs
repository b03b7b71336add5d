use ethers::abi::Token;
use eyre::Result;
use tracing::{info, warn};

use augmented_config::flags::{RoleFlag, RoleSet};
use augmented_wrappers::wrappers::market_access_controller::MarketAccessController;

use crate::{
    context::{ContractId, DeployContext},
    deploy::{deploy, send_call},
};

/// Blocks until the temporary admin grant lapses on its own if it is never
/// renounced.
const TEMP_ADMIN_EXPIRY_BLOCKS: u32 = 100_000;

pub async fn run(ctx: &mut DeployContext) -> Result<()> {
    if let Some(address) = ctx.registered(ContractId::MarketAccessController) {
        let controller = MarketAccessController::new(address, ctx.client.clone());
        let market_id: String = controller.get_market_id().call().await?;
        if market_id != ctx.pool.market_id {
            warn!(
                on_chain = market_id.as_str(),
                configured = ctx.pool.market_id,
                "continuing against a controller with a different market id"
            );
        }
        let temporary_admin = controller.get_temporary_admin().call().await?;
        if temporary_admin != ctx.deployer() {
            warn!(
                deployer = ?ctx.deployer(),
                "deployer is not the temporary admin of the existing controller; \
                 privileged steps may revert"
            );
        }
        info!(controller = ?address, "reusing existing access controller");
        return Ok(());
    }

    let address = deploy(
        ctx,
        ContractId::MarketAccessController,
        vec![Token::String(ctx.pool.market_id.to_string())],
    )
    .await?;
    let controller = MarketAccessController::new(address, ctx.client.clone());

    // The deployer administers the rest of the pipeline through a
    // block-bounded temporary grant that finalize renounces.
    send_call(
        controller.set_temporary_admin(ctx.deployer(), TEMP_ADMIN_EXPIRY_BLOCKS),
        ctx.gas_price,
    )
    .await?;

    if let Some(admin) = ctx.pool.pool_admin(ctx.network, ctx.mainnet_fork) {
        send_call(
            controller.grant_roles(admin, RoleSet::from(RoleFlag::PoolAdmin).to_u256()),
            ctx.gas_price,
        )
        .await?;
        info!(admin = ?admin, "granted POOL_ADMIN");
    }
    if let Some(admin) = ctx.pool.emergency_admin(ctx.network, ctx.mainnet_fork) {
        send_call(
            controller.grant_roles(admin, RoleSet::from(RoleFlag::EmergencyAdmin).to_u256()),
            ctx.gas_price,
        )
        .await?;
        info!(admin = ?admin, "granted EMERGENCY_ADMIN");
    }

    Ok(())
}
