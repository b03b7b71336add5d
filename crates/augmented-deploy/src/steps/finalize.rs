use std::fs::File;

use eyre::Result;
use tracing::{info, warn};

use augmented_addresses::UiConfig;

use crate::{
    context::{ContractId, DeployContext},
    deploy::send_call,
    registry::print_summary,
};

const UI_CONFIG_PATH: &str = "ui-config.json";

/// Best-effort cleanup that runs whether or not the pipeline succeeded:
/// the deployer's temporary admin is renounced so a crashed run never
/// leaves elevated keys behind, and the registry summary is printed. The
/// ui-config record is only written for successful runs.
pub async fn run(ctx: &mut DeployContext, success: bool) -> Result<()> {
    if let Ok(controller) = ctx.controller() {
        match controller.get_temporary_admin().call().await {
            Ok(admin) if admin == ctx.deployer() => {
                match send_call(controller.renounce_temporary_admin(), ctx.gas_price).await {
                    Ok(_) => info!("temporary admin renounced"),
                    Err(error) => warn!(%error, "failed to renounce temporary admin"),
                }
            }
            Ok(_) => {}
            Err(error) => warn!(%error, "could not query temporary admin"),
        }
    }

    if success {
        let ui_config = UiConfig {
            network: ctx.network.name().to_string(),
            address_registry: ctx.require_registered(ContractId::MarketAccessController)?,
            address_provider: ctx.require_registered(ContractId::MarketAccessController)?,
            data_helper: ctx.require_registered(ContractId::ProtocolDataProvider)?,
        };
        serde_json::to_writer_pretty(File::create(UI_CONFIG_PATH)?, &ui_config)?;
        info!(path = UI_CONFIG_PATH, "wrote ui config");
    }

    print_summary(ctx.registry.as_ref());
    Ok(())
}
