use ethers::types::{Address, U256};
use eyre::Result;
use tracing::info;

use augmented_config::rates::ReserveParams;
use augmented_wrappers::wrappers::{
    lending_pool::LendingPool,
    lending_pool_configurator::{ConfigureReserveInput, InitReserveInput, LendingPoolConfigurator},
};

use crate::{context::DeployContext, deploy::send_call};

/// Reserve initialization goes out in small batches so a single transaction
/// stays well under the block gas limit; configuration calls are much
/// cheaper and ride in larger ones.
pub const INIT_CHUNK: usize = 4;
pub const CONFIGURE_CHUNK: usize = 20;
const CHUNK_GAS: u64 = 5_000_000;

/// One reserve, fully resolved: the underlying asset address, the shared
/// token implementations, and the deployed strategy for its parameters.
#[derive(Clone, Debug)]
pub struct ReserveInput {
    pub symbol: &'static str,
    pub asset: Address,
    pub params: ReserveParams,
    pub strategy: Address,
}

pub struct TokenImpls {
    pub deposit: Address,
    pub variable_debt: Address,
    pub stable_debt: Address,
}

/// Initializes the reserves that are not yet registered with the pool, in
/// chunks, then pushes the risk parameters for all of them.
pub async fn init_reserves(
    ctx: &DeployContext,
    pool: Address,
    configurator: Address,
    treasury: Address,
    impls: &TokenImpls,
    inputs: &[ReserveInput],
) -> Result<()> {
    let pool = LendingPool::new(pool, ctx.client.clone());
    let configurator = LendingPoolConfigurator::new(configurator, ctx.client.clone());

    // Exclude reserves the pool already knows about so continuation runs
    // don't hit duplicate-registration reverts. This makes the chunking
    // data-dependent across runs.
    let existing: Vec<Address> = pool.get_reserves_list().call().await?;
    let pending: Vec<&ReserveInput> = inputs
        .iter()
        .filter(|input| {
            if existing.contains(&input.asset) {
                info!(symbol = input.symbol, "reserve already initialized, skipping");
                false
            } else {
                true
            }
        })
        .collect();

    for chunk in pending.chunks(INIT_CHUNK) {
        let input: Vec<InitReserveInput> = chunk
            .iter()
            .map(|reserve| InitReserveInput {
                deposit_token_impl: impls.deposit,
                variable_debt_token_impl: impls.variable_debt,
                stable_debt_token_impl: impls.stable_debt,
                underlying_asset_decimals: reserve.params.decimals,
                strategy: reserve.strategy,
                underlying_asset: reserve.asset,
                treasury,
                underlying_asset_name: reserve.symbol.to_string(),
                deposit_token_name: format!("Augmented {}", reserve.symbol),
                deposit_token_symbol: format!("ag{}", reserve.symbol),
                variable_debt_token_name: format!("Augmented variable debt {}", reserve.symbol),
                variable_debt_token_symbol: format!("vd{}", reserve.symbol),
                stable_debt_token_name: format!("Augmented stable debt {}", reserve.symbol),
                stable_debt_token_symbol: format!("sd{}", reserve.symbol),
            })
            .collect();
        let symbols: Vec<&str> = chunk.iter().map(|reserve| reserve.symbol).collect();
        let receipt = send_call(
            configurator.batch_init_reserve(input).gas(CHUNK_GAS),
            ctx.gas_price,
        )
        .await?;
        info!(?symbols, gas = ?receipt.gas_used, "initialized reserves");
    }

    // Risk parameters are idempotent, so they are (re)applied for the whole
    // reserve set on every run.
    for chunk in inputs.chunks(CONFIGURE_CHUNK) {
        let input: Vec<ConfigureReserveInput> = chunk
            .iter()
            .map(|reserve| ConfigureReserveInput {
                asset: reserve.asset,
                base_ltv: U256::from(reserve.params.base_ltv),
                liquidation_threshold: U256::from(reserve.params.liquidation_threshold),
                liquidation_bonus: U256::from(reserve.params.liquidation_bonus),
                reserve_factor: U256::from(reserve.params.reserve_factor),
                borrowing_enabled: reserve.params.borrowing_enabled,
                stable_borrowing_enabled: reserve.params.stable_borrowing_enabled,
            })
            .collect();
        let receipt = send_call(
            configurator.configure_reserves(input).gas(CHUNK_GAS),
            ctx.gas_price,
        )
        .await?;
        info!(reserves = chunk.len(), gas = ?receipt.gas_used, "configured reserves");
    }

    Ok(())
}
