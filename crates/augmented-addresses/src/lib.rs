use ethers::types::Address;
use serde::{Deserialize, Serialize};

/// The core contract addresses of a deployed market. The access controller
/// doubles as the address provider, so the remaining entries can always be
/// re-derived on-chain; they are recorded here so downstream tooling does
/// not have to make a round of RPC calls to find them.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Addresses {
    pub access_controller: Address,
    pub lending_pool: Address,
    pub pool_configurator: Address,
    pub price_oracle: Address,
    pub lending_rate_oracle: Address,
    pub stake_configurator: Address,
    pub reward_controller: Address,
    pub reward_configurator: Address,
    pub reward_token: Address,
    pub reward_stake_token: Address,
    pub treasury: Address,
    pub data_helper: Address,
    pub weth_gateway: Address,
}

/// The record consumed by the external UI, written once at the end of a
/// successful deployment.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiConfig {
    pub network: String,
    pub address_registry: Address,
    pub address_provider: Address,
    pub data_helper: Address,
}
