use std::{fmt, path::PathBuf, sync::Arc};

use ethers::{
    signers::LocalWallet,
    types::{Address, U256},
};
use eyre::{eyre, Result};

use augmented_config::{network::Network, pool::PoolConfiguration};
use augmented_wrappers::wrappers::market_access_controller::MarketAccessController;

use crate::{
    chain::{Chain, ChainClient},
    registry::ContractRegistry,
};

/// The closed set of deployable contract types. Each maps to an artifact in
/// the compiled-artifacts package; adding a contract type here is a
/// compile-time-checked change instead of a string-keyed table lookup.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ContractId {
    MarketAccessController,
    LendingPoolImpl,
    LendingPoolConfiguratorImpl,
    ProtocolDataProvider,
    OracleRouter,
    LendingRateOracle,
    StaticPriceOracle,
    DepositTokenImpl,
    VariableDebtTokenImpl,
    StableDebtTokenImpl,
    RateStrategy,
    StakeConfiguratorImpl,
    StakeTokenImpl,
    RewardControllerImpl,
    RewardConfiguratorImpl,
    AgfTokenImpl,
    XAgfTokenImpl,
    TreasuryImpl,
    WethGateway,
    TestToken,
}

impl ContractId {
    pub const ALL: &'static [ContractId] = &[
        ContractId::MarketAccessController,
        ContractId::LendingPoolImpl,
        ContractId::LendingPoolConfiguratorImpl,
        ContractId::ProtocolDataProvider,
        ContractId::OracleRouter,
        ContractId::LendingRateOracle,
        ContractId::StaticPriceOracle,
        ContractId::DepositTokenImpl,
        ContractId::VariableDebtTokenImpl,
        ContractId::StableDebtTokenImpl,
        ContractId::RateStrategy,
        ContractId::StakeConfiguratorImpl,
        ContractId::StakeTokenImpl,
        ContractId::RewardControllerImpl,
        ContractId::RewardConfiguratorImpl,
        ContractId::AgfTokenImpl,
        ContractId::XAgfTokenImpl,
        ContractId::TreasuryImpl,
        ContractId::WethGateway,
        ContractId::TestToken,
    ];

    /// The registry id the contract is recorded under.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractId::MarketAccessController => "MarketAccessController",
            ContractId::LendingPoolImpl => "LendingPoolImpl",
            ContractId::LendingPoolConfiguratorImpl => "LendingPoolConfiguratorImpl",
            ContractId::ProtocolDataProvider => "ProtocolDataProvider",
            ContractId::OracleRouter => "OracleRouter",
            ContractId::LendingRateOracle => "LendingRateOracle",
            ContractId::StaticPriceOracle => "StaticPriceOracle",
            ContractId::DepositTokenImpl => "DepositTokenImpl",
            ContractId::VariableDebtTokenImpl => "VariableDebtTokenImpl",
            ContractId::StableDebtTokenImpl => "StableDebtTokenImpl",
            ContractId::RateStrategy => "RateStrategy",
            ContractId::StakeConfiguratorImpl => "StakeConfiguratorImpl",
            ContractId::StakeTokenImpl => "StakeTokenImpl",
            ContractId::RewardControllerImpl => "RewardControllerImpl",
            ContractId::RewardConfiguratorImpl => "RewardConfiguratorImpl",
            ContractId::AgfTokenImpl => "AgfTokenImpl",
            ContractId::XAgfTokenImpl => "XAgfTokenImpl",
            ContractId::TreasuryImpl => "TreasuryImpl",
            ContractId::WethGateway => "WethGateway",
            ContractId::TestToken => "TestToken",
        }
    }

    /// The artifact file name in the compiled-artifacts package.
    pub fn artifact_name(&self) -> &'static str {
        match self {
            ContractId::MarketAccessController => "MarketAccessController",
            ContractId::LendingPoolImpl => "LendingPool",
            ContractId::LendingPoolConfiguratorImpl => "LendingPoolConfigurator",
            ContractId::ProtocolDataProvider => "ProtocolDataProvider",
            ContractId::OracleRouter => "OracleRouter",
            ContractId::LendingRateOracle => "LendingRateOracle",
            ContractId::StaticPriceOracle => "StaticPriceOracle",
            ContractId::DepositTokenImpl => "DepositToken",
            ContractId::VariableDebtTokenImpl => "VariableDebtToken",
            ContractId::StableDebtTokenImpl => "StableDebtToken",
            ContractId::RateStrategy => "DefaultReserveInterestRateStrategy",
            ContractId::StakeConfiguratorImpl => "StakeConfigurator",
            ContractId::StakeTokenImpl => "StakeToken",
            ContractId::RewardControllerImpl => "RewardBooster",
            ContractId::RewardConfiguratorImpl => "RewardConfigurator",
            ContractId::AgfTokenImpl => "AgfToken",
            ContractId::XAgfTokenImpl => "XAgfToken",
            ContractId::TreasuryImpl => "Treasury",
            ContractId::WethGateway => "WethGateway",
            ContractId::TestToken => "TestToken",
        }
    }

    /// Maps a registry id back to the contract type. Per-instance ids
    /// (rate strategies, mock tokens) carry a suffix after the base id.
    pub fn from_registry_id(id: &str) -> Option<ContractId> {
        let base = id.split('-').next().unwrap_or(id);
        ContractId::ALL
            .iter()
            .copied()
            .find(|candidate| candidate.as_str() == base)
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How this run relates to what is already on the network, computed once
/// and threaded to every step.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeploymentPhase {
    /// Nothing deployed yet; everything is created from scratch.
    FreshInstall,
    /// An installation exists and implementation contracts should be
    /// redeployed and swapped in.
    ContinuationUpgrade,
    /// An installation exists; only the always-updated contracts are
    /// redeployed, everything else attaches to existing addresses.
    ContinuationUnchanged,
}

impl DeploymentPhase {
    pub fn is_continuation(&self) -> bool {
        !matches!(self, DeploymentPhase::FreshInstall)
    }

    /// Whether implementation contracts that are "NOT updated for existing
    /// installations" may be redeployed in this phase.
    pub fn redeploys_implementations(&self) -> bool {
        matches!(
            self,
            DeploymentPhase::FreshInstall | DeploymentPhase::ContinuationUpgrade
        )
    }
}

/// Derives the phase from the presence of a previously-deployed access
/// controller in the registry.
pub fn detect_phase(registry: &dyn ContractRegistry, upgrade: bool) -> DeploymentPhase {
    match registry.named(ContractId::MarketAccessController.as_str()) {
        None => DeploymentPhase::FreshInstall,
        Some(_) if upgrade => DeploymentPhase::ContinuationUpgrade,
        Some(_) => DeploymentPhase::ContinuationUnchanged,
    }
}

/// Registry ids of the proxy-backed singletons. Implementation contracts
/// are recorded under their [`ContractId`]; the proxies in front of them
/// use these names.
pub mod ids {
    pub const LENDING_POOL: &str = "LendingPool";
    pub const LENDING_POOL_CONFIGURATOR: &str = "LendingPoolConfigurator";
    pub const TREASURY: &str = "Treasury";
    pub const STAKE_CONFIGURATOR: &str = "StakeConfigurator";
    pub const REWARD_CONTROLLER: &str = "RewardController";
    pub const REWARD_CONFIGURATOR: &str = "RewardConfigurator";
    pub const AGF_TOKEN: &str = "AgfToken";
    pub const XAGF_TOKEN: &str = "XAgfToken";
}

pub type SignerClient = ChainClient<LocalWallet>;

/// Everything a deployment step needs, threaded explicitly instead of
/// living in process-wide globals.
pub struct DeployContext {
    pub chain: Arc<Chain>,
    pub client: Arc<SignerClient>,
    /// A funded but role-less account for black-box access checks.
    pub unprivileged: LocalWallet,
    pub network: Network,
    pub mainnet_fork: bool,
    pub pool: PoolConfiguration,
    pub phase: DeploymentPhase,
    pub registry: Box<dyn ContractRegistry>,
    pub verify: bool,
    pub gas_price: Option<U256>,
    pub artifacts_dir: PathBuf,
}

impl DeployContext {
    pub fn deployer(&self) -> Address {
        self.client.address()
    }

    /// The address a singleton was registered under, if any.
    pub fn registered(&self, id: ContractId) -> Option<Address> {
        self.registry.named(id.as_str()).map(|entry| entry.address)
    }

    pub fn require_registered(&self, id: ContractId) -> Result<Address> {
        self.registered(id)
            .ok_or_else(|| eyre!("{} has not been deployed yet", id))
    }

    /// The address registered under an arbitrary name, for the
    /// proxy-backed singletons.
    pub fn named_address(&self, id: &str) -> Result<Address> {
        self.registry
            .named(id)
            .map(|entry| entry.address)
            .ok_or_else(|| eyre!("{} has not been deployed yet", id))
    }

    /// Attaches to the deployed access controller.
    pub fn controller(&self) -> Result<MarketAccessController<SignerClient>> {
        let address = self.require_registered(ContractId::MarketAccessController)?;
        Ok(MarketAccessController::new(address, self.client.clone()))
    }
}

/// Snapshots the core deployed addresses from the registry, for the
/// inspect binary and the end-of-run log.
pub fn collect_addresses(registry: &dyn ContractRegistry) -> augmented_addresses::Addresses {
    let named = |id: &str| {
        registry
            .named(id)
            .map(|entry| entry.address)
            .unwrap_or_default()
    };
    augmented_addresses::Addresses {
        access_controller: named(ContractId::MarketAccessController.as_str()),
        lending_pool: named(ids::LENDING_POOL),
        pool_configurator: named(ids::LENDING_POOL_CONFIGURATOR),
        price_oracle: named(ContractId::OracleRouter.as_str()),
        lending_rate_oracle: named(ContractId::LendingRateOracle.as_str()),
        stake_configurator: named(ids::STAKE_CONFIGURATOR),
        reward_controller: named(ids::REWARD_CONTROLLER),
        reward_configurator: named(ids::REWARD_CONFIGURATOR),
        reward_token: named(ids::AGF_TOKEN),
        reward_stake_token: named(ids::XAGF_TOKEN),
        treasury: named(ids::TREASURY),
        data_helper: named(ContractId::ProtocolDataProvider.as_str()),
        weth_gateway: named(ContractId::WethGateway.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MemoryRegistry;

    #[test]
    fn test_phase_detection() {
        let mut registry = MemoryRegistry::default();
        assert_eq!(
            detect_phase(&registry, false),
            DeploymentPhase::FreshInstall
        );
        assert_eq!(detect_phase(&registry, true), DeploymentPhase::FreshInstall);

        registry
            .add_instance(
                ContractId::MarketAccessController.as_str(),
                Address::from([1u8; 20]),
                true,
                None,
            )
            .unwrap();
        assert_eq!(
            detect_phase(&registry, false),
            DeploymentPhase::ContinuationUnchanged
        );
        assert_eq!(
            detect_phase(&registry, true),
            DeploymentPhase::ContinuationUpgrade
        );
    }

    #[test]
    fn test_registry_id_round_trip() {
        for id in ContractId::ALL {
            assert_eq!(ContractId::from_registry_id(id.as_str()), Some(*id));
        }
        assert_eq!(
            ContractId::from_registry_id("RateStrategy-rateStrategyStable"),
            Some(ContractId::RateStrategy)
        );
        assert_eq!(ContractId::from_registry_id("Unknown"), None);
    }
}
