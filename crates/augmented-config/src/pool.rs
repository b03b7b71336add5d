use std::collections::BTreeMap;

use ethers::types::{Address, U256};
use eyre::{bail, Result};

use crate::{
    network::{Network, PerNetwork},
    rates::{self, ReserveParams},
    rewards::{ReserveRewards, RewardParams, RewardShare},
    stake::{RewardStakeParams, StakeMode, StakeParams},
};

/// Everything a deployment run needs to know about one market: identity,
/// admins, reserve assets and their parameters, stake and reward settings.
/// Built once by merging the commons base with market overrides and
/// immutable afterwards.
#[derive(Clone, Debug)]
pub struct PoolConfiguration {
    pub market_id: &'static str,
    pub provider_id: u64,
    pub pool_admin: PerNetwork<Address>,
    pub emergency_admin: PerNetwork<Address>,
    pub reserve_assets: PerNetwork<BTreeMap<&'static str, Address>>,
    /// Chainlink ETH-denominated aggregators per asset; assets without an
    /// entry fall back to the router's base-asset handling.
    pub chainlink_sources: PerNetwork<BTreeMap<&'static str, Address>>,
    pub reserves: BTreeMap<&'static str, ReserveParams>,
    pub reserve_rewards: BTreeMap<&'static str, ReserveRewards>,
    pub stake_tokens: BTreeMap<&'static str, StakeParams>,
    pub reward_params: RewardParams,
    pub reward_stake: RewardStakeParams,
    pub reward_token_name: &'static str,
    pub reward_token_symbol: &'static str,
    pub reward_stake_token_name: &'static str,
    pub reward_stake_token_symbol: &'static str,
    /// Supply minted into mock assets deployed on test networks.
    pub test_token_supply: U256,
    /// Fixed prices installed into the static oracle on test networks,
    /// in wei of ETH per whole token.
    pub mock_prices: BTreeMap<&'static str, U256>,
}

impl PoolConfiguration {
    /// Resolves the address of a reserve asset for a network. `None` means
    /// the asset is not configured there; the caller decides whether that
    /// is fatal based on the reserve's `optional` flag.
    pub fn reserve_asset(
        &self,
        network: Network,
        mainnet_fork: bool,
        symbol: &str,
    ) -> Option<Address> {
        self.reserve_assets
            .get(network, mainnet_fork)
            .and_then(|assets| assets.get(symbol))
            .copied()
    }

    pub fn pool_admin(&self, network: Network, mainnet_fork: bool) -> Option<Address> {
        self.pool_admin.get(network, mainnet_fork).copied()
    }

    pub fn emergency_admin(&self, network: Network, mainnet_fork: bool) -> Option<Address> {
        self.emergency_admin.get(network, mainnet_fork).copied()
    }
}

pub fn load_pool_config(name: &str) -> Result<PoolConfiguration> {
    match name {
        "augmented" => Ok(augmented_market()),
        "test" => Ok(test_market()),
        other => bail!("unsupported pool configuration: {}", other),
    }
}

// Address literals below are static data validated by tests; a malformed
// entry fails `test_static_addresses_parse`.
fn a(s: &'static str) -> Address {
    s.parse().unwrap()
}

fn eth(whole: u64) -> U256 {
    U256::exp10(18) * whole
}

fn commons() -> PoolConfiguration {
    PoolConfiguration {
        market_id: "Augmented commons",
        provider_id: 0,
        pool_admin: PerNetwork::from([
            (
                Network::Mainnet,
                a("0x8A91a9908a2bbB34B2159f84e16cbeDbcca2459f"),
            ),
            (
                Network::Kovan,
                a("0x3e965117A51186e41c2BB58b729A1e518A715e5F"),
            ),
            (
                Network::BscTestnet,
                a("0x3e965117A51186e41c2BB58b729A1e518A715e5F"),
            ),
        ]),
        emergency_admin: PerNetwork::from([
            (
                Network::Mainnet,
                a("0x85517A6e01A9Acd3E4146DbDcD1D00f248B64a6f"),
            ),
            (
                Network::Kovan,
                a("0x3e965117A51186e41c2BB58b729A1e518A715e5F"),
            ),
        ]),
        reserve_assets: PerNetwork::from([
            (
                Network::Mainnet,
                BTreeMap::from([
                    ("DAI", a("0x6B175474E89094C44Da98b954EedeAC495271d0F")),
                    ("USDC", a("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48")),
                    ("USDT", a("0xdAC17F958D2ee523a2206206994597C13D831ec7")),
                    ("WETH", a("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2")),
                    ("WBTC", a("0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599")),
                ]),
            ),
            (
                Network::Kovan,
                BTreeMap::from([
                    ("DAI", a("0xFf795577d9AC8bD7D90Ee22b6C1703490b6512FD")),
                    ("USDC", a("0xe22da380ee6B445bb8273C81944ADEB6E8450422")),
                    ("USDT", a("0x13512979ADE267AB5100878E2e0f485B568328a4")),
                    ("WETH", a("0xd0A1E359811322d97991E03f863a0C30C2cF029C")),
                    ("WBTC", a("0xD1B98B6607330172f1D991521145A22BCe793277")),
                ]),
            ),
            // Dev networks get mocks deployed on the fly.
            (Network::Local, BTreeMap::new()),
        ]),
        chainlink_sources: PerNetwork::from([
            (
                Network::Mainnet,
                BTreeMap::from([
                    ("DAI", a("0x773616E4d11A78F511299002da57A0a94577F1f4")),
                    ("USDC", a("0x986b5E1e1755e3C2440e960477f25201B0a8bbD4")),
                    ("USDT", a("0xEe9F2375b4bdF6387aa8265dD4FB8F16512A1d46")),
                    ("WBTC", a("0xdeb288F737066589598e9214E782fa5A8eD689e8")),
                ]),
            ),
            (
                Network::Kovan,
                BTreeMap::from([
                    ("DAI", a("0x22B58f1EbEDfCA50feF632bD73368b2FdA96D541")),
                    ("USDC", a("0x64EaC61A2DFda2c3Fa04eED49AA33D021AeC8838")),
                    ("USDT", a("0x0bF499444525a23E7Bb61997539725cA2e928138")),
                    ("WBTC", a("0xF7904a295A029a3aBDFFB6F12755974a958C7C25")),
                ]),
            ),
        ]),
        reserves: BTreeMap::from([
            ("DAI", rates::dai_reserve()),
            ("USDC", rates::usdc_reserve()),
            ("USDT", rates::usdt_reserve()),
            ("WETH", rates::weth_reserve()),
            ("WBTC", rates::wbtc_reserve()),
        ]),
        reserve_rewards: BTreeMap::from([
            (
                "DAI",
                ReserveRewards {
                    deposit: Some(RewardShare::new(300, 30000)),
                    variable_debt: Some(RewardShare::new(100, 0)),
                    stable_debt: None,
                    stake: Some(RewardShare::new(200, 30000)),
                },
            ),
            (
                "USDC",
                ReserveRewards {
                    deposit: Some(RewardShare::new(400, 30000)),
                    variable_debt: Some(RewardShare::new(100, 0)),
                    stable_debt: None,
                    stake: Some(RewardShare::new(200, 30000)),
                },
            ),
            (
                "WETH",
                ReserveRewards {
                    deposit: Some(RewardShare::new(300, 30000)),
                    variable_debt: Some(RewardShare::new(100, 0)),
                    stable_debt: None,
                    stake: Some(RewardShare::new(200, 30000)),
                },
            ),
            (
                "WBTC",
                ReserveRewards {
                    deposit: Some(RewardShare::new(100, 0)),
                    variable_debt: None,
                    stable_debt: None,
                    stake: None,
                },
            ),
        ]),
        stake_tokens: BTreeMap::from([
            ("DAI", StakeParams::default_deposit(false)),
            ("USDC", StakeParams::default_deposit(false)),
            ("WETH", StakeParams::default_deposit(false)),
            (
                "WBTC",
                StakeParams {
                    mode: StakeMode::Underlying,
                    optional: true,
                    ..StakeParams::default_deposit(true)
                },
            ),
        ]),
        reward_params: RewardParams {
            emission_per_second: U256::exp10(16), // 0.01 AGF/s
            boost_pool_points: 3000,
            unlock_points: 2000,
        },
        reward_stake: RewardStakeParams {
            cooldown_period: 60 * 60 * 24 * 28, // 4 weeks
            unstake_period: 60 * 60 * 24 * 7,   // 1 week
            boost_pool_supply: eth(1_000_000),
        },
        reward_token_name: "Augmented Finance Reward Token",
        reward_token_symbol: "AGF",
        reward_stake_token_name: "Augmented Finance Locked Reward Token",
        reward_stake_token_symbol: "xAGF",
        test_token_supply: eth(1_000_000_000),
        mock_prices: BTreeMap::from([
            ("DAI", U256::from(385_000_000_000_000u64)),
            ("USDC", U256::from(385_000_000_000_000u64)),
            ("USDT", U256::from(385_000_000_000_000u64)),
            ("WETH", U256::exp10(18)),
            ("WBTC", U256::exp10(18) * 16u64),
        ]),
    }
}

fn augmented_market() -> PoolConfiguration {
    PoolConfiguration {
        market_id: "Augmented genesis market",
        provider_id: 1,
        ..commons()
    }
}

fn test_market() -> PoolConfiguration {
    let base = commons();
    PoolConfiguration {
        market_id: "Augmented test market",
        provider_id: 1000,
        reserves: base
            .reserves
            .iter()
            .filter(|(symbol, _)| ["DAI", "USDC", "WETH"].contains(*symbol))
            .map(|(symbol, params)| (*symbol, params.clone()))
            .collect(),
        test_token_supply: eth(1_000_000),
        ..base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_addresses_parse() {
        // Building the configs parses every address literal.
        for name in ["augmented", "test"] {
            load_pool_config(name).unwrap();
        }
    }

    #[test]
    fn test_unsupported_pool_name_is_an_error() {
        assert!(load_pool_config("nope").is_err());
    }

    #[test]
    fn test_market_overrides_keep_commons_data() {
        let market = augmented_market();
        assert_eq!(market.market_id, "Augmented genesis market");
        assert_eq!(market.provider_id, 1);
        // Inherited from commons untouched.
        assert!(market.reserves.contains_key("WBTC"));
        assert_eq!(market.reward_token_symbol, "AGF");
    }

    #[test]
    fn test_test_market_trims_reserves() {
        let market = test_market();
        assert_eq!(
            market.reserves.keys().copied().collect::<Vec<_>>(),
            vec!["DAI", "USDC", "WETH"]
        );
        assert!(market.reserve_assets.get(Network::Local, false).is_some());
    }

    #[test]
    fn test_reserve_asset_honors_fork_collapse() {
        let market = augmented_market();
        let kovan_dai = market.reserve_asset(Network::Kovan, false, "DAI").unwrap();
        let forked_dai = market.reserve_asset(Network::Kovan, true, "DAI").unwrap();
        let mainnet_dai = market.reserve_asset(Network::Mainnet, false, "DAI").unwrap();
        assert_ne!(kovan_dai, mainnet_dai);
        assert_eq!(forked_dai, mainnet_dai);
    }

    #[test]
    fn test_every_rewarded_symbol_is_a_reserve() {
        let market = augmented_market();
        for symbol in market.reserve_rewards.keys() {
            assert!(
                market.reserves.contains_key(symbol),
                "reward entry without reserve: {}",
                symbol
            );
        }
        for symbol in market.stake_tokens.keys() {
            assert!(
                market.reserves.contains_key(symbol),
                "stake entry without reserve: {}",
                symbol
            );
        }
    }
}
