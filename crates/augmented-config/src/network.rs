use std::{collections::BTreeMap, fmt, str::FromStr};

use eyre::{bail, Result};
use serde::{Deserialize, Serialize};

/// The networks the deployment tooling knows how to talk to. The dev
/// variants (`Local`, `Fork`) are backed by an in-process anvil node.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    Mainnet,
    Ropsten,
    Rinkeby,
    Kovan,
    Goerli,
    Bsc,
    BscTestnet,
    Avalanche,
    Fuji,
    Polygon,
    Mumbai,
    Arbitrum,
    ArbitrumTestnet,
    Optimism,
    OptimismTestnet,
    Fantom,
    FantomTestnet,
    Gnosis,
    Local,
    Fork,
}

/// API keys for the hosted RPC providers, read from the environment by the
/// binaries and threaded through explicitly.
#[derive(Clone, Debug, Default)]
pub struct ProviderKeys {
    pub infura: Option<String>,
    pub alchemy: Option<String>,
}

impl Network {
    pub const ALL: &'static [Network] = &[
        Network::Mainnet,
        Network::Ropsten,
        Network::Rinkeby,
        Network::Kovan,
        Network::Goerli,
        Network::Bsc,
        Network::BscTestnet,
        Network::Avalanche,
        Network::Fuji,
        Network::Polygon,
        Network::Mumbai,
        Network::Arbitrum,
        Network::ArbitrumTestnet,
        Network::Optimism,
        Network::OptimismTestnet,
        Network::Fantom,
        Network::FantomTestnet,
        Network::Gnosis,
        Network::Local,
        Network::Fork,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "main",
            Network::Ropsten => "ropsten",
            Network::Rinkeby => "rinkeby",
            Network::Kovan => "kovan",
            Network::Goerli => "goerli",
            Network::Bsc => "bsc",
            Network::BscTestnet => "bsc-testnet",
            Network::Avalanche => "avalanche",
            Network::Fuji => "fuji",
            Network::Polygon => "polygon",
            Network::Mumbai => "mumbai",
            Network::Arbitrum => "arbitrum",
            Network::ArbitrumTestnet => "arbitrum-testnet",
            Network::Optimism => "optimism",
            Network::OptimismTestnet => "optimism-testnet",
            Network::Fantom => "fantom",
            Network::FantomTestnet => "fantom-testnet",
            Network::Gnosis => "gnosis",
            Network::Local => "local",
            Network::Fork => "fork",
        }
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Ropsten => 3,
            Network::Rinkeby => 4,
            Network::Kovan => 42,
            Network::Goerli => 5,
            Network::Bsc => 56,
            Network::BscTestnet => 97,
            Network::Avalanche => 43114,
            Network::Fuji => 43113,
            Network::Polygon => 137,
            Network::Mumbai => 80001,
            Network::Arbitrum => 42161,
            Network::ArbitrumTestnet => 421611,
            Network::Optimism => 10,
            Network::OptimismTestnet => 69,
            Network::Fantom => 250,
            Network::FantomTestnet => 4002,
            Network::Gnosis => 100,
            Network::Local | Network::Fork => 31337,
        }
    }

    /// True for networks where mock assets may be deployed in place of
    /// missing reserve addresses.
    pub fn is_test(&self) -> bool {
        matches!(
            self,
            Network::Ropsten
                | Network::Rinkeby
                | Network::Kovan
                | Network::Goerli
                | Network::BscTestnet
                | Network::Fuji
                | Network::Mumbai
                | Network::ArbitrumTestnet
                | Network::OptimismTestnet
                | Network::FantomTestnet
                | Network::Local
                | Network::Fork
        )
    }

    /// Default gas price in gwei. `None` lets the node price the
    /// transaction.
    pub fn default_gas_price_gwei(&self) -> Option<u64> {
        match self {
            Network::Mainnet => None,
            Network::Bsc => Some(5),
            Network::Polygon => Some(35),
            Network::Avalanche => Some(26),
            Network::Fantom => Some(100),
            _ => Some(2),
        }
    }

    /// The RPC endpoint for the network, preferring Alchemy over Infura
    /// where both are configured.
    pub fn rpc_url(&self, keys: &ProviderKeys) -> Result<String> {
        let infura = |net: &str| -> Result<String> {
            match &keys.infura {
                Some(key) => Ok(format!("https://{}.infura.io/v3/{}", net, key)),
                None => bail!("INFURA_KEY is required to reach {}", self.name()),
            }
        };
        match self {
            Network::Mainnet => {
                if let Some(key) = &keys.alchemy {
                    Ok(format!("https://eth-mainnet.alchemyapi.io/v2/{}", key))
                } else {
                    infura("mainnet")
                }
            }
            Network::Ropsten => infura("ropsten"),
            Network::Rinkeby => infura("rinkeby"),
            Network::Kovan => infura("kovan"),
            Network::Goerli => infura("goerli"),
            Network::Bsc => Ok("https://bsc-dataseed.binance.org".to_string()),
            Network::BscTestnet => {
                Ok("https://data-seed-prebsc-1-s1.binance.org:8545".to_string())
            }
            Network::Avalanche => Ok("https://api.avax.network/ext/bc/C/rpc".to_string()),
            Network::Fuji => Ok("https://api.avax-test.network/ext/bc/C/rpc".to_string()),
            Network::Polygon => infura("polygon-mainnet"),
            Network::Mumbai => infura("polygon-mumbai"),
            Network::Arbitrum => infura("arbitrum-mainnet"),
            Network::ArbitrumTestnet => infura("arbitrum-rinkeby"),
            Network::Optimism => infura("optimism-mainnet"),
            Network::OptimismTestnet => infura("optimism-kovan"),
            Network::Fantom => Ok("https://rpc.ftm.tools".to_string()),
            Network::FantomTestnet => Ok("https://rpc.testnet.fantom.network".to_string()),
            Network::Gnosis => Ok("https://rpc.gnosischain.com".to_string()),
            Network::Local | Network::Fork => Ok("http://127.0.0.1:8545".to_string()),
        }
    }

    /// The block explorer verification API endpoint, where one exists.
    pub fn explorer_api_url(&self) -> Option<&'static str> {
        match self {
            Network::Mainnet => Some("https://api.etherscan.io/api"),
            Network::Ropsten => Some("https://api-ropsten.etherscan.io/api"),
            Network::Rinkeby => Some("https://api-rinkeby.etherscan.io/api"),
            Network::Kovan => Some("https://api-kovan.etherscan.io/api"),
            Network::Goerli => Some("https://api-goerli.etherscan.io/api"),
            Network::Bsc => Some("https://api.bscscan.com/api"),
            Network::BscTestnet => Some("https://api-testnet.bscscan.com/api"),
            Network::Avalanche => Some("https://api.snowtrace.io/api"),
            Network::Fuji => Some("https://api-testnet.snowtrace.io/api"),
            Network::Polygon => Some("https://api.polygonscan.com/api"),
            Network::Mumbai => Some("https://api-testnet.polygonscan.com/api"),
            Network::Arbitrum => Some("https://api.arbiscan.io/api"),
            Network::Fantom => Some("https://api.ftmscan.com/api"),
            _ => None,
        }
    }

    /// The human-facing explorer root, used by the proxy-checker form
    /// fallback.
    pub fn explorer_url(&self) -> Option<&'static str> {
        match self {
            Network::Mainnet => Some("https://etherscan.io"),
            Network::Ropsten => Some("https://ropsten.etherscan.io"),
            Network::Rinkeby => Some("https://rinkeby.etherscan.io"),
            Network::Kovan => Some("https://kovan.etherscan.io"),
            Network::Goerli => Some("https://goerli.etherscan.io"),
            Network::Bsc => Some("https://bscscan.com"),
            Network::BscTestnet => Some("https://testnet.bscscan.com"),
            Network::Polygon => Some("https://polygonscan.com"),
            Network::Mumbai => Some("https://mumbai.polygonscan.com"),
            Network::Arbitrum => Some("https://arbiscan.io"),
            Network::Fantom => Some("https://ftmscan.com"),
            _ => None,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        for network in Network::ALL {
            if network.name() == s {
                return Ok(*network);
            }
        }
        bail!("unknown network: {}", s)
    }
}

/// A partial per-network parameter table. Lookups collapse to the mainnet
/// entry when the deployment runs against a mainnet fork, so fork runs see
/// production parameters regardless of the network they were invoked as.
#[derive(Clone, Debug, Default)]
pub struct PerNetwork<T>(BTreeMap<Network, T>);

impl<T> PerNetwork<T> {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, network: Network, value: T) -> Self {
        self.0.insert(network, value);
        self
    }

    pub fn get(&self, network: Network, mainnet_fork: bool) -> Option<&T> {
        let key = if mainnet_fork { Network::Mainnet } else { network };
        self.0.get(&key)
    }
}

impl<T, const N: usize> From<[(Network, T); N]> for PerNetwork<T> {
    fn from(entries: [(Network, T); N]) -> Self {
        Self(BTreeMap::from(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_lookup_collapses_to_mainnet_on_fork() {
        let table = PerNetwork::from([
            (Network::Mainnet, "production"),
            (Network::Kovan, "staging"),
        ]);
        assert_eq!(table.get(Network::Kovan, false), Some(&"staging"));
        assert_eq!(table.get(Network::Kovan, true), Some(&"production"));
        assert_eq!(table.get(Network::Mumbai, true), Some(&"production"));
        assert_eq!(table.get(Network::Mumbai, false), None);
    }

    #[test]
    fn test_network_names_round_trip() {
        for network in Network::ALL {
            assert_eq!(network.name().parse::<Network>().unwrap(), *network);
        }
    }
}
