use std::path::PathBuf;

use ethers::signers::{coins_bip39::English, LocalWallet, MnemonicBuilder};
use eyre::{bail, Result};
use serde::Deserialize;

use augmented_config::network::ProviderKeys;

/// Deployment settings read from the environment (and `.env`). Field names
/// map 1:1 to the upper-cased variable names.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DeployEnv {
    pub mnemonic: Option<String>,
    pub private_key: Option<String>,
    pub infura_key: Option<String>,
    pub alchemy_key: Option<String>,
    pub etherscan_key: Option<String>,
    #[serde(default)]
    pub mainnet_fork: bool,
    pub mainnet_fork_block_number: Option<u64>,
    /// Gas price override in gwei.
    pub gas_price: Option<u64>,
    /// Directory holding the compiled contract artifacts.
    pub augmented_artifacts_dir: Option<PathBuf>,
}

impl DeployEnv {
    pub fn load() -> Result<Self> {
        // A missing .env file is fine; the variables may come from the
        // environment proper.
        dotenvy::dotenv().ok();
        Ok(envy::from_env()?)
    }

    pub fn provider_keys(&self) -> ProviderKeys {
        ProviderKeys {
            infura: self.infura_key.clone(),
            alchemy: self.alchemy_key.clone(),
        }
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        self.augmented_artifacts_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("./artifacts"))
    }

    /// The deployer account, from `PRIVATE_KEY` or derived from `MNEMONIC`
    /// at the given index.
    pub fn wallet(&self, index: u32) -> Result<LocalWallet> {
        if let Some(key) = &self.private_key {
            if index > 0 {
                bail!("secondary accounts require MNEMONIC, not PRIVATE_KEY");
            }
            return Ok(key.parse::<LocalWallet>()?);
        }
        let Some(mnemonic) = &self.mnemonic else {
            bail!("either MNEMONIC or PRIVATE_KEY must be set");
        };
        let wallet = MnemonicBuilder::<English>::default()
            .phrase(mnemonic.as_str())
            .index(index)?
            .build()?;
        Ok(wallet)
    }
}
