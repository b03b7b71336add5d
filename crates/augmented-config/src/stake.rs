use ethers::types::U256;

/// How a stake token sources its underlying.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StakeMode {
    /// Stakes the reserve's deposit token.
    DepositToken,
    /// Stakes the raw underlying asset.
    Underlying,
}

/// Parameters for one stake token. Periods are in seconds; `max_slash` is
/// in basis points.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StakeParams {
    pub mode: StakeMode,
    pub cooldown_period: u32,
    pub unstake_period: u32,
    pub max_slash: u16,
    pub optional: bool,
}

impl StakeParams {
    pub fn default_deposit(optional: bool) -> Self {
        Self {
            mode: StakeMode::DepositToken,
            cooldown_period: 60 * 60 * 24 * 7, // 7 days
            unstake_period: 60 * 60 * 24 * 2,  // 2 days
            max_slash: 3000,
            optional,
        }
    }
}

/// Parameters for the staked reward token (xAGF).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardStakeParams {
    pub cooldown_period: u32,
    pub unstake_period: u32,
    /// Initial supply locked into the boost pool, wei-scaled.
    pub boost_pool_supply: U256,
}
