use ethers::types::U256;

/// The share of overall reward emission assigned to one pool, plus an
/// optional boost multiplier applied by the booster for locked xAGF.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RewardShare {
    /// Basis points of the total emission rate.
    pub base_points: u16,
    /// Boost factor in basis points; 0 disables boosting for the pool.
    pub boost_factor: u16,
}

impl RewardShare {
    pub fn new(base_points: u16, boost_factor: u16) -> Self {
        Self {
            base_points,
            boost_factor,
        }
    }
}

/// Reward emission for one reserve, split across the token kinds that can
/// accrue rewards. `None` means no pool is created for that token kind.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ReserveRewards {
    pub deposit: Option<RewardShare>,
    pub variable_debt: Option<RewardShare>,
    pub stable_debt: Option<RewardShare>,
    pub stake: Option<RewardShare>,
}

/// Market-wide reward parameters.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardParams {
    /// Total emission per second, wei-scaled AGF.
    pub emission_per_second: U256,
    /// Share of emission reserved for the xAGF boost pool, basis points.
    pub boost_pool_points: u16,
    /// Unlocked share of claimed rewards, basis points; the rest vests.
    pub unlock_points: u16,
}
