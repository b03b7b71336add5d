use std::ops::BitOr;

use ethers::types::U256;

/// Role bits understood by the on-chain access controller. The controller
/// stores roles and well-known contract addresses in one uint256 space;
/// roles occupy the low bits.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u64)]
pub enum RoleFlag {
    EmergencyAdmin = 1 << 0,
    PoolAdmin = 1 << 1,
    TreasuryAdmin = 1 << 2,
    RewardConfigAdmin = 1 << 3,
    RewardRateAdmin = 1 << 4,
    StakeAdmin = 1 << 5,
    ReferralAdmin = 1 << 6,
    LendingRateAdmin = 1 << 7,
    SweepAdmin = 1 << 8,
    OracleAdmin = 1 << 9,
}

/// Address-slot identifiers of the access controller. These share the
/// controller's numeric space with [`RoleFlag`] but identify stored
/// contract addresses (and, for the proxy-backed ones, proxy creation
/// slots) rather than grants.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u64)]
pub enum AddressSlot {
    LendingPool = 1 << 16,
    LendingPoolConfigurator = 1 << 17,
    LiquidityController = 1 << 18,
    Treasury = 1 << 19,
    RewardToken = 1 << 20,
    RewardStakeToken = 1 << 21,
    RewardController = 1 << 22,
    RewardConfigurator = 1 << 23,
    StakeConfigurator = 1 << 24,
    ReferralRegistry = 1 << 25,
    WethGateway = 1 << 26,
    DataHelper = 1 << 27,
    PriceOracle = 1 << 28,
    LendingRateOracle = 1 << 29,
}

impl RoleFlag {
    pub fn bits(self) -> u64 {
        self as u64
    }
}

impl AddressSlot {
    pub fn bits(self) -> u64 {
        self as u64
    }

    pub fn to_u256(self) -> U256 {
        U256::from(self.bits())
    }

    /// Slots whose contents are installed behind a transparent proxy by the
    /// controller, as opposed to plain address registrations.
    pub fn is_proxied(self) -> bool {
        matches!(
            self,
            AddressSlot::LendingPool
                | AddressSlot::LendingPoolConfigurator
                | AddressSlot::Treasury
                | AddressSlot::RewardController
                | AddressSlot::StakeConfigurator
                | AddressSlot::RewardConfigurator
        )
    }
}

/// A union of role bits, built up for a single grant call.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RoleSet(u64);

impl RoleSet {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn with(mut self, role: RoleFlag) -> Self {
        self.0 |= role.bits();
        self
    }

    pub fn contains(&self, role: RoleFlag) -> bool {
        self.0 & role.bits() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn bits(&self) -> u64 {
        self.0
    }

    pub fn to_u256(&self) -> U256 {
        U256::from(self.0)
    }
}

impl From<RoleFlag> for RoleSet {
    fn from(role: RoleFlag) -> Self {
        RoleSet::new().with(role)
    }
}

impl BitOr<RoleFlag> for RoleSet {
    type Output = RoleSet;

    fn bitor(self, rhs: RoleFlag) -> RoleSet {
        self.with(rhs)
    }
}

impl BitOr for RoleFlag {
    type Output = RoleSet;

    fn bitor(self, rhs: RoleFlag) -> RoleSet {
        RoleSet::new().with(self).with(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ROLES: &[RoleFlag] = &[
        RoleFlag::EmergencyAdmin,
        RoleFlag::PoolAdmin,
        RoleFlag::TreasuryAdmin,
        RoleFlag::RewardConfigAdmin,
        RoleFlag::RewardRateAdmin,
        RoleFlag::StakeAdmin,
        RoleFlag::ReferralAdmin,
        RoleFlag::LendingRateAdmin,
        RoleFlag::SweepAdmin,
        RoleFlag::OracleAdmin,
    ];

    const ALL_SLOTS: &[AddressSlot] = &[
        AddressSlot::LendingPool,
        AddressSlot::LendingPoolConfigurator,
        AddressSlot::LiquidityController,
        AddressSlot::Treasury,
        AddressSlot::RewardToken,
        AddressSlot::RewardStakeToken,
        AddressSlot::RewardController,
        AddressSlot::RewardConfigurator,
        AddressSlot::StakeConfigurator,
        AddressSlot::ReferralRegistry,
        AddressSlot::WethGateway,
        AddressSlot::DataHelper,
        AddressSlot::PriceOracle,
        AddressSlot::LendingRateOracle,
    ];

    #[test]
    fn test_flags_are_disjoint_powers_of_two() {
        let mut seen = 0u64;
        for role in ALL_ROLES {
            assert!(role.bits().is_power_of_two());
            assert_eq!(seen & role.bits(), 0, "overlapping role bit: {:?}", role);
            seen |= role.bits();
        }
        for slot in ALL_SLOTS {
            assert!(slot.bits().is_power_of_two());
            assert_eq!(seen & slot.bits(), 0, "overlapping slot bit: {:?}", slot);
            seen |= slot.bits();
        }
    }

    #[test]
    fn test_role_set_union() {
        let set = RoleFlag::PoolAdmin | RoleFlag::StakeAdmin | RoleFlag::OracleAdmin;
        assert!(set.contains(RoleFlag::PoolAdmin));
        assert!(set.contains(RoleFlag::StakeAdmin));
        assert!(!set.contains(RoleFlag::EmergencyAdmin));
        assert_eq!(
            set.to_u256(),
            U256::from((1u64 << 1) | (1 << 5) | (1 << 9))
        );
    }
}
