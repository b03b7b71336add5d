use ethers::types::U256;

lazy_static! {
    /// One percent, ray-scaled (1e27 == 100%).
    pub static ref PCT: U256 = U256::exp10(25);
}

/// A percentage expressed in ray units.
pub fn pct(value: u64) -> U256 {
    *PCT * value
}

/// Interest-rate strategy parameters for a single reserve, ray-scaled.
/// These are constructor arguments for the on-chain strategy contract; the
/// curve itself is evaluated on-chain.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RateStrategy {
    pub name: &'static str,
    pub optimal_utilization: U256,
    pub base_variable_rate: U256,
    pub variable_slope1: U256,
    pub variable_slope2: U256,
    pub stable_slope1: U256,
    pub stable_slope2: U256,
}

pub fn stable_asset_strategy() -> RateStrategy {
    RateStrategy {
        name: "rateStrategyStable",
        optimal_utilization: pct(90),
        base_variable_rate: U256::zero(),
        variable_slope1: pct(4),
        variable_slope2: pct(60),
        stable_slope1: pct(2),
        stable_slope2: pct(60),
    }
}

pub fn volatile_asset_strategy() -> RateStrategy {
    RateStrategy {
        name: "rateStrategyVolatile",
        optimal_utilization: pct(65),
        base_variable_rate: U256::zero(),
        variable_slope1: pct(8),
        variable_slope2: pct(300),
        stable_slope1: pct(10),
        stable_slope2: pct(300),
    }
}

pub fn weth_strategy() -> RateStrategy {
    RateStrategy {
        name: "rateStrategyWETH",
        optimal_utilization: pct(65),
        base_variable_rate: U256::zero(),
        variable_slope1: pct(8),
        variable_slope2: pct(100),
        stable_slope1: pct(10),
        stable_slope2: pct(100),
    }
}

/// Per-reserve market parameters. Percent-like fields use basis points to
/// match the configurator's uint16 inputs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReserveParams {
    pub strategy: RateStrategy,
    pub decimals: u8,
    /// Loan-to-value, in basis points.
    pub base_ltv: u16,
    pub liquidation_threshold: u16,
    pub liquidation_bonus: u16,
    pub borrowing_enabled: bool,
    pub stable_borrowing_enabled: bool,
    pub reserve_factor: u16,
    /// Missing address entries are an error unless the reserve is optional.
    pub optional: bool,
}

pub fn dai_reserve() -> ReserveParams {
    ReserveParams {
        strategy: stable_asset_strategy(),
        decimals: 18,
        base_ltv: 7500,
        liquidation_threshold: 8000,
        liquidation_bonus: 10500,
        borrowing_enabled: true,
        stable_borrowing_enabled: true,
        reserve_factor: 1000,
        optional: false,
    }
}

pub fn usdc_reserve() -> ReserveParams {
    ReserveParams {
        decimals: 6,
        ..dai_reserve()
    }
}

pub fn usdt_reserve() -> ReserveParams {
    ReserveParams {
        decimals: 6,
        base_ltv: 0,
        liquidation_threshold: 0,
        liquidation_bonus: 0,
        borrowing_enabled: true,
        stable_borrowing_enabled: false,
        reserve_factor: 1000,
        optional: true,
        strategy: stable_asset_strategy(),
    }
}

pub fn weth_reserve() -> ReserveParams {
    ReserveParams {
        strategy: weth_strategy(),
        decimals: 18,
        base_ltv: 8000,
        liquidation_threshold: 8250,
        liquidation_bonus: 10500,
        borrowing_enabled: true,
        stable_borrowing_enabled: true,
        reserve_factor: 1000,
        optional: false,
    }
}

pub fn wbtc_reserve() -> ReserveParams {
    ReserveParams {
        strategy: volatile_asset_strategy(),
        decimals: 8,
        base_ltv: 7000,
        liquidation_threshold: 7500,
        liquidation_bonus: 11000,
        borrowing_enabled: true,
        stable_borrowing_enabled: true,
        reserve_factor: 2000,
        optional: true,
    }
}
