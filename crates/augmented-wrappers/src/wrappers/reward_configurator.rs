use ethers::prelude::abigen;

abigen!(
    RewardConfigurator,
    r#"[
        struct PoolInitData { address provider; string poolName; uint16 basePoints; uint32 boostFactor; }
        function batchInitRewardPools(PoolInitData[] entries)
        function list() external view returns (address[])
        function getPoolByName(string name) external view returns (address)
    ]"#
);
