use ethers::prelude::abigen;

abigen!(
    RewardController,
    r#"[
        function updateBaseline(uint256 baseline)
        function getPools() external view returns (address[])
        function setBoostPool(address pool)
        function getBoostPool() external view returns (address)
        function claimReward() external returns (uint256, uint256)
    ]"#
);
