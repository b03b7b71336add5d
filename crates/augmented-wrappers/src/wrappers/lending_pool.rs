use ethers::prelude::abigen;

abigen!(
    LendingPool,
    r#"[
        function initialize(address provider)
        function getReservesList() external view returns (address[])
        function getReserveNormalizedIncome(address asset) external view returns (uint256)
        function setPause(bool paused)
        function isPaused() external view returns (bool)
    ]"#
);
