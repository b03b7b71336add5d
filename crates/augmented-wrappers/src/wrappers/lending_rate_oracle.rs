use ethers::prelude::abigen;

abigen!(
    LendingRateOracle,
    r#"[
        function setMarketBorrowRate(address asset, uint256 rate)
        function getMarketBorrowRate(address asset) external view returns (uint256)
    ]"#
);
