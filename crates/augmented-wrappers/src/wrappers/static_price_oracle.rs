use ethers::prelude::abigen;

abigen!(
    StaticPriceOracle,
    r#"[
        function setAssetPrice(address asset, uint256 price)
        function getAssetPrice(address asset) external view returns (uint256)
    ]"#
);
