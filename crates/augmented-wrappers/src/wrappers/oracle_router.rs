use ethers::prelude::abigen;

abigen!(
    OracleRouter,
    r#"[
        function setAssetSources(address[] assets, address[] sources)
        function getAssetPrice(address asset) external view returns (uint256)
        function getSourceOfAsset(address asset) external view returns (address)
        function getFallbackOracle() external view returns (address)
    ]"#
);
