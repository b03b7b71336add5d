use ethers::prelude::abigen;

abigen!(
    LendingPoolConfigurator,
    r#"[
        struct InitReserveInput { address depositTokenImpl; address variableDebtTokenImpl; address stableDebtTokenImpl; uint8 underlyingAssetDecimals; address strategy; address underlyingAsset; address treasury; string underlyingAssetName; string depositTokenName; string depositTokenSymbol; string variableDebtTokenName; string variableDebtTokenSymbol; string stableDebtTokenName; string stableDebtTokenSymbol; }
        struct ConfigureReserveInput { address asset; uint256 baseLTV; uint256 liquidationThreshold; uint256 liquidationBonus; uint256 reserveFactor; bool borrowingEnabled; bool stableBorrowingEnabled; }
        function initialize(address provider)
        function batchInitReserve(InitReserveInput[] input)
        function configureReserves(ConfigureReserveInput[] inputParams)
    ]"#
);
