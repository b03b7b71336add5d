use ethers::prelude::abigen;

abigen!(
    ProtocolDataProvider,
    r#"[
        struct TokenData { string symbol; address token; }
        function getAllReservesTokens() external view returns (TokenData[])
        function getReserveTokensAddresses(address asset) external view returns (address, address, address)
    ]"#
);
