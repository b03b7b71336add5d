use ethers::prelude::abigen;

abigen!(
    MarketAccessController,
    r#"[
        function setMarketId(string marketId)
        function getMarketId() external view returns (string)
        function grantRoles(address addr, uint256 flags) external returns (uint256)
        function revokeRoles(address addr, uint256 flags) external returns (uint256)
        function queryAccessControlMask(address addr, uint256 filter) external view returns (uint256)
        function setAddress(uint256 id, address newAddress)
        function getAddress(uint256 id) external view returns (address)
        function setAddressAsProxy(uint256 id, address implementation)
        function getLendingPool() external view returns (address)
        function setTemporaryAdmin(address admin, uint32 expiryBlocks)
        function getTemporaryAdmin() external view returns (address)
        function renounceTemporaryAdmin()
        function setAnyRoleMode(bool blocked)
        event ProxyCreated(uint256 indexed id, address indexed newAddress)
        event AddressSet(uint256 indexed id, address indexed newAddress, bool hasProxy)
    ]"#
);
