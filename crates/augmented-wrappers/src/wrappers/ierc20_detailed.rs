use ethers::prelude::abigen;

abigen!(
    IERC20Detailed,
    r#"[
        function symbol() external view returns (string)
        function decimals() external view returns (uint8)
        function balanceOf(address account) external view returns (uint256)
        function totalSupply() external view returns (uint256)
    ]"#
);
