use ethers::prelude::abigen;

abigen!(
    AgfToken,
    r#"[
        function balanceOf(address account) external view returns (uint256)
        function totalSupply() external view returns (uint256)
        function symbol() external view returns (string)
    ]"#
);
