use ethers::prelude::abigen;

abigen!(
    StakeConfigurator,
    r#"[
        struct InitStakeData { address stakeTokenImpl; address stakedToken; string name; string symbol; uint32 cooldownPeriod; uint32 unstakePeriod; uint16 maxSlashable; uint8 stakedTokenDecimals; }
        function batchInitStakeTokens(InitStakeData[] input)
        function stakeTokenOf(address underlying) external view returns (address)
        function list() external view returns (address[])
    ]"#
);
