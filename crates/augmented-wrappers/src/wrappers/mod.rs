pub mod agf_token;
pub mod ierc20_detailed;
pub mod lending_pool;
pub mod lending_pool_configurator;
pub mod lending_rate_oracle;
pub mod market_access_controller;
pub mod oracle_router;
pub mod protocol_data_provider;
pub mod reward_configurator;
pub mod reward_controller;
pub mod stake_configurator;
pub mod static_price_oracle;
