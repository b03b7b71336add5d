pub mod oracles;
pub mod reserves;
pub mod rewards;
pub mod stake;
