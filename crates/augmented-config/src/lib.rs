#[macro_use]
extern crate lazy_static;

pub mod flags;
pub mod network;
pub mod pool;
pub mod rates;
pub mod rewards;
pub mod stake;
