#[macro_use]
extern crate lazy_static;

pub mod artifacts;
pub mod audit;
pub mod calls;
pub mod chain;
pub mod context;
pub mod deploy;
pub mod env;
pub mod init;
pub mod registry;
pub mod setup;
pub mod steps;
pub mod verify;
