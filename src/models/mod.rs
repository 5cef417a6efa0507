pub mod config;
pub mod provider;
pub mod transfer;

pub use config::*;
pub use provider::*;
pub use transfer::*;
