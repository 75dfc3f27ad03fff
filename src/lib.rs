pub mod arguments;
pub mod auth;
pub mod campaigns;
pub mod config;
pub mod display;
pub mod errors; // Structured error handling
pub mod logger;
pub mod rpc;
pub mod store;
pub mod sync;
pub mod transactions;
pub mod utils;
pub mod wallet; // Seed-phrase backups

#[cfg(feature = "web")]
pub mod webserver;
