//! HTTP surface
//!
//! - `POST /api/get-firebase-token`: session token for a wallet
//! - `POST /api/sync`: run one reconciliation pass
//! - `GET /api/campaigns/:address/stats`: live contribution statistics
//! - `GET /api/health`
pub mod routes;
pub mod server;
pub mod state;
pub mod utils;

pub use server::start_server;
pub use state::AppState;
