pub mod config;
pub mod connection;
mod coordinator;
pub mod directory;
pub mod error;
pub mod hub;
pub mod registry;
mod relay;
pub mod server;

pub use config::RelayConfig;
pub use hub::{Hub, SharedHub};
pub use server::RelayServer;
