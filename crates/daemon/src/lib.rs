//! Warden daemon: token provider startup, the token regeneration service and
//! the database credential command

pub mod config;
pub mod credentials;
pub mod error;
pub mod server;
pub mod startup;

pub use config::{SecurityConfig, Settings};
pub use error::{DaemonError, Result};
