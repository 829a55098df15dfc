//! Warden HTTP module
//!
//! Server side: the token regeneration route and its response envelopes.
//! Client side: the secret store client used by the credential bootstrapper.

#[cfg(feature = "server")]
#[macro_use]
extern crate tracing;

pub mod error;
pub mod types;

#[cfg(feature = "server")]
pub mod routes;
#[cfg(feature = "server")]
pub mod state;

#[cfg(feature = "client")]
pub mod client;

pub use error::{HttpError, Result};

#[cfg(feature = "server")]
pub use state::AppState;
