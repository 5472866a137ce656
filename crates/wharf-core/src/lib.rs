//! wharf-core: shared foundations for the wharf gateway
//!
//! Error taxonomy and environment configuration used by every crate in the
//! workspace. Nothing here touches the network.

pub mod config;
pub mod error;

pub use config::Config;
pub use error::{Error, Result};
