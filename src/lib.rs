pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::http::{Credentials, ReqwestTransport};
pub use config::{ApiConfig, ClientConfig, TransportConfig};
pub use crate::core::{cancel::CancelFlag, registration::RegistrationClient};
pub use utils::error::{RegistrationError, Result, TransportError, ValidationError};
