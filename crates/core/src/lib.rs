pub mod config;
pub mod error;

pub use config::{Config, TransportKind};
pub use error::*;
