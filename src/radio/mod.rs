//! A module to encapsulate all things related to radio operation.
pub mod prelude;

mod si24;
pub use si24::{Si24, Si24Error};

mod config;
pub use config::{ConfigError, TransceiverConfig};
