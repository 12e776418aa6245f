#![warn(clippy::unwrap_used)]

pub mod config;
pub mod error;
pub mod parser;
pub mod settings;

pub use config::*;
pub use error::*;
pub use parser::*;
pub use settings::*;
