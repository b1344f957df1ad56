pub mod client;
pub mod commands;
pub mod error;
pub mod output;

pub use client::GatewayClient;
pub use error::{CliError, CliResult};
pub use output::OutputFormat;
