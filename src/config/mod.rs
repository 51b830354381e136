//! JSON runtime configuration for the command-line tools.

pub mod fusion;

pub use fusion::{load_config, parse_cli, ModelsConfig, OutputConfig, OutputFormat, RuntimeConfig};
