//! CLI command implementations

pub mod catalog;
pub mod download;
pub mod error;

pub use catalog::CatalogCommand;
pub use download::{Cli, Commands, DownloadArgs, OutputFormat};
pub use error::CliError;
