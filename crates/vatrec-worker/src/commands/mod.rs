//! CLI subcommands.

pub mod config;
pub mod matching;
pub mod process;
pub mod worker;

use std::path::Path;

use vatrec_core::VatrecConfig;

/// Load the config file if one was given, defaults otherwise.
pub fn load_config(path: Option<&str>) -> anyhow::Result<VatrecConfig> {
    match path {
        Some(path) => Ok(VatrecConfig::from_file(Path::new(path))?),
        None => Ok(VatrecConfig::default()),
    }
}
