use std::path::PathBuf;

use anyhow::Result;

use crate::helpers::{CliConfig, Overrides};

mod content;
mod keys;
mod registry;

pub use content::{run_download, run_upload};
pub use keys::run_keys;
pub use registry::run_registry;

pub async fn run_command(
    config_file: PathBuf,
    overrides: Overrides,
    cmd: crate::Commands,
) -> Result<()> {
    let load = || CliConfig::load_with_overrides(&config_file, &overrides);

    match cmd {
        crate::Commands::Config { cmd } => cmd.run(&config_file, overrides.portal.as_deref()),
        crate::Commands::Keys { cmd } => run_keys(cmd, &config_file, &load()?),
        crate::Commands::Registry { cmd } => run_registry(cmd, &config_file, &load()?).await,
        crate::Commands::Upload { path } => run_upload(&load()?, path).await,
        crate::Commands::Download { cid, out } => run_download(&load()?, &cid, out).await,
    }
}
