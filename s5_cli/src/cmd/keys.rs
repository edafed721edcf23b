use std::path::Path;

use anyhow::Result;

use crate::KeysCmd;
use crate::helpers::{CliConfig, load_keypair};

pub fn run_keys(cmd: KeysCmd, config_file: &Path, config: &CliConfig) -> Result<()> {
    match cmd {
        KeysCmd::Show => {
            let public_key = load_keypair(config_file, config)?.public_key();
            println!("public key: {public_key}");
            println!("hex: {}", hex::encode(public_key.to_tagged_bytes()));
        }
    }
    Ok(())
}
