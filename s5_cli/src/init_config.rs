use std::{fs, io::Write, path::Path};

use anyhow::Context;
use clap::Subcommand;
use rand::RngCore;
use toml_edit::{DocumentMut, Item, Table};
use tracing::info;

use crate::helpers::DEFAULT_PORTAL_URL;

#[derive(Subcommand)]
pub enum CmdConfig {
    /// Creates the portal config file if it doesn't exist and generates a
    /// registry secret key
    Init,
}

impl CmdConfig {
    pub fn run(self, config_file: &Path, portal: Option<&str>) -> anyhow::Result<()> {
        let mut doc = if config_file.exists() {
            fs::read_to_string(config_file)?
        } else {
            if let Some(parent) = config_file.parent() {
                fs::create_dir_all(parent)?;
            }
            String::new()
        }
        .parse::<DocumentMut>()
        .context("could not parse portal config file")?;

        match self {
            Self::Init => {
                let secretkey_file = config_file.with_extension("secretkey");
                let secretkey_name = secretkey_file
                    .file_name()
                    .and_then(|name| name.to_str())
                    .context("secret key path is not valid utf-8")?;
                doc.insert("secret_key_file", secretkey_name.into());

                let portal_table = doc
                    .entry("portal")
                    .or_insert(Item::Table(Table::new()))
                    .as_table_mut()
                    .context("`portal` in config file is not a table")?;
                match portal {
                    Some(url) => {
                        portal_table.insert("url", url.into());
                    }
                    None if !portal_table.contains_key("url") => {
                        portal_table.insert("url", DEFAULT_PORTAL_URL.into());
                    }
                    None => {}
                }

                if !secretkey_file.exists() {
                    info!("generating secure random registry secret key");
                    let mut bytes = [0u8; 32];
                    rand::rng().fill_bytes(&mut bytes);
                    fs::write(&secretkey_file, bytes)?;
                }
            }
        }

        info!("writing to config file {config_file:?}");

        let tmp_path = config_file.with_extension("tmp");
        let mut tmp = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;
        tmp.write_all(doc.to_string().as_bytes())?;
        tmp.sync_all()?;
        fs::rename(&tmp_path, config_file)?;
        Ok(())
    }
}
