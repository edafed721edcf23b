use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use bytes::Bytes;
use s5_core::{Cid, KeyPair, PublicKey, SignedRegistryEntry};
use s5_portal::{PortalClient, PortalConfig};
use serde::Deserialize;

pub const DEFAULT_PORTAL_URL: &str = "http://localhost:5050";

/// Command line flags that take precedence over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub portal: Option<String>,
    pub api_key: Option<String>,
}

/// Contents of `portal.toml`.
#[derive(Debug, Deserialize)]
pub struct CliConfig {
    /// Secret key file, relative to the config file's directory.
    pub secret_key_file: Option<String>,
    pub portal: PortalConfig,
}

impl CliConfig {
    pub fn load(config_file: &Path) -> Result<Self> {
        let toml_content = std::fs::read_to_string(config_file)
            .with_context(|| format!("failed to read {}", config_file.display()))?;
        toml::from_str(&toml_content)
            .with_context(|| format!("failed to parse {}", config_file.display()))
    }

    /// Loads the config file if it exists and applies `overrides`.
    ///
    /// Without a config file, `--portal` alone is enough to talk to a portal.
    pub fn load_with_overrides(config_file: &Path, overrides: &Overrides) -> Result<Self> {
        let mut config = if config_file.exists() {
            Self::load(config_file)?
        } else if let Some(url) = &overrides.portal {
            Self {
                secret_key_file: None,
                portal: PortalConfig::new(url.clone()),
            }
        } else {
            bail!(
                "no config at {}; run `s5 config init` or pass --portal",
                config_file.display()
            );
        };

        if let Some(url) = &overrides.portal {
            config.portal.url = url.clone();
        }
        if let Some(api_key) = &overrides.api_key {
            config.portal.request.api_key = Some(api_key.clone());
        }
        Ok(config)
    }

    pub fn portal_client(&self) -> Result<PortalClient> {
        PortalClient::new(self.portal.clone())
            .with_context(|| format!("invalid portal url '{}'", self.portal.url))
    }
}

fn secret_key_path(config_file: &Path, config: &CliConfig) -> Result<PathBuf> {
    let name = config
        .secret_key_file
        .as_deref()
        .context("no secret_key_file in config; run `s5 config init`")?;
    let dir = config_file.parent().unwrap_or_else(|| Path::new("."));
    Ok(dir.join(name))
}

pub fn load_keypair(config_file: &Path, config: &CliConfig) -> Result<KeyPair> {
    let path = secret_key_path(config_file, config)?;
    let bytes =
        std::fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let seed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        anyhow!(
            "secret key file {} has {} bytes, expected 32",
            path.display(),
            bytes.len()
        )
    })?;
    Ok(KeyPair::from_seed(&seed))
}

/// Resolves `--pk`, falling back to the public key of our own secret key.
pub fn resolve_public_key(
    pk: Option<&str>,
    config_file: &Path,
    config: &CliConfig,
) -> Result<PublicKey> {
    match pk {
        Some(pk) => {
            PublicKey::from_base64url(pk.trim()).with_context(|| format!("invalid public key '{pk}'"))
        }
        None => Ok(load_keypair(config_file, config)?.public_key()),
    }
}

/// Turns the `registry set` argument into entry data.
pub fn parse_registry_data(data: &str, hex: bool) -> Result<Bytes> {
    let data = data.trim();
    if hex {
        let bytes = hex::decode(data).context("failed to decode hex data")?;
        return Ok(Bytes::from(bytes));
    }
    let cid = Cid::parse(data).with_context(|| format!("invalid cid '{data}'"))?;
    Ok(Bytes::from(cid.to_registry_entry()))
}

pub fn describe_entry(entry: &SignedRegistryEntry) -> String {
    let mut out = format!(
        "revision={} data={}",
        entry.revision(),
        hex::encode(entry.data())
    );
    if let Ok(cid) = Cid::from_registry_entry(entry.data()) {
        out.push_str(&format!(" cid={cid}"));
    }
    out
}
