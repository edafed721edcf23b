use std::path::PathBuf;

use anyhow::{Context, Result};
use s5_core::{Cid, RequestOptions};

use crate::helpers::CliConfig;

pub async fn run_upload(config: &CliConfig, path: PathBuf) -> Result<()> {
    let client = config.portal_client()?;
    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let size = bytes.len();
    let cid = client
        .upload_bytes(bytes, &RequestOptions::default())
        .await
        .context("failed to upload blob")?;
    println!("uploaded blob: cid={cid} size={size}");
    Ok(())
}

pub async fn run_download(config: &CliConfig, cid: &str, out: PathBuf) -> Result<()> {
    let client = config.portal_client()?;
    let cid = Cid::parse(cid.trim()).with_context(|| format!("invalid cid '{cid}'"))?;
    let bytes = client
        .download_bytes(&cid, &RequestOptions::default())
        .await
        .context("failed to download blob")?;
    tokio::fs::write(&out, &bytes)
        .await
        .with_context(|| format!("failed to write to {}", out.display()))?;
    println!("downloaded {} bytes to {}", bytes.len(), out.display());
    Ok(())
}
