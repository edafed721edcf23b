use std::path::Path;

use anyhow::{Context, Result};
use s5_core::RequestOptions;
use s5_registry::CreateOutcome;
use tokio::sync::mpsc;
use tracing::info;

use crate::RegistryCmd;
use crate::helpers::{
    CliConfig, describe_entry, load_keypair, parse_registry_data, resolve_public_key,
};

pub async fn run_registry(cmd: RegistryCmd, config_file: &Path, config: &CliConfig) -> Result<()> {
    let client = config.portal_client()?;
    let options = RequestOptions::default();

    match cmd {
        RegistryCmd::Get { pk } => {
            let public_key = resolve_public_key(pk.as_deref(), config_file, config)?;
            let entry = client
                .registry()
                .get_entry(&public_key, &options)
                .await
                .context("failed to fetch registry entry")?;
            match entry {
                Some(entry) => println!("{public_key}: {}", describe_entry(&entry)),
                None => println!("{public_key}: no entry"),
            }
        }
        RegistryCmd::Set {
            data,
            hex,
            initial_revision,
        } => {
            let data = parse_registry_data(&data, hex)?;
            let keypair = load_keypair(config_file, config)?;
            let outcome = client
                .registry()
                .create_entry(&keypair, data, initial_revision, &options)
                .await
                .context("failed to update registry entry")?;
            match outcome {
                CreateOutcome::Published { entry, ack } => {
                    println!(
                        "published {}: {} (status {})",
                        entry.public_key(),
                        describe_entry(&entry),
                        ack.status
                    );
                }
                CreateOutcome::Unchanged(entry) => {
                    println!(
                        "unchanged {}: {}",
                        entry.public_key(),
                        describe_entry(&entry)
                    );
                }
            }
        }
        RegistryCmd::Subscribe { pk, no_verify } => {
            let public_key = resolve_public_key(pk.as_deref(), config_file, config)?;
            let (tx, mut rx) = mpsc::unbounded_channel();
            let subscription = client
                .subscribe(public_key, &options, !no_verify, move |entry| {
                    let _ = tx.send(entry);
                })
                .await
                .context("failed to open registry subscription")?;
            info!("watching {public_key}, press Ctrl-C to stop");

            loop {
                tokio::select! {
                    signal = tokio::signal::ctrl_c() => {
                        signal?;
                        break;
                    }
                    entry = rx.recv() => match entry {
                        Some(entry) => println!("{public_key}: {}", describe_entry(&entry)),
                        None => break,
                    }
                }
            }

            subscription.end();
            subscription
                .closed()
                .await
                .context("registry subscription failed")?;
        }
    }
    Ok(())
}
