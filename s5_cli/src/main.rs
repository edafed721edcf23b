use crate::init_config::CmdConfig;
use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use clap_verbosity_flag::InfoLevel;
use directories::ProjectDirs;
use std::path::PathBuf;

mod cmd;
mod helpers;
mod init_config;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.config/s5/portal.toml
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Portal URL, overriding the config file
    #[arg(long, value_name = "URL", global = true)]
    portal: Option<String>,

    /// Portal API key, overriding the config file
    #[arg(long, value_name = "KEY", global = true)]
    api_key: Option<String>,

    #[command(flatten)]
    verbosity: clap_verbosity_flag::Verbosity<InfoLevel>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Modify the portal client config
    Config {
        #[command(subcommand)]
        cmd: CmdConfig,
    },
    /// Inspect the registry keypair
    Keys {
        #[command(subcommand)]
        cmd: KeysCmd,
    },
    /// Read, write and watch registry entries
    Registry {
        #[command(subcommand)]
        cmd: RegistryCmd,
    },
    /// Upload a local file to the portal and print its CID
    Upload {
        /// Local file path to upload
        path: PathBuf,
    },
    /// Download a blob by CID into a local file
    Download {
        /// CID in any multibase encoding
        cid: String,
        /// Output file path to write the blob to
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum KeysCmd {
    /// Print the registry public key of the configured secret key
    Show,
}

#[derive(Subcommand)]
enum RegistryCmd {
    /// Fetch and verify the current entry for a public key
    Get {
        /// Tagged public key in base64url; defaults to our own key
        #[arg(long, value_name = "PUBLIC_KEY")]
        pk: Option<String>,
    },
    /// Point our registry entry at new data
    Set {
        /// A CID, or raw bytes in hex when --hex is given
        data: String,
        /// Interpret DATA as hex instead of a CID
        #[arg(long, action = ArgAction::SetTrue)]
        hex: bool,
        /// Revision used when no entry exists yet
        #[arg(long, value_name = "REVISION", default_value_t = 0)]
        initial_revision: u64,
    },
    /// Print entries pushed by the portal until interrupted
    Subscribe {
        /// Tagged public key in base64url; defaults to our own key
        #[arg(long, value_name = "PUBLIC_KEY")]
        pk: Option<String>,
        /// Deliver entries without checking their signatures
        #[arg(long, action = ArgAction::SetTrue)]
        no_verify: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    // Configs live under ~/.config/s5/:
    // - portal.toml        portal url and request defaults
    // - portal.secretkey   32-byte registry key seed
    let config_file = match cli.config {
        Some(path) => path,
        None => ProjectDirs::from("", "", "s5")
            .context("failed to determine config directory path")?
            .config_dir()
            .join("portal.toml"),
    };

    let overrides = helpers::Overrides {
        portal: cli.portal,
        api_key: cli.api_key,
    };
    cmd::run_command(config_file, overrides, cli.cmd).await
}
