//! chainbreak — offline forensic dumper for legacy (pre-SQLite) Apple
//! `.keychain` files.
//!
//! # Quick Start
//!
//! ```bash
//! # Dump everything as text, trying a password
//! chainbreak dump login.keychain --password hunter2
//!
//! # Export generic passwords to files, recovered via an unlock file
//! chainbreak dump login.keychain --unlock-file login.keychain.unlock \
//!     --which generic --export-dir ./recovered
//!
//! # Print the crackable password hash without needing any credential
//! chainbreak dump login.keychain --which hash
//! ```

mod commands;
mod export;
mod json;
mod style;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// chainbreak — recover secrets from legacy Apple keychain files.
#[derive(Parser)]
#[command(name = "chainbreak")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Disable colored output, regardless of terminal support.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a keychain file and dump its records.
    Dump {
        /// Path to the `.keychain` file.
        keychain: PathBuf,

        /// Unlock with a plaintext password (PBKDF2-derives the master key).
        #[arg(long)]
        password: Option<String>,

        /// Unlock with an already-recovered 24-byte hex-encoded wrapping key.
        #[arg(long)]
        hex_key: Option<String>,

        /// Unlock with a keychain unlock-file's embedded master key.
        #[arg(long)]
        unlock_file: Option<PathBuf>,

        /// Which table(s) to dump.
        #[arg(long, value_enum, default_value_t = Which::All)]
        which: Which,

        /// Output rendering format. Defaults to the configured format if not given.
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Write one file per record into this directory instead of stdout.
        #[arg(long)]
        export_dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Which {
    Generic,
    Internet,
    Appleshare,
    X509,
    Pubkey,
    Privkey,
    Hash,
    All,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let config = chainbreak_config::ChainbreakConfig::load().unwrap_or_default();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.log_level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    style::set_no_color(cli.no_color || std::env::var_os("NO_COLOR").is_some());

    match cli.command {
        Commands::Dump {
            keychain,
            password,
            hex_key,
            unlock_file,
            which,
            format,
            export_dir,
        } => commands::dump::run(commands::dump::DumpArgs {
            keychain_path: keychain,
            password,
            hex_key,
            unlock_file,
            which,
            format: format.unwrap_or_else(|| match config.output.format {
                chainbreak_config::OutputFormatName::Text => OutputFormat::Text,
                chainbreak_config::OutputFormatName::Json => OutputFormat::Json,
            }),
            export_dir,
            try_all_kinds: config.credential.try_all_kinds,
        }),
    }
}

pub(crate) use OutputFormat as CliOutputFormat;
pub(crate) use Which as CliWhich;
