//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use streamkey::Role;

#[derive(Parser)]
#[command(name = "streamkey")]
#[command(about = "Signed stream keys for WHIP/WHEP", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Env file to load instead of the one selected by APP_ENV
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    /// Hex-encoded HMAC key (falls back to HMAC_KEY after the env file is loaded)
    ///
    /// Warning: arguments are visible in process listings. Prefer setting
    /// HMAC_KEY in the environment or the env file.
    #[arg(long, global = true)]
    pub hmac_key: Option<String>,

    /// Log level
    #[arg(long, env = "RUST_LOG", default_value = "warn", global = true)]
    pub log_level: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate keys for identifiers read from stdin
    ///
    /// Prints `identifier,whipKey,whepKey` per input line.
    ///
    /// Examples:
    ///   echo my-stream | streamkey genkeys
    ///   APP_ENV=production streamkey genkeys < streams.txt
    Genkeys,

    /// Sign a single identifier
    ///
    /// Examples:
    ///   streamkey encode my-stream --role publisher
    Encode {
        /// Stream identifier
        identifier: String,

        /// publisher (whip) or viewer (whep)
        #[arg(short, long)]
        role: Role,
    },

    /// Verify a credential and print its identifier
    ///
    /// Examples:
    ///   streamkey verify 'Bearer live_my-stream.AbC...' --role publisher
    ///   streamkey verify 'play_my-stream.AbC...' --role viewer --bare
    Verify {
        /// Presented credential
        credential: String,

        /// publisher (whip) or viewer (whep)
        #[arg(short, long)]
        role: Role,

        /// Credential has no `Bearer ` framing
        #[arg(long)]
        bare: bool,
    },
}
