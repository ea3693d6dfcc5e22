//! Streamkey CLI entry point

mod cli;

use crate::cli::{Cli, Commands};
use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::Path;
use streamkey::auth::{HmacSecret, Role, StreamKeyCodec, TokenError};
use streamkey::config;
use streamkey::keygen;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    load_env(cli.env_file.as_deref())?;

    let codec = match build_codec(cli.hmac_key.as_deref()) {
        Ok(codec) => codec,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Genkeys => genkeys(&codec),
        Commands::Encode { identifier, role } => encode(&codec, &identifier, role),
        Commands::Verify { credential, role, bare } => verify(&codec, &credential, role, bare),
    }
}

fn load_env(env_file: Option<&Path>) -> Result<()> {
    match env_file {
        Some(path) => {
            let loaded = config::load_env_file(path)
                .with_context(|| format!("Failed to load env file: {}", path.display()))?;
            if !loaded {
                anyhow::bail!("Env file not found: {}", path.display());
            }
        }
        None => {
            let env = config::load_app_env().context("Failed to load env file")?;
            debug!(app_env = %env, "Environment selected");
        }
    }
    Ok(())
}

fn build_codec(hmac_key: Option<&str>) -> Result<StreamKeyCodec, TokenError> {
    match hmac_key {
        Some(hex) => HmacSecret::from_hex(hex).map(StreamKeyCodec::new),
        None => StreamKeyCodec::from_env(),
    }
}

fn genkeys(codec: &StreamKeyCodec) -> Result<()> {
    let rows = keygen::write_key_rows(codec, io::stdin().lock(), io::stdout().lock())
        .context("Failed to generate keys")?;
    info!(rows, "Stream keys generated");
    Ok(())
}

fn encode(codec: &StreamKeyCodec, identifier: &str, role: Role) -> Result<()> {
    println!("{}", codec.encode(identifier, role));
    Ok(())
}

fn verify(codec: &StreamKeyCodec, credential: &str, role: Role, bare: bool) -> Result<()> {
    let result = if bare {
        codec.decode_token(credential, role)
    } else {
        codec.decode(credential, role)
    };

    match result {
        Ok(identifier) => {
            println!("{}", identifier);
            Ok(())
        }
        Err(e) => {
            // Details were logged at debug level by the codec
            eprintln!("{}", e.into_opaque());
            std::process::exit(1);
        }
    }
}
