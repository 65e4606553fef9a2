//! # iotstore
//!
//! Binary entry point: loads settings, installs logging and runs the
//! `server` or `delete` subcommand.

#![deny(unsafe_code)]

mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Instrument;

use iotstore_logging::{Format, init_subscriber, service_span};
use iotstore_settings::{LogFormat, Settings, load_settings};

use crate::cli::{Cli, Command};

fn log_format(format: LogFormat) -> Format {
    match format {
        LogFormat::Json => Format::Json,
        LogFormat::Pretty => Format::Pretty,
    }
}

fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = load_settings(cli.config.as_deref()).context("failed to load settings")?;
    cli.apply_overrides(&mut settings);
    settings.validate().context("invalid settings")?;
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;
    init_subscriber(&settings.logging.level, log_format(settings.logging.format));

    async move {
        match &cli.command {
            Command::Server(_) => commands::run_server(&settings).await,
            Command::Delete(args) => commands::run_delete(&settings, args).await.map(|_| ()),
        }
    }
    .instrument(service_span())
    .await
}
