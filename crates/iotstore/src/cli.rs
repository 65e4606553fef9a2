//! Command-line interface.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

use iotstore_settings::Settings;

/// Append-only encrypted event store for IoT devices.
#[derive(Parser, Debug)]
#[command(name = "iotstore", version, about)]
pub struct Cli {
    /// JSON settings file. Environment variables prefixed `IOTSTORE_`
    /// override it; flags override both.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database URL (`sqlite://path` or `sqlite::memory:`).
    #[arg(long, short = 'd', global = true)]
    pub database_url: Option<String>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the Datastore listening for requests.
    Server(ServerArgs),
    /// Delete old events from the store.
    ///
    /// Without --execute the deletion is rolled back and only the number of
    /// events that would be removed is reported. Deleted events are gone for
    /// good, so back up first.
    Delete(DeleteArgs),
}

/// Flags of `iotstore server`.
#[derive(Args, Debug)]
pub struct ServerArgs {
    /// Address to bind.
    #[arg(long, short = 'a')]
    pub addr: Option<String>,

    /// Log every request.
    #[arg(long)]
    pub verbose: bool,
}

/// Flags of `iotstore delete`.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Delete events recorded strictly before this RFC 3339 timestamp.
    #[arg(long, short = 'b', value_parser = parse_rfc3339)]
    pub before: DateTime<Utc>,

    /// Commit the deletion instead of reporting a count.
    #[arg(long, short = 'e')]
    pub execute: bool,
}

fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}

impl Cli {
    /// Apply flag overrides on top of loaded settings.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(url) = &self.database_url {
            settings.database_url.clone_from(url);
        }
        if let Command::Server(args) = &self.command {
            if let Some(addr) = &args.addr {
                settings.server.addr.clone_from(addr);
            }
            if args.verbose {
                settings.server.verbose = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn server_flags() {
        let cli = Cli::try_parse_from(["iotstore", "server", "-a", "127.0.0.1:9000", "--verbose", "-d", "sqlite::memory:"])
            .unwrap();
        let mut settings = Settings::default();
        cli.apply_overrides(&mut settings);
        assert_eq!(settings.server.addr, "127.0.0.1:9000");
        assert!(settings.server.verbose);
        assert_eq!(settings.database_url, "sqlite::memory:");
    }

    #[test]
    fn absent_flags_keep_settings() {
        let cli = Cli::try_parse_from(["iotstore", "server"]).unwrap();
        let mut settings = Settings {
            database_url: "sqlite:///var/lib/iotstore.db".into(),
            ..Settings::default()
        };
        settings.server.verbose = true;
        cli.apply_overrides(&mut settings);
        assert_eq!(settings.database_url, "sqlite:///var/lib/iotstore.db");
        assert!(settings.server.verbose);
        assert_eq!(settings.server.addr, "0.0.0.0:8080");
    }

    #[test]
    fn delete_parses_timestamp() {
        let cli = Cli::try_parse_from(["iotstore", "delete", "-b", "2018-05-01T10:00:00+02:00", "-e"]).unwrap();
        match cli.command {
            Command::Delete(args) => {
                assert_eq!(args.before, Utc.with_ymd_and_hms(2018, 5, 1, 8, 0, 0).unwrap());
                assert!(args.execute);
            }
            Command::Server(_) => panic!("expected delete"),
        }
    }

    #[test]
    fn delete_defaults_to_dry_run() {
        let cli = Cli::try_parse_from(["iotstore", "delete", "--before", "2018-05-01T00:00:00Z"]).unwrap();
        assert!(matches!(cli.command, Command::Delete(DeleteArgs { execute: false, .. })));
    }

    #[test]
    fn delete_requires_before() {
        assert!(Cli::try_parse_from(["iotstore", "delete"]).is_err());
        assert!(Cli::try_parse_from(["iotstore", "delete", "-b", "yesterday"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["iotstore", "delete", "-b", "2018-05-01T00:00:00Z", "--config", "/etc/iotstore.json"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/iotstore.json")));
    }
}
