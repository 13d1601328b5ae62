use std::{fs, io, net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::debug;

use ics_filter_proxy::{
    Config,
    ics::{self, EventFilter, KeyMode, ParseOptions},
    server,
};

#[derive(Debug, Parser)]
#[command(version, about = "Relay an iCalendar feed, keeping only matching events")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Address to listen on, overrides BIND_ADDR
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Filter a local ICS file, or stdin, and print the result
    Filter {
        #[command(flatten)]
        input: InputArgs,
        /// Text the event field must contain, defaults to DEFAULT_FILTER
        #[arg(long)]
        filter: Option<String>,
        /// Event property to match on, defaults to FILTER_FIELD
        #[arg(long)]
        field: Option<String>,
    },
    /// Print the parsed feed as JSON
    Inspect {
        #[command(flatten)]
        input: InputArgs,
    },
}

#[derive(Debug, Args)]
struct InputArgs {
    /// ICS file to read, stdin when omitted
    file: Option<PathBuf>,
    /// Only accept uppercase alphabetic property names
    #[arg(long)]
    strict: bool,
    /// Ignore calendar-level properties
    #[arg(long)]
    no_headers: bool,
}

impl InputArgs {
    fn read(&self) -> Result<String> {
        match &self.file {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read ICS file {}", path.display())),
            None => io::read_to_string(io::stdin()).context("Failed to read ICS from stdin"),
        }
    }

    fn parse_options(&self, config: &Config) -> ParseOptions {
        let mut options = config.parse_options();
        if self.strict {
            options.key_mode = KeyMode::Strict;
        }
        if self.no_headers {
            options.headers = false;
        }
        options
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::init();
    let mut config = Config::from_env()?;

    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            debug!("Starting server with {:?}", config);
            server::serve(config).await?;
        }
        Command::Filter {
            input,
            filter,
            field,
        } => {
            let text = input.read()?;
            let mut event_filter = config.event_filter(filter.as_deref());
            if let Some(field) = field {
                event_filter = EventFilter::new(field, event_filter.needle);
            }
            print!(
                "{}",
                ics::filter_feed(&text, &input.parse_options(&config), &event_filter)
            );
        }
        Command::Inspect { input } => {
            let text = input.read()?;
            let feed = ics::parse(&text, &input.parse_options(&config));
            println!(
                "{}",
                serde_json::to_string_pretty(&feed).context("Failed to serialize feed")?
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn help_parses_without_config() {
        let err = Cli::try_parse_from(["ics-filter-proxy", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn filter_arguments() {
        let cli = Cli::try_parse_from([
            "ics-filter-proxy",
            "filter",
            "feed.ics",
            "--filter",
            "Review",
            "--strict",
        ])
        .unwrap();

        match cli.command {
            Some(Command::Filter { input, filter, field }) => {
                assert_eq!(input.file, Some(PathBuf::from("feed.ics")));
                assert!(input.strict);
                assert!(!input.no_headers);
                assert_eq!(filter.as_deref(), Some("Review"));
                assert_eq!(field, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn cli_flags_override_config_options() {
        let input = InputArgs {
            file: None,
            strict: true,
            no_headers: true,
        };
        let options = input.parse_options(&Config::default());
        assert_eq!(options.key_mode, KeyMode::Strict);
        assert!(!options.headers);
    }
}
