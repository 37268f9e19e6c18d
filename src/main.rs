//! Ambient Pomodoro - a focus timer for the terminal
//!
//! This tool helps you stay focused using the Pomodoro Technique:
//! - Focus sessions followed by short breaks
//! - A long break after every few sessions
//! - Optional rain, night or white-noise ambience while you focus
//! - Gentle reminders of what to do on a break

use anyhow::Result;
use clap::{CommandFactory, Parser};

use ambient_pomodoro::cli::{Cli, Commands, CustomCommand, Display, IpcClient, ReminderCommand};
use ambient_pomodoro::daemon;
use ambient_pomodoro::storage::DataPaths;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` wins; otherwise `warn`, or `debug` with `--verbose`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        // No command provided, show help
        Cli::command().print_help()?;
        return Ok(());
    };

    match &command {
        Commands::Daemon => {
            let paths = DataPaths::resolve()?;
            return daemon::run(&paths).await;
        }
        Commands::Completions { shell } => {
            generate_completions(*shell);
            return Ok(());
        }
        _ => {}
    }

    let Some(request) = command.to_request() else {
        return Ok(());
    };
    let client = IpcClient::new()?;
    let response = client.send(&request).await?;

    match command {
        Commands::Status => Display::show_status(&response),
        Commands::Reminder(ReminderCommand::List) => Display::show_reminders(&response),
        Commands::Custom(CustomCommand::Show) => Display::show_custom_mode(&response),
        _ => Display::show_success(&response),
    }

    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::parse_from(["pomodoro"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::parse_from(["pomodoro", "status"]);
        assert!(matches!(cli.command, Some(Commands::Status)));
    }

    #[test]
    fn test_cli_parse_daemon() {
        let cli = Cli::parse_from(["pomodoro", "daemon"]);
        assert!(matches!(cli.command, Some(Commands::Daemon)));
    }

    #[test]
    fn test_cli_parse_verbose() {
        let cli = Cli::parse_from(["pomodoro", "--verbose", "status"]);
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }
}
