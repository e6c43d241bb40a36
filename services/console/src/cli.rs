use crate::commands::{
    run_assess, run_installment, run_settings, run_stats, AssessArgs, InstallmentArgs,
    SettingsCommand,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use loan_risk::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Loan Risk Console",
    about = "Score loan applicants and manage the risk policy from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Compute the monthly installment for a loan
    Installment(InstallmentArgs),
    /// Score an applicant against the risk engine
    Assess(AssessArgs),
    /// Inspect or change the risk policy
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
    /// Show portfolio statistics reported by the engine
    Stats,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Installment(args) => run_installment(args),
        Command::Assess(args) => run_assess(args).await,
        Command::Settings { command } => run_settings(command).await,
        Command::Stats => run_stats().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_defaults_to_serve() {
        let cli = Cli::try_parse_from(["loan-risk"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn settings_set_accepts_partial_overrides() {
        let cli = Cli::try_parse_from(["loan-risk", "settings", "set", "--min-fico", "680"])
            .expect("parses");
        match cli.command {
            Some(Command::Settings {
                command: SettingsCommand::Set(args),
            }) => {
                assert_eq!(args.min_fico, Some(680));
                assert!(args.threshold.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn assess_rejects_unpriced_terms() {
        let result = Cli::try_parse_from(["loan-risk", "assess", "--term", "48"]);
        assert!(result.is_err());
    }
}
