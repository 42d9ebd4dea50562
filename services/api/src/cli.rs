use crate::commands::{run_import, run_profiles, run_score, ImportArgs, ScoreArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use doc_scoring::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Document Scoring",
    about = "Manage scoring profiles and score extracted documents",
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
    /// Score a document snapshot (JSON) against a stored profile
    Score(ScoreArgs),
    /// Replace the stored profiles with rules from a CSV or JSON export
    Import(ImportArgs),
    /// List stored profiles and mark the active one
    Profiles(StoreArgs),
}

/// Location of the persisted profile set.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct StoreArgs {
    /// Override the configured store directory (SCORING_STORE_DIR)
    #[arg(long)]
    pub(crate) store_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) store: StoreArgs,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
        Command::Import(args) => run_import(args),
        Command::Profiles(args) => run_profiles(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_requires_exactly_one_source() {
        assert!(Cli::try_parse_from(["doc-scoring-api", "import"]).is_err());
        assert!(Cli::try_parse_from([
            "doc-scoring-api",
            "import",
            "--csv",
            "rules.csv",
            "--json",
            "rules.json"
        ])
        .is_err());

        let cli = Cli::try_parse_from([
            "doc-scoring-api",
            "import",
            "--json",
            "rules.json",
            "--store-dir",
            "/tmp/scoring",
        ])
        .expect("parses");
        match cli.command {
            Some(Command::Import(args)) => {
                assert_eq!(args.json, Some(PathBuf::from("rules.json")));
                assert_eq!(args.store.store_dir, Some(PathBuf::from("/tmp/scoring")));
            }
            other => panic!("expected import command, got {other:?}"),
        }
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["doc-scoring-api"]).expect("parses");
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["doc-scoring-api", "serve", "--port", "8080"])
            .expect("parses");
        assert!(matches!(
            cli.command,
            Some(Command::Serve(ServeArgs { port: Some(8080), .. }))
        ));
    }
}
