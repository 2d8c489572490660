use crate::offline::{run_recompute, run_score, RecomputeArgs, ScoreArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use perf_review::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Performance Review Engine",
    about = "Score, rank, and calibrate monthly performance reviews",
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
    /// Compute a composite score and level without storing anything
    Score(ScoreArgs),
    /// Rank and calibrate one month loaded from a records CSV, printed as JSON
    Recompute(RecomputeArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Employee roster CSV used as the directory
    #[arg(long)]
    pub(crate) roster: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
        Command::Recompute(args) => run_recompute(args),
    }
}
