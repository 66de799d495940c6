use clap::{Parser, Subcommand};
use coursefind_cli::{
    init_tracing, load_settings, run_build_command, run_check_command, run_query_command, BuildArgs, CheckArgs,
    QueryArgs,
};

#[derive(Parser, Debug)]
#[command(name = "coursefind", about = "Semantic course search")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Embed the course CSV and write the artifacts
    Build(BuildArgs),
    /// Search the built index
    Query(QueryArgs),
    /// Report data quality and artifact consistency
    Check(CheckArgs),
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = load_settings()?;
    match &cli.command {
        Command::Build(args) => run_build_command(args, settings),
        Command::Query(args) => run_query_command(args, settings),
        Command::Check(args) => run_check_command(args, &settings).map(|_| ()),
    }
}
