use clap::Parser;
use coursefind_cli::{init_tracing, load_settings, run_query_command, QueryArgs};

/// Semantic search over a built course index.
#[derive(Parser, Debug)]
#[command(name = "coursefind-query")]
struct Cli {
    #[command(flatten)]
    args: QueryArgs,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = load_settings()?;
    run_query_command(&cli.args, settings)
}
