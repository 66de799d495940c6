use clap::Parser;
use coursefind_cli::{init_tracing, load_settings, run_build_command, BuildArgs};

/// Embed the course CSV and write the embeddings matrix and index.
#[derive(Parser, Debug)]
#[command(name = "coursefind-build")]
struct Cli {
    #[command(flatten)]
    args: BuildArgs,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = load_settings()?;
    run_build_command(&cli.args, settings)
}
