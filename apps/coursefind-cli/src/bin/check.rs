use clap::Parser;
use coursefind_cli::{init_tracing, load_settings, run_check_command, CheckArgs};

/// Data-quality report for the course CSV and its embeddings.
#[derive(Parser, Debug)]
#[command(name = "coursefind-check")]
struct Cli {
    #[command(flatten)]
    args: CheckArgs,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = load_settings()?;
    run_check_command(&cli.args, &settings)?;
    Ok(())
}
