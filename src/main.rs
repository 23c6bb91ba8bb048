use clap::Parser;
use sitemirror::cli::{self, Cli, Command};
use sitemirror::{init_tracing, Orchestrator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => {
            let config = cli::load_config(&args.config, &args.seeds, args.dry_run)?;
            init_tracing(&config);
            let orchestrator = Orchestrator::new(config);
            let summary = orchestrator.run_auto().await?;
            tracing::info!(
                run_dir = %summary.run_dir.display(),
                pages = summary.stats.pages,
                failures = summary.stats.failures,
                assets = summary.stats.assets,
                stopped = summary.stopped,
                "run complete",
            );
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Discover(args) => {
            let config = cli::load_config(&args.config, &args.seeds, false)?;
            init_tracing(&config);
            let orchestrator = Orchestrator::new(config);
            let urls = orchestrator.discover().await?;
            tracing::info!(urls = urls.len(), "discovery complete");
            println!("{}", serde_json::to_string_pretty(&urls)?);
        }
        Command::Stop(args) => {
            cli::stop_run(&args.run_dir)?;
            println!("stop requested for {}", args.run_dir.display());
        }
    }

    Ok(())
}
