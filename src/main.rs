use clap::Parser;
use price_collector::cli::{Cli, Commands};
use price_collector::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });
    config.apply_process_env()?;
    cli.command.apply(&mut config);
    config.validate()?;

    // Initialize telemetry
    let telemetry = price_collector::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            args.execute(config, telemetry).await?;
        }
        Commands::Backfill(args) => {
            tracing::info!("Starting one-shot backfill");
            args.execute(config).await?;
        }
        Commands::Fetch(args) => {
            args.execute(config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
