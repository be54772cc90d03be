// squadpick entry point.
//
// Startup sequence:
// 1. Parse arguments
// 2. Initialize tracing (log to file, stdout carries the report)
// 3. Load config, copying defaults on first run
// 4. Run the command on the blocking pool under the request timeout
// 5. Print the report, or the error chain on stderr

use std::path::Path;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use squadpick_cli::commands::{self, Cli};
use squadpick_cli::config;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    init_tracing(&cli.config_dir)?;
    info!("squadpick starting: {:?}", cli.command);

    let config = config::load_config(&cli.config_dir).context("failed to load configuration")?;
    info!(
        "Config loaded: {} features, {} trees, budget {:.2}, squad of {}",
        config.model.features.len(),
        config.model.n_trees,
        config.selection.budget,
        config.quotas.total()
    );

    let output = commands::run(config, cli.command).await?;
    println!("{output}");
    Ok(())
}

/// Initialize tracing to log to `logs/squadpick.log` under the config dir.
fn init_tracing(base_dir: &Path) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = base_dir.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;

    let log_file = std::fs::File::create(log_dir.join("squadpick.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("squadpick=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
