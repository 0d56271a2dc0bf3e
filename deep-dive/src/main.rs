// Pitcher deep-dive entry point.
//
// Startup sequence:
// 1. Parse arguments and initialize tracing (stderr; stdout carries the report)
// 2. Validate the request
// 3. Load config (copying defaults on first run)
// 4. Build the stats, event and id providers
// 5. Run the deep dive and print the report as JSON

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use deep_dive::config;
use deep_dive::providers::fangraphs::FangraphsClient;
use deep_dive::providers::register::ChadwickRegister;
use deep_dive::providers::savant::SavantClient;
use deep_dive::report::{DeepDive, DeepDiveError, DeepDiveRequest};

/// Season, trailing or career pitching breakdown for one pitcher.
#[derive(Parser)]
#[command(name = "deep-dive")]
#[command(about = "Pitcher deep dive: season stats merged with pitch-level aggregates")]
struct Cli {
    /// MLBAM player id
    #[arg(long)]
    player: u32,

    /// Target season
    #[arg(long)]
    year: i32,

    /// regular, postseason or total
    #[arg(long, default_value = "regular")]
    span: String,

    /// season, last3 or career
    #[arg(long, default_value = "season")]
    rollup: String,

    /// Directory holding config/ and defaults/
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing() {
        eprintln!("failed to initialize logging: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let request = DeepDiveRequest::parse(cli.player, cli.year, &cli.span, &cli.rollup)?;

    let config = config::load_config_in(&cli.base_dir).context("failed to load configuration")?;
    info!("Config loaded from {}", cli.base_dir.display());

    let register_path = config.ids.resolve_register_path(&cli.base_dir);
    let register = ChadwickRegister::load(&register_path, config.ids.override_map())
        .context("failed to load id register")?;

    let deep_dive = DeepDive::new(
        Arc::new(FangraphsClient::from_config(&config)?),
        Arc::new(SavantClient::from_config(&config)?),
        Arc::new(register),
        config.savant.first_season,
    );

    let report = deep_dive.run(&request).await?;

    let json = if cli.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .context("failed to serialize report")?;
    println!("{json}");
    Ok(())
}

/// 2 for bad input, 3 for an unknown player, 1 for everything else.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<DeepDiveError>() {
        Some(DeepDiveError::InvalidInput { .. }) => 2,
        Some(DeepDiveError::PlayerNotFound { .. }) => 3,
        _ => 1,
    }
}

/// Initialize tracing to stderr so stdout stays machine-readable.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("deep_dive=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
