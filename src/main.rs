use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use zip_spend_map::apis::{GeocodeClient, PaymentAggregateClient};
use zip_spend_map::app::ports::{ClockPort, GeocoderPort, HttpClientPort};
use zip_spend_map::config::AppConfig;
use zip_spend_map::constants::DEFAULT_CONFIG_PATH;
use zip_spend_map::export;
use zip_spend_map::infra::clock::TokioClock;
use zip_spend_map::infra::http_client::ReqwestHttp;
use zip_spend_map::logging;
use zip_spend_map::pipeline::{EnrichmentPipeline, Pacer};
use zip_spend_map::postal_code;
use zip_spend_map::types::EnrichedResult;

#[derive(Parser)]
#[command(name = "zip_spend_map")]
#[command(about = "Top-spending postal codes from state payment data, geocoded for map markers")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, rank and geocode; print or write the map data
    Run {
        #[arg(long)]
        fiscal_year: Option<i32>,
        /// Number of top-spending postal codes to select
        #[arg(long)]
        top: Option<usize>,
        /// Minimum spacing between geocoder requests
        #[arg(long)]
        interval_ms: Option<u64>,
        /// Write the JSON artifact here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
        /// Emit an empty list instead of failing when the payment data is unreachable
        #[arg(long)]
        empty_on_failure: bool,
    },
    /// Show the top-spending postal codes without geocoding
    Top {
        #[arg(long)]
        fiscal_year: Option<i32>,
        #[arg(long)]
        top: Option<usize>,
    },
    /// Look up one postal code and print every candidate
    Geocode { postal_code: String },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    dotenv::dotenv().ok();
    let mut config = match path {
        Some(p) => AppConfig::load(p, true)?,
        None => AppConfig::load(Path::new(DEFAULT_CONFIG_PATH), false)?,
    };
    config.apply_env()?;
    Ok(config)
}

fn http_client(timeout_seconds: u64) -> anyhow::Result<Arc<dyn HttpClientPort>> {
    let http = ReqwestHttp::new(Duration::from_secs(timeout_seconds))
        .context("Failed to build HTTP client")?;
    Ok(Arc::new(http))
}

fn build_pipeline(config: &AppConfig) -> anyhow::Result<EnrichmentPipeline> {
    let source = PaymentAggregateClient::with_endpoint(
        http_client(config.payments.timeout_seconds)?,
        &config.payments.endpoint,
    );
    let geocoder = build_geocoder(config)?;
    Ok(EnrichmentPipeline::new(
        Arc::new(source),
        Arc::new(geocoder),
        Arc::new(TokioClock::new()),
        config.geocoder.min_interval(),
    ))
}

fn build_geocoder(config: &AppConfig) -> anyhow::Result<GeocodeClient> {
    Ok(GeocodeClient::new(http_client(config.geocoder.timeout_seconds)?)
        .with_endpoint(&config.geocoder.endpoint)
        .with_user_agent(&config.geocoder.user_agent))
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling");
            trigger.cancel();
        }
    });
    cancel
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _log_guard = logging::init_logging();
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Run {
            fiscal_year,
            top,
            interval_ms,
            output,
            pretty,
            empty_on_failure,
        } => {
            if let Some(year) = fiscal_year {
                config.pipeline.fiscal_year = year;
            }
            if let Some(n) = top {
                config.pipeline.top_n = n;
            }
            if let Some(ms) = interval_ms {
                config.geocoder.min_interval_ms = ms;
            }
            config.validate()?;

            let pipeline = build_pipeline(&config)?;
            let cancel = cancel_on_ctrl_c();
            info!(
                fiscal_year = config.pipeline.fiscal_year,
                top_n = config.pipeline.top_n,
                "Starting enrichment pipeline"
            );

            let result = match pipeline
                .run(config.pipeline.fiscal_year, config.pipeline.top_n, &cancel)
                .await
            {
                Ok(report) => {
                    for diagnostic in &report.diagnostics {
                        info!("Dropped: {}", diagnostic);
                    }
                    report.result
                }
                Err(e) if empty_on_failure => {
                    error!("Pipeline failed, emitting empty map data: {}", e);
                    EnrichedResult::empty()
                }
                Err(e) => return Err(e).context("Pipeline run failed"),
            };

            match output {
                Some(path) => {
                    export::write_json_file(&result, &path, pretty)?;
                    info!("Saved {} entries to {}", result.len(), path.display());
                }
                None => export::write_json(&result, std::io::stdout().lock(), pretty)?,
            }
        }
        Commands::Top { fiscal_year, top } => {
            if let Some(year) = fiscal_year {
                config.pipeline.fiscal_year = year;
            }
            if let Some(n) = top {
                config.pipeline.top_n = n;
            }
            config.validate()?;

            let pipeline = build_pipeline(&config)?;
            let selection = pipeline
                .select(config.pipeline.fiscal_year, config.pipeline.top_n)
                .await
                .context("Failed to fetch payment aggregates")?;
            export::write_json(&selection, std::io::stdout().lock(), true)?;
        }
        Commands::Geocode { postal_code: raw } => {
            config.validate()?;
            let code = postal_code::normalize(&raw);
            if !postal_code::is_valid(&code) {
                warn!("{:?} is not a 5-digit postal code; querying anyway", raw);
            }

            let geocoder = build_geocoder(&config)?;
            let clock: Arc<dyn ClockPort> = Arc::new(TokioClock::new());
            let mut pacer = Pacer::new(clock, config.geocoder.min_interval());
            pacer.wait(&cancel_on_ctrl_c()).await?;
            let candidates = geocoder
                .resolve(&code)
                .await
                .with_context(|| format!("Geocode lookup failed for {code}"))?;

            info!("{} candidate(s) for {}", candidates.len(), code);
            export::write_json(&candidates, std::io::stdout().lock(), true)?;
        }
    }

    Ok(())
}
