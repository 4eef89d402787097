use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use noshow_core::{ModelSelector, PredictionResult, RiskSummary};
use noshow_pipeline::{AppointmentSource, CsvAppointmentSource, NoShowTrainer, PipelineConfig, Predictor};
use noshow_store::{FsModelStore, ModelStore};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "noshow", version, about = "Appointment no-show risk prediction")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a model on past appointments and store it under a new tag
    Train {
        /// Appointment CSV (overrides data.path)
        #[arg(long)]
        data: Option<PathBuf>,
        /// Reference date separating history from pending (default: today, UTC)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Score upcoming appointments with a stored model
    Predict {
        #[arg(long)]
        data: Option<PathBuf>,
        /// Model tag or `latest`
        #[arg(long, default_value = "latest")]
        version: ModelSelector,
        #[arg(long)]
        today: Option<NaiveDate>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// List stored model versions
    Models,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = PipelineConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_logging(&config, cli.verbose);
    config.validate().context("Invalid configuration")?;

    let store = FsModelStore::open(&config.store.directory).with_context(|| {
        format!("Failed to open model store at {}", config.store.directory.display())
    })?;
    info!(root = %store.root().display(), "model store opened");

    match cli.command {
        Command::Train { data, today } => {
            let source = CsvAppointmentSource::new(data.unwrap_or_else(|| config.data.path.clone()));
            let today = today.unwrap_or_else(|| Utc::now().date_naive());

            let historical = source
                .historical(today)
                .with_context(|| format!("Failed to read {}", source.path().display()))?;
            let tag = NoShowTrainer::new(&store, config.forest.clone())
                .train(&historical, today, Utc::now())
                .context("Training failed")?;

            println!("{tag}");
        }
        Command::Predict {
            data,
            version,
            today,
            format,
        } => {
            let source = CsvAppointmentSource::new(data.unwrap_or_else(|| config.data.path.clone()));
            let today = today.unwrap_or_else(|| Utc::now().date_naive());

            let pending = source
                .pending(today)
                .with_context(|| format!("Failed to read {}", source.path().display()))?;

            // Resolve the selector once so a concurrent save can't change it mid-run
            let model = match store.load(&version) {
                Ok(model) => model,
                Err(err) if err.is_cold_start() => {
                    anyhow::bail!("No trained model available ({version}); run `noshow train` first")
                }
                Err(err) => return Err(err).context("Failed to load model"),
            };
            info!(tag = %model.version, "scoring with model");

            let results = Predictor::<FsModelStore>::predict_with(&model, &pending)
                .context("Prediction failed")?;
            print_results(&results, format)?;
        }
        Command::Models => {
            let latest = store.latest_tag()?;
            for tag in store.tags()? {
                let marker = if Some(&tag) == latest.as_ref() { " (latest)" } else { "" };
                println!("{tag}{marker}");
            }
        }
    }

    Ok(())
}

fn print_results(results: &[PredictionResult], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(results)?);
        }
        OutputFormat::Table => {
            println!("{:>12}  {:>11}  category", "appointment", "probability");
            for result in results {
                println!(
                    "{:>12}  {:>11.4}  {}",
                    result.appointment_id, result.probability, result.category
                );
            }
            let summary = RiskSummary::from_results(results);
            println!(
                "\n{} appointments: {} low, {} medium, {} high",
                summary.total(),
                summary.low,
                summary.medium,
                summary.high
            );
        }
    }
    Ok(())
}

fn init_logging(config: &PipelineConfig, verbose: u8) {
    let fallback = match verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    // Logs go to stderr; stdout carries results
    if config.logging.format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}
