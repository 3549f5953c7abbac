//! # avocado-forecast
//!
//! Command-line interface for the avocado sales study.

use anyhow::{bail, Context};
use avocado_forecast::analysis::explore;
use avocado_forecast::config::AnalysisConfig;
use avocado_forecast::data::{generate, load_csv, write_csv, Panel, SyntheticConfig};
use avocado_forecast::pipeline::run_study;
use avocado_forecast::report::StudyReport;
use avocado_forecast::split::TrainTestSplit;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "avocado-forecast")]
#[command(about = "Regional avocado sales forecasting study", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit every model, forecast the test window and write the reports
    Analyze {
        /// Sales CSV (region, type, Date, AveragePrice, Total Volume)
        #[arg(short, long)]
        input: PathBuf,

        /// JSON configuration file; omitted settings keep their defaults
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory for forecasts.csv, accuracy.csv, summary.csv,
        /// orders.csv, report.json and report.md
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Training weeks (overrides the configuration)
        #[arg(long)]
        train: Option<usize>,

        /// Test weeks (overrides the configuration)
        #[arg(long)]
        test: Option<usize>,
    },

    /// Print the exploratory summary of a sales CSV
    Explore {
        #[arg(short, long)]
        input: PathBuf,

        /// Write the summary as JSON instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a synthetic sales CSV with the same layout as the real data
    Generate {
        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, default_value = "169")]
        weeks: usize,

        #[arg(long, default_value = "42")]
        seed: u64,

        /// Comma-separated region names
        #[arg(long, value_delimiter = ',')]
        regions: Option<Vec<String>>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn load_panel(input: &Path) -> anyhow::Result<Panel> {
    let observations =
        load_csv(input).with_context(|| format!("failed to load {}", input.display()))?;
    let panel = Panel::from_observations(observations).context("failed to build the panel")?;
    info!(
        series = panel.len(),
        observations = panel.observation_count(),
        "loaded panel"
    );
    Ok(panel)
}

fn analyze(
    input: &Path,
    config: Option<&Path>,
    output: &Path,
    train: Option<usize>,
    test: Option<usize>,
) -> anyhow::Result<()> {
    let mut config = match config {
        Some(path) => AnalysisConfig::from_json_file(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    config.split = TrainTestSplit::new(
        train.unwrap_or(config.split.train),
        test.unwrap_or(config.split.test),
    );
    config.validate().context("invalid configuration")?;

    let panel = load_panel(input)?;
    let exploration = explore(&panel).context("exploratory analysis failed")?;
    let result = run_study(&panel, &config).context("study failed")?;
    let report = StudyReport::new(result).with_exploration(exploration);

    report
        .write_csv(output)
        .with_context(|| format!("failed to write reports to {}", output.display()))?;
    report
        .write_json(output.join("report.json"))
        .context("failed to write report.json")?;
    std::fs::write(output.join("report.md"), report.render_markdown())
        .context("failed to write report.md")?;

    if let Some(best) = report.best_model() {
        info!(model = %best, "lowest mean MAPE");
    }
    println!("{}", report.render_markdown());
    Ok(())
}

fn explore_command(input: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let panel = load_panel(input)?;
    let exploration = explore(&panel)?;
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            serde_json::to_writer_pretty(BufWriter::new(file), &exploration)?;
            info!(path = %path.display(), "wrote exploratory summary");
        }
        None => println!("{}", serde_json::to_string_pretty(&exploration)?),
    }
    Ok(())
}

fn generate_command(
    output: &Path,
    weeks: usize,
    seed: u64,
    regions: Option<Vec<String>>,
) -> anyhow::Result<()> {
    let mut config = SyntheticConfig {
        weeks,
        seed,
        ..SyntheticConfig::default()
    };
    if let Some(regions) = regions {
        if regions.is_empty() {
            bail!("--regions needs at least one region");
        }
        config.regions = regions;
    }

    let observations = generate(&config)?;
    let file =
        File::create(output).with_context(|| format!("failed to create {}", output.display()))?;
    write_csv(&observations, BufWriter::new(file))?;
    info!(
        rows = observations.len(),
        path = %output.display(),
        "wrote synthetic sales"
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Analyze {
            input,
            config,
            output,
            train,
            test,
        } => analyze(&input, config.as_deref(), &output, train, test),
        Commands::Explore { input, output } => explore_command(&input, output.as_deref()),
        Commands::Generate {
            output,
            weeks,
            seed,
            regions,
        } => generate_command(&output, weeks, seed, regions),
    }
}
