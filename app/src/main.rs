use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use common::config::Config;
use eyre::{Context, Result};
use fsbench_report::pipeline::Pipeline;
use tokio::fs::read_to_string;
use tracing::{debug, error};
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Library crates that log under their own target
const MODULES: &[&str] = &["common", "fio", "fio_basic"];

#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long, default_value = "report.yaml")]
    config_file: String,
    /// Root of the result tree
    #[arg(long)]
    root: Option<PathBuf>,
    /// Directory for per-run and aggregate tables
    #[arg(long)]
    csv_dir: Option<PathBuf>,
    /// Directory for rendered charts
    #[arg(long)]
    plot_dir: Option<PathBuf>,
    /// Log min/max/mean of every aggregated group
    #[arg(long, default_value_t = false)]
    diagnostics: bool,
    #[arg(long, default_value_t = false)]
    no_progress: bool,
    #[arg(short, long)]
    log: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List config dirs and their result files
    Ls,
    /// Extract result files into per-run tables
    Extract,
    /// Aggregate per-run tables and render charts
    Plot,
    /// Extract, then plot
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let args = Cli::parse();
    let file_appender = tracing_appender::rolling::never(".", "log.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let mut env_filter = EnvFilter::new(format!("fsbench_report={log_level}"));

    if !args.log.is_empty() {
        for log in &args.log {
            env_filter = env_filter.add_directive(log.parse()?);
        }
    }

    for module in MODULES {
        if !args.log.iter().any(|x| x.starts_with(module)) {
            env_filter = env_filter.add_directive(format!("{module}={log_level}").parse()?);
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .compact(),
        )
        .with(layer().with_writer(non_blocking))
        .init();

    let mut config = load_config(Path::new(&args.config_file)).await?;
    if let Some(root) = args.root {
        config.root = root;
    }
    if let Some(csv_dir) = args.csv_dir {
        config.csv_dir = csv_dir;
    }
    if let Some(plot_dir) = args.plot_dir {
        config.plot_dir = plot_dir;
    }
    config.diagnostics |= args.diagnostics;

    let pipeline = Pipeline::new(config).with_progress(!args.no_progress);
    let result = match args.command {
        Commands::Ls => {
            list(&pipeline);
            Ok(())
        }
        Commands::Extract => pipeline.extract().await.map(|_| ()),
        Commands::Plot => pipeline.plot().await.map(print_summary),
        Commands::Run => pipeline.run().await.map(print_summary),
    };
    if let Err(err) = &result {
        error!("{err:#?}");
    }
    result
}

async fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!("{} not found, using defaults", path.display());
        return Ok(Config::default());
    }
    let config = serde_yml::from_str(&read_to_string(path).await?)
        .with_context(|| format!("Parse {}", path.display()))?;
    Ok(config)
}

fn list(pipeline: &Pipeline) {
    for item in pipeline.inventory() {
        println!("{}/{} -> {} files", item.benchmark, item.config, item.files);
    }
}

fn print_summary(summary: fsbench_report::pipeline::PlotSummary) {
    for path in &summary.rendered {
        println!("{}", path.display());
    }
    if !summary.skipped.is_empty() {
        println!("Skipped charts: {}", summary.skipped.join(", "));
    }
    if !summary.failed.is_empty() {
        println!("Failed benchmarks: {}", summary.failed.join(", "));
    }
}
