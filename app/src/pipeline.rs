use std::path::PathBuf;

use common::{
    aggregate::Aggregator,
    config::{BenchmarkConfig, Config},
    record::AggregateTable,
    table::{PerRunTable, TableArtifact, TableWriter, write_table},
    util::ensure_dirs,
    walk::TreeWalker,
};
use eyre::{Context, Result};
use fio::ExtractError;
use fio_basic::{ChartRenderer, ChartSpec, units::normalize};
use futures::{StreamExt, stream};
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tokio::fs::read_to_string;
use tracing::{debug, error, info, warn};

/// Result files read concurrently while extracting
const READ_CONCURRENCY: usize = 16;
const AGGREGATE_DIR: &str = "aggregate";

#[derive(Debug, Default)]
pub struct PlotSummary {
    pub rendered: Vec<PathBuf>,
    /// Charts that could not be drawn, ie. because there was no data
    pub skipped: Vec<String>,
    /// Benchmark types whose tables could not be aggregated
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigInventory {
    pub benchmark: String,
    pub config: String,
    pub files: usize,
}

pub struct Pipeline {
    config: Config,
    progress: bool,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            progress: false,
        }
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn walker(&self) -> TreeWalker {
        TreeWalker::new(&self.config.root, &self.config.result_suffix)
    }

    /// Extracts every benchmark type, then aggregates and plots them
    pub async fn run(&self) -> Result<PlotSummary> {
        self.extract().await?;
        self.plot().await
    }

    pub async fn extract(&self) -> Result<Vec<TableArtifact>> {
        ensure_dirs(&[self.config.csv_dir.clone()]).await?;
        let mut artifacts = Vec::new();
        for benchmark in &self.config.benchmarks {
            artifacts.extend(self.extract_benchmark(benchmark).await?);
        }
        Ok(artifacts)
    }

    /// Writes one per-run table for every config dir of the benchmark type.
    /// Files that can not be parsed are logged and left out.
    pub async fn extract_benchmark(
        &self,
        benchmark: &BenchmarkConfig,
    ) -> Result<Vec<TableArtifact>> {
        let walker = self.walker();
        let writer = TableWriter::new(&self.config.csv_dir, &benchmark.name);
        let configs = walker.configs(&benchmark.name);
        if configs.is_empty() {
            warn!(
                "No configs found in {}",
                walker.benchmark_dir(&benchmark.name).display()
            );
        }

        let mut artifacts = Vec::new();
        for config in configs {
            let files = walker.runs(&benchmark.name, &config).collect::<Vec<_>>();
            debug!("{}/{config}: {} result files", benchmark.name, files.len());

            let bar = self.progress_bar(files.len() as u64, format!("{}/{config}", benchmark.name));
            let bar_ref = &bar;
            let raws = stream::iter(files)
                .map(|path| async move {
                    let raw = read_to_string(&path).await;
                    bar_ref.inc(1);
                    (path, raw)
                })
                .buffered(READ_CONCURRENCY)
                .collect::<Vec<_>>()
                .await;
            bar.finish_and_clear();

            let records = raws
                .into_par_iter()
                .filter_map(|(path, raw)| {
                    let record = raw
                        .map_err(|source| ExtractError::Io {
                            path: path.clone(),
                            source,
                        })
                        .and_then(|raw| fio::extract(&raw, &config));
                    match record {
                        Ok(record) => {
                            debug!("Processed {}", path.display());
                            Some(record)
                        }
                        Err(err) if err.is_truncated() => {
                            warn!("Skipping truncated file {}: {err}", path.display());
                            None
                        }
                        Err(err) => {
                            warn!("Skipping {}: {err}", path.display());
                            None
                        }
                    }
                })
                .collect::<Vec<_>>();

            let artifact = writer
                .write(&config, records)
                .with_context(|| format!("Write table for {}/{config}", benchmark.name))?;
            info!(
                "{} rows written to {}",
                artifact.rows,
                artifact.path.display()
            );
            artifacts.push(artifact);
        }
        Ok(artifacts)
    }

    /// Reads every per-run table of the benchmark type and averages them per group
    pub fn aggregate_benchmark(&self, benchmark: &BenchmarkConfig) -> Result<AggregateTable> {
        let writer = TableWriter::new(&self.config.csv_dir, &benchmark.name);
        let tables = writer
            .existing()?
            .iter()
            .map(|path| PerRunTable::read(path))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("{}: aggregating {} tables", benchmark.name, tables.len());
        let table = Aggregator::new()
            .with_diagnostics(self.config.diagnostics)
            .aggregate(&tables)?;
        Ok(table)
    }

    /// Aggregates and renders every configured chart. A benchmark type that fails to
    /// aggregate, or a chart that fails to render, does not stop the others.
    pub async fn plot(&self) -> Result<PlotSummary> {
        let aggregate_dir = self.config.csv_dir.join(AGGREGATE_DIR);
        ensure_dirs(&[self.config.plot_dir.clone(), aggregate_dir.clone()]).await?;
        let renderer = ChartRenderer::new(&self.config.plot_dir);

        let mut summary = PlotSummary::default();
        for benchmark in &self.config.benchmarks {
            let table = match self.aggregate_benchmark(benchmark) {
                Ok(table) => table,
                Err(err) => {
                    error!("Aggregating {} failed: {err:#}", benchmark.name);
                    summary.failed.push(benchmark.name.clone());
                    continue;
                }
            };

            let path = aggregate_dir.join(format!("{}.csv", benchmark.name));
            match write_table(&path, table.iter().cloned()) {
                Ok(rows) => info!("{rows} aggregate rows written to {}", path.display()),
                Err(err) => warn!("{}: aggregate table not written: {err}", benchmark.name),
            }

            for chart in &benchmark.charts {
                let normalized = normalize(&table, chart.y, chart.unit);
                let spec = ChartSpec::from_config(chart, &benchmark.labels);
                match renderer.render(&normalized, &spec) {
                    Ok(path) => {
                        info!("Rendered {}", path.display());
                        summary.rendered.push(path);
                    }
                    Err(err) => {
                        warn!("Skipping chart {}: {err}", chart.name);
                        summary.skipped.push(chart.name.clone());
                    }
                }
            }
        }
        Ok(summary)
    }

    /// Config dirs of every benchmark type with their number of result files
    pub fn inventory(&self) -> Vec<ConfigInventory> {
        let walker = self.walker();
        let mut inventory = Vec::new();
        for benchmark in &self.config.benchmarks {
            let counts = walker.walk(&benchmark.name).counts_by(|run| run.config);
            for config in walker.configs(&benchmark.name) {
                inventory.push(ConfigInventory {
                    benchmark: benchmark.name.clone(),
                    files: counts.get(&config).copied().unwrap_or(0),
                    config,
                });
            }
        }
        inventory
    }

    fn progress_bar(&self, len: u64, name: String) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len}") {
            bar.set_style(style);
        }
        bar.set_message(name);
        bar
    }
}
