use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{KIB_PER_GIB, NS_PER_US, record::Column};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub name: String,
    /// Root of the result tree, ie. `tmpfs`
    pub root: PathBuf,
    pub csv_dir: PathBuf,
    pub plot_dir: PathBuf,
    pub result_suffix: String,
    /// Log min/max/mean of the primary fields of every group while aggregating
    pub diagnostics: bool,
    pub benchmarks: Vec<BenchmarkConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Directory name under the root, also the prefix of the per-run tables
    pub name: String,
    /// Legend labels, in plotting order. Configs not listed are left out of charts.
    #[serde(default)]
    pub labels: Vec<ConfigLabel>,
    #[serde(default)]
    pub charts: Vec<ChartConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigLabel {
    pub config: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    pub name: String,
    #[serde(default = "default_x")]
    pub x: Column,
    pub y: Column,
    #[serde(default = "default_group_by")]
    pub group_by: Column,
    #[serde(default)]
    pub unit: Unit,
    pub y_label: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    #[default]
    Raw,
    /// KiB/s to GiB/s
    GibPerSec,
    /// ns to μs
    Micros,
}

impl Unit {
    pub fn divisor(self) -> f64 {
        match self {
            Unit::Raw => 1.0,
            Unit::GibPerSec => KIB_PER_GIB,
            Unit::Micros => NS_PER_US,
        }
    }
}

fn default_x() -> Column {
    Column::SizeBytes
}

fn default_group_by() -> Column {
    Column::Config
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "fs-comparison".to_owned(),
            root: PathBuf::from("tmpfs"),
            csv_dir: PathBuf::from("csv"),
            plot_dir: PathBuf::from("plots"),
            result_suffix: ".output".to_owned(),
            diagnostics: false,
            benchmarks: vec![
                BenchmarkConfig {
                    name: "bandwidth".to_owned(),
                    labels: filesystem_labels("bw"),
                    charts: vec![
                        ChartConfig::new("Read_Bandwidth", Column::ReadBwMean, Unit::GibPerSec),
                        ChartConfig::new("Write_Bandwidth", Column::WriteBwMean, Unit::GibPerSec),
                    ],
                },
                BenchmarkConfig {
                    name: "latency".to_owned(),
                    labels: filesystem_labels("lat"),
                    charts: vec![
                        ChartConfig::new("Read_Latency", Column::ReadLatencyMean, Unit::Micros),
                        ChartConfig::new("Write_Latency", Column::WriteLatencyMean, Unit::Micros),
                    ],
                },
            ],
        }
    }
}

impl ChartConfig {
    pub fn new(name: &str, y: Column, unit: Unit) -> Self {
        let y_label = match unit {
            Unit::Raw => y.name().to_owned(),
            Unit::GibPerSec => "Bandwidth [GiB/s]".to_owned(),
            Unit::Micros => "Latency [μsec]".to_owned(),
        };
        Self {
            name: name.to_owned(),
            x: default_x(),
            y,
            group_by: default_group_by(),
            unit,
            y_label,
        }
    }
}

/// Config dirs are named `{fs}{suffix}`, ie. `btfsbw` for the bandwidth run of BasicBtreeFS
fn filesystem_labels(suffix: &str) -> Vec<ConfigLabel> {
    [
        ("btfs", "BasicBtreeFS"),
        ("btfsnocache", "BasicBtreeFSNoCache"),
        ("ftfs", "BasicLinkFS"),
        ("linbtrfs", "Linux BTRFS"),
        ("linfatfs", "Linux FAT/MSDOS"),
    ]
    .into_iter()
    .map(|(fs, label)| ConfigLabel {
        config: format!("{fs}{suffix}"),
        label: label.to_owned(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_covers_both_benchmarks() {
        let config = Config::default();
        let names = config
            .benchmarks
            .iter()
            .map(|b| b.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["bandwidth", "latency"]);
        assert_eq!(config.benchmarks[0].labels[0].config, "btfsbw");
        assert_eq!(config.benchmarks[1].labels[4].config, "linfatfslat");
        assert_eq!(config.benchmarks[1].charts[0].y, Column::ReadLatencyMean);
    }

    #[test]
    fn unit_divisors() {
        assert_eq!(Unit::Raw.divisor(), 1.0);
        assert_eq!(Unit::GibPerSec.divisor(), 1_048_576.0);
        assert_eq!(Unit::Micros.divisor(), 1000.0);
    }
}
