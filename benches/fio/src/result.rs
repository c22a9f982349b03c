use serde::{Deserialize, Serialize};

/// The subset of fio's `--output-format=json` document that reports are built from.
/// Unknown keys are ignored, every listed non-`Option` key is required.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FioResult {
    #[serde(rename = "fio version")]
    pub fio_version: Option<String>,
    pub timestamp: Option<i64>,
    #[serde(rename = "global options")]
    pub global_options: GlobalOptions,
    pub jobs: Vec<Job>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalOptions {
    pub size: String,
    pub bs: Option<String>,
    pub rw: Option<String>,
    pub ioengine: Option<String>,
    pub iodepth: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub jobname: Option<String>,
    pub error: Option<i64>,
    pub read: IoStats,
    pub write: IoStats,
}

/// Per-direction statistics. Bandwidth is in KiB/s, latencies in ns.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IoStats {
    pub io_bytes: Option<f64>,
    pub bw: f64,
    pub iops: f64,
    pub runtime: Option<f64>,
    pub lat_ns: LatNs,
    pub bw_mean: f64,
    pub iops_mean: Option<f64>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatNs {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: f64,
    pub stddev: Option<f64>,
    #[serde(rename = "N")]
    pub n: Option<i64>,
}
