use serde::{Deserialize, Serialize};

/// Column names of per-run and aggregate tables, in file order.
pub const HEADER: [&str; 11] = [
    "size",
    "size_verbose",
    "r_bw_mean",
    "r_lat_mean",
    "r_bw",
    "r_iops",
    "w_bw_mean",
    "w_lat_mean",
    "w_bw",
    "w_iops",
    "config",
];

/// One extracted fio run. Either every field is populated or the run is dropped.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// `None` when the size descriptor has an unknown unit or a non-numeric prefix
    #[serde(rename = "size")]
    pub size_bytes: Option<u64>,
    #[serde(rename = "size_verbose")]
    pub size_label: String,
    #[serde(rename = "r_bw_mean")]
    pub read_bw_mean: f64,
    #[serde(rename = "r_lat_mean")]
    pub read_latency_mean_ns: f64,
    #[serde(rename = "r_bw")]
    pub read_bw: f64,
    #[serde(rename = "r_iops")]
    pub read_iops: f64,
    #[serde(rename = "w_bw_mean")]
    pub write_bw_mean: f64,
    #[serde(rename = "w_lat_mean")]
    pub write_latency_mean_ns: f64,
    #[serde(rename = "w_bw")]
    pub write_bw: f64,
    #[serde(rename = "w_iops")]
    pub write_iops: f64,
    pub config: String,
}

/// Mean of every metric over one (size, size_verbose, config) group.
pub type AggregateRow = MetricRecord;
pub type AggregateTable = Vec<AggregateRow>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    #[serde(rename = "size")]
    SizeBytes,
    #[serde(rename = "size_verbose")]
    SizeLabel,
    #[serde(rename = "r_bw_mean")]
    ReadBwMean,
    #[serde(rename = "r_lat_mean")]
    ReadLatencyMean,
    #[serde(rename = "r_bw")]
    ReadBw,
    #[serde(rename = "r_iops")]
    ReadIops,
    #[serde(rename = "w_bw_mean")]
    WriteBwMean,
    #[serde(rename = "w_lat_mean")]
    WriteLatencyMean,
    #[serde(rename = "w_bw")]
    WriteBw,
    #[serde(rename = "w_iops")]
    WriteIops,
    #[serde(rename = "config")]
    Config,
}

impl Column {
    pub const ALL: [Column; 11] = [
        Column::SizeBytes,
        Column::SizeLabel,
        Column::ReadBwMean,
        Column::ReadLatencyMean,
        Column::ReadBw,
        Column::ReadIops,
        Column::WriteBwMean,
        Column::WriteLatencyMean,
        Column::WriteBw,
        Column::WriteIops,
        Column::Config,
    ];

    /// Columns that are averaged during aggregation
    pub const METRICS: [Column; 8] = [
        Column::ReadBwMean,
        Column::ReadLatencyMean,
        Column::ReadBw,
        Column::ReadIops,
        Column::WriteBwMean,
        Column::WriteLatencyMean,
        Column::WriteBw,
        Column::WriteIops,
    ];

    pub fn name(self) -> &'static str {
        HEADER[self as usize]
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, Column::SizeLabel | Column::Config)
    }

    pub fn numeric(self, row: &MetricRecord) -> Option<f64> {
        match self {
            Column::SizeBytes => row.size_bytes.map(|x| x as f64),
            Column::SizeLabel | Column::Config => None,
            _ => self.metric(row),
        }
    }

    pub fn text(self, row: &MetricRecord) -> Option<&str> {
        match self {
            Column::SizeLabel => Some(&row.size_label),
            Column::Config => Some(&row.config),
            _ => None,
        }
    }

    fn metric(self, row: &MetricRecord) -> Option<f64> {
        let value = match self {
            Column::ReadBwMean => row.read_bw_mean,
            Column::ReadLatencyMean => row.read_latency_mean_ns,
            Column::ReadBw => row.read_bw,
            Column::ReadIops => row.read_iops,
            Column::WriteBwMean => row.write_bw_mean,
            Column::WriteLatencyMean => row.write_latency_mean_ns,
            Column::WriteBw => row.write_bw,
            Column::WriteIops => row.write_iops,
            _ => return None,
        };
        Some(value)
    }

    /// Mutable access to a metric field. Key columns are not writable through this.
    pub fn metric_mut(self, row: &mut MetricRecord) -> Option<&mut f64> {
        match self {
            Column::ReadBwMean => Some(&mut row.read_bw_mean),
            Column::ReadLatencyMean => Some(&mut row.read_latency_mean_ns),
            Column::ReadBw => Some(&mut row.read_bw),
            Column::ReadIops => Some(&mut row.read_iops),
            Column::WriteBwMean => Some(&mut row.write_bw_mean),
            Column::WriteLatencyMean => Some(&mut row.write_latency_mean_ns),
            Column::WriteBw => Some(&mut row.write_bw),
            Column::WriteIops => Some(&mut row.write_iops),
            _ => None,
        }
    }
}
