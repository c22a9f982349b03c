use std::path::{Path, PathBuf};

use common::{record::MetricRecord, util::parse_size_descriptor};
use thiserror::Error;
use tokio::fs::read_to_string;
use tracing::debug;

use crate::result::{FioResult, IoStats};

pub mod result;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed fio result: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("fio result contains no jobs")]
    NoJobs,
}

impl ExtractError {
    /// The document ended early, usually a file clipped by the filesystem's size limit
    pub fn is_truncated(&self) -> bool {
        matches!(self, ExtractError::Malformed(err) if err.is_eof())
    }
}

/// Parses one fio JSON document into a [`MetricRecord`] for `config`.
///
/// Metrics come from the first job. Any missing or mistyped field fails the whole
/// document, no partial record is ever returned.
pub fn extract(raw: &str, config: &str) -> Result<MetricRecord, ExtractError> {
    let result: FioResult = serde_json::from_str(raw)?;
    to_record(&result, config)
}

pub fn to_record(result: &FioResult, config: &str) -> Result<MetricRecord, ExtractError> {
    let job = result.jobs.first().ok_or(ExtractError::NoJobs)?;
    if result.jobs.len() > 1 {
        debug!(
            "{config}: using first of {} jobs ({:?})",
            result.jobs.len(),
            job.jobname
        );
    }
    let IoStats {
        bw_mean: read_bw_mean,
        lat_ns: read_lat,
        bw: read_bw,
        iops: read_iops,
        ..
    } = &job.read;
    let IoStats {
        bw_mean: write_bw_mean,
        lat_ns: write_lat,
        bw: write_bw,
        iops: write_iops,
        ..
    } = &job.write;
    let size = &result.global_options.size;

    Ok(MetricRecord {
        size_bytes: parse_size_descriptor(size),
        size_label: size.clone(),
        read_bw_mean: *read_bw_mean,
        read_latency_mean_ns: read_lat.mean,
        read_bw: *read_bw,
        read_iops: *read_iops,
        write_bw_mean: *write_bw_mean,
        write_latency_mean_ns: write_lat.mean,
        write_bw: *write_bw,
        write_iops: *write_iops,
        config: config.to_owned(),
    })
}

pub async fn extract_file(path: &Path, config: &str) -> Result<MetricRecord, ExtractError> {
    let raw = read_to_string(path)
        .await
        .map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    extract(&raw, config)
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn document(size: &str) -> Value {
        json!({
            "fio version": "fio-3.28",
            "timestamp": 1650000000,
            "global options": { "size": size, "rw": "randrw", "bs": "4k" },
            "jobs": [{
                "jobname": "bw",
                "groupid": 0,
                "error": 0,
                "read": {
                    "io_bytes": 4096,
                    "bw": 1048576,
                    "iops": 262144.123456,
                    "runtime": 1000,
                    "lat_ns": { "min": 10, "max": 900, "mean": 1234.56789, "stddev": 1.5, "N": 12 },
                    "bw_mean": 1040000.5,
                    "iops_mean": 260000.25
                },
                "write": {
                    "io_bytes": 0,
                    "bw": 524288,
                    "iops": 131072.5,
                    "runtime": 1000,
                    "lat_ns": { "min": 0, "max": 0, "mean": 2345.678, "stddev": 0.0, "N": 0 },
                    "bw_mean": 520000.75,
                    "iops_mean": 130000.0
                },
                "usr_cpu": 1.2
            }],
            "disk_util": []
        })
    }

    #[test]
    fn extracts_exact_values() {
        let raw = document("4K").to_string();
        let record = extract(&raw, "btfsbw").unwrap();
        assert_eq!(
            record,
            MetricRecord {
                size_bytes: Some(4000),
                size_label: "4K".to_owned(),
                read_bw_mean: 1040000.5,
                read_latency_mean_ns: 1234.56789,
                read_bw: 1048576.0,
                read_iops: 262144.123456,
                write_bw_mean: 520000.75,
                write_latency_mean_ns: 2345.678,
                write_bw: 524288.0,
                write_iops: 131072.5,
                config: "btfsbw".to_owned(),
            }
        );
    }

    #[test]
    fn megabyte_sizes() {
        let record = extract(&document("16M").to_string(), "fsA").unwrap();
        assert_eq!(record.size_bytes, Some(16_000_000));
    }

    #[test]
    fn unknown_unit_keeps_label() {
        for size in ["4G", "4k", "abcK", ""] {
            let record = extract(&document(size).to_string(), "fsA").unwrap();
            assert_eq!(record.size_bytes, None);
            assert_eq!(record.size_label, size);
        }
    }

    #[test]
    fn missing_fields_fail() {
        let pointers = [
            ("/global options", "size"),
            ("/jobs/0/read", "bw_mean"),
            ("/jobs/0/read", "bw"),
            ("/jobs/0/read", "iops"),
            ("/jobs/0/read/lat_ns", "mean"),
            ("/jobs/0/write", "bw_mean"),
            ("/jobs/0/write", "lat_ns"),
            ("/jobs/0", "write"),
            ("", "jobs"),
            ("", "global options"),
        ];
        for (parent, key) in pointers {
            let mut doc = document("4K");
            doc.pointer_mut(parent)
                .and_then(Value::as_object_mut)
                .unwrap()
                .remove(key);
            let err = extract(&doc.to_string(), "fsA").unwrap_err();
            assert!(
                matches!(err, ExtractError::Malformed(_)),
                "{parent}/{key}: {err}"
            );
        }
    }

    #[test]
    fn wrong_types_fail() {
        let mut doc = document("4K");
        doc["jobs"][0]["read"]["bw_mean"] = json!("fast");
        assert!(extract(&doc.to_string(), "fsA").is_err());

        let mut doc = document("4K");
        doc["global options"]["size"] = json!(4096);
        assert!(extract(&doc.to_string(), "fsA").is_err());
    }

    #[test]
    fn empty_jobs_fail() {
        let mut doc = document("4K");
        doc["jobs"] = json!([]);
        assert!(matches!(
            extract(&doc.to_string(), "fsA"),
            Err(ExtractError::NoJobs)
        ));
    }

    #[test]
    fn truncated_document_fails() {
        let raw = document("4K").to_string();
        let err = extract(&raw[..raw.len() / 2], "fsA").unwrap_err();
        assert!(err.is_truncated());
        assert!(extract("not json", "fsA").is_err());
    }

    #[tokio::test]
    async fn file_extraction_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("run.output");
        std::fs::write(&path, document("128K").to_string()).unwrap();
        let first = extract_file(&path, "fsA").await.unwrap();
        let second = extract_file(&path, "fsA").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.size_bytes, Some(128_000));

        let missing = extract_file(&tmp.path().join("gone.output"), "fsA").await;
        assert!(matches!(missing, Err(ExtractError::Io { .. })));
    }
}
