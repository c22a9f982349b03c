use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, WriterBuilder};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

use crate::record::{HEADER, MetricRecord};

/// Quote character of the tables, `,` is the delimiter
pub const QUOTE: u8 = b'|';
pub const EXTENSION: &str = "csv";

#[derive(Debug, Error)]
pub enum TableError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Schema mismatch in {table}: expected [{expected}], found [{found}]")]
    SchemaMismatch {
        table: String,
        expected: String,
        found: String,
    },
}

impl TableError {
    fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            source,
        }
    }

    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Rows of one (benchmark type, config) unit, as written by [`TableWriter`].
#[derive(Debug, Clone, PartialEq)]
pub struct PerRunTable {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<MetricRecord>,
}

impl PerRunTable {
    pub fn new(name: impl Into<String>, rows: Vec<MetricRecord>) -> Self {
        Self {
            name: name.into(),
            header: HEADER.iter().map(|x| x.to_string()).collect(),
            rows,
        }
    }

    /// Reads a table back. A header that differs from [`HEADER`] is a schema mismatch.
    pub fn read(path: &Path) -> Result<Self, TableError> {
        let name = path
            .file_stem()
            .map(|x| x.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut reader = ReaderBuilder::new()
            .quote(QUOTE)
            .from_path(path)
            .map_err(|err| TableError::csv(path, err))?;
        let header = reader
            .headers()
            .map_err(|err| TableError::csv(path, err))?
            .iter()
            .map(|x| x.to_owned())
            .collect::<Vec<_>>();
        let table = Self {
            name,
            header,
            rows: Vec::new(),
        };
        table.check_schema()?;

        let rows = reader
            .deserialize::<MetricRecord>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| TableError::csv(path, err))?;
        Ok(Self { rows, ..table })
    }

    pub fn check_schema(&self) -> Result<(), TableError> {
        if self.header.iter().map(String::as_str).eq(HEADER) {
            return Ok(());
        }
        Err(TableError::SchemaMismatch {
            table: self.name.clone(),
            expected: HEADER.join(","),
            found: self.header.join(","),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableArtifact {
    pub config: String,
    pub path: PathBuf,
    pub rows: usize,
}

/// Writes one `{benchmark}_{config}.csv` artifact per config.
#[derive(Debug, Clone)]
pub struct TableWriter {
    out_dir: PathBuf,
    benchmark: String,
}

impl TableWriter {
    pub fn new(out_dir: impl Into<PathBuf>, benchmark: impl Into<String>) -> Self {
        Self {
            out_dir: out_dir.into(),
            benchmark: benchmark.into(),
        }
    }

    pub fn artifact_path(&self, config: &str) -> PathBuf {
        self.out_dir
            .join(format!("{}_{config}.{EXTENSION}", self.benchmark))
    }

    /// Writes the header and the records in the order received, replacing any previous artifact
    pub fn write<I>(&self, config: &str, records: I) -> Result<TableArtifact, TableError>
    where
        I: IntoIterator<Item = MetricRecord>,
    {
        let path = self.artifact_path(config);
        let rows = write_table(&path, records)?;
        debug!("Wrote {rows} rows to {}", path.display());
        Ok(TableArtifact {
            config: config.to_owned(),
            path,
            rows,
        })
    }

    /// Per-run tables of this benchmark type found in the output dir, sorted by name
    pub fn existing(&self) -> Result<Vec<PathBuf>, TableError> {
        if !self.out_dir.is_dir() {
            return Ok(Vec::new());
        }
        let prefix = format!("{}_", self.benchmark);
        let entries =
            std::fs::read_dir(&self.out_dir).map_err(|err| TableError::io(&self.out_dir, err))?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| TableError::io(&self.out_dir, err))?;
            let path = entry.path();
            let matches = path.is_file()
                && path.extension().is_some_and(|ext| ext == EXTENSION)
                && path
                    .file_name()
                    .and_then(|x| x.to_str())
                    .is_some_and(|x| x.starts_with(&prefix));
            if matches {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

/// Writes rows to a temp file next to `path` and persists it over `path`. Returns the row count.
///
/// The temp file is removed if any step fails.
pub fn write_table<I>(path: &Path, records: I) -> Result<usize, TableError>
where
    I: IntoIterator<Item = MetricRecord>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir).map_err(|err| TableError::io(dir, err))?;
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote(QUOTE)
        .from_writer(tmp);
    writer
        .write_record(HEADER)
        .map_err(|err| TableError::csv(path, err))?;

    let mut rows = 0;
    for record in records {
        writer
            .serialize(record)
            .map_err(|err| TableError::csv(path, err))?;
        rows += 1;
    }
    let tmp = writer
        .into_inner()
        .map_err(|err| TableError::io(path, err.into_error()))?;
    tmp.persist(path)
        .map_err(|err| TableError::io(path, err.error))?;
    Ok(rows)
}
