use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::util::natural_order;

/// Depth of result files below a config directory: `{size}/{iteration}/{file}`
const RUN_FILE_DEPTH: usize = 3;
const ITERATION_DEPTH: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFile {
    pub config: String,
    pub path: PathBuf,
}

/// Walks `root/{benchmark}/{config}/{size}/{iteration}/{file}` result trees.
#[derive(Debug, Clone)]
pub struct TreeWalker {
    root: PathBuf,
    suffix: String,
}

impl TreeWalker {
    pub fn new(root: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            suffix: suffix.into(),
        }
    }

    pub fn benchmark_dir(&self, benchmark: &str) -> PathBuf {
        self.root.join(benchmark)
    }

    /// Config directories of a benchmark type, sorted by name
    pub fn configs(&self, benchmark: &str) -> Vec<String> {
        WalkDir::new(self.benchmark_dir(benchmark))
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) if entry.file_type().is_dir() => match entry.file_name().to_str() {
                    Some(name) => Some(name.to_owned()),
                    None => {
                        warn!("Skipping non UTF-8 config dir {}", entry.path().display());
                        None
                    }
                },
                Ok(_) => None,
                Err(err) => {
                    warn!("Skipping unreadable entry for {benchmark}: {err}");
                    None
                }
            })
            .collect()
    }

    /// Result files of one config. Size dirs are visited in lexicographic order,
    /// iteration dirs in numeric order.
    pub fn runs(&self, benchmark: &str, config: &str) -> impl Iterator<Item = PathBuf> + use<> {
        let suffix = self.suffix.clone();
        WalkDir::new(self.benchmark_dir(benchmark).join(config))
            .min_depth(RUN_FILE_DEPTH)
            .max_depth(RUN_FILE_DEPTH)
            .follow_links(true)
            .sort_by(|a, b| {
                let (a_name, b_name) = (
                    a.file_name().to_string_lossy(),
                    b.file_name().to_string_lossy(),
                );
                if a.depth() == ITERATION_DEPTH {
                    natural_order(&a_name, &b_name)
                } else {
                    a_name.cmp(&b_name)
                }
            })
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) if is_result_file(&entry, &suffix) => Some(entry.into_path()),
                Ok(entry) => {
                    debug!("Ignoring {}", entry.path().display());
                    None
                }
                Err(err) => {
                    warn!(
                        "Skipping {}: {err}",
                        err.path().unwrap_or(Path::new("<unknown>")).display()
                    );
                    None
                }
            })
    }

    /// Lazily yields every result file of a benchmark type with its config label
    pub fn walk(&self, benchmark: &str) -> impl Iterator<Item = RunFile> {
        self.configs(benchmark).into_iter().flat_map(move |config| {
            self.runs(benchmark, &config).map(move |path| RunFile {
                config: config.clone(),
                path,
            })
        })
    }
}

fn is_result_file(entry: &DirEntry, suffix: &str) -> bool {
    entry.file_type().is_file()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(suffix))
}
