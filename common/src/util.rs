use std::{cmp::Ordering, path::PathBuf};

use eyre::{Context, Result};
use futures::future::join_all;
use tokio::fs::create_dir_all;

/// Parses fio's `size` option, ie. `4K` or `16M`, into bytes.
///
/// Units are decimal (`K` = 1000, `M` = 1000000). Returns `None` for any other
/// unit or a prefix that is not an integer.
pub fn parse_size_descriptor(size: &str) -> Option<u64> {
    let mut chars = size.chars();
    let factor: u64 = match chars.next_back()? {
        'K' => 1000,
        'M' => 1_000_000,
        _ => return None,
    };
    chars.as_str().parse::<u64>().ok()?.checked_mul(factor)
}

/// Orders directory names numerically when both are integers, numeric names first.
pub fn natural_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

pub async fn ensure_dirs(dirs: &[PathBuf]) -> Result<()> {
    let create_jobs = dirs.iter().map(create_dir_all);
    for (res, dir) in join_all(create_jobs).await.into_iter().zip(dirs) {
        res.with_context(|| format!("Create directory {}", dir.display()))?;
    }
    Ok(())
}
