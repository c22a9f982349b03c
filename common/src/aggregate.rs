use std::collections::HashMap;

use tracing::info;

use crate::{
    record::{AggregateRow, AggregateTable, Column, MetricRecord},
    table::{PerRunTable, TableError},
};

/// Fields reported per group in diagnostic mode
const DIAGNOSTIC_COLUMNS: [Column; 4] = [
    Column::ReadBwMean,
    Column::WriteBwMean,
    Column::ReadLatencyMean,
    Column::WriteLatencyMean,
];

type GroupKey<'a> = (Option<u64>, &'a str, &'a str);

#[derive(Debug, Default, Clone, Copy)]
pub struct Aggregator {
    diagnostics: bool,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_diagnostics(mut self, diagnostics: bool) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Groups the rows of all tables by (size, size_verbose, config) and averages every metric.
    ///
    /// Groups appear in the order they are first seen. Rows with an unparsed size form
    /// their own groups rather than being dropped.
    pub fn aggregate(&self, tables: &[PerRunTable]) -> Result<AggregateTable, TableError> {
        for table in tables {
            table.check_schema()?;
        }

        let mut index: HashMap<GroupKey<'_>, usize> = HashMap::new();
        let mut groups: Vec<Vec<&MetricRecord>> = Vec::new();
        for row in tables.iter().flat_map(|table| table.rows.iter()) {
            let key = (row.size_bytes, row.size_label.as_str(), row.config.as_str());
            let idx = *index.entry(key).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[idx].push(row);
        }

        Ok(groups
            .iter()
            .map(|rows| {
                if self.diagnostics {
                    report_group(rows);
                }
                mean_row(rows)
            })
            .collect())
    }
}

/// Averages every metric column; key columns are taken from the first row.
fn mean_row(rows: &[&MetricRecord]) -> AggregateRow {
    let first = rows[0];
    let mut mean = AggregateRow {
        size_bytes: first.size_bytes,
        size_label: first.size_label.clone(),
        config: first.config.clone(),
        ..Default::default()
    };
    for column in Column::METRICS {
        let values = rows.iter().filter_map(|row| column.numeric(row));
        let summary = FieldSummary::of(values);
        if let (Some(field), Some(summary)) = (column.metric_mut(&mut mean), summary) {
            *field = summary.mean;
        }
    }
    mean
}

fn report_group(rows: &[&MetricRecord]) {
    let first = rows[0];
    info!(
        "Group ({}, {}) with {} rows",
        first.size_label,
        first.config,
        rows.len()
    );
    for column in DIAGNOSTIC_COLUMNS {
        if let Some(summary) = FieldSummary::of(rows.iter().filter_map(|row| column.numeric(row))) {
            info!(
                "{} min: {:.3} max: {:.3} mean: {:.3}",
                column.name(),
                summary.min,
                summary.max,
                summary.mean
            );
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl FieldSummary {
    pub fn of(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for value in values {
            count += 1;
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }
        if count == 0 {
            return None;
        }
        Some(Self {
            min,
            max,
            mean: sum / count as f64,
        })
    }
}
