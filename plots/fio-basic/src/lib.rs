use std::{
    error::Error,
    fs::create_dir_all,
    ops::Range,
    path::{Path, PathBuf},
};

use common::{
    config::{ChartConfig, ConfigLabel},
    record::{AggregateRow, Column},
};
use itertools::Itertools;
use plotters::{
    coord::{
        ranged1d::{DefaultFormatting, KeyPointHint, Ranged},
        types::RangedCoordf64,
    },
    prelude::*,
};
use thiserror::Error;
use tracing::debug;

pub mod units;

const DEFAULT_SIZE: (u32, u32) = (1000, 500);
const X_DESC: &str = "Size [Bytes]";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("No rows to plot for {0}")]
    EmptyTable(String),
    #[error("Column {column} can not be used as {role} of {chart}")]
    InvalidField {
        chart: String,
        column: &'static str,
        role: &'static str,
    },
    #[error("None of the labelled configs have data for {0}")]
    NoSeries(String),
    #[error("Could not create {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Drawing {chart} failed: {message}")]
    Draw { chart: String, message: String },
}

/// What to draw: `x` against `y`, one line per labelled value of `group_by`.
#[derive(Debug, Clone)]
pub struct ChartSpec<'a> {
    pub name: &'a str,
    pub x: Column,
    pub y: Column,
    pub group_by: Column,
    /// Legend labels, in drawing order
    pub labels: &'a [ConfigLabel],
    pub x_desc: &'a str,
    pub y_desc: &'a str,
}

impl<'a> ChartSpec<'a> {
    pub fn from_config(chart: &'a ChartConfig, labels: &'a [ConfigLabel]) -> Self {
        Self {
            name: &chart.name,
            x: chart.x,
            y: chart.y,
            group_by: chart.group_by,
            labels,
            x_desc: X_DESC,
            y_desc: &chart.y_label,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    /// Tick label, the size label with a `B` suffix
    pub tick: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: Vec<Point>,
}

/// One series per label that has plottable rows, points sorted by x.
///
/// Rows without a positive numeric x can not be placed on a log axis and are left out.
pub fn build_series(table: &[AggregateRow], spec: &ChartSpec<'_>) -> Vec<Series> {
    spec.labels
        .iter()
        .filter_map(|label| {
            let points = table
                .iter()
                .filter(|row| spec.group_by.text(row) == Some(label.config.as_str()))
                .filter_map(|row| {
                    let x = spec.x.numeric(row).filter(|x| *x > 0.0)?;
                    let y = spec.y.numeric(row)?;
                    Some(Point {
                        x,
                        y,
                        tick: format!("{}B", row.size_label),
                    })
                })
                .sorted_by(|a, b| a.x.total_cmp(&b.x))
                .collect::<Vec<_>>();
            if points.is_empty() {
                debug!("No data for {} in {}", label.config, spec.name);
                return None;
            }
            Some(Series {
                label: label.label.clone(),
                points,
            })
        })
        .collect()
}

/// Distinct x positions on the log2 axis with their labels
fn x_ticks(series: &[Series]) -> Vec<(f64, String)> {
    series
        .iter()
        .flat_map(|s| s.points.iter())
        .map(|p| (p.x.log2(), p.tick.clone()))
        .sorted_by(|a, b| a.0.total_cmp(&b.0))
        .dedup_by(|a, b| a.0 == b.0)
        .collect()
}

/// Linear axis over log2 sizes whose ticks sit exactly on the data points
struct SizeAxis {
    inner: RangedCoordf64,
    ticks: Vec<f64>,
}

impl Ranged for SizeAxis {
    type FormatOption = DefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        self.inner.map(value, limit)
    }

    fn key_points<Hint: KeyPointHint>(&self, _hint: Hint) -> Vec<f64> {
        self.ticks.clone()
    }

    fn range(&self) -> Range<f64> {
        self.inner.range()
    }
}

/// Renders line charts as SVG documents into one output directory.
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    out_dir: PathBuf,
    size: (u32, u32),
}

impl ChartRenderer {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            size: DEFAULT_SIZE,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn output_path(&self, name: &str) -> PathBuf {
        self.out_dir.join(format!("{name}.svg"))
    }

    /// Draws `spec` from an already unit-normalized table, returns the written file.
    pub fn render(
        &self,
        table: &[AggregateRow],
        spec: &ChartSpec<'_>,
    ) -> Result<PathBuf, RenderError> {
        if table.is_empty() {
            return Err(RenderError::EmptyTable(spec.name.to_owned()));
        }
        for (column, role, valid) in [
            (spec.x, "x axis", spec.x.is_numeric()),
            (spec.y, "y axis", spec.y.is_numeric()),
            (spec.group_by, "grouping", !spec.group_by.is_numeric()),
        ] {
            if !valid {
                return Err(RenderError::InvalidField {
                    chart: spec.name.to_owned(),
                    column: column.name(),
                    role,
                });
            }
        }

        let series = build_series(table, spec);
        if series.is_empty() {
            return Err(RenderError::NoSeries(spec.name.to_owned()));
        }

        let (y_min, y_max) = series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.y))
            .fold((0f64, f64::NEG_INFINITY), |(lo, hi), y| {
                (lo.min(y), hi.max(y))
            });
        let y_top = if y_max > 0.0 { y_max * 1.1 } else { 1.0 };

        create_dir_all(&self.out_dir).map_err(|source| RenderError::Io {
            path: self.out_dir.clone(),
            source,
        })?;
        let path = self.output_path(spec.name);
        self.draw(&path, spec, &series, y_min..y_top)
            .map_err(|err| RenderError::Draw {
                chart: spec.name.to_owned(),
                message: err.to_string(),
            })?;
        debug!("Rendered {}", path.display());
        Ok(path)
    }

    fn draw(
        &self,
        path: &Path,
        spec: &ChartSpec<'_>,
        series: &[Series],
        y_range: Range<f64>,
    ) -> Result<(), Box<dyn Error>> {
        let ticks = x_ticks(series);
        let key_points = ticks.iter().map(|(x, _)| *x).collect::<Vec<_>>();
        let x_axis = match (key_points.first(), key_points.last()) {
            (Some(first), Some(last)) => SizeAxis {
                inner: ((first - 0.5)..(last + 0.5)).into(),
                ticks: key_points,
            },
            _ => return Err("no x positions".into()),
        };

        let root = SVGBackend::new(path, self.size).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(spec.name.replace('_', " "), ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(x_axis, y_range)?;

        let tick_label = |x: &f64| {
            ticks
                .iter()
                .find(|(pos, _)| (pos - x).abs() < 1e-9)
                .map(|(_, label)| label.clone())
                .unwrap_or_default()
        };
        chart
            .configure_mesh()
            .x_desc(spec.x_desc)
            .y_desc(spec.y_desc)
            .x_labels(ticks.len())
            .x_label_formatter(&tick_label)
            .draw()?;

        for (i, s) in series.iter().enumerate() {
            let color = Palette99::pick(i).mix(0.9);
            chart
                .draw_series(LineSeries::new(
                    s.points.iter().map(|p| (p.x.log2(), p.y)),
                    color.stroke_width(2),
                ))?
                .label(s.label.as_str())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
            chart.draw_series(
                s.points
                    .iter()
                    .map(|p| Circle::new((p.x.log2(), p.y), 3, color.filled())),
            )?;
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
        root.present()?;
        Ok(())
    }
}
