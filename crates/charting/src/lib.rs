//! Cluster scatter rendering against an external charting surface.

use std::{collections::BTreeMap, sync::Arc};

use shared::domain::{ClusterId, ClusterPoint};
use tracing::{debug, warn};

pub mod option;

pub use option::{ChartOption, ScatterDatum, ScatterSeries};

use option::{
    AxisOption, DatumTooltip, ItemStyle, LegendOption, TooltipOption, MARKER_OPACITY,
    MARKER_SYMBOL, X_AXIS_TITLE, Y_AXIS_TITLE,
};

/// The charting collaborator. Each call replaces whatever the surface
/// showed before.
pub trait ChartSurface: Send + Sync {
    fn replace_option(&self, option: &ChartOption) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSeries {
    pub cluster_id: ClusterId,
    pub points: Vec<ClusterPoint>,
}

impl ClusterSeries {
    pub fn name(&self) -> String {
        series_name(self.cluster_id)
    }
}

pub fn series_name(cluster_id: ClusterId) -> String {
    format!("Cluster {cluster_id}")
}

/// Groups points by cluster id, ascending by id, keeping each point's
/// relative order within its cluster.
pub fn cluster_series(points: &[ClusterPoint]) -> Vec<ClusterSeries> {
    let mut grouped: BTreeMap<ClusterId, Vec<ClusterPoint>> = BTreeMap::new();
    for point in points {
        grouped.entry(point.cluster_id).or_default().push(point.clone());
    }
    grouped
        .into_iter()
        .map(|(cluster_id, points)| ClusterSeries { cluster_id, points })
        .collect()
}

pub fn format_tooltip(point: &ClusterPoint, series_name: &str) -> String {
    format!(
        "{}\nCluster: {}\n(x: {:.2}, y: {:.2})",
        point.label, series_name, point.x, point.y
    )
}

pub fn build_chart_option(points: &[ClusterPoint]) -> ChartOption {
    let series: Vec<ScatterSeries> = cluster_series(points)
        .into_iter()
        .map(|cluster| {
            let name = cluster.name();
            let data = cluster
                .points
                .iter()
                .map(|point| ScatterDatum {
                    value: [point.x, point.y],
                    name: point.label.clone(),
                    tooltip: DatumTooltip {
                        formatter: format_tooltip(point, &name),
                    },
                })
                .collect();
            ScatterSeries {
                name,
                kind: "scatter",
                symbol: MARKER_SYMBOL,
                item_style: ItemStyle {
                    opacity: MARKER_OPACITY,
                },
                data,
            }
        })
        .collect();

    ChartOption {
        tooltip: TooltipOption { trigger: "item" },
        legend: LegendOption {
            data: series.iter().map(|s| s.name.clone()).collect(),
        },
        x_axis: AxisOption::value(X_AXIS_TITLE),
        y_axis: AxisOption::value(Y_AXIS_TITLE),
        series,
    }
}

#[derive(Clone, Default)]
pub struct ResultRenderer {
    surface: Option<Arc<dyn ChartSurface>>,
}

impl ResultRenderer {
    pub fn new(surface: Arc<dyn ChartSurface>) -> Self {
        Self {
            surface: Some(surface),
        }
    }

    pub fn detached() -> Self {
        Self::default()
    }

    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    /// Renders `points` onto the surface. Returns the number of series drawn,
    /// or `None` when nothing reached the surface.
    pub fn render(&self, points: &[ClusterPoint]) -> Option<usize> {
        let Some(surface) = self.surface.as_ref() else {
            debug!("render skipped: no chart surface attached");
            return None;
        };
        if points.is_empty() {
            debug!("render skipped: no points");
            return None;
        }

        let option = build_chart_option(points);
        let series_count = option.series.len();
        if let Err(err) = surface.replace_option(&option) {
            warn!(series = series_count, "chart surface rejected option: {err}");
            return None;
        }
        debug!(series = series_count, points = points.len(), "rendered cluster chart");
        Some(series_count)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
