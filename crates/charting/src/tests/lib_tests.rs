use super::*;
use std::sync::Mutex;

#[derive(Default)]
struct RecordingSurface {
    options: Mutex<Vec<ChartOption>>,
    fail_with: Option<String>,
}

impl RecordingSurface {
    fn failing(err: impl Into<String>) -> Self {
        Self {
            options: Mutex::new(Vec::new()),
            fail_with: Some(err.into()),
        }
    }

    fn calls(&self) -> usize {
        self.options.lock().expect("lock").len()
    }

    fn last(&self) -> ChartOption {
        self.options
            .lock()
            .expect("lock")
            .last()
            .cloned()
            .expect("at least one render")
    }
}

impl ChartSurface for RecordingSurface {
    fn replace_option(&self, option: &ChartOption) -> anyhow::Result<()> {
        if let Some(err) = &self.fail_with {
            return Err(anyhow::anyhow!(err.clone()));
        }
        self.options.lock().expect("lock").push(option.clone());
        Ok(())
    }
}

fn point(label: &str, cluster: i64, x: f64, y: f64) -> ClusterPoint {
    ClusterPoint {
        x,
        y,
        label: label.to_string(),
        cluster_id: ClusterId(cluster),
    }
}

fn mixed_points() -> Vec<ClusterPoint> {
    vec![
        point("s0", 2, 0.0, 0.0),
        point("s1", 0, 1.0, 1.0),
        point("s2", 1, 2.0, 2.0),
        point("s3", 0, 3.0, 3.0),
        point("s4", 2, 4.0, 4.0),
    ]
}

#[test]
fn groups_points_by_ascending_cluster_id() {
    let series = cluster_series(&mixed_points());

    let ids: Vec<_> = series.iter().map(|s| s.cluster_id).collect();
    assert_eq!(ids, vec![ClusterId(0), ClusterId(1), ClusterId(2)]);

    let labels = |idx: usize| -> Vec<&str> {
        series[idx].points.iter().map(|p| p.label.as_str()).collect()
    };
    assert_eq!(labels(0), vec!["s1", "s3"]);
    assert_eq!(labels(1), vec!["s2"]);
    assert_eq!(labels(2), vec!["s0", "s4"]);
}

#[test]
fn orders_ids_numerically_including_negative_and_sparse_ids() {
    let points = vec![
        point("a", 10, 0.0, 0.0),
        point("b", -1, 0.0, 0.0),
        point("c", 2, 0.0, 0.0),
    ];
    let names: Vec<_> = cluster_series(&points).iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["Cluster -1", "Cluster 2", "Cluster 10"]);
}

#[test]
fn tooltip_rounds_coordinates_to_two_decimals() {
    let text = format_tooltip(&point("TCGA-A1", 1, 1.23456, -0.5), "Cluster 1");
    assert_eq!(text, "TCGA-A1\nCluster: Cluster 1\n(x: 1.23, y: -0.50)");
}

#[test]
fn chart_option_carries_axes_legend_and_marker_style() {
    let option = build_chart_option(&mixed_points());

    assert_eq!(option.legend.data, vec!["Cluster 0", "Cluster 1", "Cluster 2"]);
    assert_eq!(option.x_axis.name, "PC 1");
    assert_eq!(option.y_axis.name, "PC 2");
    assert!(!option.x_axis.split_line.show);
    assert!(!option.y_axis.split_line.show);
    for series in &option.series {
        assert_eq!(series.kind, "scatter");
        assert_eq!(series.symbol, "emptyCircle");
        assert_eq!(series.item_style.opacity, 0.8);
    }

    let json = serde_json::to_value(&option).expect("serialize");
    assert_eq!(json["xAxis"]["type"], "value");
    assert_eq!(json["xAxis"]["splitLine"]["show"], false);
    assert_eq!(json["series"][0]["itemStyle"]["opacity"], 0.8);
    assert_eq!(json["series"][0]["data"][0]["name"], "s1");
    assert_eq!(
        json["series"][0]["data"][0]["tooltip"]["formatter"],
        "s1\nCluster: Cluster 0\n(x: 1.00, y: 1.00)"
    );
}

#[test]
fn render_replaces_surface_option_each_call() {
    let surface = Arc::new(RecordingSurface::default());
    let renderer = ResultRenderer::new(surface.clone());

    assert_eq!(renderer.render(&mixed_points()), Some(3));
    assert_eq!(renderer.render(&[point("only", 7, 0.0, 0.0)]), Some(1));

    assert_eq!(surface.calls(), 2);
    let last = surface.last();
    assert_eq!(last.series.len(), 1);
    assert_eq!(last.series[0].name, "Cluster 7");
}

#[test]
fn render_with_no_points_never_touches_surface() {
    let surface = Arc::new(RecordingSurface::default());
    let renderer = ResultRenderer::new(surface.clone());

    assert_eq!(renderer.render(&[]), None);
    assert_eq!(surface.calls(), 0);
}

#[test]
fn render_without_surface_is_silent() {
    let renderer = ResultRenderer::detached();
    assert!(!renderer.has_surface());
    assert_eq!(renderer.render(&mixed_points()), None);
}

#[test]
fn surface_failure_is_swallowed() {
    let renderer = ResultRenderer::new(Arc::new(RecordingSurface::failing("canvas disposed")));
    assert_eq!(renderer.render(&mixed_points()), None);
}
