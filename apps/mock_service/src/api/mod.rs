use std::f64::consts::TAU;

use csv::{ReaderBuilder, StringRecord, Trim};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde_json::{json, Map, Value};
use shared::{
    domain::{ClusterId, ClusterPoint, DataOrientation, MatrixShape, Metrics},
    error::ParseOrientationError,
    protocol::{RunParameters, RunResultData},
};
use thiserror::Error;

/// Upper bound on scatter points returned for one run.
pub const MAX_PLOTTED_SAMPLES: u64 = 500;

const CLUSTER_RADIUS: f64 = 4.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMatrix {
    pub original_filename: String,
    pub orientation: DataOrientation,
    pub shape: MatrixShape,
}

impl StoredMatrix {
    pub fn sample_count(&self) -> u64 {
        if self.orientation.samples_are_rows() {
            self.shape.rows
        } else {
            self.shape.cols
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("no file was attached to the upload")]
    MissingFile,
    #[error("the upload did not declare a data format")]
    MissingFormat,
    #[error(transparent)]
    Format(#[from] ParseOrientationError),
    #[error("invalid filename {0:?}")]
    InvalidFilename(String),
    #[error("file is not UTF-8 text")]
    NotText,
    #[error("file is not valid CSV: {0}")]
    Malformed(String),
    #[error("file contains no rows")]
    Empty,
    #[error("row {row} has {found} fields but the first row has {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("no data cells remain once names are removed for {orientation}")]
    NoData { orientation: DataOrientation },
    #[error(
        "non-numeric value {value:?} at row {row}, column {col}; \
         check that the file matches {orientation}"
    )]
    NotNumeric {
        value: String,
        row: usize,
        col: usize,
        orientation: DataOrientation,
    },
}

/// Validates one multipart upload and returns what the service keeps about it.
pub fn accept_upload(
    original_filename: &str,
    data_format: Option<&str>,
    bytes: &[u8],
) -> Result<StoredMatrix, UploadError> {
    let orientation: DataOrientation = data_format
        .ok_or(UploadError::MissingFormat)?
        .parse()?;
    validate_filename(original_filename)?;
    let shape = inspect_matrix(bytes, orientation)?;
    Ok(StoredMatrix {
        original_filename: original_filename.to_string(),
        orientation,
        shape,
    })
}

fn validate_filename(filename: &str) -> Result<(), UploadError> {
    let trimmed = filename.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains(['/', '\\'])
        || trimmed.chars().any(char::is_control)
    {
        return Err(UploadError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}

/// Reads a comma separated matrix under `orientation` and returns the shape
/// of its numeric block. Quoted fields follow RFC 4180 and blank lines are
/// ignored; every other row must have as many fields as the first.
pub fn inspect_matrix(
    bytes: &[u8],
    orientation: DataOrientation,
) -> Result<MatrixShape, UploadError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let mut rows: Vec<StringRecord> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| match err.kind() {
            csv::ErrorKind::Utf8 { .. } => UploadError::NotText,
            _ => UploadError::Malformed(err.to_string()),
        })?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(record);
    }

    let Some(first) = rows.first() else {
        return Err(UploadError::Empty);
    };
    let expected = first.len();
    if let Some((idx, row)) = rows
        .iter()
        .enumerate()
        .find(|(_, row)| row.len() != expected)
    {
        return Err(UploadError::Ragged {
            row: idx + 1,
            expected,
            found: row.len(),
        });
    }

    let skip_rows = usize::from(orientation.has_header_row());
    let skip_cols = usize::from(orientation.has_row_names());
    let data_rows = rows.len().saturating_sub(skip_rows);
    let data_cols = expected.saturating_sub(skip_cols);
    if data_rows == 0 || data_cols == 0 {
        return Err(UploadError::NoData { orientation });
    }

    for (row_idx, row) in rows.iter().enumerate().skip(skip_rows) {
        for (col_idx, cell) in row.iter().enumerate().skip(skip_cols) {
            if cell.parse::<f64>().is_err() {
                return Err(UploadError::NotNumeric {
                    value: cell.to_string(),
                    row: row_idx + 1,
                    col: col_idx + 1,
                    orientation,
                });
            }
        }
    }

    Ok(MatrixShape::new(data_rows as u64, data_cols as u64))
}

/// Canned result for a run. Known algorithms get metrics and a scatter of
/// every sample (capped at [`MAX_PLOTTED_SAMPLES`]); anything else is
/// reported as pending with no sections.
pub fn analysis_data(
    algorithm: &str,
    params: RunParameters,
    matrix: &StoredMatrix,
) -> RunResultData {
    let (metrics, details) = match algorithm {
        "K-means" => (
            Metrics {
                silhouette: 0.41,
                calinski_harabasz: 120.3,
                davies_bouldin: 0.77,
            },
            json!({
                "method": "K-means (Lloyd)",
                "clusters_found": params.cluster_count,
                "iterations_run": params.max_iterations.min(25),
            }),
        ),
        "PIntMF" => (
            Metrics {
                silhouette: 0.52,
                calinski_harabasz: 148.6,
                davies_bouldin: 0.69,
            },
            json!({
                "method": "PIntMF (Matrix Factorization)",
                "clusters_found": params.cluster_count,
                "accuracy_score": 0.88,
                "top_genes": ["TP53", "BRCA1", "EGFR"],
            }),
        ),
        "Subtype-GAN" => (
            Metrics {
                silhouette: 0.47,
                calinski_harabasz: 133.9,
                davies_bouldin: 0.72,
            },
            json!({
                "method": "Subtype-GAN (Deep Learning)",
                "clusters_found": params.cluster_count,
                "convergence_epoch": 600,
                "note": "Latent space projected onto two components",
            }),
        ),
        other => {
            return RunResultData {
                metrics: None,
                plot_data: None,
                details: details_map(json!({
                    "info": format!("Algorithm {other} is not implemented yet"),
                    "status": "pending",
                })),
            };
        }
    };

    RunResultData {
        metrics: Some(metrics),
        plot_data: Some(scatter_points(matrix.sample_count(), params)),
        details: details_map(details),
    }
}

fn details_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Places samples round-robin into `cluster_count` blobs laid out on a
/// circle. Jitter is drawn from an rng seeded with `random_seed`, so equal
/// parameters give equal points.
pub fn scatter_points(samples: u64, params: RunParameters) -> Vec<ClusterPoint> {
    let clusters = u64::from(params.cluster_count.max(1));
    let mut rng = StdRng::seed_from_u64(params.random_seed as u64);
    (0..samples.min(MAX_PLOTTED_SAMPLES))
        .map(|idx| {
            let cluster = idx % clusters;
            let angle = TAU * cluster as f64 / clusters as f64;
            let jitter_x: f64 = rng.gen_range(-1.0..1.0);
            let jitter_y: f64 = rng.gen_range(-1.0..1.0);
            ClusterPoint {
                x: CLUSTER_RADIUS * angle.cos() + jitter_x,
                y: CLUSTER_RADIUS * angle.sin() + jitter_y,
                label: format!("S{}", idx + 1),
                cluster_id: ClusterId(cluster as i64),
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
