use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{AcceptedUpload, ClusterPoint, MatrixShape, Metrics};

pub const UPLOAD_PATH: &str = "api/upload";
pub const RUN_PATH: &str = "api/run";

/// Multipart field carrying the raw matrix bytes.
pub const UPLOAD_FILE_FIELD: &str = "file";
/// Multipart field carrying the declared orientation token.
pub const UPLOAD_FORMAT_FIELD: &str = "data_format";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub filename: String,
    pub original_filename: String,
    pub original_shape: MatrixShape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<UploadResponse> for AcceptedUpload {
    fn from(value: UploadResponse) -> Self {
        Self {
            server_filename: value.filename,
            original_filename: value.original_filename,
            original_shape: value.original_shape,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParameters {
    pub cluster_count: u32,
    pub random_seed: i64,
    pub max_iterations: u32,
}

impl Default for RunParameters {
    fn default() -> Self {
        Self {
            cluster_count: 3,
            random_seed: 42,
            max_iterations: 300,
        }
    }
}

/// Body of a run submission.
///
/// Only constructible from an [`AcceptedUpload`], so a request never names a
/// file the service has not accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    algorithm: String,
    #[serde(rename = "timestamp")]
    submitted_at: DateTime<Utc>,
    #[serde(rename = "filename")]
    target_file: String,
    #[serde(rename = "n_clusters")]
    cluster_count: u32,
    #[serde(rename = "random_state")]
    random_seed: i64,
    #[serde(rename = "max_iter")]
    max_iterations: u32,
}

impl AnalysisRequest {
    pub fn for_upload(
        upload: &AcceptedUpload,
        algorithm: impl Into<String>,
        params: RunParameters,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            algorithm: algorithm.into(),
            submitted_at,
            target_file: upload.server_filename.clone(),
            cluster_count: params.cluster_count,
            random_seed: params.random_seed,
            max_iterations: params.max_iterations,
        }
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn target_file(&self) -> &str {
        &self.target_file
    }

    pub fn params(&self) -> RunParameters {
        RunParameters {
            cluster_count: self.cluster_count,
            random_seed: self.random_seed,
            max_iterations: self.max_iterations,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResponse {
    pub status: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_time: Option<String>,
    #[serde(default)]
    pub data: RunResultData,
}

/// `data` section of a run response. Both sections are optional; anything
/// else the service reports is kept in `details`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResultData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot_data: Option<Vec<ClusterPoint>>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}
