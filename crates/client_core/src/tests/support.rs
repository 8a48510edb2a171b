use std::{collections::VecDeque, sync::Arc, time::Duration};

use async_trait::async_trait;
use charting::{ChartOption, ChartSurface};
use shared::{
    domain::{ClusterId, ClusterPoint, DataOrientation, MatrixShape, Metrics},
    protocol::{AnalysisRequest, RunResponse, RunResultData, UploadResponse},
};
use tokio::sync::{oneshot, Mutex};

use crate::{
    transport::{AnalysisService, MatrixFile, ServiceError},
    ClientEvent,
};

type Reply<T> = oneshot::Receiver<Result<T, ServiceError>>;

/// Service fake that answers from a queue of scripted replies. Replies can
/// be released later to simulate slow or out-of-order responses.
#[derive(Default)]
pub(crate) struct ScriptedService {
    uploads: Mutex<VecDeque<Reply<UploadResponse>>>,
    runs: Mutex<VecDeque<Reply<RunResponse>>>,
    pub upload_calls: Arc<Mutex<Vec<(String, DataOrientation)>>>,
    pub run_calls: Arc<Mutex<Vec<AnalysisRequest>>>,
}

impl ScriptedService {
    pub async fn reply_upload(&self, result: Result<UploadResponse, ServiceError>) {
        let _ = self.gate_upload().await.send(result);
    }

    pub async fn gate_upload(&self) -> oneshot::Sender<Result<UploadResponse, ServiceError>> {
        let (tx, rx) = oneshot::channel();
        self.uploads.lock().await.push_back(rx);
        tx
    }

    pub async fn reply_run(&self, result: Result<RunResponse, ServiceError>) {
        let _ = self.gate_run().await.send(result);
    }

    pub async fn gate_run(&self) -> oneshot::Sender<Result<RunResponse, ServiceError>> {
        let (tx, rx) = oneshot::channel();
        self.runs.lock().await.push_back(rx);
        tx
    }

    pub async fn upload_call_count(&self) -> usize {
        self.upload_calls.lock().await.len()
    }

    pub async fn run_call_count(&self) -> usize {
        self.run_calls.lock().await.len()
    }

    pub async fn wait_for_upload_calls(&self, expected: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.upload_call_count().await < expected {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("upload call was not issued in time");
    }

    pub async fn wait_for_run_calls(&self, expected: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.run_call_count().await < expected {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("run call was not issued in time");
    }
}

#[async_trait]
impl AnalysisService for ScriptedService {
    async fn upload_matrix(
        &self,
        file: MatrixFile,
        orientation: DataOrientation,
    ) -> Result<UploadResponse, ServiceError> {
        self.upload_calls
            .lock()
            .await
            .push((file.filename.clone(), orientation));
        let Some(reply) = self.uploads.lock().await.pop_front() else {
            return Err(ServiceError::Unavailable);
        };
        reply.await.unwrap_or(Err(ServiceError::Unavailable))
    }

    async fn run_analysis(&self, request: AnalysisRequest) -> Result<RunResponse, ServiceError> {
        self.run_calls.lock().await.push(request);
        let Some(reply) = self.runs.lock().await.pop_front() else {
            return Err(ServiceError::Unavailable);
        };
        reply.await.unwrap_or(Err(ServiceError::Unavailable))
    }
}

#[derive(Default)]
pub(crate) struct RecordingSurface {
    pub options: std::sync::Mutex<Vec<ChartOption>>,
}

impl RecordingSurface {
    pub fn calls(&self) -> usize {
        self.options.lock().expect("lock").len()
    }

    pub fn last(&self) -> Option<ChartOption> {
        self.options.lock().expect("lock").last().cloned()
    }
}

impl ChartSurface for RecordingSurface {
    fn replace_option(&self, option: &ChartOption) -> anyhow::Result<()> {
        self.options.lock().expect("lock").push(option.clone());
        Ok(())
    }
}

pub(crate) fn matrix_file(name: &str) -> MatrixFile {
    MatrixFile::new(name, b",F1,F2\nS1,10,20\nS2,30,40".to_vec())
}

pub(crate) fn upload_response(filename: &str, rows: u64, cols: u64) -> UploadResponse {
    UploadResponse {
        filename: filename.to_string(),
        original_filename: "matrix.csv".to_string(),
        original_shape: MatrixShape::new(rows, cols),
        message: None,
    }
}

pub(crate) fn sample_points(count: usize, clusters: i64) -> Vec<ClusterPoint> {
    (0..count)
        .map(|idx| ClusterPoint {
            x: idx as f64 * 0.5,
            y: -(idx as f64) * 0.25,
            label: format!("S{idx}"),
            cluster_id: ClusterId(idx as i64 % clusters),
        })
        .collect()
}

pub(crate) fn run_response(
    metrics: Option<Metrics>,
    points: Option<Vec<ClusterPoint>>,
) -> RunResponse {
    RunResponse {
        status: "success".to_string(),
        message: "K-means finished".to_string(),
        server_time: None,
        data: RunResultData {
            metrics,
            plot_data: points,
            details: Default::default(),
        },
    }
}

pub(crate) fn drain_events(
    rx: &mut tokio::sync::broadcast::Receiver<ClientEvent>,
) -> Vec<ClientEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
