use std::sync::Arc;

use charting::ResultRenderer;
use chrono::Utc;
use serde_json::{Map, Value};
use shared::{
    domain::{ClusterPoint, Metrics, RequestToken},
    protocol::{AnalysisRequest, RunParameters, RunResponse},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    emit_prompt, error::ClientError, pending::PendingGuard, transport::AnalysisService,
    upload::UploadController, ClientEvent,
};

/// The run endpoint reports no structured reasons, so every failure reads
/// the same.
pub const RUN_FAILURE_REASON: &str = "connection or CORS failure";

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub message: String,
    pub metrics: Option<Metrics>,
    pub points: Option<Vec<ClusterPoint>>,
    /// Remaining fields of the response `data` object.
    pub details: Map<String, Value>,
}

impl From<RunResponse> for AnalysisResult {
    fn from(value: RunResponse) -> Self {
        Self {
            message: value.message,
            metrics: value.data.metrics,
            points: value.data.plot_data,
            details: value.data.details,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AnalysisOutcome {
    #[default]
    Idle,
    Running,
    Succeeded(AnalysisResult),
    Failed {
        reason: String,
    },
}

impl AnalysisOutcome {
    /// Loading indicator state; true exactly while a run is outstanding.
    pub fn is_loading(&self) -> bool {
        matches!(self, AnalysisOutcome::Running)
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            AnalysisOutcome::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn status_line(&self) -> Option<String> {
        match self {
            AnalysisOutcome::Idle => None,
            AnalysisOutcome::Running => Some("Running analysis...".to_string()),
            AnalysisOutcome::Succeeded(result) => Some(result.message.clone()),
            AnalysisOutcome::Failed { reason } => Some(format!("Analysis failed: {reason}")),
        }
    }
}

struct RunState {
    outcome: AnalysisOutcome,
    latest: RequestToken,
}

pub struct RunController {
    service: Arc<dyn AnalysisService>,
    uploads: Arc<UploadController>,
    renderer: ResultRenderer,
    inner: Arc<Mutex<RunState>>,
    events: broadcast::Sender<ClientEvent>,
}

impl RunController {
    pub fn new(
        service: Arc<dyn AnalysisService>,
        uploads: Arc<UploadController>,
        renderer: ResultRenderer,
        events: broadcast::Sender<ClientEvent>,
    ) -> Self {
        Self {
            service,
            uploads,
            renderer,
            inner: Arc::new(Mutex::new(RunState {
                outcome: AnalysisOutcome::Idle,
                latest: RequestToken(0),
            })),
            events,
        }
    }

    pub async fn outcome(&self) -> AnalysisOutcome {
        self.inner.lock().await.outcome.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.lock().await.outcome.is_loading()
    }

    pub async fn run(
        &self,
        algorithm: &str,
        params: RunParameters,
    ) -> Result<AnalysisOutcome, ClientError> {
        let Some(upload) = self.uploads.accepted().await else {
            return Err(emit_prompt(&self.events, ClientError::NoAcceptedUpload));
        };
        let algorithm = algorithm.trim();
        if algorithm.is_empty() {
            return Err(emit_prompt(&self.events, ClientError::NoAlgorithm));
        }
        if params.cluster_count < 2 {
            return Err(emit_prompt(
                &self.events,
                ClientError::InvalidClusterCount(params.cluster_count),
            ));
        }

        let request = AnalysisRequest::for_upload(&upload, algorithm, params, Utc::now());
        let token = {
            let mut guard = self.inner.lock().await;
            let token = guard.latest.next();
            guard.latest = token;
            publish(&mut guard, &self.events, AnalysisOutcome::Running);
            token
        };
        let pending = PendingGuard::arm(self.inner.clone(), {
            let events = self.events.clone();
            move |state: &mut RunState| {
                if state.latest == token {
                    warn!(token = token.0, "run: abandoned before a response arrived");
                    let reason = RUN_FAILURE_REASON.to_string();
                    publish(state, &events, AnalysisOutcome::Failed { reason });
                }
            }
        });

        info!(
            token = token.0,
            algorithm,
            filename = request.target_file(),
            n_clusters = params.cluster_count,
            random_state = params.random_seed,
            max_iter = params.max_iterations,
            "run: submitting"
        );
        let outcome = match self.service.run_analysis(request).await {
            Ok(response) => {
                info!(token = token.0, status = %response.status, "run: succeeded");
                AnalysisOutcome::Succeeded(response.into())
            }
            Err(err) => {
                warn!(token = token.0, "run: failed: {err}");
                AnalysisOutcome::Failed {
                    reason: RUN_FAILURE_REASON.to_string(),
                }
            }
        };

        {
            let mut guard = self.inner.lock().await;
            pending.disarm();
            if guard.latest != token {
                debug!(
                    token = token.0,
                    latest = guard.latest.0,
                    "run: discarding superseded response"
                );
                return Ok(guard.outcome.clone());
            }
            publish(&mut guard, &self.events, outcome.clone());
        }

        if outcome.result().is_some() {
            // Observers get a turn to show the result before the chart is drawn.
            tokio::task::yield_now().await;
            if self.inner.lock().await.latest == token {
                self.render_current().await;
            }
        }
        Ok(outcome)
    }

    /// Redraws the chart from the current outcome. Returns the number of
    /// series drawn.
    pub async fn render_current(&self) -> Option<usize> {
        let points = {
            let guard = self.inner.lock().await;
            guard.outcome.result()?.points.clone()?
        };
        let series = self.renderer.render(&points)?;
        let _ = self.events.send(ClientEvent::Rendered { series });
        Some(series)
    }
}

fn publish(
    state: &mut RunState,
    events: &broadcast::Sender<ClientEvent>,
    outcome: AnalysisOutcome,
) {
    state.outcome = outcome.clone();
    let _ = events.send(ClientEvent::AnalysisChanged(outcome));
}

#[cfg(test)]
#[path = "tests/analysis_tests.rs"]
mod tests;
