use std::sync::Arc;

use charting::ResultRenderer;
use tokio::sync::broadcast;
use tracing::info;

pub mod analysis;
pub mod error;
mod pending;
pub mod transport;
pub mod upload;

pub use analysis::{AnalysisOutcome, AnalysisResult, RunController, RUN_FAILURE_REASON};
pub use error::ClientError;
pub use transport::{
    AnalysisService, HttpAnalysisService, MatrixFile, MissingAnalysisService, ServiceError,
    DEFAULT_SERVICE_URL,
};
pub use upload::{UploadController, UploadOutcome, UNREACHABLE_REASON};

#[derive(Debug, Clone)]
pub enum ClientEvent {
    UploadChanged(UploadOutcome),
    AnalysisChanged(AnalysisOutcome),
    /// A precondition failed; the message is meant for the user as-is.
    Prompt(String),
    Rendered {
        series: usize,
    },
}

pub(crate) fn emit_prompt(
    events: &broadcast::Sender<ClientEvent>,
    err: ClientError,
) -> ClientError {
    info!("prompting user: {err}");
    let _ = events.send(ClientEvent::Prompt(err.to_string()));
    err
}

/// Upload and run controllers wired to one service and one event bus.
pub struct DeckClient {
    pub uploads: Arc<UploadController>,
    pub runs: Arc<RunController>,
    events: broadcast::Sender<ClientEvent>,
}

impl DeckClient {
    pub fn new(service: Arc<dyn AnalysisService>, renderer: ResultRenderer) -> Self {
        let (events, _) = broadcast::channel(1024);
        let uploads = Arc::new(UploadController::new(service.clone(), events.clone()));
        let runs = Arc::new(RunController::new(
            service,
            uploads.clone(),
            renderer,
            events.clone(),
        ));
        Self {
            uploads,
            runs,
            events,
        }
    }

    pub fn connect(service_url: &str, renderer: ResultRenderer) -> Result<Self, ServiceError> {
        let service = HttpAnalysisService::new(service_url)?;
        info!(service_url = %service.base_url(), "analysis service configured");
        Ok(Self::new(Arc::new(service), renderer))
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
