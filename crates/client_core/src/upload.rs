use std::sync::Arc;

use shared::{
    catalog,
    domain::{AcceptedUpload, DataOrientation, RequestToken},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    emit_prompt,
    error::ClientError,
    pending::PendingGuard,
    transport::{AnalysisService, MatrixFile},
    ClientEvent,
};

/// Reason recorded when the upload failed without an explanation from the
/// service.
pub const UNREACHABLE_REASON: &str = "service unreachable";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UploadOutcome {
    #[default]
    Idle,
    Uploading,
    Accepted(AcceptedUpload),
    Rejected {
        reason: String,
    },
}

impl UploadOutcome {
    pub fn accepted(&self) -> Option<&AcceptedUpload> {
        match self {
            UploadOutcome::Accepted(upload) => Some(upload),
            _ => None,
        }
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self, UploadOutcome::Uploading)
    }

    pub fn status_line(&self) -> Option<String> {
        match self {
            UploadOutcome::Idle => None,
            UploadOutcome::Uploading => Some("Uploading and validating...".to_string()),
            UploadOutcome::Accepted(upload) => Some(format!(
                "Accepted {} as {} with shape {}",
                upload.original_filename, upload.server_filename, upload.original_shape
            )),
            UploadOutcome::Rejected { reason } => Some(format!("Upload failed: {reason}")),
        }
    }
}

struct UploadState {
    file: Option<MatrixFile>,
    orientation: DataOrientation,
    outcome: UploadOutcome,
    latest: RequestToken,
}

pub struct UploadController {
    service: Arc<dyn AnalysisService>,
    inner: Arc<Mutex<UploadState>>,
    events: broadcast::Sender<ClientEvent>,
}

impl UploadController {
    pub fn new(service: Arc<dyn AnalysisService>, events: broadcast::Sender<ClientEvent>) -> Self {
        Self {
            service,
            inner: Arc::new(Mutex::new(UploadState {
                file: None,
                orientation: DataOrientation::default(),
                outcome: UploadOutcome::Idle,
                latest: RequestToken(0),
            })),
            events,
        }
    }

    pub async fn outcome(&self) -> UploadOutcome {
        self.inner.lock().await.outcome.clone()
    }

    pub async fn accepted(&self) -> Option<AcceptedUpload> {
        self.inner.lock().await.outcome.accepted().cloned()
    }

    pub async fn orientation(&self) -> DataOrientation {
        self.inner.lock().await.orientation
    }

    pub async fn selected_filename(&self) -> Option<String> {
        self.inner
            .lock()
            .await
            .file
            .as_ref()
            .map(|file| file.filename.clone())
    }

    /// Example text for the currently declared orientation.
    pub async fn example(&self) -> &'static str {
        catalog::example_for(self.orientation().await)
    }

    /// Replaces the held file and, when one is given, uploads it right away.
    /// Clearing the selection leaves the outcome `Idle` without a request.
    pub async fn select_file(
        &self,
        file: Option<MatrixFile>,
    ) -> Result<UploadOutcome, ClientError> {
        {
            let mut guard = self.inner.lock().await;
            // Responses still in flight for the previous selection must not land.
            guard.latest = guard.latest.next();
            guard.file = file;
            publish(&mut guard, &self.events, UploadOutcome::Idle);
            if guard.file.is_none() {
                info!("upload: file selection cleared");
                return Ok(UploadOutcome::Idle);
            }
        }
        self.submit_upload().await
    }

    /// Records the declared orientation and re-validates the held file under
    /// it. Without a held file nothing is sent.
    pub async fn change_orientation(
        &self,
        orientation: DataOrientation,
    ) -> Result<UploadOutcome, ClientError> {
        {
            let mut guard = self.inner.lock().await;
            guard.orientation = orientation;
            info!(format = %orientation, "upload: data format changed");
            if guard.file.is_none() {
                return Ok(guard.outcome.clone());
            }
        }
        self.submit_upload().await
    }

    pub async fn submit_upload(&self) -> Result<UploadOutcome, ClientError> {
        let (token, file, orientation) = {
            let mut guard = self.inner.lock().await;
            let Some(file) = guard.file.clone() else {
                return Err(emit_prompt(&self.events, ClientError::NoFileSelected));
            };
            let token = guard.latest.next();
            guard.latest = token;
            let orientation = guard.orientation;
            publish(&mut guard, &self.events, UploadOutcome::Uploading);
            (token, file, orientation)
        };
        let pending = PendingGuard::arm(self.inner.clone(), {
            let events = self.events.clone();
            move |state: &mut UploadState| {
                if state.latest == token {
                    warn!(token = token.0, "upload: abandoned before a response arrived");
                    let reason = UNREACHABLE_REASON.to_string();
                    publish(state, &events, UploadOutcome::Rejected { reason });
                }
            }
        });

        info!(
            token = token.0,
            filename = %file.filename,
            bytes = file.bytes.len(),
            format = %orientation,
            "upload: submitting"
        );
        let outcome = match self.service.upload_matrix(file, orientation).await {
            Ok(response) => UploadOutcome::Accepted(response.into()),
            Err(err) => {
                warn!(token = token.0, "upload: failed: {err}");
                let reason = err
                    .rejection_reason()
                    .map(str::to_owned)
                    .unwrap_or_else(|| UNREACHABLE_REASON.to_string());
                UploadOutcome::Rejected { reason }
            }
        };

        let mut guard = self.inner.lock().await;
        pending.disarm();
        if guard.latest != token {
            debug!(
                token = token.0,
                latest = guard.latest.0,
                "upload: discarding superseded response"
            );
            return Ok(guard.outcome.clone());
        }
        if let UploadOutcome::Accepted(upload) = &outcome {
            info!(
                token = token.0,
                server_filename = %upload.server_filename,
                shape = %upload.original_shape,
                "upload: accepted"
            );
        }
        publish(&mut guard, &self.events, outcome.clone());
        Ok(outcome)
    }
}

fn publish(
    state: &mut UploadState,
    events: &broadcast::Sender<ClientEvent>,
    outcome: UploadOutcome,
) {
    state.outcome = outcome.clone();
    let _ = events.send(ClientEvent::UploadChanged(outcome));
}

#[cfg(test)]
#[path = "tests/upload_tests.rs"]
mod tests;
