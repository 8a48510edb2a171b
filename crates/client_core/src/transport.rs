use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use shared::{
    domain::DataOrientation,
    error::ServiceErrorBody,
    protocol::{
        AnalysisRequest, RunResponse, UploadResponse, RUN_PATH, UPLOAD_FILE_FIELD,
        UPLOAD_FORMAT_FIELD, UPLOAD_PATH,
    },
};
use thiserror::Error;
use tracing::debug;
use url::Url;

pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl MatrixFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("service rejected the request ({status}): {detail}")]
    Rejected { status: u16, detail: String },
    #[error("service responded with status {status}")]
    Status { status: u16 },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid service url: {0}")]
    Url(#[from] url::ParseError),
    #[error("analysis service is unavailable")]
    Unavailable,
}

impl ServiceError {
    /// The collaborator's own explanation, when it sent one.
    pub fn rejection_reason(&self) -> Option<&str> {
        match self {
            ServiceError::Rejected { detail, .. } => Some(detail),
            _ => None,
        }
    }
}

#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn upload_matrix(
        &self,
        file: MatrixFile,
        orientation: DataOrientation,
    ) -> Result<UploadResponse, ServiceError>;
    async fn run_analysis(&self, request: AnalysisRequest) -> Result<RunResponse, ServiceError>;
}

pub struct MissingAnalysisService;

#[async_trait]
impl AnalysisService for MissingAnalysisService {
    async fn upload_matrix(
        &self,
        _file: MatrixFile,
        _orientation: DataOrientation,
    ) -> Result<UploadResponse, ServiceError> {
        Err(ServiceError::Unavailable)
    }

    async fn run_analysis(&self, _request: AnalysisRequest) -> Result<RunResponse, ServiceError> {
        Err(ServiceError::Unavailable)
    }
}

pub struct HttpAnalysisService {
    http: Client,
    base_url: Url,
}

impl HttpAnalysisService {
    pub fn new(service_url: &str) -> Result<Self, ServiceError> {
        let mut base_url = Url::parse(service_url.trim())?;
        // `Url::join` drops the last path segment unless it ends with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        Ok(self.base_url.join(path)?)
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisService {
    async fn upload_matrix(
        &self,
        file: MatrixFile,
        orientation: DataOrientation,
    ) -> Result<UploadResponse, ServiceError> {
        let part = Part::bytes(file.bytes)
            .file_name(file.filename)
            .mime_str("text/csv")?;
        let form = Form::new()
            .part(UPLOAD_FILE_FIELD, part)
            .text(UPLOAD_FORMAT_FIELD, orientation.token());

        let response = self
            .http
            .post(self.endpoint(UPLOAD_PATH)?)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.bytes().await?;
        let reason = serde_json::from_slice::<ServiceErrorBody>(&body)
            .ok()
            .and_then(|body| body.reason());
        debug!(status = status.as_u16(), has_reason = reason.is_some(), "upload rejected");
        Err(match reason {
            Some(detail) => ServiceError::Rejected {
                status: status.as_u16(),
                detail,
            },
            None => ServiceError::Status {
                status: status.as_u16(),
            },
        })
    }

    async fn run_analysis(&self, request: AnalysisRequest) -> Result<RunResponse, ServiceError> {
        let response = self
            .http
            .post(self.endpoint(RUN_PATH)?)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }
}
