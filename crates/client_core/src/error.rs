use thiserror::Error;

/// Local precondition failures. These are shown to the user as prompts and
/// never reach the analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("Please select a data file first.")]
    NoFileSelected,
    #[error("Please upload a data file that passes validation before running an analysis.")]
    NoAcceptedUpload,
    #[error("Please choose an algorithm.")]
    NoAlgorithm,
    #[error("Cluster count must be at least 2 (got {0}).")]
    InvalidClusterCount(u32),
}
