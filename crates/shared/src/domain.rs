use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ParseOrientationError;

macro_rules! id_newtype {
    ($name:ident, $inner:ty) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(ClusterId, i64);
id_newtype!(RequestToken, u64);

impl RequestToken {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Declared arrangement of samples and features in an uploaded matrix.
///
/// "Feature-major" layouts place one sample per row with features running
/// along the columns; "sample-major" layouts are the transpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataOrientation {
    #[default]
    FeatureMajorNamed,
    SampleMajorNamed,
    FeatureMajorHeaded,
    SampleMajorHeaded,
    FeatureMajorColumned,
    SampleMajorColumned,
    AnonymousFeatureMajor,
    AnonymousSampleMajor,
}

impl DataOrientation {
    pub const ALL: [DataOrientation; 8] = [
        DataOrientation::FeatureMajorNamed,
        DataOrientation::SampleMajorNamed,
        DataOrientation::FeatureMajorHeaded,
        DataOrientation::SampleMajorHeaded,
        DataOrientation::FeatureMajorColumned,
        DataOrientation::SampleMajorColumned,
        DataOrientation::AnonymousFeatureMajor,
        DataOrientation::AnonymousSampleMajor,
    ];

    /// Wire token sent as the `data_format` upload field.
    pub fn token(self) -> &'static str {
        match self {
            DataOrientation::FeatureMajorNamed => "feature-major-named",
            DataOrientation::SampleMajorNamed => "sample-major-named",
            DataOrientation::FeatureMajorHeaded => "feature-major-headed",
            DataOrientation::SampleMajorHeaded => "sample-major-headed",
            DataOrientation::FeatureMajorColumned => "feature-major-columned",
            DataOrientation::SampleMajorColumned => "sample-major-columned",
            DataOrientation::AnonymousFeatureMajor => "anonymous-feature-major",
            DataOrientation::AnonymousSampleMajor => "anonymous-sample-major",
        }
    }

    pub fn has_header_row(self) -> bool {
        matches!(
            self,
            DataOrientation::FeatureMajorNamed
                | DataOrientation::SampleMajorNamed
                | DataOrientation::FeatureMajorHeaded
                | DataOrientation::SampleMajorHeaded
        )
    }

    pub fn has_row_names(self) -> bool {
        matches!(
            self,
            DataOrientation::FeatureMajorNamed
                | DataOrientation::SampleMajorNamed
                | DataOrientation::FeatureMajorColumned
                | DataOrientation::SampleMajorColumned
        )
    }

    pub fn samples_are_rows(self) -> bool {
        matches!(
            self,
            DataOrientation::FeatureMajorNamed
                | DataOrientation::FeatureMajorHeaded
                | DataOrientation::FeatureMajorColumned
                | DataOrientation::AnonymousFeatureMajor
        )
    }
}

impl fmt::Display for DataOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for DataOrientation {
    type Err = ParseOrientationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        DataOrientation::ALL
            .into_iter()
            .find(|orientation| orientation.token() == token)
            .ok_or_else(|| ParseOrientationError::new(token))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u64; 2]", into = "[u64; 2]")]
pub struct MatrixShape {
    pub rows: u64,
    pub cols: u64,
}

impl MatrixShape {
    pub fn new(rows: u64, cols: u64) -> Self {
        Self { rows, cols }
    }
}

impl From<[u64; 2]> for MatrixShape {
    fn from([rows, cols]: [u64; 2]) -> Self {
        Self { rows, cols }
    }
}

impl From<MatrixShape> for [u64; 2] {
    fn from(value: MatrixShape) -> Self {
        [value.rows, value.cols]
    }
}

impl fmt::Display for MatrixShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.rows, self.cols)
    }
}

/// Upload the analysis service validated and stored under `server_filename`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedUpload {
    pub server_filename: String,
    pub original_filename: String,
    pub original_shape: MatrixShape,
}

/// Quality scores echoed from the analysis service without range checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub silhouette: f64,
    #[serde(rename = "calinski")]
    pub calinski_harabasz: f64,
    #[serde(rename = "davies")]
    pub davies_bouldin: f64,
}

impl Metrics {
    /// Label/value pairs for display. Values use the shortest float repr so
    /// they read exactly as the service sent them.
    pub fn display_rows(&self) -> [(&'static str, String); 3] {
        [
            ("Silhouette", self.silhouette.to_string()),
            ("Calinski-Harabasz", self.calinski_harabasz.to_string()),
            ("Davies-Bouldin", self.davies_bouldin.to_string()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterPoint {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "name")]
    pub label: String,
    #[serde(rename = "cluster")]
    pub cluster_id: ClusterId,
}
