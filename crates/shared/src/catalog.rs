//! Static option lists offered to the user: matrix orientations with their
//! illustrative examples, and the selectable clustering algorithms.

use crate::domain::DataOrientation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOption {
    pub orientation: DataOrientation,
    pub label: &'static str,
}

pub const FORMAT_CATALOG: [FormatOption; 8] = [
    FormatOption {
        orientation: DataOrientation::FeatureMajorNamed,
        label: "Samples in rows, features in columns (row and column names)",
    },
    FormatOption {
        orientation: DataOrientation::SampleMajorNamed,
        label: "Features in rows, samples in columns (row and column names)",
    },
    FormatOption {
        orientation: DataOrientation::FeatureMajorHeaded,
        label: "Samples in rows, features in columns (header row only)",
    },
    FormatOption {
        orientation: DataOrientation::SampleMajorHeaded,
        label: "Features in rows, samples in columns (header row only)",
    },
    FormatOption {
        orientation: DataOrientation::FeatureMajorColumned,
        label: "Samples in rows, features in columns (row names only)",
    },
    FormatOption {
        orientation: DataOrientation::SampleMajorColumned,
        label: "Features in rows, samples in columns (row names only)",
    },
    FormatOption {
        orientation: DataOrientation::AnonymousFeatureMajor,
        label: "Samples in rows, features in columns (no names)",
    },
    FormatOption {
        orientation: DataOrientation::AnonymousSampleMajor,
        label: "Features in rows, samples in columns (no names)",
    },
];

pub fn label_for(orientation: DataOrientation) -> &'static str {
    FORMAT_CATALOG
        .iter()
        .find(|option| option.orientation == orientation)
        .map(|option| option.label)
        .unwrap_or_else(|| orientation.token())
}

/// Example CSV text for the given orientation.
pub fn example_for(orientation: DataOrientation) -> &'static str {
    match orientation {
        DataOrientation::FeatureMajorNamed => ",F1,F2\nS1,10,20\nS2,30,40",
        DataOrientation::SampleMajorNamed => ",S1,S2\nF1,10,30\nF2,20,40",
        DataOrientation::FeatureMajorHeaded => "F1,F2\n10,20\n30,40",
        DataOrientation::SampleMajorHeaded => "S1,S2\n10,30\n20,40",
        DataOrientation::FeatureMajorColumned => "S1,10,20\nS2,30,40",
        DataOrientation::SampleMajorColumned => "F1,10,30\nF2,20,40",
        DataOrientation::AnonymousFeatureMajor => "10,20\n30,40",
        DataOrientation::AnonymousSampleMajor => "10,30\n20,40",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlgorithmOption {
    pub name: &'static str,
    pub label: &'static str,
}

pub const ALGORITHM_CATALOG: [AlgorithmOption; 3] = [
    AlgorithmOption {
        name: "K-means",
        label: "K-means (centroid clustering)",
    },
    AlgorithmOption {
        name: "PIntMF",
        label: "PIntMF (matrix factorization)",
    },
    AlgorithmOption {
        name: "Subtype-GAN",
        label: "Subtype-GAN (deep learning)",
    },
];
