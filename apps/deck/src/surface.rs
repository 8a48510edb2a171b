use std::{fs, path::PathBuf};

use anyhow::Context;
use charting::{ChartOption, ChartSurface};

/// Writes each chart option as pretty JSON, to a file when a path is given
/// and to stdout otherwise. Every render overwrites the previous output.
pub struct JsonChartSurface {
    path: Option<PathBuf>,
}

impl JsonChartSurface {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl ChartSurface for JsonChartSurface {
    fn replace_option(&self, option: &ChartOption) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(option)?;
        match &self.path {
            Some(path) => fs::write(path, json)
                .with_context(|| format!("failed to write chart to '{}'", path.display())),
            None => {
                println!("{json}");
                Ok(())
            }
        }
    }
}
