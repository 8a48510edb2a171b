use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use charting::ResultRenderer;
use clap::Parser;
use client_core::{ClientEvent, DeckClient, MatrixFile};
use shared::{
    catalog::{example_for, ALGORITHM_CATALOG, FORMAT_CATALOG},
    domain::DataOrientation,
    protocol::RunParameters,
};
use tracing::info;

mod config;
mod surface;

use config::{load_settings, normalize_service_url};
use surface::JsonChartSurface;

#[derive(Parser, Debug)]
#[command(
    name = "deck",
    about = "Upload an omics matrix, run a clustering analysis and export the cluster chart"
)]
struct Args {
    /// Matrix file (CSV) to upload.
    #[arg(long)]
    file: Option<PathBuf>,
    /// Declared orientation of the matrix.
    #[arg(long, default_value_t = DataOrientation::default())]
    format: DataOrientation,
    #[arg(long)]
    algorithm: Option<String>,
    #[arg(long, default_value_t = 3)]
    clusters: u32,
    #[arg(long, default_value_t = 42)]
    seed: i64,
    #[arg(long, default_value_t = 300)]
    max_iter: u32,
    /// Overrides the configured analysis service address.
    #[arg(long)]
    server_url: Option<String>,
    /// Where to write the chart option JSON; stdout when omitted.
    #[arg(long)]
    chart_out: Option<PathBuf>,
    /// Print the example layout for --format and exit unless --file is given.
    #[arg(long)]
    show_example: bool,
    #[arg(long)]
    list_formats: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = load_settings();
    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .init();

    if args.list_formats {
        for option in FORMAT_CATALOG {
            println!("{:<24} {}", option.orientation.token(), option.label);
        }
        println!();
        for algorithm in ALGORITHM_CATALOG {
            println!("{:<24} {}", algorithm.name, algorithm.label);
        }
    }
    if args.show_example {
        println!("Example for {}:\n{}", args.format, example_for(args.format));
    }
    let Some(path) = args.file.as_ref() else {
        if args.list_formats || args.show_example {
            return Ok(());
        }
        bail!("--file is required to upload a matrix");
    };

    let service_url =
        normalize_service_url(args.server_url.as_deref().unwrap_or(&settings.service_url))?;
    let renderer = ResultRenderer::new(Arc::new(JsonChartSurface::new(args.chart_out.clone())));
    let client = DeckClient::connect(&service_url, renderer)?;

    let mut events = client.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let ClientEvent::Prompt(message) = event {
                eprintln!("{message}");
            }
        }
    });

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "matrix.csv".to_string());

    client.uploads.change_orientation(args.format).await?;
    let upload = client
        .uploads
        .select_file(Some(MatrixFile::new(filename, bytes)))
        .await?;
    if let Some(line) = upload.status_line() {
        println!("{line}");
    }
    if upload.accepted().is_none() {
        bail!("upload was not accepted");
    }

    let algorithm = args
        .algorithm
        .clone()
        .unwrap_or_else(|| settings.default_algorithm.clone());
    let params = RunParameters {
        cluster_count: args.clusters,
        random_seed: args.seed,
        max_iterations: args.max_iter,
    };
    info!(%algorithm, ?params, "starting analysis");
    let outcome = client.runs.run(&algorithm, params).await?;
    if let Some(line) = outcome.status_line() {
        println!("{line}");
    }

    let Some(result) = outcome.result() else {
        bail!("analysis did not complete");
    };
    if let Some(metrics) = result.metrics {
        for (label, value) in metrics.display_rows() {
            println!("  {label:<18} {value}");
        }
    }
    if let Some(points) = &result.points {
        println!("  {} samples plotted", points.len());
    }
    if !result.details.is_empty() {
        println!("{}", serde_json::to_string_pretty(&result.details)?);
    }

    Ok(())
}
