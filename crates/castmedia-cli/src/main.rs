//! castmedia: validate and normalize media uploads from the command line.
//!
//! Configuration comes from the environment (and `.env`): size ceilings,
//! ffprobe/ffmpeg overrides, subprocess timeouts and UPLOAD_DIR.

use anyhow::Context;
use castmedia_cli::{
    exit_code_for_verdict, init_tracing, print_json, report_error, ValidationReport, EXIT_FAILURE,
};
use castmedia_core::{AppError, FileDescriptor, MediaPipelineConfig, TargetGeometry};
use castmedia_processing::{
    IngestRequest, IngestService, JsonLinesStore, MediaTools, MediaValidator, MetadataExtractor,
    Normalizer, ProcessRunner, SizeLimits, TokioProcessRunner,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

const RECORDS_FILE: &str = "media_records.jsonl";

#[derive(Parser)]
#[command(name = "castmedia", about = "Media validation and 9:16 normalization")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the discovered ffprobe/ffmpeg paths
    Tools,
    /// Validate a file against the upload policy
    Validate {
        /// Path to the file to validate
        file: PathBuf,
        /// Client-supplied filename (defaults to the file's name)
        #[arg(long)]
        declared_name: Option<String>,
        /// Client-supplied size in bytes (defaults to the size on disk)
        #[arg(long)]
        declared_size: Option<u64>,
    },
    /// Letterbox a file onto the 1080x1920 canvas
    Normalize {
        /// Source image or video
        source: PathBuf,
        /// Destination path
        dest: PathBuf,
    },
    /// Validate, store and record a file under UPLOAD_DIR
    Ingest {
        /// Path to the file to ingest (moved into the upload root)
        file: PathBuf,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
}

fn descriptor_for(
    file: PathBuf,
    declared_name: Option<String>,
    declared_size: Option<u64>,
) -> anyhow::Result<FileDescriptor> {
    let actual_size = std::fs::metadata(&file)
        .with_context(|| format!("Cannot read {}", file.display()))?
        .len();
    let name = declared_name.unwrap_or_else(|| {
        file.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    });
    Ok(FileDescriptor::new(
        file,
        name,
        declared_size.unwrap_or(actual_size),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = MediaPipelineConfig::from_env().context("Invalid media pipeline configuration")?;
    let tools = MediaTools::from_config(&config);
    let runner: Arc<dyn ProcessRunner> = Arc::new(TokioProcessRunner);

    match cli.command {
        Commands::Tools => {
            print_json(&tools)?;
        }
        Commands::Validate {
            file,
            declared_name,
            declared_size,
        } => {
            let descriptor = descriptor_for(file, declared_name, declared_size)?;
            let validator = MediaValidator::new(
                MetadataExtractor::new(&tools, runner, config.probe_timeout()),
                SizeLimits::from_config(&config),
                TargetGeometry::PORTRAIT,
            );

            let result = validator.validate(&descriptor, true).await;
            print_json(&ValidationReport::from(&result))?;

            let code = exit_code_for_verdict(result.verdict());
            if code != 0 {
                std::process::exit(code);
            }
        }
        Commands::Normalize { source, dest } => {
            let normalizer = Normalizer::from_tools(&tools, runner, &config);
            let outcome = normalizer.normalize_path(&source, &dest).await;
            print_json(&outcome)?;

            if !outcome.success {
                std::process::exit(EXIT_FAILURE);
            }
        }
        Commands::Ingest {
            file,
            title,
            description,
        } => {
            let descriptor = descriptor_for(file, None, None)?;
            tokio::fs::create_dir_all(&config.upload_dir)
                .await
                .with_context(|| format!("Cannot create {}", config.upload_dir.display()))?;

            let store = Arc::new(JsonLinesStore::new(config.upload_dir.join(RECORDS_FILE)));
            let service = IngestService::from_config(&config, &tools, runner, store);
            let request = IngestRequest::new(descriptor)
                .with_title(title)
                .with_description(description);

            match service.ingest(request).await {
                Ok(ingested) => print_json(&serde_json::json!({
                    "success": true,
                    "message": "Media uploaded successfully and submitted for approval",
                    "media_id": ingested.id,
                    "media_url": ingested.record.media_url,
                    "normalized_url": ingested.record.normalized_url,
                    "verdict": ingested.verdict,
                }))?,
                Err(e) => {
                    let err = AppError::from(e);
                    print_json(&serde_json::json!({
                        "success": false,
                        "error": err.to_string(),
                    }))?;
                    std::process::exit(report_error(&err));
                }
            }
        }
    }

    Ok(())
}
