//! Clipvault CLI: run the video upload pipeline against configured storage and database.
//!
//! Configuration comes from the environment (see `Config::from_env`).

use anyhow::Context;
use clap::{Parser, Subcommand};
use clipvault_cli::{
    authorize_upload, ensure_within_limit, init_tracing, is_production_env, log_error,
    spawn_cancel_triggers, ErrorReport,
};
use clipvault_core::constants::VIDEO_MP4;
use clipvault_core::{AppError, Config, Video};
use clipvault_db::{connect, run_migrations, MetadataGateway, PgVideoRepository};
use clipvault_processing::{AspectClassifier, FfprobeProbe, UploadPipeline, UploadRequest};
use clipvault_storage::{create_storage, AssetKeyGenerator};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "clipvault", about = "Clipvault video upload pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a video file for an existing video record
    Upload {
        /// Path to the video file
        file: PathBuf,
        /// Video record UUID
        #[arg(long)]
        video_id: Uuid,
        /// UUID of the uploading user
        #[arg(long)]
        user_id: Uuid,
        /// Declared content type
        #[arg(long, default_value = VIDEO_MP4)]
        content_type: String,
    },
    /// Print the aspect category of a video file
    Classify {
        /// Path to the video file
        file: PathBuf,
        /// ffprobe binary
        #[arg(long, env = "FFPROBE_PATH", default_value = "ffprobe")]
        ffprobe: String,
    },
    /// Generate a storage key
    Key {
        /// Media type the key is for
        #[arg(long)]
        media_type: String,
        /// Optional key prefix
        #[arg(long)]
        prefix: Option<String>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

async fn upload(
    file: PathBuf,
    video_id: Uuid,
    user_id: Uuid,
    content_type: String,
) -> Result<Video, AppError> {
    let config = Config::from_env().context("Failed to load configuration")?;

    let size = tokio::fs::metadata(&file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?
        .len();
    ensure_within_limit(size, config.max_video_size_bytes)?;

    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set for uploads")?;
    let pool = connect(database_url).await?;
    run_migrations(&pool).await?;
    let videos = Arc::new(PgVideoRepository::new(pool));

    let existing = videos.fetch(video_id).await?;
    authorize_upload(existing.as_ref(), video_id, user_id)?;

    let storage = create_storage(&config)
        .await
        .context("Failed to initialize storage backend")?;
    let pipeline = UploadPipeline::from_config(&config, storage, videos);

    let body = tokio::fs::File::open(&file)
        .await
        .with_context(|| format!("Failed to open {}", file.display()))?;

    let token = CancellationToken::new();
    spawn_cancel_triggers(token.clone(), config.pipeline_timeout());

    let result = pipeline
        .run_with_cancel(
            UploadRequest {
                media_type: Some(content_type),
                body: Box::pin(body),
                user_id,
                video_id,
            },
            &token,
        )
        .await;
    token.cancel();

    result.map_err(AppError::from)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Upload {
            file,
            video_id,
            user_id,
            content_type,
        } => match upload(file, video_id, user_id, content_type).await {
            Ok(video) => print_json(&video)?,
            Err(err) => {
                log_error(&err);
                print_json(&ErrorReport::new(&err, is_production_env()))?;
                return Ok(ExitCode::FAILURE);
            }
        },
        Commands::Classify { file, ffprobe } => {
            let classifier = AspectClassifier::new(Arc::new(FfprobeProbe::new(ffprobe)));
            let category = classifier
                .classify(&file)
                .await
                .with_context(|| format!("Failed to classify {}", file.display()))?;
            print_json(&serde_json::json!({
                "file": file.display().to_string(),
                "category": category,
                "prefix": category.key_prefix(),
            }))?;
        }
        Commands::Key { media_type, prefix } => {
            let key = AssetKeyGenerator::default()
                .generate(&media_type, prefix.as_deref())
                .context("Failed to generate storage key")?;
            print_json(&serde_json::json!({ "key": key }))?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
