use std::io::{Write, stdout};
use std::path::PathBuf;
use std::sync::Mutex;
use anyhow::{Context, bail};
use clap::Parser;
use crossterm::cursor::MoveToColumn;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use tracing_subscriber::EnvFilter;
use vidup::config::DEFAULT_CONFIG_FILE;
use vidup::core::plan_chunks;
use vidup::utils::{format_bytes, format_duration, format_speed};
use vidup::{
    ChunkedUploader, Config, UploadError, UploadObserver, UploadProgress, UploadedFileInfo, VideoFile,
    validate_video_file,
};

/// Upload a lecture video to the course backend in chunks.
#[derive(Parser, Debug)]
#[command(name = "vidup", version, about)]
struct Cli {
    /// Video file to upload.
    file: PathBuf,

    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Dashboard page URL; the production host uploads through the same-origin proxy.
    #[arg(long, env = "VIDUP_LOCATION")]
    location: Option<String>,

    /// Bearer token for the upload API.
    #[arg(long, env = "VIDUP_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Override the media type guessed from the file extension.
    #[arg(long)]
    media_type: Option<String>,
}

/// 终端进度条，同时保存最终结果
#[derive(Default)]
struct TerminalObserver {
    outcome: Mutex<Option<Result<UploadedFileInfo, String>>>,
}

impl TerminalObserver {
    fn finish(&self, outcome: Result<UploadedFileInfo, String>) {
        println!();
        if let Ok(mut slot) = self.outcome.lock() {
            *slot = Some(outcome);
        }
    }

    fn take(&self) -> Option<Result<UploadedFileInfo, String>> {
        self.outcome.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl UploadObserver for TerminalObserver {
    fn on_progress(&self, progress: &UploadProgress) {
        let eta = progress.eta.map(format_duration).unwrap_or_else(|| "-".to_string());
        let mut out = stdout();
        let _ = execute!(out, MoveToColumn(0), Clear(ClearType::CurrentLine));
        let _ = write!(
            out,
            "{:>6.2}%  {} / {}  {}  ETA {}",
            progress.percentage,
            format_bytes(progress.uploaded_bytes),
            format_bytes(progress.total_bytes),
            format_speed(progress.speed),
            eta
        );
        let _ = out.flush();
    }

    fn on_complete(&self, info: &UploadedFileInfo) {
        self.finish(Ok(info.clone()));
    }

    fn on_error(&self, error: &UploadError) {
        let message = if error.is_unauthorized() {
            format!("{error} (session expired, log in again and retry)")
        } else {
            error.to_string()
        };
        self.finish(Err(message));
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config: {}", cli.config.display()))?;
    if cli.location.is_some() {
        config.location = cli.location;
    }
    if cli.token.is_some() {
        config.auth_token = cli.token;
    }

    let file = VideoFile::open(&cli.file, cli.media_type)
        .await
        .with_context(|| format!("Failed to open file: {}", cli.file.display()))?;
    if let Some(message) = validate_video_file(Some(&file)) {
        bail!("{message}");
    }

    let location = config.location_url()?;
    let uploader = ChunkedUploader::from_config(&config, location.as_ref())?;

    println!(
        "Uploading {} ({}, {} chunks) to {}",
        file.name,
        format_bytes(file.size),
        plan_chunks(file.size, config.upload.chunk_size).len(),
        uploader.endpoints().primary()
    );

    let observer = TerminalObserver::default();
    uploader.upload_video(&file, &observer).await;

    match observer.take() {
        Some(Ok(info)) => {
            println!("Uploaded: {}", info.video_url);
            if let Some(message) = &info.message {
                println!("{message}");
            }
            if info.using_fallback {
                println!("Note: the file was stored in fallback storage");
            }
            Ok(())
        }
        Some(Err(message)) => bail!("Upload failed: {message}"),
        None => bail!("Upload finished without a result"),
    }
}
