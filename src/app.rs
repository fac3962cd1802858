use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error};
use url::Url;

use crate::api::{FetchConfig, ImageClient, DEFAULT_IMAGE_URL};
use crate::application::{WallpaperCoordinator, WallpaperEvent};
use crate::domain::{AppError, HelperLocation, WallpaperPhase};
use crate::helper::{default_interpreter, HelperConfig, WallpaperApplier};
use crate::utils::default_destination;

/// Download a random image and set it as the desktop wallpaper
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Endpoint that serves the image
    #[arg(long, global = true, default_value = DEFAULT_IMAGE_URL, value_parser = parse_source_url)]
    pub url: Url,

    /// Where the image is saved (defaults to ~/downloaded_wallpaper.jpg)
    #[arg(long, global = true)]
    pub destination: Option<PathBuf>,

    /// Use this helper script instead of the bundled one
    #[arg(long, global = true)]
    pub helper: Option<PathBuf>,

    /// Program that runs the helper script
    #[arg(long, global = true, conflicts_with = "no_interpreter")]
    pub interpreter: Option<String>,

    /// Execute the helper directly instead of through an interpreter
    #[arg(long, global = true)]
    pub no_interpreter: bool,

    /// Capture the helper's stderr and include it in the error report
    #[arg(long, global = true)]
    pub capture_stderr: bool,

    /// Give up on the download after this many seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Hide the progress bar
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Exit with status 1 when the wallpaper could not be set
    #[arg(long, global = true)]
    pub fail_on_error: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Download a new image and apply it (the default)
    Run,
    /// Download a new image without applying it
    Fetch,
    /// Apply an image that is already on disk
    Apply {
        /// Image to hand to the helper
        image: PathBuf,
    },
}

impl Cli {
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            source_url: self.url.to_string(),
            destination: self
                .destination
                .clone()
                .unwrap_or_else(default_destination),
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn helper_config(&self) -> HelperConfig {
        let location = match &self.helper {
            Some(path) => HelperLocation::Path(path.clone()),
            None => HelperLocation::Bundled,
        };
        let interpreter = if self.no_interpreter {
            None
        } else {
            Some(
                self.interpreter
                    .clone()
                    .unwrap_or_else(|| default_interpreter().to_string()),
            )
        };

        HelperConfig {
            location,
            interpreter,
            capture_stderr: self.capture_stderr,
        }
    }
}

fn parse_source_url(value: &str) -> Result<Url, String> {
    let url = Url::parse(value).map_err(|e| format!("invalid URL: {}", e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported scheme '{}', expected http or https", other)),
    }
}

/// Handle one trigger. Failures are logged, never propagated.
pub async fn run(cli: Cli) -> ExitCode {
    let failed = trigger(&cli).await;
    exit_code(failed, cli.fail_on_error)
}

/// Failures only reach the exit status with `--fail-on-error`
fn exit_code(failed: bool, fail_on_error: bool) -> ExitCode {
    if failed && fail_on_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Returns `true` when the command failed
async fn trigger(cli: &Cli) -> bool {
    let (action, result) = match &cli.command {
        None | Some(Commands::Run) => ("Failed to set wallpaper", refresh(cli).await),
        Some(Commands::Fetch) => ("Failed to fetch image", fetch(cli).await),
        Some(Commands::Apply { image }) => ("Failed to apply wallpaper", apply(cli, image).await),
    };

    match result {
        Ok(()) => false,
        Err(e) => {
            error!("{}: {}", action, e);
            true
        }
    }
}

async fn refresh(cli: &Cli) -> Result<(), AppError> {
    let coordinator = WallpaperCoordinator::new(cli.fetch_config(), cli.helper_config())?;

    let progress = DownloadProgress::new(cli.quiet);
    let result = coordinator.refresh(|event| progress.observe(event)).await;
    progress.finish();

    result.map(|_| ())
}

async fn fetch(cli: &Cli) -> Result<(), AppError> {
    let config = cli.fetch_config();
    let client = ImageClient::new(&config)?;

    let image = client
        .fetch_image(&config.source_url, &config.destination)
        .await?;
    debug!("Fetched {} bytes from {}", image.bytes_written, image.source_url);

    println!("{}", image.path.display());
    Ok(())
}

async fn apply(cli: &Cli, image: &Path) -> Result<(), AppError> {
    if !image.is_file() {
        return Err(AppError::InvalidInput(format!(
            "image not found: {}",
            image.display()
        )));
    }
    WallpaperApplier::new(cli.helper_config()).apply(image).await
}

struct DownloadProgress {
    bar: ProgressBar,
}

impl DownloadProgress {
    fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        Self { bar }
    }

    fn observe(&self, event: &WallpaperEvent) {
        match event {
            WallpaperEvent::PhaseChanged(phase) => self.bar.set_message(phase_label(*phase)),
            WallpaperEvent::Progress { downloaded, total } => {
                if let Some(total) = *total {
                    if self.bar.length() != Some(total) {
                        self.bar.set_length(total);
                        if let Ok(style) =
                            ProgressStyle::with_template("{msg} [{bar:30}] {bytes}/{total_bytes}")
                        {
                            self.bar.set_style(style.progress_chars("=> "));
                        }
                    }
                }
                self.bar.set_position(*downloaded);
            }
            WallpaperEvent::Fetched(image) => {
                debug!("Fetched {} bytes from {}", image.bytes_written, image.source_url)
            }
            WallpaperEvent::Applied(_) | WallpaperEvent::Failed(_) => {}
        }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

fn phase_label(phase: WallpaperPhase) -> &'static str {
    match phase {
        WallpaperPhase::Idle => "done",
        WallpaperPhase::Fetching => "downloading",
        WallpaperPhase::Applying => "applying",
        WallpaperPhase::Failed => "failed",
    }
}
