use std::path::PathBuf;

use futures::{stream::BoxStream, StreamExt};
use tracing::info;

use crate::{
    api::{FetchConfig, ImageClient, ImageDownload},
    domain::{AppError, DownloadedImage, WallpaperPhase},
    helper::{HelperConfig, WallpaperApplier},
};

#[derive(Debug, Clone)]
pub enum WallpaperEvent {
    PhaseChanged(WallpaperPhase),
    Progress { downloaded: u64, total: Option<u64> },
    Fetched(DownloadedImage),
    Applied(PathBuf),
    Failed(AppError),
}

#[derive(Clone)]
pub struct WallpaperCoordinator {
    client: ImageClient,
    applier: WallpaperApplier,
    source_url: String,
    destination: PathBuf,
}

impl WallpaperCoordinator {
    pub fn new(fetch: FetchConfig, helper: HelperConfig) -> Result<Self, AppError> {
        let client = ImageClient::new(&fetch)?;
        Ok(Self {
            client,
            applier: WallpaperApplier::new(helper),
            source_url: fetch.source_url,
            destination: fetch.destination,
        })
    }

    /// Fetch a new image and apply it, handing every event to `observe`.
    ///
    /// Returns the path of the applied image.
    pub async fn refresh(
        &self,
        mut observe: impl FnMut(&WallpaperEvent),
    ) -> Result<PathBuf, AppError> {
        let mut events = self.events();
        let mut outcome = None;

        while let Some(event) = events.next().await {
            observe(&event);
            match event {
                WallpaperEvent::Applied(path) => outcome = Some(Ok(path)),
                WallpaperEvent::Failed(e) => outcome = Some(Err(e)),
                _ => {}
            }
        }

        outcome.unwrap_or_else(|| Err(AppError::Subprocess("wallpaper was not applied".to_string())))
    }

    /// Idle -> Fetching -> Applying -> Idle, or Failed at the first error
    pub fn events(&self) -> BoxStream<'static, WallpaperEvent> {
        futures::stream::unfold(
            RuntimeState::Start {
                coordinator: self.clone(),
            },
            |state| async move {
                match state {
                    RuntimeState::Start { coordinator } => Some((
                        WallpaperEvent::PhaseChanged(WallpaperPhase::Fetching),
                        RuntimeState::Connecting { coordinator },
                    )),
                    RuntimeState::Connecting { coordinator } => {
                        match coordinator
                            .client
                            .start_download(&coordinator.source_url, &coordinator.destination)
                            .await
                        {
                            Ok(download) => Some((
                                WallpaperEvent::Progress {
                                    downloaded: 0,
                                    total: download.total(),
                                },
                                RuntimeState::Downloading {
                                    coordinator,
                                    download,
                                },
                            )),
                            Err(e) => Some((
                                WallpaperEvent::Failed(e.into()),
                                RuntimeState::Failed,
                            )),
                        }
                    }
                    RuntimeState::Downloading {
                        coordinator,
                        mut download,
                    } => match download.next_chunk().await {
                        Ok(Some(downloaded)) => Some((
                            WallpaperEvent::Progress {
                                downloaded,
                                total: download.total(),
                            },
                            RuntimeState::Downloading {
                                coordinator,
                                download,
                            },
                        )),
                        Ok(None) => {
                            let image = download.into_image();
                            info!("Image saved to: {}", image.path.display());
                            let path = image.path.clone();
                            Some((
                                WallpaperEvent::Fetched(image),
                                RuntimeState::Fetched { coordinator, path },
                            ))
                        }
                        Err(e) => Some((
                            WallpaperEvent::Failed(e.into()),
                            RuntimeState::Failed,
                        )),
                    },
                    RuntimeState::Fetched { coordinator, path } => Some((
                        WallpaperEvent::PhaseChanged(WallpaperPhase::Applying),
                        RuntimeState::Applying { coordinator, path },
                    )),
                    RuntimeState::Applying { coordinator, path } => {
                        match coordinator.applier.apply(&path).await {
                            Ok(()) => Some((WallpaperEvent::Applied(path), RuntimeState::Done)),
                            Err(e) => Some((WallpaperEvent::Failed(e), RuntimeState::Failed)),
                        }
                    }
                    RuntimeState::Done => Some((
                        WallpaperEvent::PhaseChanged(WallpaperPhase::Idle),
                        RuntimeState::Finished,
                    )),
                    RuntimeState::Failed => Some((
                        WallpaperEvent::PhaseChanged(WallpaperPhase::Failed),
                        RuntimeState::Finished,
                    )),
                    RuntimeState::Finished => None,
                }
            },
        )
        .boxed()
    }
}

enum RuntimeState {
    Start {
        coordinator: WallpaperCoordinator,
    },
    Connecting {
        coordinator: WallpaperCoordinator,
    },
    Downloading {
        coordinator: WallpaperCoordinator,
        download: ImageDownload,
    },
    Fetched {
        coordinator: WallpaperCoordinator,
        path: PathBuf,
    },
    Applying {
        coordinator: WallpaperCoordinator,
        path: PathBuf,
    },
    Done,
    Failed,
    Finished,
}
