use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::models::FetchConfig;
use crate::domain::{AppError, DownloadedImage};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Server responded with status {0}")]
    Status(StatusCode),

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::RequestError(_) | ApiError::Status(_) => AppError::Network(err.to_string()),
            ApiError::Io { .. } => AppError::Io(err.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct ImageClient {
    client: Client,
}

impl ImageClient {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Send the GET and open the destination for writing.
    ///
    /// The destination is only created (and truncated) once a successful
    /// response has arrived, so a failed request never touches it.
    pub async fn start_download(&self, url: &str, destination: &Path) -> Result<ImageDownload> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }

        let total = response.content_length();
        let stream = response
            .bytes_stream()
            .map_err(ApiError::RequestError)
            .boxed();

        let file = tokio::fs::File::create(destination)
            .await
            .map_err(|source| ApiError::Io {
                path: destination.to_path_buf(),
                source,
            })?;

        Ok(ImageDownload {
            url: url.to_string(),
            path: destination.to_path_buf(),
            file,
            stream,
            downloaded: 0,
            total,
        })
    }

    /// Download `url` into `destination`, overwriting whatever was there
    pub async fn fetch_image(&self, url: &str, destination: &Path) -> Result<DownloadedImage> {
        let mut download = self.start_download(url, destination).await?;
        while download.next_chunk().await?.is_some() {}

        let image = download.into_image();
        info!("Image saved to: {}", image.path.display());
        Ok(image)
    }
}

/// A response body being streamed to disk
pub struct ImageDownload {
    url: String,
    path: PathBuf,
    file: tokio::fs::File,
    stream: BoxStream<'static, Result<Bytes>>,
    downloaded: u64,
    total: Option<u64>,
}

impl ImageDownload {
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Write the next chunk. Returns the bytes written so far, or `None`
    /// once the body is exhausted and the file has been synced.
    pub async fn next_chunk(&mut self) -> Result<Option<u64>> {
        match self.stream.next().await {
            Some(chunk) => {
                let chunk = chunk?;
                self.file
                    .write_all(&chunk)
                    .await
                    .map_err(|source| self.io_error(source))?;
                self.downloaded += chunk.len() as u64;
                Ok(Some(self.downloaded))
            }
            None => {
                self.file
                    .flush()
                    .await
                    .map_err(|source| self.io_error(source))?;
                self.file
                    .sync_all()
                    .await
                    .map_err(|source| self.io_error(source))?;
                Ok(None)
            }
        }
    }

    pub fn into_image(self) -> DownloadedImage {
        DownloadedImage {
            source_url: self.url,
            path: self.path,
            bytes_written: self.downloaded,
        }
    }

    fn io_error(&self, source: std::io::Error) -> ApiError {
        ApiError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
