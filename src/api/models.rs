use std::path::PathBuf;
use std::time::Duration;

use crate::utils::default_destination;

/// Endpoint that answers every GET with a random image
pub const DEFAULT_IMAGE_URL: &str = "http://185.124.108.230:314/get-random-image";

/// Configuration for fetching the wallpaper image
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub source_url: String,
    pub destination: PathBuf,
    pub timeout: Option<Duration>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_IMAGE_URL.to_string(),
            destination: default_destination(),
            timeout: None,
        }
    }
}
