pub mod client;
pub mod models;

pub use client::{ImageClient, ImageDownload};
pub use models::{FetchConfig, DEFAULT_IMAGE_URL};
