use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Wallpaper helper failed: {0}")]
    Subprocess(String),

    #[error("I/O error: {0}")]
    Io(String),
}
