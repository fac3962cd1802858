use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedImage {
    pub source_url: String,
    pub path: PathBuf,
    pub bytes_written: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallpaperPhase {
    Idle,
    Fetching,
    Applying,
    Failed,
}

/// Where the wallpaper helper script comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HelperLocation {
    /// Script embedded in the binary, extracted to a temp file for each run.
    #[default]
    Bundled,
    /// Script on disk; relative paths resolve against the working directory.
    Path(PathBuf),
}
