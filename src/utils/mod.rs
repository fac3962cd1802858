use std::path::{Path, PathBuf};
use std::process::ExitStatus;

pub const DESTINATION_FILE_NAME: &str = "downloaded_wallpaper.jpg";

/// `<home>/downloaded_wallpaper.jpg`, or the working directory when no home is known
pub fn default_destination() -> PathBuf {
    destination_in(dirs::home_dir().as_deref())
}

fn destination_in(home: Option<&Path>) -> PathBuf {
    home.unwrap_or_else(|| Path::new("."))
        .join(DESTINATION_FILE_NAME)
}

/// Human readable summary of how a child process ended
pub fn describe_exit(status: &ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Last non-empty line of captured stderr, e.g. the exception line of a traceback
pub fn summarize_stderr(stderr: &[u8]) -> Option<String> {
    String::from_utf8_lossy(stderr)
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .map(str::to_string)
}
