use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tempfile::TempPath;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::domain::{AppError, HelperLocation};
use crate::utils::{describe_exit, summarize_stderr};

const BUNDLED_SCRIPT: &str = include_str!("../../assets/set_wallpaper.py");

pub fn default_interpreter() -> &'static str {
    if cfg!(windows) {
        "python"
    } else {
        "python3"
    }
}

/// How the wallpaper helper is found and launched
#[derive(Debug, Clone)]
pub struct HelperConfig {
    pub location: HelperLocation,
    /// Program the helper is passed to. `None` executes the helper itself.
    pub interpreter: Option<String>,
    /// Collect the helper's stderr and report it on failure
    pub capture_stderr: bool,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            location: HelperLocation::Bundled,
            interpreter: Some(default_interpreter().to_string()),
            capture_stderr: false,
        }
    }
}

enum ResolvedHelper {
    // removed from disk when dropped
    Extracted(TempPath),
    OnDisk(PathBuf),
}

impl ResolvedHelper {
    fn path(&self) -> &Path {
        match self {
            ResolvedHelper::Extracted(path) => path,
            ResolvedHelper::OnDisk(path) => path,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WallpaperApplier {
    config: HelperConfig,
}

impl WallpaperApplier {
    pub fn new(config: HelperConfig) -> Self {
        Self { config }
    }

    /// Run the helper with `image` as its only argument and wait for it.
    pub async fn apply(&self, image: &Path) -> Result<(), AppError> {
        let helper = self.resolve_helper()?;

        let mut command = match &self.config.interpreter {
            Some(interpreter) => {
                let mut command = Command::new(interpreter);
                command.arg(helper.path());
                command
            }
            None => Command::new(helper.path()),
        };
        command
            .arg(image)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(if self.config.capture_stderr {
                Stdio::piped()
            } else {
                Stdio::inherit()
            });

        let program = self
            .config
            .interpreter
            .clone()
            .unwrap_or_else(|| helper.path().display().to_string());
        debug!(
            "Launching {} with helper {} for {}",
            program,
            helper.path().display(),
            image.display()
        );

        let output = command
            .output()
            .await
            .map_err(|e| AppError::Subprocess(format!("failed to launch {}: {}", program, e)))?;

        if output.status.success() {
            info!("Wallpaper set to {}", image.display());
            return Ok(());
        }

        let mut message = format!("helper exited with {}", describe_exit(&output.status));
        if let Some(summary) = summarize_stderr(&output.stderr) {
            error!("Helper stderr:\n{}", String::from_utf8_lossy(&output.stderr).trim_end());
            message = format!("{}: {}", message, summary);
        }
        Err(AppError::Subprocess(message))
    }

    fn resolve_helper(&self) -> Result<ResolvedHelper, AppError> {
        match &self.config.location {
            HelperLocation::Bundled => {
                extract_bundled_script(&std::env::temp_dir()).map(ResolvedHelper::Extracted)
            }
            HelperLocation::Path(path) => {
                let path = if path.is_absolute() {
                    path.clone()
                } else {
                    std::env::current_dir()
                        .map_err(|e| {
                            AppError::Subprocess(format!("cannot resolve helper path: {}", e))
                        })?
                        .join(path)
                };
                if !path.is_file() {
                    return Err(AppError::Subprocess(format!(
                        "helper not found: {}",
                        path.display()
                    )));
                }
                Ok(ResolvedHelper::OnDisk(path))
            }
        }
    }
}

fn extract_bundled_script(dir: &Path) -> Result<TempPath, AppError> {
    let mut file = tempfile::Builder::new()
        .prefix("set_wallpaper_")
        .suffix(".py")
        .tempfile_in(dir)
        .map_err(|e| AppError::Subprocess(format!("failed to extract helper script: {}", e)))?;
    file.write_all(BUNDLED_SCRIPT.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|e| AppError::Subprocess(format!("failed to extract helper script: {}", e)))?;
    Ok(file.into_temp_path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_script_is_extracted_and_removed() {
        let path = extract_bundled_script(&std::env::temp_dir()).unwrap();
        let on_disk = path.to_path_buf();

        assert_eq!(on_disk.extension().unwrap(), "py");
        assert_eq!(std::fs::read_to_string(&on_disk).unwrap(), BUNDLED_SCRIPT);

        drop(path);
        assert!(!on_disk.exists());
    }

    #[test]
    fn test_failed_extraction_is_subprocess_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_bundled_script(&dir.path().join("missing")).unwrap_err();
        match err {
            AppError::Subprocess(message) => {
                assert!(message.contains("failed to extract helper script"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_helper_is_subprocess_error() {
        let dir = tempfile::tempdir().unwrap();
        let applier = WallpaperApplier::new(HelperConfig {
            location: HelperLocation::Path(dir.path().join("nope.py")),
            ..Default::default()
        });

        let err = applier.apply(Path::new("image.jpg")).await.unwrap_err();
        match err {
            AppError::Subprocess(message) => assert!(message.contains("helper not found")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_subprocess_error() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("helper.py");
        std::fs::write(&script, "print('hi')\n").unwrap();

        let applier = WallpaperApplier::new(HelperConfig {
            location: HelperLocation::Path(script),
            interpreter: Some("definitely-not-an-interpreter-4711".to_string()),
            capture_stderr: false,
        });

        let err = applier.apply(Path::new("image.jpg")).await.unwrap_err();
        match err {
            AppError::Subprocess(message) => assert!(message.contains("failed to launch")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    mod unix {
        use super::*;

        fn sh_helper(dir: &Path, body: &str) -> WallpaperApplier {
            let script = dir.join("helper.sh");
            std::fs::write(&script, body).unwrap();
            WallpaperApplier::new(HelperConfig {
                location: HelperLocation::Path(script),
                interpreter: Some("sh".to_string()),
                capture_stderr: true,
            })
        }

        #[tokio::test]
        async fn test_helper_receives_image_path() {
            let dir = tempfile::tempdir().unwrap();
            let marker = dir.path().join("marker");
            let applier = sh_helper(
                dir.path(),
                &format!("printf '%s' \"$1\" > '{}'\n", marker.display()),
            );

            let image = dir.path().join("downloaded_wallpaper.jpg");
            applier.apply(&image).await.unwrap();

            assert_eq!(
                std::fs::read_to_string(&marker).unwrap(),
                image.display().to_string()
            );
        }

        #[tokio::test]
        async fn test_non_zero_exit_carries_stderr() {
            let dir = tempfile::tempdir().unwrap();
            let applier = sh_helper(dir.path(), "echo 'no desktop found' >&2\nexit 1\n");

            let err = applier.apply(Path::new("image.jpg")).await.unwrap_err();
            match err {
                AppError::Subprocess(message) => {
                    assert!(message.contains("exit code 1"));
                    assert!(message.contains("no desktop found"));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_relative_helper_path_resolves_from_working_dir() {
            let dir = tempfile::tempdir_in(".").unwrap();
            std::fs::write(dir.path().join("ok.sh"), "exit 0\n").unwrap();
            let relative = PathBuf::from(dir.path().file_name().unwrap()).join("ok.sh");

            let applier = WallpaperApplier::new(HelperConfig {
                location: HelperLocation::Path(relative),
                interpreter: Some("sh".to_string()),
                capture_stderr: false,
            });

            applier.apply(Path::new("image.jpg")).await.unwrap();
        }

        #[tokio::test]
        async fn test_helper_without_interpreter_runs_directly() {
            // /bin/sh as the helper runs its argument as a script
            let dir = tempfile::tempdir().unwrap();
            let argument = dir.path().join("exit_code.sh");
            std::fs::write(&argument, "exit 3\n").unwrap();

            let applier = WallpaperApplier::new(HelperConfig {
                location: HelperLocation::Path(PathBuf::from("/bin/sh")),
                interpreter: None,
                capture_stderr: false,
            });

            let err = applier.apply(&argument).await.unwrap_err();
            match err {
                AppError::Subprocess(message) => assert!(message.contains("exit code 3")),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }
}
