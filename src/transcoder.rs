//! Container conversion through an external binary.
//!
//! Downloaded segments are concatenated into one MPEG-TS file; a [`Transcoder`]
//! turns that into the final container. The production implementation runs
//! ffmpeg with stream copy, so no re-encoding happens.

use crate::config::ToolsConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Converts an assembled transport stream into the output container
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Write `output` from `input`; `output` is overwritten if it exists
    async fn remux(&self, input: &Path, output: &Path) -> Result<()>;

    /// Name of the implementation for logging
    fn name(&self) -> &'static str;
}

/// [`Transcoder`] backed by the ffmpeg binary
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary_path: PathBuf,
}

impl FfmpegTranscoder {
    /// Create a transcoder with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find ffmpeg in PATH
    pub fn from_path() -> Option<Self> {
        which::which("ffmpeg").ok().map(Self::new)
    }

    /// Locate ffmpeg according to the tools configuration
    ///
    /// An explicit `ffmpeg_path` must point at an existing file. Otherwise PATH
    /// is searched when `search_path` is enabled. Not finding the binary is a
    /// configuration error.
    pub fn discover(tools: &ToolsConfig) -> Result<Self> {
        if let Some(path) = &tools.ffmpeg_path {
            if path.is_file() {
                return Ok(Self::new(path.clone()));
            }
            return Err(Error::config(
                format!("ffmpeg not found at '{}'", path.display()),
                "ffmpeg_path",
            ));
        }

        if tools.search_path
            && let Some(found) = Self::from_path()
        {
            return Ok(found);
        }

        Err(Error::config(
            "ffmpeg wasn't found on your system, it is required to convert video files",
            "ffmpeg_path",
        ))
    }

    /// Path of the binary that will be executed
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn remux(&self, input: &Path, output: &Path) -> Result<()> {
        let result = Command::new(&self.binary_path)
            .arg("-y")
            .args(["-loglevel", "error"])
            .arg("-i")
            .arg(input)
            .args(["-c", "copy", "-bsf:a", "aac_adtstoasc"])
            .arg(output)
            .output()
            .await
            .map_err(|e| Error::ExternalTool(format!("Failed to execute ffmpeg: {}", e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(Error::ExternalTool(format!(
                "ffmpeg exited with {} converting {}: {}",
                result.status,
                input.display(),
                stderr.trim()
            )));
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_keeps_path() {
        let transcoder = FfmpegTranscoder::new(PathBuf::from("/usr/bin/ffmpeg"));
        assert_eq!(transcoder.binary_path(), Path::new("/usr/bin/ffmpeg"));
        assert_eq!(transcoder.name(), "ffmpeg");
    }

    #[test]
    fn test_from_path_consistency_with_which_crate() {
        let which_result = which::which("ffmpeg");
        let from_path = FfmpegTranscoder::from_path();
        assert_eq!(which_result.is_ok(), from_path.is_some());
    }

    #[test]
    fn test_discover_explicit_missing_path_is_config_error() {
        let dir = TempDir::new().unwrap();
        let tools = ToolsConfig {
            ffmpeg_path: Some(dir.path().join("ffmpeg")),
            search_path: true,
        };
        let err = FfmpegTranscoder::discover(&tools).unwrap_err();
        assert!(matches!(err, Error::Config { key: Some(ref k), .. } if k == "ffmpeg_path"));
    }

    #[test]
    fn test_discover_explicit_existing_path() {
        let dir = TempDir::new().unwrap();
        let binary = dir.path().join("ffmpeg");
        std::fs::write(&binary, b"").unwrap();
        let tools = ToolsConfig {
            ffmpeg_path: Some(binary.clone()),
            search_path: false,
        };
        let transcoder = FfmpegTranscoder::discover(&tools).unwrap();
        assert_eq!(transcoder.binary_path(), binary.as_path());
    }

    #[test]
    fn test_discover_without_search_fails() {
        let tools = ToolsConfig {
            ffmpeg_path: None,
            search_path: false,
        };
        assert!(matches!(
            FfmpegTranscoder::discover(&tools),
            Err(Error::Config { .. })
        ));
    }

    #[tokio::test]
    async fn test_remux_with_missing_binary_is_external_tool_error() {
        let dir = TempDir::new().unwrap();
        let transcoder = FfmpegTranscoder::new(dir.path().join("no-such-ffmpeg"));
        let err = transcoder
            .remux(&dir.path().join("in.ts"), &dir.path().join("out.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ExternalTool(_)));
    }
}
