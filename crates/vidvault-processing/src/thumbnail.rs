//! Thumbnail extraction for placed videos

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Produces a still image for a video file.
///
/// Implementations complete only once the thumbnail is written or extraction failed.
#[async_trait]
pub trait ThumbnailExtractor: Send + Sync {
    /// Write a thumbnail for `video_path` to `output_path`
    async fn extract(&self, video_path: &Path, output_path: &Path) -> Result<PathBuf>;
}

const SHELL_METACHARACTERS: &[char] = &[';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];

/// Grabs one frame at a fixed offset with an external `ffmpeg`
pub struct FfmpegThumbnailExtractor {
    ffmpeg_path: String,
    offset_secs: f64,
    timeout: Duration,
}

impl FfmpegThumbnailExtractor {
    /// `timeout` bounds one ffmpeg run; a run that exceeds it is killed.
    pub fn new(ffmpeg_path: String, offset_secs: f64, timeout: Duration) -> Result<Self> {
        if ffmpeg_path.is_empty() || ffmpeg_path.contains(SHELL_METACHARACTERS) {
            return Err(anyhow!("Invalid ffmpeg path: {:?}", ffmpeg_path));
        }
        if !offset_secs.is_finite() || offset_secs < 0.0 {
            return Err(anyhow!("Invalid thumbnail offset: {}", offset_secs));
        }
        if timeout.is_zero() {
            return Err(anyhow!("Thumbnail timeout must be greater than zero"));
        }

        Ok(Self {
            ffmpeg_path,
            offset_secs,
            timeout,
        })
    }
}

#[async_trait]
impl ThumbnailExtractor for FfmpegThumbnailExtractor {
    async fn extract(&self, video_path: &Path, output_path: &Path) -> Result<PathBuf> {
        let start = std::time::Instant::now();

        // -ss before -i seeks the input
        let run = Command::new(&self.ffmpeg_path)
            .arg("-ss")
            .arg(format!("{:.3}", self.offset_secs))
            .arg("-i")
            .arg(video_path)
            .args(["-frames:v", "1", "-q:v", "2", "-y"])
            .arg(output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        // Dropping the timed-out future kills the child
        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| {
                anyhow!(
                    "ffmpeg timed out after {:?} on {}",
                    self.timeout,
                    video_path.display()
                )
            })?
            .with_context(|| format!("Failed to run {}", self.ffmpeg_path))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr.trim()
            ));
        }

        if !tokio::fs::try_exists(output_path).await.unwrap_or(false) {
            return Err(anyhow!(
                "FFmpeg exited successfully but wrote no thumbnail to {}",
                output_path.display()
            ));
        }

        tracing::info!(
            video = %video_path.display(),
            thumbnail = %output_path.display(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Thumbnail extracted"
        );

        Ok(output_path.to_path_buf())
    }
}

/// Extractor used when thumbnails are disabled
pub struct NoopThumbnailExtractor;

#[async_trait]
impl ThumbnailExtractor for NoopThumbnailExtractor {
    async fn extract(&self, video_path: &Path, _output_path: &Path) -> Result<PathBuf> {
        Err(anyhow!(
            "Thumbnail extraction is disabled for {}",
            video_path.display()
        ))
    }
}
