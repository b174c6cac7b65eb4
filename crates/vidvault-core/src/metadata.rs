//! Parser for the line-oriented metadata file uploaded alongside a video.
//!
//! Layout, one `key:value` pair per line, in this order:
//!
//! ```text
//! <header line, ignored>
//! id:<video id>
//! title:<title>
//! description:<description>
//! length:<duration in seconds>
//! ```
//!
//! Keys are positional; only the text after the first `:` of each line is used, so
//! values may themselves contain colons.

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMetadata {
    pub id: String,
    pub title: String,
    pub description: String,
    pub duration_secs: i64,
}

pub fn parse_video_metadata(text: &str) -> Result<VideoMetadata, AppError> {
    let mut values = text.lines().skip(1).map(|line| {
        let line = line.trim_end_matches('\r');
        line.split_once(':')
            .map(|(_, value)| value.trim().to_string())
            .ok_or_else(|| {
                AppError::InvalidInput(format!("Metadata line is not key:value: {}", line))
            })
    });

    let mut next = |field: &str| -> Result<String, AppError> {
        values
            .next()
            .unwrap_or_else(|| Err(AppError::InvalidInput(format!("Metadata is missing {}", field))))
    };

    let id = next("id")?;
    let title = next("title")?;
    let description = next("description")?;
    let length = next("length")?;

    let duration_secs = length
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
        .map(|d| d.round() as i64)
        .ok_or_else(|| AppError::InvalidInput(format!("Invalid metadata length: {}", length)))?;

    Ok(VideoMetadata {
        id,
        title,
        description,
        duration_secs,
    })
}
