use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;

/// Visibility state of a video.
///
/// Discriminants are the values stored in the database and exchanged with clients.
/// New states are appended, existing values never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum VideoPrivacy {
    Public = 0,
    Organization = 1,
    Unlisted = 2,
    Private = 3,
    /// Mandatory initial state while files are still arriving
    Processing = 4,
}

impl VideoPrivacy {
    pub fn as_i16(self) -> i16 {
        self as u8 as i16
    }

    /// Whether an owner may move a video into this state explicitly
    pub fn is_owner_selectable(self) -> bool {
        !matches!(self, VideoPrivacy::Processing)
    }
}

impl TryFrom<u8> for VideoPrivacy {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(VideoPrivacy::Public),
            1 => Ok(VideoPrivacy::Organization),
            2 => Ok(VideoPrivacy::Unlisted),
            3 => Ok(VideoPrivacy::Private),
            4 => Ok(VideoPrivacy::Processing),
            other => Err(format!("Unknown video privacy value: {}", other)),
        }
    }
}

impl TryFrom<i16> for VideoPrivacy {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| format!("Unknown video privacy value: {}", value))
            .and_then(VideoPrivacy::try_from)
    }
}

impl From<VideoPrivacy> for u8 {
    fn from(value: VideoPrivacy) -> Self {
        value as u8
    }
}

impl Display for VideoPrivacy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            VideoPrivacy::Public => write!(f, "public"),
            VideoPrivacy::Organization => write!(f, "organization"),
            VideoPrivacy::Unlisted => write!(f, "unlisted"),
            VideoPrivacy::Private => write!(f, "private"),
            VideoPrivacy::Processing => write!(f, "processing"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Video {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Duration in seconds, as declared by the metadata file
    pub duration_secs: Option<i64>,
    /// Aggregate size of every placed file of the video
    pub size_bytes: i64,
    pub view_count: i64,
    pub download_count: i64,
    #[schema(value_type = u8)]
    pub privacy: VideoPrivacy,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    /// Whether someone other than the owner may read this video
    pub fn is_publicly_visible(&self) -> bool {
        matches!(self.privacy, VideoPrivacy::Public | VideoPrivacy::Unlisted)
    }
}
