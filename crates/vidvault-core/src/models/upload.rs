use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

/// Declared purpose of a completed file transfer.
///
/// The discriminant is sent by clients. New kinds are appended, existing values never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum UploadFileKind {
    Video = 0,
    Meta = 1,
    Tags = 2,
    Chapters = 3,
    Extra = 4,
    Miniature = 5,
}

impl TryFrom<u8> for UploadFileKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(UploadFileKind::Video),
            1 => Ok(UploadFileKind::Meta),
            2 => Ok(UploadFileKind::Tags),
            3 => Ok(UploadFileKind::Chapters),
            4 => Ok(UploadFileKind::Extra),
            5 => Ok(UploadFileKind::Miniature),
            other => Err(format!("Unknown upload file kind: {}", other)),
        }
    }
}

impl From<UploadFileKind> for u8 {
    fn from(value: UploadFileKind) -> Self {
        value as u8
    }
}

impl Display for UploadFileKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadFileKind::Video => write!(f, "video"),
            UploadFileKind::Meta => write!(f, "meta"),
            UploadFileKind::Tags => write!(f, "tags"),
            UploadFileKind::Chapters => write!(f, "chapters"),
            UploadFileKind::Extra => write!(f, "extra"),
            UploadFileKind::Miniature => write!(f, "miniature"),
        }
    }
}

/// Reference to a not-yet-placed blob held by the staging store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StagedBlob {
    pub video_id: Uuid,
    pub transfer_id: Uuid,
}

impl StagedBlob {
    pub fn new(video_id: Uuid, transfer_id: Uuid) -> Self {
        Self {
            video_id,
            transfer_id,
        }
    }
}
