use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Title shared by every song that carries no album tag.
pub const UNKNOWN_ALBUM_TITLE: &str = "";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: String,
    pub file_path: String,
    pub title: String,
    pub artist_id: String,
    pub artist: String,
    pub album_id: String,
    pub album: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_no: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_no: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    /// Whole seconds.
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork_path: Option<String>,
    /// Unix milliseconds.
    pub created_at: u64,
    pub scan_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistRef {
    pub artist_id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork_path: Option<String>,
    pub song_count: u32,
}

impl Album {
    /// The shared bucket for untagged songs. Its artists and artwork never change after creation.
    pub fn is_unknown(&self) -> bool {
        self.title == UNKNOWN_ALBUM_TITLE
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub id: String,
    pub name: String,
    pub song_count: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedFolder {
    pub id: String,
    pub path: String,
    pub scanned_songs_count: u32,
    /// Unix milliseconds.
    pub scanned_at: u64,
}

/// Lyrics keyed by song id.
pub type LyricsMap = BTreeMap<String, String>;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanProgress {
    pub path: String,
    pub total_files_count: usize,
    pub current_index: usize,
    pub scanned_files_count: usize,
    pub skipped_files_count: usize,
    pub done: bool,
}

pub fn stable_id(input: &str) -> String {
    blake3::hash(input.as_bytes()).to_hex().to_string()
}
