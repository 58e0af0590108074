use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use common::stable_id;
use metadata::{read_tags, MetadataError};
use tracing::{debug, warn};

use crate::artwork::ArtworkStore;

#[derive(Debug)]
pub enum ExtractionError {
    Metadata(MetadataError),
    Io(std::io::Error),
}

impl std::fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionError::Metadata(err) => write!(f, "metadata error: {}", err),
            ExtractionError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for ExtractionError {}

impl From<MetadataError> for ExtractionError {
    fn from(err: MetadataError) -> Self {
        ExtractionError::Metadata(err)
    }
}

impl From<std::io::Error> for ExtractionError {
    fn from(err: std::io::Error) -> Self {
        ExtractionError::Io(err)
    }
}

/// One audio file, normalised and ready to merge into the catalog.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedSong {
    pub id: String,
    pub file_path: String,
    pub title: String,
    /// Empty when untagged.
    pub artist: String,
    /// Empty when untagged, which routes the song into the unknown album.
    pub album: String,
    pub disk_no: Option<u16>,
    pub track_no: Option<u16>,
    pub year: Option<i32>,
    pub genres: Option<Vec<String>>,
    pub size: u64,
    /// Bits per second. Tags report whole kbps, so this is always a multiple of 1000.
    pub bitrate: Option<u32>,
    pub sample_rate: Option<u32>,
    pub duration: u32,
    pub artwork_path: Option<String>,
    pub created_at: u64,
    pub lyrics: Option<String>,
}

pub fn parse_song(path: &Path, artworks: &ArtworkStore) -> Result<ParsedSong, ExtractionError> {
    debug!("Parsing {:?}", path);
    let tags = read_tags(path)?;
    let stat = fs::metadata(path)?;

    let artwork_path = tags.cover.as_ref().and_then(|cover| {
        match artworks.save(&cover.data, cover.mime.as_deref()) {
            Ok(saved) => Some(saved.to_string_lossy().into_owned()),
            Err(err) => {
                warn!("Failed to save artwork for {:?}: {}", path, err);
                None
            }
        }
    });

    let file_path = path.to_string_lossy().into_owned();
    let created = stat.created().or_else(|_| stat.modified()).ok();

    Ok(ParsedSong {
        id: stable_id(&file_path),
        title: tags.title.unwrap_or_else(|| file_stem(path)),
        artist: tags.artist.unwrap_or_default(),
        album: tags.album.unwrap_or_default(),
        disk_no: tags.disc_no,
        track_no: tags.track_no,
        year: tags.year,
        genres: if tags.genres.is_empty() {
            None
        } else {
            Some(tags.genres)
        },
        size: stat.len(),
        bitrate: tags.bitrate.and_then(bits_per_second),
        sample_rate: tags.sample_rate,
        duration: tags.duration_ms.map(round_seconds).unwrap_or(0),
        artwork_path,
        created_at: created.map(unix_millis).unwrap_or_else(crate::now_millis),
        lyrics: tags.lyrics,
        file_path,
    })
}

fn bits_per_second(kbps: u32) -> Option<u32> {
    match kbps {
        0 => None,
        kbps => Some(kbps.saturating_mul(1000)),
    }
}

fn round_seconds(ms: u32) -> u32 {
    ms.saturating_add(500) / 1000
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn unix_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
