use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use common::{Album, Artist, LyricsMap, ScannedFolder, Song};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::sort::{songs_sort_options, sort_records, Order, SongsSortPreset};

mod artwork;
mod catalog;
pub mod config;
mod extract;
mod scan;
pub mod sort;
mod store;
mod sync;
#[cfg(test)]
mod test_support;
mod waveform;

pub use artwork::{ArtworkError, ArtworkStore, DEFAULT_ARTWORK_SIZE};
pub use catalog::{Catalog, Collection, CollectionKind, Record, SaveOutcome, SaveReport};
pub use config::{ConfigError, LibraryConfig};
pub use extract::{parse_song, ExtractionError, ParsedSong};
pub use scan::{
    collect_audio_files, is_audio_file, CancelToken, ScanOptions, ScanSummary, AUDIO_EXTENSIONS,
};
pub use store::{JsonStore, StoreError};
pub use sync::RemoveSummary;
pub use waveform::{Waveform, WaveformError, WaveformStore};

#[derive(Clone, Debug)]
pub struct LibraryOptions {
    pub data_root: PathBuf,
    pub artwork_size: u32,
}

impl LibraryOptions {
    pub fn new(data_root: PathBuf) -> Self {
        Self {
            data_root,
            artwork_size: DEFAULT_ARTWORK_SIZE,
        }
    }

    pub fn stores_dir(&self) -> PathBuf {
        self.data_root.join("stores")
    }

    pub fn artworks_dir(&self) -> PathBuf {
        self.data_root.join("artworks")
    }

    pub fn waveforms_dir(&self) -> PathBuf {
        self.data_root.join("waveforms")
    }
}

// Lock order: `ops`, then `catalog`.
#[derive(Clone)]
pub struct Library {
    options: LibraryOptions,
    catalog: Arc<Mutex<Catalog>>,
    ops: Arc<Mutex<()>>,
    artworks: ArtworkStore,
    waveforms: WaveformStore,
}

impl Library {
    pub fn open(options: LibraryOptions) -> Result<Self, LibraryError> {
        let catalog = Catalog::open(&options.stores_dir())?;
        info!(
            "Loaded catalog from {:?}: {} artists, {} albums, {} songs",
            options.stores_dir(),
            catalog.artists.len(),
            catalog.albums.len(),
            catalog.songs.len()
        );
        Ok(Self {
            artworks: ArtworkStore::new(options.artworks_dir(), options.artwork_size),
            waveforms: WaveformStore::new(options.waveforms_dir()),
            catalog: Arc::new(Mutex::new(catalog)),
            ops: Arc::new(Mutex::new(())),
            options,
        })
    }

    pub fn options(&self) -> &LibraryOptions {
        &self.options
    }

    pub fn all_songs(&self) -> Result<Vec<Song>, LibraryError> {
        Ok(self.catalog.lock().songs.all()?)
    }

    pub fn songs_sorted(
        &self,
        preset: SongsSortPreset,
        order: Order,
    ) -> Result<Vec<Song>, LibraryError> {
        let mut songs = self.all_songs()?;
        sort_records(&mut songs, &songs_sort_options(preset, order));
        Ok(songs)
    }

    pub fn all_albums(&self) -> Result<Vec<Album>, LibraryError> {
        Ok(self.catalog.lock().albums.all()?)
    }

    pub fn all_artists(&self) -> Result<Vec<Artist>, LibraryError> {
        Ok(self.catalog.lock().artists.all()?)
    }

    pub fn all_lyrics(&self) -> Result<LyricsMap, LibraryError> {
        Ok(self.catalog.lock().lyrics.read()?)
    }

    pub fn scanned_folders(&self) -> Result<Vec<ScannedFolder>, LibraryError> {
        Ok(self.catalog.lock().folders.all()?)
    }

    pub fn song(&self, song_id: &str) -> Result<Option<Song>, LibraryError> {
        Ok(self.catalog.lock().songs.get(song_id)?)
    }

    pub fn album(&self, album_id: &str) -> Result<Option<Album>, LibraryError> {
        Ok(self.catalog.lock().albums.get(album_id)?)
    }

    pub fn artist(&self, artist_id: &str) -> Result<Option<Artist>, LibraryError> {
        Ok(self.catalog.lock().artists.get(artist_id)?)
    }

    pub fn lyrics(&self, song_id: &str) -> Result<Option<String>, LibraryError> {
        let mut catalog = self.catalog.lock();
        catalog.lyrics.refresh()?;
        Ok(catalog
            .lyrics
            .value()
            .and_then(|lyrics| lyrics.get(song_id).cloned()))
    }

    pub fn stats(&self) -> Result<LibraryStats, LibraryError> {
        let mut catalog = self.catalog.lock();
        catalog.refresh()?;
        Ok(LibraryStats {
            artists: catalog.artists.len(),
            albums: catalog.albums.len(),
            songs: catalog.songs.len(),
        })
    }

    /// Drops the in-memory copy so the next access rereads the document.
    /// Waits for any running scan or removal to finish.
    pub fn clear_cache(&self, kind: CollectionKind) {
        let _op = self.ops.lock();
        self.catalog.lock().clear_cache(kind);
    }

    pub fn waveform(&self, song_id: &str) -> Result<Option<Waveform>, WaveformError> {
        self.waveforms.read(song_id)
    }

    pub fn save_waveform(&self, song_id: &str, waveform: &Waveform) -> Result<(), WaveformError> {
        self.waveforms.save(song_id, waveform)
    }

    pub fn delete_waveform(&self, song_id: &str) -> Result<bool, WaveformError> {
        self.waveforms.delete(song_id)
    }

    pub fn delete_all_waveforms(&self) -> Result<usize, WaveformError> {
        self.waveforms.delete_all()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryStats {
    pub artists: usize,
    pub albums: usize,
    pub songs: usize,
}

#[derive(Debug)]
pub enum LibraryError {
    Io(std::io::Error),
    Store(StoreError),
    Walk(walkdir::Error),
    Config(ConfigError),
}

impl std::fmt::Display for LibraryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LibraryError::Io(err) => write!(f, "io error: {}", err),
            LibraryError::Store(err) => write!(f, "store error: {}", err),
            LibraryError::Walk(err) => write!(f, "walk error: {}", err),
            LibraryError::Config(err) => write!(f, "config error: {}", err),
        }
    }
}

impl std::error::Error for LibraryError {}

impl From<std::io::Error> for LibraryError {
    fn from(err: std::io::Error) -> Self {
        LibraryError::Io(err)
    }
}

impl From<StoreError> for LibraryError {
    fn from(err: StoreError) -> Self {
        LibraryError::Store(err)
    }
}

impl From<walkdir::Error> for LibraryError {
    fn from(err: walkdir::Error) -> Self {
        LibraryError::Walk(err)
    }
}

impl From<ConfigError> for LibraryError {
    fn from(err: ConfigError) -> Self {
        LibraryError::Config(err)
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_millis() as u64
}
