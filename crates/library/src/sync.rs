use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use common::{Album, Artist, ArtistRef, ScanProgress, ScannedFolder, Song};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::{Catalog, SaveReport};
use crate::extract::{parse_song, ParsedSong};
use crate::scan::{collect_audio_files, ProgressReporter, ScanOptions, ScanSummary};
use crate::{now_millis, Library, LibraryError};

#[derive(Debug)]
pub struct RemoveSummary {
    /// Ids that were present and removed; absent ids are ignored.
    pub removed: Vec<String>,
    pub deleted_artworks: Vec<PathBuf>,
    pub saves: SaveReport,
}

impl Library {
    /// Indexes every new audio file under `folder`.
    ///
    /// Files already in the catalog are skipped without parsing. Files that fail
    /// to parse are logged and skipped. Only a failed directory walk or catalog reload
    /// fails the call.
    ///
    /// `progress` runs while this library's operation lock is held, so it must not
    /// call back into a mutating method or `clear_cache` on the same library.
    pub fn scan_folder<F>(
        &self,
        folder: &Path,
        options: &ScanOptions,
        progress: F,
    ) -> Result<ScanSummary, LibraryError>
    where
        F: FnMut(&ScanProgress),
    {
        let _op = self.ops.lock();
        let folder_path = folder.to_string_lossy().into_owned();
        let mut reporter = ProgressReporter::new(&folder_path, progress);

        info!("Scanning {:?}", folder);
        let files = match collect_audio_files(folder) {
            Ok(files) => files,
            Err(err) => {
                reporter.finish();
                return Err(err.into());
            }
        };
        info!("Found {} audio files in {:?}", files.len(), folder);
        reporter.set_total(files.len());

        let (mut scanned_folder, known_paths) = {
            let mut catalog = self.catalog.lock();
            if let Err(err) = catalog.refresh() {
                drop(catalog);
                reporter.finish();
                return Err(err.into());
            }
            let scanned_folder = catalog
                .folders
                .find_by_path(&folder_path)
                .cloned()
                .unwrap_or_else(|| ScannedFolder {
                    id: Uuid::new_v4().to_string(),
                    path: folder_path.clone(),
                    scanned_songs_count: 0,
                    scanned_at: now_millis(),
                });
            let known: HashSet<String> = catalog
                .songs
                .items()
                .iter()
                .map(|song| song.file_path.clone())
                .collect();
            (scanned_folder, known)
        };

        let mut added = 0usize;
        let mut cancelled = false;
        for file in &files {
            if options.cancel.is_cancelled() {
                info!("Scan of {:?} cancelled", folder);
                cancelled = true;
                break;
            }
            let file_path = file.to_string_lossy();
            if known_paths.contains(&*file_path) {
                reporter.skipped();
                continue;
            }
            match parse_song(file, &self.artworks) {
                Ok(parsed) => {
                    let merged = merge_song(&mut self.catalog.lock(), &scanned_folder.id, parsed);
                    if merged {
                        added += 1;
                        scanned_folder.scanned_songs_count += 1;
                        reporter.scanned();
                    } else {
                        reporter.skipped();
                    }
                }
                Err(err) => {
                    warn!("Failed to parse {:?}: {}", file, err);
                    reporter.skipped();
                }
            }
        }

        let saves = {
            let mut catalog = self.catalog.lock();
            if added > 0 && options.resort_library {
                debug!("Resorting library");
                catalog.resort();
            }
            scanned_folder.scanned_at = now_millis();
            catalog.folders.upsert(scanned_folder.clone());
            catalog.save_all()
        };

        let last = reporter.finish();
        info!(
            "Scan of {:?} finished: {} scanned, {} skipped",
            folder, last.scanned_files_count, last.skipped_files_count
        );

        Ok(ScanSummary {
            scan_id: scanned_folder.id,
            total_files: files.len(),
            scanned: last.scanned_files_count,
            skipped: last.skipped_files_count,
            cancelled,
            saves,
        })
    }

    pub fn remove_songs(&self, song_ids: &[String]) -> Result<RemoveSummary, LibraryError> {
        let _op = self.ops.lock();
        self.catalog.lock().refresh()?;
        self.remove_songs_locked(song_ids, None)
    }

    /// Removes every song owned by one scanned folder, then the folder itself.
    pub fn delete_entities_by_scan_id(&self, scan_id: &str) -> Result<RemoveSummary, LibraryError> {
        let _op = self.ops.lock();
        let song_ids = {
            let mut catalog = self.catalog.lock();
            catalog.refresh()?;
            catalog.songs.ids_for_scan(scan_id)
        };
        info!("Removing {} songs of scan {}", song_ids.len(), scan_id);
        self.remove_songs_locked(&song_ids, Some(scan_id))
    }

    fn remove_songs_locked(
        &self,
        song_ids: &[String],
        scan_id: Option<&str>,
    ) -> Result<RemoveSummary, LibraryError> {
        let mut removed = Vec::new();
        let mut candidates: Vec<String> = Vec::new();

        for song_id in song_ids {
            let song = {
                let mut catalog = self.catalog.lock();
                match remove_song(&mut catalog, song_id, &mut candidates) {
                    Some(song) => song,
                    None => continue,
                }
            };
            if let Err(err) = self.waveforms.delete(&song.id) {
                warn!("Failed to delete waveform for {}: {}", song.id, err);
            }
            removed.push(song.id);
        }

        let mut catalog = self.catalog.lock();
        if let Some(scan_id) = scan_id {
            catalog.folders.delete(scan_id);
        }
        let deleted_artworks = if candidates.is_empty() {
            Vec::new()
        } else {
            self.artworks.delete_if_unreferenced(
                &candidates,
                catalog.songs.items(),
                catalog.albums.items(),
            )
        };
        let saves = catalog.save_all();

        Ok(RemoveSummary {
            removed,
            deleted_artworks,
            saves,
        })
    }

    /// Empties every collection and deletes all artwork and waveform files.
    pub fn clear_library(&self) -> SaveReport {
        let _op = self.ops.lock();
        let saves = self.catalog.lock().reset();
        match self.artworks.delete_all() {
            Ok(count) => debug!("Deleted {} artworks", count),
            Err(err) => warn!("Failed to delete artworks: {}", err),
        }
        match self.waveforms.delete_all() {
            Ok(count) => debug!("Deleted {} waveforms", count),
            Err(err) => warn!("Failed to delete waveforms: {}", err),
        }
        info!("Library cleared");
        saves
    }

    pub fn initialize_library(&self) -> Result<SaveReport, LibraryError> {
        fs::create_dir_all(self.options.stores_dir())?;
        fs::create_dir_all(self.options.artworks_dir())?;
        fs::create_dir_all(self.options.waveforms_dir())?;
        Ok(self.clear_library())
    }
}

// Returns false when the file path is already indexed.
pub(crate) fn merge_song(catalog: &mut Catalog, scan_id: &str, parsed: ParsedSong) -> bool {
    if catalog.songs.find_by_path(&parsed.file_path).is_some() {
        return false;
    }

    if let Some(lyrics) = &parsed.lyrics {
        catalog
            .lyrics
            .value_mut()
            .insert(parsed.id.clone(), lyrics.clone());
    }

    let artist_id = match catalog.artists.find_by_name_mut(&parsed.artist) {
        Some(artist) => {
            artist.song_count += 1;
            artist.id.clone()
        }
        None => {
            let id = Uuid::new_v4().to_string();
            catalog.artists.add(Artist {
                id: id.clone(),
                name: parsed.artist.clone(),
                song_count: 1,
            });
            id
        }
    };

    let album_id = match catalog.albums.find_by_title_mut(&parsed.album) {
        Some(album) => {
            if !album.is_unknown() {
                if !album.artists.iter().any(|a| a.artist_id == artist_id) {
                    album.artists.push(ArtistRef {
                        artist_id: artist_id.clone(),
                        name: parsed.artist.clone(),
                    });
                }
                if album.artwork_path.is_none() {
                    album.artwork_path = parsed.artwork_path.clone();
                }
            }
            album.song_count += 1;
            album.id.clone()
        }
        None => {
            let id = Uuid::new_v4().to_string();
            catalog.albums.add(Album {
                id: id.clone(),
                title: parsed.album.clone(),
                artists: vec![ArtistRef {
                    artist_id: artist_id.clone(),
                    name: parsed.artist.clone(),
                }],
                artwork_path: parsed.artwork_path.clone(),
                song_count: 1,
            });
            id
        }
    };

    catalog.songs.add(Song {
        id: parsed.id,
        file_path: parsed.file_path,
        title: parsed.title,
        artist_id,
        artist: parsed.artist,
        album_id,
        album: parsed.album,
        disk_no: parsed.disk_no,
        track_no: parsed.track_no,
        year: parsed.year,
        genres: parsed.genres,
        size: parsed.size,
        bitrate: parsed.bitrate,
        sample_rate: parsed.sample_rate,
        duration: parsed.duration,
        artwork_path: parsed.artwork_path,
        created_at: parsed.created_at,
        scan_id: scan_id.to_string(),
    });
    true
}

/// Cascades one song out of the catalog. Artwork paths it or its album held are
/// appended to `candidates` in first-seen order.
fn remove_song(catalog: &mut Catalog, song_id: &str, candidates: &mut Vec<String>) -> Option<Song> {
    let song = catalog.songs.find_by_id(song_id)?.clone();
    push_unique(candidates, song.artwork_path.as_deref());

    let artist_shared = catalog.songs.items().iter().any(|other| {
        other.id != song.id && other.album_id == song.album_id && other.artist_id == song.artist_id
    });
    let mut album_emptied = false;
    if let Some(album) = catalog.albums.find_by_id_mut(&song.album_id) {
        if album.song_count <= 1 {
            album_emptied = true;
        } else {
            album.song_count -= 1;
            if !artist_shared {
                album.artists.retain(|a| a.artist_id != song.artist_id);
            }
        }
    }
    if album_emptied {
        if let Some(album) = catalog.albums.delete(&song.album_id) {
            push_unique(candidates, album.artwork_path.as_deref());
        }
    }

    let mut artist_emptied = false;
    if let Some(artist) = catalog.artists.find_by_id_mut(&song.artist_id) {
        if artist.song_count <= 1 {
            artist_emptied = true;
        } else {
            artist.song_count -= 1;
        }
    }
    if artist_emptied {
        catalog.artists.delete(&song.artist_id);
    }

    catalog.lyrics.value_mut().remove(&song.id);
    catalog.songs.delete(&song.id);
    Some(song)
}

fn push_unique(candidates: &mut Vec<String>, path: Option<&str>) {
    if let Some(path) = path {
        if !candidates.iter().any(|existing| existing == path) {
            candidates.push(path.to_string());
        }
    }
}
