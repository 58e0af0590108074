use std::path::Path;

use common::{Album, Artist, LyricsMap, ScannedFolder, Song};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::sort::{
    default_album_sort, default_artist_sort, default_song_sort, sort_records, SortOption,
    Sortable,
};
use crate::store::{JsonStore, StoreError};

pub trait Record: Clone {
    fn id(&self) -> &str;
}

impl Record for Song {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Album {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Artist {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for ScannedFolder {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Songs,
    Albums,
    Artists,
    Lyrics,
    ScannedFolders,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 5] = [
        CollectionKind::Songs,
        CollectionKind::Albums,
        CollectionKind::Artists,
        CollectionKind::Lyrics,
        CollectionKind::ScannedFolders,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            CollectionKind::Songs => "songs.json",
            CollectionKind::Albums => "albums.json",
            CollectionKind::Artists => "artists.json",
            CollectionKind::Lyrics => "lyrics.json",
            CollectionKind::ScannedFolders => "scanned-folders.json",
        }
    }
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_name())
    }
}

#[derive(Debug)]
pub struct SaveOutcome {
    pub collection: CollectionKind,
    pub result: Result<(), StoreError>,
}

/// Per-collection results of a batch of independent writes.
#[derive(Debug, Default)]
pub struct SaveReport {
    pub outcomes: Vec<SaveOutcome>,
}

impl SaveReport {
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.result.is_ok())
    }

    pub fn failed(&self) -> Vec<CollectionKind> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result.is_err())
            .map(|outcome| outcome.collection)
            .collect()
    }
}

#[derive(Debug)]
pub struct Collection<T> {
    store: JsonStore<Vec<T>>,
}

impl<T> Collection<T>
where
    T: Record + Serialize + DeserializeOwned,
{
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            store: JsonStore::open(path.to_path_buf())?,
        })
    }

    pub fn all(&mut self) -> Result<Vec<T>, StoreError> {
        self.store.read()
    }

    pub fn items(&self) -> &[T] {
        self.store.value().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn find_by_id(&self, id: &str) -> Option<&T> {
        self.items().iter().find(|item| item.id() == id)
    }

    pub fn get(&mut self, id: &str) -> Result<Option<T>, StoreError> {
        self.store.refresh()?;
        Ok(self.find_by_id(id).cloned())
    }

    pub(crate) fn find_by_id_mut(&mut self, id: &str) -> Option<&mut T> {
        self.store.value_mut().iter_mut().find(|item| item.id() == id)
    }

    pub(crate) fn add(&mut self, item: T) {
        self.store.value_mut().push(item);
    }

    /// Removes the first record with `id`.
    pub(crate) fn delete(&mut self, id: &str) -> Option<T> {
        let items = self.store.value_mut();
        let index = items.iter().position(|item| item.id() == id)?;
        Some(items.remove(index))
    }

    pub(crate) fn sort(&mut self, options: &[SortOption<T::Key>])
    where
        T: Sortable,
    {
        sort_records(self.store.value_mut(), options);
    }

    pub fn refresh(&mut self) -> Result<(), StoreError> {
        self.store.refresh()
    }

    pub fn save(&mut self) -> Result<(), StoreError> {
        self.store.save()
    }

    pub(crate) fn reset(&mut self) -> Result<(), StoreError> {
        self.store.save_value(Vec::new())
    }

    pub fn clear_cache(&mut self) {
        self.store.clear_cache();
    }
}

impl Collection<Song> {
    pub fn find_by_path(&self, file_path: &str) -> Option<&Song> {
        self.items().iter().find(|song| song.file_path == file_path)
    }

    pub fn ids_for_scan(&self, scan_id: &str) -> Vec<String> {
        self.items()
            .iter()
            .filter(|song| song.scan_id == scan_id)
            .map(|song| song.id.clone())
            .collect()
    }
}

impl Collection<Album> {
    pub fn find_by_title(&self, title: &str) -> Option<&Album> {
        self.items().iter().find(|album| album.title == title)
    }

    pub(crate) fn find_by_title_mut(&mut self, title: &str) -> Option<&mut Album> {
        self.store
            .value_mut()
            .iter_mut()
            .find(|album| album.title == title)
    }
}

impl Collection<Artist> {
    pub fn find_by_name(&self, name: &str) -> Option<&Artist> {
        self.items().iter().find(|artist| artist.name == name)
    }

    pub(crate) fn find_by_name_mut(&mut self, name: &str) -> Option<&mut Artist> {
        self.store
            .value_mut()
            .iter_mut()
            .find(|artist| artist.name == name)
    }
}

impl Collection<ScannedFolder> {
    /// Case-insensitive.
    pub fn find_by_path(&self, path: &str) -> Option<&ScannedFolder> {
        let wanted = path.to_lowercase();
        self.items()
            .iter()
            .find(|folder| folder.path.to_lowercase() == wanted)
    }

    pub(crate) fn upsert(&mut self, folder: ScannedFolder) {
        match self.find_by_id_mut(&folder.id) {
            Some(existing) => *existing = folder,
            None => self.add(folder),
        }
    }
}

#[derive(Debug)]
pub struct Catalog {
    pub songs: Collection<Song>,
    pub albums: Collection<Album>,
    pub artists: Collection<Artist>,
    pub folders: Collection<ScannedFolder>,
    pub lyrics: JsonStore<LyricsMap>,
}

impl Catalog {
    pub fn open(stores_dir: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            songs: Collection::open(&stores_dir.join(CollectionKind::Songs.file_name()))?,
            albums: Collection::open(&stores_dir.join(CollectionKind::Albums.file_name()))?,
            artists: Collection::open(&stores_dir.join(CollectionKind::Artists.file_name()))?,
            folders: Collection::open(
                &stores_dir.join(CollectionKind::ScannedFolders.file_name()),
            )?,
            lyrics: JsonStore::open(stores_dir.join(CollectionKind::Lyrics.file_name()))?,
        })
    }

    /// Reloads any collection whose cache was cleared. Required before mutating.
    pub fn refresh(&mut self) -> Result<(), StoreError> {
        self.songs.refresh()?;
        self.albums.refresh()?;
        self.artists.refresh()?;
        self.folders.refresh()?;
        self.lyrics.refresh()
    }

    pub fn resort(&mut self) {
        self.songs.sort(&default_song_sort());
        self.albums.sort(&default_album_sort());
        self.artists.sort(&default_artist_sort());
    }

    pub fn clear_cache(&mut self, kind: CollectionKind) {
        match kind {
            CollectionKind::Songs => self.songs.clear_cache(),
            CollectionKind::Albums => self.albums.clear_cache(),
            CollectionKind::Artists => self.artists.clear_cache(),
            CollectionKind::Lyrics => self.lyrics.clear_cache(),
            CollectionKind::ScannedFolders => self.folders.clear_cache(),
        }
    }

    pub fn save(&mut self, kind: CollectionKind) -> Result<(), StoreError> {
        match kind {
            CollectionKind::Songs => self.songs.save(),
            CollectionKind::Albums => self.albums.save(),
            CollectionKind::Artists => self.artists.save(),
            CollectionKind::Lyrics => self.lyrics.save(),
            CollectionKind::ScannedFolders => self.folders.save(),
        }
    }

    /// Attempts every write; one failure never prevents the others.
    pub fn save_all(&mut self) -> SaveReport {
        settle(CollectionKind::ALL.iter().map(|&kind| SaveOutcome {
            collection: kind,
            result: self.save(kind),
        }))
    }

    /// Writes empty documents for every collection.
    pub fn reset(&mut self) -> SaveReport {
        settle(CollectionKind::ALL.iter().map(|&kind| SaveOutcome {
            collection: kind,
            result: match kind {
                CollectionKind::Songs => self.songs.reset(),
                CollectionKind::Albums => self.albums.reset(),
                CollectionKind::Artists => self.artists.reset(),
                CollectionKind::Lyrics => self.lyrics.save_value(LyricsMap::new()),
                CollectionKind::ScannedFolders => self.folders.reset(),
            },
        }))
    }
}

fn settle(outcomes: impl Iterator<Item = SaveOutcome>) -> SaveReport {
    let outcomes: Vec<SaveOutcome> = outcomes.collect();
    for outcome in &outcomes {
        if let Err(err) = &outcome.result {
            warn!("Failed to save {}: {}", outcome.collection, err);
        }
    }
    SaveReport { outcomes }
}
