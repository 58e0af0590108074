use std::fs;
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};

use common::{Album, Song};
use image::imageops::FilterType;
use image::ImageFormat;
use tracing::{debug, warn};
use xxhash_rust::xxh3::xxh3_64;

pub const DEFAULT_ARTWORK_SIZE: u32 = 256;

#[derive(Debug)]
pub enum ArtworkError {
    Io(std::io::Error),
    Image(image::ImageError),
}

impl std::fmt::Display for ArtworkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtworkError::Io(err) => write!(f, "io error: {}", err),
            ArtworkError::Image(err) => write!(f, "image error: {}", err),
        }
    }
}

impl std::error::Error for ArtworkError {}

impl From<std::io::Error> for ArtworkError {
    fn from(err: std::io::Error) -> Self {
        ArtworkError::Io(err)
    }
}

impl From<image::ImageError> for ArtworkError {
    fn from(err: image::ImageError) -> Self {
        ArtworkError::Image(err)
    }
}

/// Content-addressed PNG thumbnails. The file name is the xxh3 digest of the
/// embedded picture bytes, so identical pictures share one file.
#[derive(Clone, Debug)]
pub struct ArtworkStore {
    dir: PathBuf,
    size: u32,
}

impl ArtworkStore {
    pub fn new(dir: PathBuf, size: u32) -> Self {
        let size = if size == 0 { DEFAULT_ARTWORK_SIZE } else { size };
        Self { dir, size }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, bytes: &[u8]) -> PathBuf {
        self.dir.join(format!("{:016x}.png", xxh3_64(bytes)))
    }

    /// Returns the existing file untouched when the digest is already stored.
    pub fn save(&self, bytes: &[u8], mime: Option<&str>) -> Result<PathBuf, ArtworkError> {
        let path = self.path_for(bytes);
        if path.is_file() {
            return Ok(path);
        }

        let format = mime.and_then(ImageFormat::from_mime_type);
        let image = match format {
            Some(format) => image::load_from_memory_with_format(bytes, format)?,
            None => image::load_from_memory(bytes)?,
        };
        let resized = image.resize(self.size, self.size, FilterType::Lanczos3);

        let mut encoded = Vec::new();
        resized.write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)?;

        fs::create_dir_all(&self.dir)?;
        let partial = path.with_extension("png.part");
        fs::write(&partial, &encoded)?;
        if let Err(err) = fs::rename(&partial, &path) {
            let _ = fs::remove_file(&partial);
            return Err(err.into());
        }
        debug!("Saved artwork {:?}", path);
        Ok(path)
    }

    /// Deletes candidates that no song or album references.
    ///
    /// Stops at the first candidate that is still referenced and leaves every
    /// later candidate on disk, even unreferenced ones.
    pub fn delete_if_unreferenced(
        &self,
        candidates: &[String],
        songs: &[Song],
        albums: &[Album],
    ) -> Vec<PathBuf> {
        let mut deleted = Vec::new();
        for candidate in candidates {
            let referenced = songs
                .iter()
                .any(|song| song.artwork_path.as_deref() == Some(candidate.as_str()))
                || albums
                    .iter()
                    .any(|album| album.artwork_path.as_deref() == Some(candidate.as_str()));
            if referenced {
                return deleted;
            }

            let path = PathBuf::from(candidate);
            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!("Deleted artwork {:?}", path);
                    deleted.push(path);
                }
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => warn!("Failed to delete artwork {:?}: {}", path, err),
            }
        }
        deleted
    }

    /// Removes every `*.png` in the store. Returns how many were deleted.
    pub fn delete_all(&self) -> Result<usize, ArtworkError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err.into()),
        };
        let mut count = 0;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("png") {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => count += 1,
                Err(err) => warn!("Failed to delete artwork {:?}: {}", path, err),
            }
        }
        Ok(count)
    }
}
