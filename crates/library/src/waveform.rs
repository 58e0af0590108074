use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::warn;

#[derive(Debug)]
pub enum WaveformError {
    Io(std::io::Error),
    /// The blob is shorter than its declared sample count.
    Truncated { expected: usize, actual: usize },
    LengthMismatch { min: usize, max: usize },
    InvalidId(String),
}

impl std::fmt::Display for WaveformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaveformError::Io(err) => write!(f, "io error: {}", err),
            WaveformError::Truncated { expected, actual } => write!(
                f,
                "truncated waveform: expected {} bytes, found {}",
                expected, actual
            ),
            WaveformError::LengthMismatch { min, max } => {
                write!(f, "waveform has {} minimums but {} maximums", min, max)
            }
            WaveformError::InvalidId(id) => write!(f, "invalid song id for waveform: {:?}", id),
        }
    }
}

impl std::error::Error for WaveformError {}

impl From<std::io::Error> for WaveformError {
    fn from(err: std::io::Error) -> Self {
        WaveformError::Io(err)
    }
}

/// Peak envelope of a song: one signed minimum and maximum per bucket.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Waveform {
    min: Vec<i8>,
    max: Vec<i8>,
}

impl Waveform {
    pub fn new(min: Vec<i8>, max: Vec<i8>) -> Result<Self, WaveformError> {
        if min.len() != max.len() {
            return Err(WaveformError::LengthMismatch {
                min: min.len(),
                max: max.len(),
            });
        }
        Ok(Self { min, max })
    }

    pub fn len(&self) -> usize {
        self.min.len()
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_empty()
    }

    pub fn min(&self) -> &[i8] {
        &self.min
    }

    pub fn max(&self) -> &[i8] {
        &self.max
    }

    /// `u32` LE sample count, then the minimums, then the maximums.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.min.len() * 2);
        out.extend_from_slice(&(self.min.len() as u32).to_le_bytes());
        out.extend(self.min.iter().map(|&v| v as u8));
        out.extend(self.max.iter().map(|&v| v as u8));
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, WaveformError> {
        let header: [u8; 4] = match bytes.get(..4).and_then(|head| head.try_into().ok()) {
            Some(header) => header,
            None => {
                return Err(WaveformError::Truncated {
                    expected: 4,
                    actual: bytes.len(),
                })
            }
        };
        let count = u32::from_le_bytes(header) as usize;
        let expected = 4 + count * 2;
        if bytes.len() < expected {
            return Err(WaveformError::Truncated {
                expected,
                actual: bytes.len(),
            });
        }
        let body = &bytes[4..expected];
        let (min, max) = body.split_at(count);
        Ok(Self {
            min: min.iter().map(|&v| v as i8).collect(),
            max: max.iter().map(|&v| v as i8).collect(),
        })
    }
}

/// `<song id>.dat` blobs. Waveforms are produced elsewhere; this only stores them.
#[derive(Clone, Debug)]
pub struct WaveformStore {
    dir: PathBuf,
}

impl WaveformStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, song_id: &str) -> Result<PathBuf, WaveformError> {
        if song_id.is_empty() || song_id.contains(&['/', '\\'][..]) || song_id.contains("..") {
            return Err(WaveformError::InvalidId(song_id.to_string()));
        }
        Ok(self.dir.join(format!("{}.dat", song_id)))
    }

    pub fn read(&self, song_id: &str) -> Result<Option<Waveform>, WaveformError> {
        let path = self.path_for(song_id)?;
        match fs::read(&path) {
            Ok(bytes) => Waveform::decode(&bytes).map(Some),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn save(&self, song_id: &str, waveform: &Waveform) -> Result<(), WaveformError> {
        let path = self.path_for(song_id)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(path, waveform.encode())?;
        Ok(())
    }

    /// Returns whether a blob was removed.
    pub fn delete(&self, song_id: &str) -> Result<bool, WaveformError> {
        let path = self.path_for(song_id)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    pub fn delete_all(&self) -> Result<usize, WaveformError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err.into()),
        };
        let mut count = 0;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("dat") {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => count += 1,
                Err(err) => warn!("Failed to delete waveform {:?}: {}", path, err),
            }
        }
        Ok(count)
    }
}
