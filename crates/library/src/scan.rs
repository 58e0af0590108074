use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use common::ScanProgress;
use walkdir::WalkDir;

use crate::catalog::SaveReport;

pub const AUDIO_EXTENSIONS: [&str; 7] = ["aac", "mp3", "ogg", "wav", "flac", "webm", "m4a"];

pub fn is_audio_file(path: &Path) -> bool {
    match path.extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy().to_ascii_lowercase();
            AUDIO_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Every audio file under `root`, sorted. Any unreadable directory fails the walk.
pub fn collect_audio_files(root: &Path) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry?;
        if entry.file_type().is_file() && is_audio_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug)]
pub struct ScanOptions {
    pub resort_library: bool,
    pub cancel: CancelToken,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            resort_library: true,
            cancel: CancelToken::new(),
        }
    }
}

#[derive(Debug)]
pub struct ScanSummary {
    pub scan_id: String,
    pub total_files: usize,
    pub scanned: usize,
    pub skipped: usize,
    pub cancelled: bool,
    pub saves: SaveReport,
}

pub(crate) struct ProgressReporter<F> {
    progress: ScanProgress,
    sink: F,
}

impl<F> ProgressReporter<F>
where
    F: FnMut(&ScanProgress),
{
    pub(crate) fn new(path: &str, sink: F) -> Self {
        Self {
            progress: ScanProgress {
                path: path.to_string(),
                ..ScanProgress::default()
            },
            sink,
        }
    }

    pub(crate) fn set_total(&mut self, total: usize) {
        self.progress.total_files_count = total;
    }

    pub(crate) fn scanned(&mut self) {
        self.progress.current_index += 1;
        self.progress.scanned_files_count += 1;
        (self.sink)(&self.progress);
    }

    pub(crate) fn skipped(&mut self) {
        self.progress.current_index += 1;
        self.progress.skipped_files_count += 1;
        (self.sink)(&self.progress);
    }

    pub(crate) fn finish(mut self) -> ScanProgress {
        self.progress.done = true;
        (self.sink)(&self.progress);
        self.progress
    }
}
