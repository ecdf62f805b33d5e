use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{FaceGroupError, Result};

/// A directory of photos awaiting a clustering or search run.
///
/// Only regular files whose names do not start with `.` are photos.
/// Listing order is lexicographic by filename. [`Intake::clear`] removes
/// hidden files too.
#[derive(Debug, Clone)]
pub struct Intake {
    dir: PathBuf,
}

impl Intake {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns all photos, sorted by filename. A missing directory is empty.
    pub fn photos(&self) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(FaceGroupError::io(&self.dir, e)),
        };

        let mut photos = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| FaceGroupError::io(&self.dir, e))?;
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let file_type = entry
                .file_type()
                .map_err(|e| FaceGroupError::io(entry.path(), e))?;
            if file_type.is_file() {
                photos.push(entry.path());
            }
        }
        photos.sort();
        Ok(photos)
    }

    /// Returns the lexicographically first photo, warning when more than one is waiting.
    pub fn first(&self) -> Result<Option<PathBuf>> {
        let mut photos = self.photos()?;
        if photos.len() > 1 {
            warn!(
                dir = %self.dir.display(),
                count = photos.len(),
                "more than one photo waiting, using the first by name"
            );
        }
        if photos.is_empty() {
            return Ok(None);
        }
        Ok(Some(photos.swap_remove(0)))
    }

    /// Removes every regular file, hidden ones included, so nothing from
    /// this batch lingers into the next. Returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(FaceGroupError::io(&self.dir, e)),
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| FaceGroupError::io(&self.dir, e))?;
            let path = entry.path();
            let file_type = entry
                .file_type()
                .map_err(|e| FaceGroupError::io(&path, e))?;
            if !file_type.is_file() {
                continue;
            }
            fs::remove_file(&path).map_err(|e| FaceGroupError::io(&path, e))?;
            removed += 1;
        }
        Ok(removed)
    }
}

/// Filename component of a photo path.
pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
