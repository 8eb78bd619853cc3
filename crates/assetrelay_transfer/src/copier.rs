//! Ordered, throttled delivery of candidates into the destination.

use crate::cancel::CancellationToken;
use crate::error::{RelayError, Result};
use crate::gate::BacklogGate;
use crate::selector::CandidateSet;
use crate::types::EntryKind;
use filetime::FileTime;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// What a copy pass has done so far. Kept up to date while copying, so it
/// is still meaningful after a failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyProgress {
    /// Destination paths, in copy order.
    pub copied: Vec<PathBuf>,
    pub files_copied: usize,
    pub dirs_copied: usize,
    pub gate_waits: usize,
}

/// Copies candidates in order, pausing on the backlog gate:
/// once before the first copy, after every directory, and after every
/// `threshold`-th single file.
pub struct ThrottledCopier<'a> {
    destination: &'a Path,
    threshold: NonZeroUsize,
    gate: &'a dyn BacklogGate,
    cancel: &'a CancellationToken,
}

impl<'a> ThrottledCopier<'a> {
    pub fn new(
        destination: &'a Path,
        threshold: NonZeroUsize,
        gate: &'a dyn BacklogGate,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            destination,
            threshold,
            gate,
            cancel,
        }
    }

    /// Copy every candidate. Stops at the first failure; whatever was copied
    /// before it stays in the destination.
    pub fn copy_all(&self, candidates: &CandidateSet, progress: &mut CopyProgress) -> Result<()> {
        self.wait(progress)?;

        for candidate in &candidates.entries {
            if self.cancel.is_cancelled() {
                return Err(RelayError::Cancelled);
            }

            match candidate.kind {
                EntryKind::Directory => {
                    let target = copy_dir_into(&candidate.path, self.destination)?;
                    tracing::info!(from = %candidate.path.display(), to = %target.display(), "copied directory");
                    progress.copied.push(target);
                    progress.dirs_copied += 1;
                    self.wait(progress)?;
                }
                EntryKind::File => {
                    let target = copy_file_into(&candidate.path, self.destination)?;
                    tracing::info!(from = %candidate.path.display(), to = %target.display(), "copied file");
                    progress.copied.push(target);
                    progress.files_copied += 1;
                    if progress.files_copied % self.threshold.get() == 0 {
                        self.wait(progress)?;
                    }
                }
            }
        }

        Ok(())
    }

    fn wait(&self, progress: &mut CopyProgress) -> Result<()> {
        progress.gate_waits += 1;
        self.gate.wait_until_clear(self.cancel)
    }
}

/// Copy `src` to `<dest_dir>/<file name>`, overwriting, keeping the
/// modification time.
pub fn copy_file_into(src: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let name = src.file_name().ok_or_else(|| {
        RelayError::InvalidInput(format!("'{}' has no file name", src.display()))
    })?;
    let target = dest_dir.join(name);
    copy_preserving_mtime(src, &target)?;
    Ok(target)
}

/// Copy the tree rooted at `src` to `<dest_dir>/<dir name>/...`.
///
/// Symlinks are followed: linked directories are copied as directories and
/// linked files by content.
pub fn copy_dir_into(src: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let name = src.file_name().ok_or_else(|| {
        RelayError::InvalidInput(format!("'{}' has no directory name", src.display()))
    })?;
    let root = dest_dir.join(name);

    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| RelayError::InvalidInput(e.to_string()))?;
        let target = root.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|source| RelayError::Copy {
                path: entry.path().to_path_buf(),
                source,
            })?;
        } else {
            copy_preserving_mtime(entry.path(), &target)?;
        }
    }

    Ok(root)
}

fn copy_preserving_mtime(src: &Path, target: &Path) -> Result<()> {
    let copy_err = |source: std::io::Error| RelayError::Copy {
        path: src.to_path_buf(),
        source,
    };
    fs::copy(src, target).map_err(copy_err)?;
    let metadata = fs::metadata(src).map_err(copy_err)?;
    filetime::set_file_mtime(target, FileTime::from_last_modification_time(&metadata))
        .map_err(copy_err)?;
    Ok(())
}
