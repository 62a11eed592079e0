// ─────────────────────────────────────────────────────────────────────
// Lorenz-96 GAN Kernel — Atomic Publish
// ─────────────────────────────────────────────────────────────────────
//! Write-to-temp then rename, so a destination either holds the previous
//! contents or the complete new file.
//!
//! The temporary file lives in the destination directory (rename is only
//! atomic within one filesystem) and is removed if anything fails before
//! the rename. [`commit_all`] extends this to a group of files: a failed
//! rename puts every destination of the group back the way it was.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use l96_types::{L96Error, L96Result};
use tempfile::{NamedTempFile, TempPath};

fn publish_error(dest: &Path, e: std::io::Error) -> L96Error {
    log::error!("publishing {} failed: {e}", dest.display());
    L96Error::io(dest, e)
}

fn staging_dir(dest: &Path) -> &Path {
    match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

fn temp_in(dest: &Path, suffix: &str) -> L96Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix(".l96-")
        .suffix(suffix)
        .tempfile_in(staging_dir(dest))
        .map_err(|e| publish_error(dest, e))
}

/// A fully written, fsynced temp file waiting to be renamed over `dest`.
///
/// Dropping it without committing removes the temp file.
#[derive(Debug)]
pub struct StagedFile {
    dest: PathBuf,
    tmp: TempPath,
}

/// A committed destination and the previous file it replaced.
struct Committed {
    dest: PathBuf,
    backup: Option<TempPath>,
}

impl StagedFile {
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Rename over the destination.
    pub fn commit(self) -> L96Result<PathBuf> {
        let StagedFile { dest, tmp } = self;
        // On error `PathPersistError` hands the temp path back; dropping it unlinks.
        tmp.persist(&dest).map_err(|e| publish_error(&dest, e.error))?;
        log::debug!("published {}", dest.display());
        Ok(dest)
    }

    /// Move an existing destination aside, then commit.
    fn commit_keeping_backup(self) -> L96Result<Committed> {
        let backup = if self.dest.is_file() {
            let bak = temp_in(&self.dest, ".bak")?.into_temp_path();
            fs::rename(&self.dest, &bak).map_err(|e| publish_error(&self.dest, e))?;
            Some(bak)
        } else {
            None
        };
        let dest = self.dest.clone();
        match self.commit() {
            Ok(dest) => Ok(Committed { dest, backup }),
            Err(e) => {
                restore(Committed { dest, backup }, false);
                Err(e)
            }
        }
    }
}

/// Put `c.dest` back to its state before the commit. `committed` says
/// whether a new file currently sits at the destination.
fn restore(c: Committed, committed: bool) {
    let result = match (c.backup, committed) {
        (Some(bak), _) => bak.persist(&c.dest).map_err(|e| e.error),
        (None, true) => fs::remove_file(&c.dest),
        (None, false) => return,
    };
    match result {
        Ok(()) => log::warn!("rolled back {}", c.dest.display()),
        Err(e) => log::error!("rolling back {} failed: {e}", c.dest.display()),
    }
}

/// Commit a group of staged files as one publication.
///
/// If any rename fails, destinations already committed in this call are
/// restored (previous contents back, new files removed), the remaining
/// staged files are discarded, and the first error is returned.
pub fn commit_all(staged: Vec<StagedFile>) -> L96Result<Vec<PathBuf>> {
    let mut done: Vec<Committed> = Vec::with_capacity(staged.len());
    for file in staged {
        match file.commit_keeping_backup() {
            Ok(c) => done.push(c),
            Err(e) => {
                for c in done.into_iter().rev() {
                    restore(c, true);
                }
                return Err(e);
            }
        }
    }
    // Backups are dropped, and so unlinked, only once every rename landed.
    Ok(done.into_iter().map(|c| c.dest).collect())
}

/// Write `dest`'s new contents next to it without touching `dest`.
///
/// Every failure is reported as [`L96Error::Io`] carrying `dest`.
pub fn stage<F>(dest: &Path, write: F) -> L96Result<StagedFile>
where
    F: FnOnce(&mut dyn Write) -> std::io::Result<()>,
{
    let fail = |e| publish_error(dest, e);
    let tmp = temp_in(dest, ".tmp")?;
    {
        let mut w = BufWriter::new(tmp.as_file());
        write(&mut w).map_err(fail)?;
        w.flush().map_err(fail)?;
    }
    tmp.as_file().sync_all().map_err(fail)?;
    Ok(StagedFile {
        dest: dest.to_path_buf(),
        tmp: tmp.into_temp_path(),
    })
}

/// Stage a file produced by a writer that opens paths itself.
///
/// `write` receives the temp path, which already exists and may be
/// overwritten; its errors are returned as they are.
pub fn stage_path<F>(dest: &Path, write: F) -> L96Result<StagedFile>
where
    F: FnOnce(&Path) -> L96Result<()>,
{
    let tmp = temp_in(dest, ".tmp")?.into_temp_path();
    write(&tmp)?;
    File::open(&tmp)
        .and_then(|f| f.sync_all())
        .map_err(|e| publish_error(dest, e))?;
    Ok(StagedFile {
        dest: dest.to_path_buf(),
        tmp,
    })
}

/// Stage and commit in one go.
pub fn publish<F>(dest: &Path, write: F) -> L96Result<()>
where
    F: FnOnce(&mut dyn Write) -> std::io::Result<()>,
{
    stage(dest, write)?.commit().map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn leftovers(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_publish_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.txt");
        publish(&dest, |w| w.write_all(b"hello")).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"hello");
        assert_eq!(leftovers(dir.path()), vec!["out.txt".to_string()]);
    }

    #[test]
    fn test_publish_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.txt");
        fs::write(&dest, b"old contents").unwrap();
        publish(&dest, |w| w.write_all(b"new")).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"new");
    }

    #[test]
    fn test_failed_write_keeps_previous_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.txt");
        fs::write(&dest, b"previous").unwrap();
        let err = publish(&dest, |w| {
            w.write_all(b"partial")?;
            Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"))
        })
        .unwrap_err();
        match err {
            L96Error::Io { path, .. } => assert_eq!(path, dest),
            other => panic!("unexpected error {other}"),
        }
        assert_eq!(fs::read(&dest).unwrap(), b"previous");
        assert_eq!(leftovers(dir.path()), vec!["out.txt".to_string()]);
    }

    #[test]
    fn test_staged_file_invisible_until_commit() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.txt");
        let staged = stage(&dest, |w| w.write_all(b"staged")).unwrap();
        assert!(!dest.exists());
        assert_eq!(staged.dest(), dest.as_path());
        assert_eq!(staged.commit().unwrap(), dest);
        assert_eq!(fs::read(&dest).unwrap(), b"staged");
    }

    #[test]
    fn test_dropped_stage_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.txt");
        drop(stage(&dest, |w| w.write_all(b"never")).unwrap());
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("no").join("such").join("out.txt");
        let err = publish(&dest, |w| w.write_all(b"x")).unwrap_err();
        assert!(matches!(err, L96Error::Io { .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn test_stage_path_hands_over_existing_temp() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.bin");
        let staged = stage_path(&dest, |p| {
            assert!(p.exists());
            assert_eq!(p.parent(), Some(dir.path()));
            fs::write(p, b"by path").map_err(|e| L96Error::io(p, e))
        })
        .unwrap();
        assert!(!dest.exists());
        staged.commit().unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"by path");
        assert_eq!(leftovers(dir.path()), vec!["out.bin".to_string()]);
    }

    #[test]
    fn test_stage_path_error_removes_temp() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.bin");
        let err = stage_path(&dest, |_| Err(L96Error::Format("bad".to_string()))).unwrap_err();
        assert!(matches!(err, L96Error::Format(_)));
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn test_commit_all_publishes_group() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, b"old a").unwrap();
        let staged = vec![
            stage(&a, |w| w.write_all(b"new a")).unwrap(),
            stage(&b, |w| w.write_all(b"new b")).unwrap(),
        ];
        assert_eq!(commit_all(staged).unwrap(), vec![a.clone(), b.clone()]);
        assert_eq!(fs::read(&a).unwrap(), b"new a");
        assert_eq!(fs::read(&b).unwrap(), b"new b");
        let mut names = leftovers(dir.path());
        names.sort();
        assert_eq!(names, vec!["a.txt".to_string(), "b.txt".to_string()]);
    }

    #[test]
    fn test_commit_all_rolls_back_on_late_failure() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        // A non-empty directory cannot be renamed over.
        let blocked = dir.path().join("c.txt");
        fs::create_dir(&blocked).unwrap();
        fs::write(blocked.join("keep"), b"k").unwrap();
        fs::write(&a, b"old a").unwrap();

        let staged = vec![
            stage(&a, |w| w.write_all(b"new a")).unwrap(),
            stage(&b, |w| w.write_all(b"new b")).unwrap(),
            stage(&blocked, |w| w.write_all(b"new c")).unwrap(),
        ];
        let err = commit_all(staged).unwrap_err();
        match err {
            L96Error::Io { path, .. } => assert_eq!(path, blocked),
            other => panic!("unexpected error {other}"),
        }
        assert_eq!(fs::read(&a).unwrap(), b"old a");
        assert!(!b.exists());
        assert!(blocked.join("keep").exists());
        let mut names = leftovers(dir.path());
        names.sort();
        assert_eq!(names, vec!["a.txt".to_string(), "c.txt".to_string()]);
    }
}
