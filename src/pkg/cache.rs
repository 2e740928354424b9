// Purpose: Locate the per-user cache directory and serialize writers inside it.
// Inputs/Outputs: Resolves cache paths; hands out an exclusive lock guard.
// Invariants: Writers hold CacheLock while replacing files so readers never see a torn write.
// Gotchas: File-open flags and truncation policy are critical for Windows compatibility.

use anyhow::Context;
use directories::ProjectDirs;
use fs2::FileExt;
use std::fs;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

pub const CACHE_DIR_ENV: &str = "GRUN_CACHE_DIR";

pub fn project_dirs() -> anyhow::Result<ProjectDirs> {
    ProjectDirs::from("dev", "grun", "grun").context("cannot determine OS cache directory")
}

pub fn cache_root() -> anyhow::Result<PathBuf> {
    if let Ok(p) = std::env::var(CACHE_DIR_ENV)
        && !p.trim().is_empty()
    {
        return Ok(PathBuf::from(p));
    }
    Ok(project_dirs()?.cache_dir().to_path_buf())
}

pub fn ensure_dir(p: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(p).with_context(|| format!("create {}", p.display()))?;
    Ok(())
}

pub struct CacheLock {
    _file: File,
}

impl CacheLock {
    // Precondition: `root` is (or can become) a writable directory.
    // Postcondition: Holds an exclusive advisory lock until the guard is dropped.
    // Side effects: Creates `root` and an empty `cache.lock` file inside it.
    pub fn acquire(root: &Path) -> anyhow::Result<Self> {
        ensure_dir(root)?;
        let lock_path = root.join("cache.lock");
        let f = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&lock_path)
            .with_context(|| format!("open {}", lock_path.display()))?;
        FileExt::lock_exclusive(&f).with_context(|| format!("lock {}", lock_path.display()))?;
        Ok(Self { _file: f })
    }
}

#[cfg(test)]
mod tests {
    use super::CacheLock;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> PathBuf {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time drift")
            .as_nanos();
        std::env::temp_dir().join(format!("grun-{}-{}-{}", prefix, std::process::id(), nonce))
    }

    #[test]
    fn lock_creates_missing_root_and_can_be_reacquired() {
        let root = temp_dir("lock").join("nested");
        {
            let _guard = CacheLock::acquire(&root).expect("first lock");
            assert!(root.join("cache.lock").exists());
        }
        let _again = CacheLock::acquire(&root).expect("lock after release");
        let _ = std::fs::remove_dir_all(root.parent().expect("parent"));
    }
}
