// Purpose: Map short package names to import paths, persisted between runs.
// Inputs/Outputs: Parses `go list` output, reads/writes `short full` records in the cache dir.
// Invariants: A catalog is loaded whole or not at all; a rebuild replaces the file atomically.
// Gotchas: Concurrent rebuilds are last-writer-wins; only the rename itself is atomic.

use anyhow::{Context, bail};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::pkg::cache::{CacheLock, cache_root, ensure_dir};
use crate::toolchain::Toolchain;

pub const CATALOG_FILE: &str = "go.list";

/// Path roots that never make useful one-liner imports.
const EXCLUDED_ROOTS: &[&str] = &["golang.org", "cmd"];

/// Short-name lookup as seen by the import resolver.
pub trait ModuleLookup {
    fn lookup(&self, short: &str) -> Option<&str>;
    fn short_names(&self) -> Vec<String>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModuleCatalog {
    entries: BTreeMap<String, String>,
}

impl ModuleCatalog {
    /// Index `go list` output by last path segment. Single-segment paths are
    /// skipped because their short name already is their import path.
    pub fn from_listing(listing: &str) -> Self {
        let mut entries = BTreeMap::new();
        for line in listing.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let parts: Vec<&str> = line.split('/').collect();
            if EXCLUDED_ROOTS.contains(&parts[0]) || parts.len() < 2 || parts.contains(&"internal")
            {
                continue;
            }
            if let Some(last) = parts.last() {
                entries.insert(last.to_string(), line.to_string());
            }
        }
        Self { entries }
    }

    pub fn parse_records(text: &str) -> anyhow::Result<Self> {
        let mut entries = BTreeMap::new();
        for (n, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next(), fields.next()) {
                (Some(short), Some(full), None) => {
                    entries.insert(short.to_string(), full.to_string());
                }
                _ => bail!("malformed catalog record on line {}: {:?}", n + 1, line),
            }
        }
        Ok(Self { entries })
    }

    pub fn to_records(&self) -> String {
        let mut out = String::new();
        for (short, full) in &self.entries {
            out.push_str(short);
            out.push(' ');
            out.push_str(full);
            out.push('\n');
        }
        out
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for ModuleCatalog {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl ModuleLookup for ModuleCatalog {
    fn lookup(&self, short: &str) -> Option<&str> {
        self.entries.get(short).map(String::as_str)
    }

    fn short_names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// The on-disk home of the catalog.
#[derive(Clone, Debug)]
pub struct CatalogStore {
    dir: PathBuf,
}

impl CatalogStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn default_location() -> anyhow::Result<Self> {
        Ok(Self::new(cache_root()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CATALOG_FILE)
    }

    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    pub fn load(&self) -> anyhow::Result<ModuleCatalog> {
        let path = self.path();
        let text =
            fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        let catalog = ModuleCatalog::parse_records(&text)
            .with_context(|| format!("parse {}", path.display()))?;
        debug!(entries = catalog.len(), path = %path.display(), "loaded package catalog");
        Ok(catalog)
    }

    /// Write through a temp file in the same directory and rename over the old
    /// catalog, so a failed write leaves the previous file intact.
    pub fn persist(&self, catalog: &ModuleCatalog) -> anyhow::Result<()> {
        ensure_dir(&self.dir)?;
        let _lock = CacheLock::acquire(&self.dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .with_context(|| format!("create temp file in {}", self.dir.display()))?;
        tmp.write_all(catalog.to_records().as_bytes())
            .context("write catalog records")?;
        tmp.as_file().sync_all().context("sync catalog")?;
        let path = self.path();
        tmp.persist(&path)
            .with_context(|| format!("replace {}", path.display()))?;
        Ok(())
    }

    /// Rebuild from an arbitrary package listing. The listing closure is the
    /// seam used by tests; production goes through [`CatalogStore::rebuild`].
    pub fn rebuild_with<F>(&self, list: F) -> anyhow::Result<ModuleCatalog>
    where
        F: FnOnce() -> anyhow::Result<String>,
    {
        let listing = list()?;
        let catalog = ModuleCatalog::from_listing(&listing);
        self.persist(&catalog)?;
        info!(entries = catalog.len(), "rebuilt package catalog");
        Ok(catalog)
    }

    pub fn rebuild(&self, toolchain: &Toolchain) -> anyhow::Result<ModuleCatalog> {
        self.rebuild_with(|| toolchain.list_packages())
    }

    /// The catalog for this invocation: loaded from disk when present,
    /// rebuilt when forced or when no catalog has been written yet.
    pub fn load_or_rebuild(
        &self,
        toolchain: &Toolchain,
        force: bool,
    ) -> anyhow::Result<ModuleCatalog> {
        if force || !self.exists() {
            return self.rebuild(toolchain);
        }
        self.load()
    }
}
