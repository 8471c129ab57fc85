//! Reference signature store: directory-backed, atomically swapped snapshots.
//!
//! The store is the only mutable shared resource in the engine. It is read
//! by arbitrarily many concurrent scans and written by at most one reload
//! or append at a time. Readers hold an [`Arc`] to the published snapshot
//! and never observe a partially built collection: `reload` and `append`
//! assemble a complete new database before swapping the pointer under a
//! short write lock.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use crate::error::{HashwardError, Result};
use crate::signature::{Signature, SignatureHasher};

/// File extensions accepted for references and raw candidate links.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "gif"];

/// Check a file name or URL path (query string already removed) against the
/// supported extension list, case-insensitively.
pub fn has_image_extension(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{ext}")))
}

/// One admitted reference image: signature computed once at load or append,
/// immutable thereafter.
#[derive(Debug, Clone)]
pub struct ReferenceEntry {
    pub id: String,
    pub signature: Signature,
}

/// An immutable, fully built collection of reference signatures.
#[derive(Debug, Default)]
pub struct SignatureDatabase {
    entries: Vec<ReferenceEntry>,
    skipped: usize,
}

impl SignatureDatabase {
    /// Build a snapshot directly from entries, for callers that manage
    /// their own persistence.
    pub fn from_entries(entries: Vec<ReferenceEntry>) -> Self {
        Self {
            entries,
            skipped: 0,
        }
    }

    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Source entries that failed to decode during the load that built this
    /// snapshot.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

/// Directory-backed store publishing immutable snapshots.
pub struct SignatureStore {
    root: PathBuf,
    current: RwLock<Arc<SignatureDatabase>>,
}

impl SignatureStore {
    /// Open the store, creating the directory if absent, and load every
    /// decodable image in it. An unreadable directory is the one condition
    /// that aborts startup.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| HashwardError::StoreUnavailable {
            path: root.clone(),
            source,
        })?;
        let db = load_directory(&root)?;
        info!(
            path = %root.display(),
            entries = db.len(),
            skipped = db.skipped(),
            "reference store loaded"
        );
        Ok(Self {
            root,
            current: RwLock::new(Arc::new(db)),
        })
    }

    /// The currently published snapshot. Cheap to call; the returned handle
    /// is unaffected by later publishes.
    pub fn snapshot(&self) -> Arc<SignatureDatabase> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Rebuild the snapshot from the backing directory and publish it,
    /// replacing the previous collection wholesale. Triggered only by
    /// explicit request, never on a timer. Returns the new entry count.
    pub fn reload(&self) -> Result<usize> {
        let db = load_directory(&self.root)?;
        let count = db.len();
        info!(entries = count, skipped = db.skipped(), "reference store reloaded");
        self.publish(db);
        Ok(count)
    }

    /// Validate, persist, and admit one new reference image.
    ///
    /// The blob is written to the backing directory before the new snapshot
    /// is published, so a restart reproduces the same database. Rejections
    /// (`UnsupportedExtension`, `Decode`) are surfaced synchronously and
    /// leave the store untouched. Returns the new entry count.
    pub fn append(&self, name: &str, bytes: &[u8]) -> Result<usize> {
        let file_name = Path::new(name)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| HashwardError::UnsupportedExtension(name.to_string()))?;
        if !has_image_extension(file_name) {
            return Err(HashwardError::UnsupportedExtension(file_name.to_string()));
        }
        let image = image::load_from_memory(bytes)
            .map_err(|err| HashwardError::Decode(err.to_string()))?;
        let signature = SignatureHasher::new().compute(&image);

        fs::write(self.root.join(file_name), bytes)?;

        let entry = ReferenceEntry {
            id: file_name.to_string(),
            signature,
        };
        let count = {
            let mut guard = match self.current.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let mut entries = guard.entries.clone();
            entries.push(entry);
            let next = SignatureDatabase {
                entries,
                skipped: guard.skipped,
            };
            *guard = Arc::new(next);
            guard.len()
        };
        info!(name = file_name, entries = count, "reference appended");
        Ok(count)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn publish(&self, db: SignatureDatabase) {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Arc::new(db);
    }
}

/// Enumerate a directory and compute one signature per decodable image,
/// counting everything else as skipped. References are hashed at the 0°
/// orientation only; rotation invariance is applied to candidates instead.
fn load_directory(root: &Path) -> Result<SignatureDatabase> {
    let read_dir = fs::read_dir(root).map_err(|source| HashwardError::StoreUnavailable {
        path: root.to_path_buf(),
        source,
    })?;

    let hasher = SignatureHasher::new();
    let mut entries = Vec::new();
    let mut skipped = 0usize;

    for dir_entry in read_dir {
        let dir_entry = match dir_entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable directory entry");
                skipped += 1;
                continue;
            }
        };
        let path = dir_entry.path();
        if !path.is_file() {
            continue;
        }
        let name = dir_entry.file_name().to_string_lossy().into_owned();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(name = %name, error = %err, "skipping unreadable reference");
                skipped += 1;
                continue;
            }
        };
        match image::load_from_memory(&bytes) {
            Ok(image) => entries.push(ReferenceEntry {
                id: name,
                signature: hasher.compute(&image),
            }),
            Err(err) => {
                warn!(name = %name, error = %err, "skipping undecodable reference");
                skipped += 1;
            }
        }
    }

    // Match iteration order is unspecified; sorting keeps logs and
    // diagnostics stable across reloads.
    entries.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(SignatureDatabase { entries, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn png_bytes(seed: u8) -> Vec<u8> {
        let img = RgbImage::from_fn(24, 24, |x, y| {
            Rgb([seed.wrapping_add(x as u8), y as u8, seed])
        });
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_open_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("refs");
        let store = SignatureStore::open(&root).unwrap();
        assert!(root.is_dir());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_load_skips_undecodable_entries() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.png"), png_bytes(1)).unwrap();
        fs::write(dir.path().join("b.png"), png_bytes(200)).unwrap();
        fs::write(dir.path().join("junk.txt"), b"not an image").unwrap();

        let store = SignatureStore::open(dir.path()).unwrap();
        let db = store.snapshot();
        assert_eq!(db.len(), 2);
        assert_eq!(db.skipped(), 1);
        let ids: Vec<_> = db.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["a.png", "b.png"]);
    }

    #[test]
    fn test_append_rejects_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let store = SignatureStore::open(dir.path()).unwrap();
        let err = store.append("scam.bmp", &png_bytes(3)).unwrap_err();
        assert!(matches!(err, HashwardError::UnsupportedExtension(_)));
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_append_rejects_undecodable_bytes() {
        let dir = TempDir::new().unwrap();
        let store = SignatureStore::open(dir.path()).unwrap();
        let err = store.append("scam.png", b"garbage").unwrap_err();
        assert!(matches!(err, HashwardError::Decode(_)));
        assert!(store.snapshot().is_empty());
        // Rejected blobs are never persisted
        assert!(!dir.path().join("scam.png").exists());
    }

    #[test]
    fn test_append_persists_before_publishing() {
        let dir = TempDir::new().unwrap();
        let store = SignatureStore::open(dir.path()).unwrap();
        let count = store.append("scam.png", &png_bytes(7)).unwrap();
        assert_eq!(count, 1);
        assert!(dir.path().join("scam.png").is_file());

        // A fresh open reproduces the same database
        let reopened = SignatureStore::open(dir.path()).unwrap();
        assert_eq!(reopened.snapshot().len(), 1);
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_appends() {
        let dir = TempDir::new().unwrap();
        let store = SignatureStore::open(dir.path()).unwrap();
        let before = store.snapshot();
        store.append("scam.png", &png_bytes(9)).unwrap();
        assert_eq!(before.len(), 0);
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn test_reload_replaces_collection_wholesale() {
        let dir = TempDir::new().unwrap();
        let store = SignatureStore::open(dir.path()).unwrap();
        store.append("old.png", &png_bytes(11)).unwrap();

        fs::remove_file(dir.path().join("old.png")).unwrap();
        fs::write(dir.path().join("new.png"), png_bytes(42)).unwrap();

        let count = store.reload().unwrap();
        assert_eq!(count, 1);
        assert_eq!(store.snapshot().entries()[0].id, "new.png");
    }
}
