//! Collaborators the engine reads originals from and files variants into.
//!
//! | Trait | Used for |
//! |---|---|
//! | [`MetadataLookup`] | Original format and dimensions, without touching pixels |
//! | [`OriginalStore`] | Original bytes, loaded only when a variant must be generated |
//! | [`VariantStore`] | Durable cache of generated variants, keyed by [`VariantKey`] |
//!
//! Two implementations ship with the crate: [`MemoryImageRepository`] /
//! [`MemoryVariantStore`] for embedding and tests, and [`DirectoryVariantStore`]
//! which files variants on disk under [`VariantKey::file_name`].

use crate::transform::{ImageBytes, SourceImage};
use crate::variant::{ImageAttributes, ImageId, VariantKey};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Backend(String),
}

pub trait MetadataLookup: Send + Sync {
    /// `Ok(None)` when the image is unknown.
    fn original_attributes(&self, image: ImageId) -> Result<Option<ImageAttributes>, StoreError>;
}

pub trait OriginalStore: Send + Sync {
    fn load_original(&self, image: ImageId) -> Result<Option<SourceImage>, StoreError>;
}

pub trait VariantStore: Send + Sync {
    fn get(&self, key: &VariantKey) -> Result<Option<ImageBytes>, StoreError>;

    fn put(&self, key: &VariantKey, bytes: &ImageBytes) -> Result<(), StoreError>;

    /// Record an access, for eviction by last use.
    fn touch(&self, key: &VariantKey) -> Result<(), StoreError>;

    /// Removing an absent key is not an error.
    fn remove(&self, key: &VariantKey) -> Result<(), StoreError>;
}

// ============================================================================
// In-memory
// ============================================================================

/// Originals held in memory; serves both metadata and bytes.
#[derive(Default)]
pub struct MemoryImageRepository {
    images: RwLock<HashMap<ImageId, (ImageAttributes, SourceImage)>>,
}

impl MemoryImageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, image: ImageId, attributes: ImageAttributes, bytes: impl Into<ImageBytes>) {
        let source = SourceImage::new(attributes.format, bytes);
        self.images.write().insert(image, (attributes, source));
    }
}

impl MetadataLookup for MemoryImageRepository {
    fn original_attributes(&self, image: ImageId) -> Result<Option<ImageAttributes>, StoreError> {
        Ok(self.images.read().get(&image).map(|(attrs, _)| *attrs))
    }
}

impl OriginalStore for MemoryImageRepository {
    fn load_original(&self, image: ImageId) -> Result<Option<SourceImage>, StoreError> {
        Ok(self.images.read().get(&image).map(|(_, source)| source.clone()))
    }
}

struct StoredVariant {
    bytes: ImageBytes,
    last_accessed: SystemTime,
}

#[derive(Default)]
pub struct MemoryVariantStore {
    entries: RwLock<HashMap<VariantKey, StoredVariant>>,
}

impl MemoryVariantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn contains(&self, key: &VariantKey) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn last_accessed(&self, key: &VariantKey) -> Option<SystemTime> {
        self.entries.read().get(key).map(|e| e.last_accessed)
    }
}

impl VariantStore for MemoryVariantStore {
    fn get(&self, key: &VariantKey) -> Result<Option<ImageBytes>, StoreError> {
        Ok(self.entries.read().get(key).map(|e| e.bytes.clone()))
    }

    fn put(&self, key: &VariantKey, bytes: &ImageBytes) -> Result<(), StoreError> {
        self.entries.write().insert(
            *key,
            StoredVariant {
                bytes: bytes.clone(),
                last_accessed: SystemTime::now(),
            },
        );
        Ok(())
    }

    fn touch(&self, key: &VariantKey) -> Result<(), StoreError> {
        if let Some(entry) = self.entries.write().get_mut(key) {
            entry.last_accessed = SystemTime::now();
        }
        Ok(())
    }

    fn remove(&self, key: &VariantKey) -> Result<(), StoreError> {
        self.entries.write().remove(key);
        Ok(())
    }
}

// ============================================================================
// Directory
// ============================================================================

/// Variants as files: `<root>/<context>/<image>-<w>x<h>-<digest>.<ext>`.
///
/// Each write goes to its own temporary file in the target directory and is
/// persisted over the final path, so a reader never sees a partially written
/// variant and concurrent writers of one key cannot clobber each other's
/// staging file. A failed write leaves the previous variant, if any, in
/// place. `touch` bumps the file's modification time.
pub struct DirectoryVariantStore {
    root: PathBuf,
}

impl DirectoryVariantStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &VariantKey) -> PathBuf {
        let context = match key.context {
            Some(context) => context.0.to_string(),
            None => "default".to_string(),
        };
        self.root.join(context).join(key.file_name())
    }
}

impl VariantStore for DirectoryVariantStore {
    fn get(&self, key: &VariantKey) -> Result<Option<ImageBytes>, StoreError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes.into())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn put(&self, key: &VariantKey, bytes: &ImageBytes) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let parent = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent)?;
        let mut staged = tempfile::NamedTempFile::new_in(parent)?;
        staged.write_all(bytes)?;
        staged.persist(&path).map_err(|err| err.error)?;
        Ok(())
    }

    fn touch(&self, key: &VariantKey) -> Result<(), StoreError> {
        match fs::File::options().write(true).open(self.path_for(key)) {
            Ok(file) => Ok(file.set_modified(SystemTime::now())?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn remove(&self, key: &VariantKey) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Dimensions;
    use crate::variant::{ContextId, ImageFormat, ResolvedVariant};
    use std::time::Duration;
    use tempfile::TempDir;

    fn key(image: u64) -> VariantKey {
        VariantKey::new(
            ImageId(image),
            ResolvedVariant::unmodified(Dimensions::new(10, 10), ImageFormat::Png),
        )
    }

    fn bytes(s: &str) -> ImageBytes {
        s.as_bytes().into()
    }

    // =========================================================================
    // Memory
    // =========================================================================

    #[test]
    fn repository_serves_metadata_and_bytes() {
        let repo = MemoryImageRepository::new();
        let attrs = ImageAttributes::new(ImageFormat::Jpeg, Dimensions::new(4, 3));
        repo.insert(ImageId(1), attrs, b"jpeg".to_vec());
        assert_eq!(repo.original_attributes(ImageId(1)).unwrap(), Some(attrs));
        assert_eq!(&*repo.load_original(ImageId(1)).unwrap().unwrap().bytes, b"jpeg");
        assert!(repo.original_attributes(ImageId(2)).unwrap().is_none());
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryVariantStore::new();
        assert!(store.get(&key(1)).unwrap().is_none());
        store.put(&key(1), &bytes("v")).unwrap();
        assert_eq!(&*store.get(&key(1)).unwrap().unwrap(), b"v");
        assert!(!store.contains(&key(2)));
        store.remove(&key(1)).unwrap();
        store.remove(&key(1)).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn memory_touch_updates_access_time() {
        let store = MemoryVariantStore::new();
        store.put(&key(1), &bytes("v")).unwrap();
        let first = store.last_accessed(&key(1)).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        store.touch(&key(1)).unwrap();
        assert!(store.last_accessed(&key(1)).unwrap() > first);
        // Touching an absent key is a no-op.
        store.touch(&key(9)).unwrap();
        assert_eq!(store.len(), 1);
    }

    // =========================================================================
    // Directory
    // =========================================================================

    #[test]
    fn directory_store_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = DirectoryVariantStore::new(tmp.path());
        assert!(store.get(&key(1)).unwrap().is_none());
        store.put(&key(1), &bytes("pixels")).unwrap();
        assert_eq!(&*store.get(&key(1)).unwrap().unwrap(), b"pixels");
        assert!(store.path_for(&key(1)).starts_with(tmp.path().join("default")));
        let parent = store.path_for(&key(1)).parent().unwrap().to_path_buf();
        assert_eq!(fs::read_dir(&parent).unwrap().count(), 1);
        store.remove(&key(1)).unwrap();
        store.remove(&key(1)).unwrap();
        assert!(store.get(&key(1)).unwrap().is_none());
    }

    #[test]
    fn concurrent_puts_of_one_key_all_land() {
        let tmp = TempDir::new().unwrap();
        let store = DirectoryVariantStore::new(tmp.path());
        let payload = bytes(&"x".repeat(1 << 20));

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for round in 0..30 {
                        store
                            .put(&key(1), &payload)
                            .unwrap_or_else(|err| panic!("round {round}: {err}"));
                    }
                });
            }
        });

        assert!(store.get(&key(1)).unwrap().unwrap() == payload);
        let parent = store.path_for(&key(1)).parent().unwrap().to_path_buf();
        assert_eq!(fs::read_dir(&parent).unwrap().count(), 1);
    }

    #[test]
    fn directory_store_separates_contexts() {
        let tmp = TempDir::new().unwrap();
        let store = DirectoryVariantStore::new(tmp.path());
        let scoped = key(1).in_context(ContextId(7));
        store.put(&scoped, &bytes("ctx")).unwrap();
        assert!(store.path_for(&scoped).starts_with(tmp.path().join("7")));
        assert!(store.get(&key(1)).unwrap().is_none());
    }

    #[test]
    fn directory_touch_bumps_mtime() {
        let tmp = TempDir::new().unwrap();
        let store = DirectoryVariantStore::new(tmp.path());
        store.put(&key(1), &bytes("v")).unwrap();
        let path = store.path_for(&key(1));
        let old = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(old)
            .unwrap();
        store.touch(&key(1)).unwrap();
        assert!(fs::metadata(&path).unwrap().modified().unwrap() > old);
        store.touch(&key(2)).unwrap();
    }
}
