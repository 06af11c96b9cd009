//! The saved photo list and its persisted mirror.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::photo::{Photo, PhotoList};
use crate::storage::KeyValueStore;

/// Storage key holding the JSON-serialized photo list.
pub const PHOTOS_KEY: &str = "photoJournalPhotos";

/// In-memory photo list kept in sync with a [`KeyValueStore`].
///
/// Every mutation writes the new list to the store before it replaces the
/// in-memory copy, so a failed write leaves both sides unchanged.
#[derive(Debug)]
pub struct PhotoStore {
    kv: Arc<dyn KeyValueStore>,
    photos: PhotoList,
}

impl PhotoStore {
    /// Open the photo list from `kv`.
    ///
    /// Missing or unreadable data yields an empty list.
    #[must_use]
    pub fn open(kv: Arc<dyn KeyValueStore>) -> Self {
        let photos = Self::load(kv.as_ref());
        Self { kv, photos }
    }

    /// Read and deserialize the persisted list.
    ///
    /// Returns an empty list when nothing is stored, when the store cannot be
    /// read, or when the stored document does not parse.
    #[must_use]
    pub fn load(kv: &dyn KeyValueStore) -> PhotoList {
        let raw = match kv.get(PHOTOS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return PhotoList::new(),
            Err(e) => {
                warn!(error = %e, "Could not read saved photos, starting empty");
                return PhotoList::new();
            }
        };

        match serde_json::from_str::<PhotoList>(&raw) {
            Ok(photos) => {
                debug!(count = photos.len(), "Loaded saved photos");
                photos
            }
            Err(e) => {
                warn!(error = %e, "Saved photos are corrupt, starting empty");
                PhotoList::new()
            }
        }
    }

    /// Serialize `photos` and overwrite the persisted copy.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(kv: &dyn KeyValueStore, photos: &[Photo]) -> Result<()> {
        let json = serde_json::to_string(photos)?;
        kv.set(PHOTOS_KEY, &json)
    }

    /// Insert a photo at the front of the list.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be persisted; the in-memory list
    /// is then left as it was.
    pub fn add(&mut self, photo: Photo) -> Result<()> {
        let id = photo.id.clone();
        let mut next = Vec::with_capacity(self.photos.len() + 1);
        next.push(photo);
        next.extend(self.photos.iter().cloned());

        Self::save(self.kv.as_ref(), &next)?;
        self.photos = next;
        info!(%id, count = self.photos.len(), "Saved photo");
        Ok(())
    }

    /// Remove the photo with `id`. Returns `true` if it existed.
    ///
    /// Removing an unknown id changes nothing and writes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be persisted; the in-memory list
    /// is then left as it was.
    pub fn remove(&mut self, id: &str) -> Result<bool> {
        if !self.photos.iter().any(|p| p.id == id) {
            debug!(%id, "No photo to remove");
            return Ok(false);
        }

        let next: PhotoList = self.photos.iter().filter(|p| p.id != id).cloned().collect();
        Self::save(self.kv.as_ref(), &next)?;
        self.photos = next;
        info!(%id, count = self.photos.len(), "Deleted photo");
        Ok(true)
    }

    /// The current list, newest first.
    #[must_use]
    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    /// Look up a photo by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Photo> {
        self.photos.iter().find(|p| p.id == id)
    }

    /// Number of saved photos.
    #[must_use]
    pub fn len(&self) -> usize {
        self.photos.len()
    }

    /// Whether the journal is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::photo::Quote;
    use crate::storage::SqliteStore;

    fn kv() -> Arc<dyn KeyValueStore> {
        Arc::new(SqliteStore::open_in_memory().unwrap())
    }

    fn photo(text: &str) -> Photo {
        Photo::new(format!("data:image/jpeg;base64,{text}"), &Quote::anonymous(text))
    }

    fn assert_mirrored(store: &PhotoStore) {
        assert_eq!(PhotoStore::load(store.kv.as_ref()), store.photos());
    }

    /// Store whose writes always fail.
    #[derive(Debug)]
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::internal("read-only"))
        }

        fn remove(&self, _key: &str) -> Result<bool> {
            Err(Error::internal("read-only"))
        }
    }

    #[test]
    fn test_open_empty() {
        let store = PhotoStore::open(kv());
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_add_is_newest_first() {
        let mut store = PhotoStore::open(kv());
        let first = photo("first");
        let second = photo("second");
        store.add(first.clone()).unwrap();
        store.add(second.clone()).unwrap();

        assert_eq!(store.photos(), &[second, first]);
        assert_mirrored(&store);
    }

    #[test]
    fn test_persisted_matches_memory_after_every_mutation() {
        let mut store = PhotoStore::open(kv());
        let mut ids = Vec::new();

        for i in 0..6 {
            let p = photo(&format!("p{i}"));
            ids.push(p.id.clone());
            store.add(p).unwrap();
            assert_mirrored(&store);
        }

        for id in [&ids[2], &ids[0], &ids[5], &ids[2]] {
            store.remove(id).unwrap();
            assert_mirrored(&store);
        }

        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let mut store = PhotoStore::open(kv());
        store.add(photo("only")).unwrap();
        let before = store.photos().to_vec();

        assert!(!store.remove("does-not-exist").unwrap());
        assert_eq!(store.photos(), before.as_slice());
        assert_mirrored(&store);
    }

    #[test]
    fn test_remove_keeps_relative_order() {
        let mut store = PhotoStore::open(kv());
        let a = photo("a");
        let b = photo("b");
        let c = photo("c");
        store.add(a.clone()).unwrap();
        store.add(b.clone()).unwrap();
        store.add(c.clone()).unwrap();

        store.remove(&b.id).unwrap();
        assert_eq!(store.photos(), &[c, a]);
    }

    #[test]
    fn test_reopen_sees_saved_photos() {
        let kv = kv();
        let p = photo("kept");
        {
            let mut store = PhotoStore::open(Arc::clone(&kv));
            store.add(p.clone()).unwrap();
        }

        let store = PhotoStore::open(kv);
        assert_eq!(store.get(&p.id), Some(&p));
    }

    #[test]
    fn test_corrupt_document_loads_empty() {
        let kv = kv();
        kv.set(PHOTOS_KEY, "{not json").unwrap();
        assert!(PhotoStore::open(kv).is_empty());
    }

    #[test]
    fn test_reads_legacy_document() {
        let kv = kv();
        kv.set(
            PHOTOS_KEY,
            r#"[{"id":"1717171717","imageData":"data:image/jpeg;base64,/9j/","quote":"O melhor momento é agora.","timestamp":1717171717000}]"#,
        )
        .unwrap();

        let store = PhotoStore::open(kv);
        assert_eq!(store.len(), 1);
        assert_eq!(store.photos()[0].id, "1717171717");
        assert!(store.photos()[0].author.is_none());
    }

    #[test]
    fn test_failed_write_leaves_memory_unchanged() {
        let mut store = PhotoStore::open(Arc::new(ReadOnlyStore));
        assert!(store.add(photo("lost")).is_err());
        assert!(store.is_empty());
    }
}
