use crate::assembler::DocumentAssembler;
use bytes::Bytes;
use folio_core::{FolioError, FolioResult, SequenceKey, UserId};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

/// File extension of staged photos.
const PHOTO_EXT: &str = "jpg";
/// File extension of assembled documents.
const DOCUMENT_EXT: &str = "pdf";

/// Durable per-user storage for pending photos and assembled documents.
///
/// Layout on disk: `<root>/photos/<userId>/<key>.jpg` for pending photos and
/// `<root>/documents/<userId>/<name>.pdf` for finished documents. Photo file
/// stems are fixed-width zero-padded decimals so that listing order, numeric
/// key order, and upload order all coincide.
///
/// Best-effort durability: photos are fully written before the caller is
/// acknowledged, and documents are written to a temporary name and renamed
/// on success so a failed assembly never leaves output mistaken for
/// complete. No transactional guarantees beyond that.
pub struct StagingStore {
    photos_root: PathBuf,
    documents_root: PathBuf,
    assembler: Arc<dyn DocumentAssembler>,
}

impl StagingStore {
    /// Opens a store rooted at `root`, creating the two subtrees if absent.
    ///
    /// Does not touch existing contents; call [`StagingStore::reset_all`] at
    /// process start to clear stale areas from a previous run.
    pub async fn open(
        root: impl AsRef<Path>,
        assembler: Arc<dyn DocumentAssembler>,
    ) -> FolioResult<Self> {
        let root = root.as_ref();
        let store = Self {
            photos_root: root.join("photos"),
            documents_root: root.join("documents"),
            assembler,
        };
        fs::create_dir_all(&store.photos_root).await?;
        fs::create_dir_all(&store.documents_root).await?;
        Ok(store)
    }

    fn photo_dir(&self, user: UserId) -> PathBuf {
        self.photos_root.join(user.to_string())
    }

    fn document_dir(&self, user: UserId) -> PathBuf {
        self.documents_root.join(user.to_string())
    }

    fn photo_path(&self, user: UserId, key: SequenceKey) -> PathBuf {
        self.photo_dir(user).join(format!("{}.{PHOTO_EXT}", key.stem()))
    }

    fn document_path(&self, user: UserId, name: &str) -> PathBuf {
        self.document_dir(user).join(format!("{name}.{DOCUMENT_EXT}"))
    }

    /// Erases and recreates both subtrees, discarding every user's area.
    ///
    /// Sessions are not persisted across restarts, so anything on disk at
    /// startup is stale. Must complete before the first event is accepted.
    pub async fn reset_all(&self) -> FolioResult<()> {
        for root in [&self.photos_root, &self.documents_root] {
            if root.exists() {
                fs::remove_dir_all(root).await?;
            }
            fs::create_dir_all(root).await?;
        }
        tracing::info!("staging root reset");
        Ok(())
    }

    /// Creates an empty area for `user`, discarding any prior one.
    pub async fn create_area(&self, user: UserId) -> FolioResult<()> {
        self.delete_area(user).await?;
        fs::create_dir_all(self.photo_dir(user)).await?;
        fs::create_dir_all(self.document_dir(user)).await?;
        tracing::debug!(%user, "staging area created");
        Ok(())
    }

    /// Removes the area and all its contents; no-op when absent.
    pub async fn delete_area(&self, user: UserId) -> FolioResult<()> {
        for dir in [self.photo_dir(user), self.document_dir(user)] {
            if dir.exists() {
                fs::remove_dir_all(&dir).await?;
            }
        }
        Ok(())
    }

    /// Writes photo bytes under `key`, overwriting any existing entry.
    pub async fn put_photo(&self, user: UserId, key: SequenceKey, bytes: &[u8]) -> FolioResult<()> {
        fs::write(self.photo_path(user, key), bytes).await?;
        tracing::debug!(%user, %key, len = bytes.len(), "photo staged");
        Ok(())
    }

    /// Deletes the photo under `key`; returns whether it existed.
    pub async fn remove_photo(&self, user: UserId, key: SequenceKey) -> FolioResult<bool> {
        let path = self.photo_path(user, key);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path).await?;
        Ok(true)
    }

    /// Deletes the photo with the greatest key; returns it, or `None` when
    /// the area holds no photos.
    pub async fn remove_last_photo(&self, user: UserId) -> FolioResult<Option<SequenceKey>> {
        let Some(key) = self.list_photos(user).await?.pop() else {
            return Ok(None);
        };
        fs::remove_file(self.photo_path(user, key)).await?;
        Ok(Some(key))
    }

    /// True iff zero photos remain in the user's area.
    pub async fn is_empty(&self, user: UserId) -> FolioResult<bool> {
        Ok(self.list_photos(user).await?.is_empty())
    }

    /// All staged keys in ascending numeric order.
    ///
    /// Stems are parsed and sorted as numbers, never as strings, so even a
    /// legacy unpadded `10` cannot sort before `2`. An absent area counts as
    /// empty.
    pub async fn list_photos(&self, user: UserId) -> FolioResult<Vec<SequenceKey>> {
        let dir = self.photo_dir(user);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(&format!(".{PHOTO_EXT}")))
            else {
                continue;
            };
            if let Some(key) = SequenceKey::from_stem(stem) {
                keys.push(key);
            }
        }
        keys.sort_unstable();
        Ok(keys)
    }

    /// Assembles every staged photo, ascending by key, into one PDF named
    /// `name`, and returns the document's path.
    ///
    /// Writes to a `.part` path first and renames on success, so a failed
    /// run leaves no output that could be mistaken for complete. An empty
    /// area or an undecodable image fails with [`FolioError::Assembly`] and
    /// leaves the staged photos untouched.
    pub async fn assemble(&self, user: UserId, name: &str) -> FolioResult<PathBuf> {
        let keys = self.list_photos(user).await?;
        if keys.is_empty() {
            return Err(FolioError::Assembly("no photos staged".to_string()));
        }

        let mut images = Vec::with_capacity(keys.len());
        for key in keys {
            images.push(Bytes::from(fs::read(self.photo_path(user, key)).await?));
        }

        let assembler = Arc::clone(&self.assembler);
        let title = name.to_string();
        let pdf = tokio::task::spawn_blocking(move || assembler.assemble(&title, &images))
            .await
            .map_err(|e| FolioError::Staging(format!("assembly task failed: {e}")))??;

        let path = self.document_path(user, name);
        let part = path.with_extension(format!("{DOCUMENT_EXT}.part"));
        if let Err(e) = self.write_document(&part, &path, &pdf).await {
            if part.exists() {
                let _ = fs::remove_file(&part).await;
            }
            return Err(e);
        }
        tracing::info!(%user, name, "document assembled");
        Ok(path)
    }

    async fn write_document(&self, part: &Path, path: &Path, pdf: &[u8]) -> FolioResult<()> {
        fs::write(part, pdf).await?;
        fs::rename(part, path).await?;
        Ok(())
    }

    /// Opens a previously assembled document for reading.
    ///
    /// The handle releases on drop on every exit path, including a failed
    /// transfer, so callers need no explicit close.
    pub async fn open_document(&self, user: UserId, name: &str) -> FolioResult<fs::File> {
        let file = fs::File::open(self.document_path(user, name)).await?;
        Ok(file)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    /// Assembler that encodes input order into the output so tests can
    /// verify page ordering without decoding a real PDF.
    struct RecordingAssembler;

    impl DocumentAssembler for RecordingAssembler {
        fn assemble(&self, title: &str, images: &[Bytes]) -> FolioResult<Vec<u8>> {
            if images.is_empty() {
                return Err(FolioError::Assembly("no images".to_string()));
            }
            let mut out = format!("{title}:").into_bytes();
            for image in images {
                out.extend_from_slice(image);
                out.push(b'|');
            }
            Ok(out)
        }
    }

    /// Assembler that always fails with a conversion error.
    struct FailingAssembler;

    impl DocumentAssembler for FailingAssembler {
        fn assemble(&self, _title: &str, _images: &[Bytes]) -> FolioResult<Vec<u8>> {
            Err(FolioError::Assembly("bad image".to_string()))
        }
    }

    async fn store_with(assembler: Arc<dyn DocumentAssembler>) -> (TempDir, StagingStore) {
        let tmp = TempDir::new().unwrap();
        let store = StagingStore::open(tmp.path(), assembler).await.unwrap();
        (tmp, store)
    }

    async fn recording_store() -> (TempDir, StagingStore) {
        store_with(Arc::new(RecordingAssembler)).await
    }

    #[tokio::test]
    async fn photos_list_in_numeric_order() {
        let (_tmp, store) = recording_store().await;
        let user = UserId(1);
        store.create_area(user).await.unwrap();

        for key in [10, 2, 5] {
            store.put_photo(user, SequenceKey(key), b"x").await.unwrap();
        }

        let keys = store.list_photos(user).await.unwrap();
        assert_eq!(keys, vec![SequenceKey(2), SequenceKey(5), SequenceKey(10)]);
    }

    #[tokio::test]
    async fn remove_last_takes_greatest_key_and_terminates() {
        let (_tmp, store) = recording_store().await;
        let user = UserId(1);
        store.create_area(user).await.unwrap();
        for key in [2, 10, 5] {
            store.put_photo(user, SequenceKey(key), b"x").await.unwrap();
        }

        assert_eq!(store.remove_last_photo(user).await.unwrap(), Some(SequenceKey(10)));
        assert_eq!(store.remove_last_photo(user).await.unwrap(), Some(SequenceKey(5)));
        assert_eq!(store.remove_last_photo(user).await.unwrap(), Some(SequenceKey(2)));
        assert_eq!(store.remove_last_photo(user).await.unwrap(), None);
        assert!(store.is_empty(user).await.unwrap());
    }

    #[tokio::test]
    async fn remove_photo_reports_existence() {
        let (_tmp, store) = recording_store().await;
        let user = UserId(3);
        store.create_area(user).await.unwrap();
        store.put_photo(user, SequenceKey(11), b"x").await.unwrap();

        assert!(store.remove_photo(user, SequenceKey(11)).await.unwrap());
        assert!(store.is_empty(user).await.unwrap());
        assert!(!store.remove_photo(user, SequenceKey(11)).await.unwrap());
    }

    #[tokio::test]
    async fn create_area_is_an_idempotent_reset() {
        let (_tmp, store) = recording_store().await;
        let user = UserId(4);
        store.create_area(user).await.unwrap();
        store.put_photo(user, SequenceKey(1), b"x").await.unwrap();

        store.create_area(user).await.unwrap();
        assert!(store.is_empty(user).await.unwrap());
    }

    #[tokio::test]
    async fn delete_area_is_a_noop_when_absent() {
        let (_tmp, store) = recording_store().await;
        store.delete_area(UserId(99)).await.unwrap();
    }

    #[tokio::test]
    async fn reset_all_clears_every_area() {
        let (_tmp, store) = recording_store().await;
        for id in [1, 2] {
            let user = UserId(id);
            store.create_area(user).await.unwrap();
            store.put_photo(user, SequenceKey(1), b"x").await.unwrap();
        }

        store.reset_all().await.unwrap();
        assert!(store.is_empty(UserId(1)).await.unwrap());
        assert!(store.is_empty(UserId(2)).await.unwrap());
    }

    #[tokio::test]
    async fn assemble_orders_pages_by_key() {
        let (_tmp, store) = recording_store().await;
        let user = UserId(42);
        store.create_area(user).await.unwrap();
        store.put_photo(user, SequenceKey(5), b"five").await.unwrap();
        store.put_photo(user, SequenceKey(2), b"two").await.unwrap();
        store.put_photo(user, SequenceKey(9), b"nine").await.unwrap();

        store.assemble(user, "trip").await.unwrap();

        let mut file = store.open_document(user, "trip").await.unwrap();
        let mut data = Vec::new();
        file.read_to_end(&mut data).await.unwrap();
        assert_eq!(data, b"trip:two|five|nine|");
    }

    #[tokio::test]
    async fn assemble_empty_area_fails_without_output() {
        let (_tmp, store) = recording_store().await;
        let user = UserId(7);
        store.create_area(user).await.unwrap();

        let err = store.assemble(user, "trip").await.unwrap_err();
        assert!(matches!(err, FolioError::Assembly(_)));
        assert!(store.open_document(user, "trip").await.is_err());
    }

    #[tokio::test]
    async fn failed_assembly_preserves_staged_photos() {
        let (_tmp, store) = store_with(Arc::new(FailingAssembler)).await;
        let user = UserId(8);
        store.create_area(user).await.unwrap();
        store.put_photo(user, SequenceKey(1), b"x").await.unwrap();

        let err = store.assemble(user, "trip").await.unwrap_err();
        assert!(matches!(err, FolioError::Assembly(_)));
        assert_eq!(store.list_photos(user).await.unwrap(), vec![SequenceKey(1)]);
        assert!(store.open_document(user, "trip").await.is_err());
    }
}
