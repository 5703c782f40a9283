use std::sync::Arc;

use serde::{Deserialize, Serialize};
use storage_platform::filesystem::{OpenOptions, StorageApi, StorageError};
use tracing::{debug, info, warn};

use crate::error::ExplorerError;
use crate::navigator::{Listing, Navigator};

/// Inserted between existing content and appended content
pub const APPEND_SEPARATOR: &str = "\n";

/// One write against a named file under the storage root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRequest {
    pub file_name: String,
    pub content: String,
    pub append: bool,
}

impl WriteRequest {
    pub fn overwrite(file_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
            append: false,
        }
    }

    pub fn append(file_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
            append: true,
        }
    }
}

/// Outcome of a successful write
#[derive(Debug)]
pub struct WriteReport {
    /// Location of the written file
    pub location: String,
    pub bytes_written: u64,
    /// Length of the file after the write
    pub file_length: u64,
    /// Re-listing of the directory being browsed, when there was one.
    /// A failed re-list does not undo or fail the write.
    pub relisted: Option<Result<Listing, ExplorerError>>,
}

/// Writes and reads single files relative to the storage root
pub struct Transfer {
    storage: Arc<dyn StorageApi>,
}

impl Transfer {
    pub fn new(storage: Arc<dyn StorageApi>) -> Self {
        Self { storage }
    }

    /// Create or open `request.file_name` under the root and write to it.
    ///
    /// Appending to a non-empty file puts [`APPEND_SEPARATOR`] before the new
    /// content; appending to an empty file writes the content alone. When a
    /// directory is being browsed it is re-listed once the write completed.
    pub async fn write_file(
        &self,
        navigator: &mut Navigator,
        request: &WriteRequest,
    ) -> Result<WriteReport, ExplorerError> {
        let name = request.file_name.as_str();
        let file_error = |source: StorageError| ExplorerError::FileResolution {
            name: name.to_string(),
            source,
        };

        if name.trim_matches('/').is_empty() {
            return Err(file_error(StorageError::InvalidName(name.to_string())));
        }

        let root = navigator.root()?.handle().clone();
        let file = self
            .storage
            .get_file(&root, name, Some(OpenOptions::create()))
            .await
            .map_err(file_error)?;
        let mut writer = self
            .storage
            .create_writer(&file)
            .await
            .map_err(file_error)?;

        let payload = if request.append {
            let end = writer.length();
            writer
                .seek(end)
                .await
                .map_err(|source| ExplorerError::AppendPosition {
                    name: name.to_string(),
                    source,
                })?;
            if end == 0 {
                request.content.clone()
            } else {
                format!("{}{}", APPEND_SEPARATOR, request.content)
            }
        } else {
            writer
                .truncate(0)
                .await
                .map_err(|source| ExplorerError::WriteIo {
                    name: name.to_string(),
                    source,
                })?;
            request.content.clone()
        };

        writer
            .write(&payload)
            .await
            .map_err(|source| ExplorerError::WriteIo {
                name: name.to_string(),
                source,
            })?;
        let file_length = writer.length();
        drop(writer);

        info!(
            "{} {} ({} bytes)",
            if request.append { "appended to" } else { "wrote" },
            file.location(),
            payload.len()
        );

        let relisted = navigator.refresh().await;
        if let Some(Err(e)) = &relisted {
            warn!("re-list after writing {} failed: {}", file.location(), e);
        }

        Ok(WriteReport {
            location: file.location().to_string(),
            bytes_written: payload.len() as u64,
            file_length,
            relisted,
        })
    }

    /// Read the whole of `file_name` under the root. Never creates the file.
    pub async fn read_file(
        &self,
        navigator: &Navigator,
        file_name: &str,
    ) -> Result<String, ExplorerError> {
        let root = navigator.root()?;
        let file = self
            .storage
            .get_file(root.handle(), file_name, None)
            .await
            .map_err(|source| ExplorerError::FileNotFound {
                name: file_name.to_string(),
                source,
            })?;

        let content = self
            .storage
            .read(&file)
            .await
            .map_err(|source| ExplorerError::ReadIo {
                name: file_name.to_string(),
                source,
            })?;

        debug!("read {} ({} bytes)", file.location(), content.len());
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryStorage, ROOT};

    async fn setup(storage: &Arc<MemoryStorage>) -> (Navigator, Transfer) {
        let mut nav = Navigator::new(storage.clone());
        nav.resolve_root().await.unwrap();
        (nav, Transfer::new(storage.clone()))
    }

    #[tokio::test]
    async fn test_overwrite_then_read() {
        let storage = Arc::new(MemoryStorage::new());
        let (mut nav, transfer) = setup(&storage).await;

        let report = transfer
            .write_file(&mut nav, &WriteRequest::overwrite("a.txt", "hello"))
            .await
            .unwrap();
        assert_eq!(report.location, format!("{}a.txt", ROOT));
        assert_eq!(report.bytes_written, 5);

        assert_eq!(transfer.read_file(&nav, "a.txt").await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_append_accumulates_lines() {
        let storage = Arc::new(MemoryStorage::new());
        let (mut nav, transfer) = setup(&storage).await;

        transfer
            .write_file(&mut nav, &WriteRequest::overwrite("a.txt", "first"))
            .await
            .unwrap();
        transfer
            .write_file(&mut nav, &WriteRequest::append("a.txt", "second"))
            .await
            .unwrap();
        assert_eq!(
            transfer.read_file(&nav, "a.txt").await.unwrap(),
            "first\nsecond"
        );

        let report = transfer
            .write_file(&mut nav, &WriteRequest::append("a.txt", "third"))
            .await
            .unwrap();
        assert_eq!(report.file_length, "first\nsecond\nthird".len() as u64);
        assert_eq!(storage.file("a.txt").unwrap(), "first\nsecond\nthird");
    }

    #[tokio::test]
    async fn test_append_to_new_file_has_no_leading_newline() {
        let storage = Arc::new(MemoryStorage::new());
        let (mut nav, transfer) = setup(&storage).await;

        transfer
            .write_file(&mut nav, &WriteRequest::append("log.txt", "entry"))
            .await
            .unwrap();
        assert_eq!(storage.file("log.txt").unwrap(), "entry");
    }

    #[tokio::test]
    async fn test_overwrite_shorter_content_leaves_no_tail() {
        let storage = Arc::new(MemoryStorage::new().with_file("a.txt", "a much longer line"));
        let (mut nav, transfer) = setup(&storage).await;

        transfer
            .write_file(&mut nav, &WriteRequest::overwrite("a.txt", "short"))
            .await
            .unwrap();
        assert_eq!(storage.file("a.txt").unwrap(), "short");
    }

    #[tokio::test]
    async fn test_failed_seek_writes_nothing() {
        let storage = Arc::new(MemoryStorage::new().with_file("a.txt", "keep"));
        let (mut nav, transfer) = setup(&storage).await;
        storage.set_fail_seek(true);

        let err = transfer
            .write_file(&mut nav, &WriteRequest::append("a.txt", "lost"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExplorerError::AppendPosition { .. }));
        assert_eq!(storage.write_calls(), 0);
        assert_eq!(storage.file("a.txt").unwrap(), "keep");
    }

    #[tokio::test]
    async fn test_write_io_failure() {
        let storage = Arc::new(MemoryStorage::new());
        let (mut nav, transfer) = setup(&storage).await;
        storage.set_fail_write(true);

        let err = transfer
            .write_file(&mut nav, &WriteRequest::overwrite("a.txt", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExplorerError::WriteIo { .. }));
    }

    #[tokio::test]
    async fn test_file_resolution_failures() {
        let storage = Arc::new(MemoryStorage::new().with_dir("docs"));
        let (mut nav, transfer) = setup(&storage).await;

        let err = transfer
            .write_file(&mut nav, &WriteRequest::overwrite("", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExplorerError::FileResolution { .. }));
        assert!(err.is_invalid_name());

        // parent directory does not exist
        let err = transfer
            .write_file(&mut nav, &WriteRequest::overwrite("nowhere/a.txt", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExplorerError::FileResolution { .. }));
        assert!(!err.is_invalid_name());

        // name is a directory
        let err = transfer
            .write_file(&mut nav, &WriteRequest::overwrite("docs", "x"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExplorerError::FileResolution {
                source: StorageError::NotAFile(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_write_into_subdirectory() {
        let storage = Arc::new(MemoryStorage::new().with_dir("docs"));
        let (mut nav, transfer) = setup(&storage).await;

        transfer
            .write_file(&mut nav, &WriteRequest::overwrite("docs/n.txt", "note"))
            .await
            .unwrap();
        assert_eq!(transfer.read_file(&nav, "docs/n.txt").await.unwrap(), "note");
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let storage = Arc::new(MemoryStorage::new());
        let (nav, transfer) = setup(&storage).await;

        let err = transfer.read_file(&nav, "ghost.txt").await.unwrap_err();
        assert!(matches!(err, ExplorerError::FileNotFound { .. }));
        assert!(storage.file("ghost.txt").is_none());
        assert_eq!(storage.write_calls(), 0);
    }

    #[tokio::test]
    async fn test_read_io_failure() {
        let storage = Arc::new(MemoryStorage::new().with_file("a.txt", "x"));
        let (nav, transfer) = setup(&storage).await;
        storage.set_fail_read(true);

        assert!(matches!(
            transfer.read_file(&nav, "a.txt").await,
            Err(ExplorerError::ReadIo { .. })
        ));
    }

    #[tokio::test]
    async fn test_requires_root() {
        let storage = Arc::new(MemoryStorage::new());
        let mut nav = Navigator::new(storage.clone());
        let transfer = Transfer::new(storage.clone());

        assert!(matches!(
            transfer
                .write_file(&mut nav, &WriteRequest::overwrite("a.txt", "x"))
                .await,
            Err(ExplorerError::RootUnavailable { .. })
        ));
        assert!(matches!(
            transfer.read_file(&nav, "a.txt").await,
            Err(ExplorerError::RootUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_write_relists_only_while_browsing() {
        let storage = Arc::new(MemoryStorage::new());
        let (mut nav, transfer) = setup(&storage).await;

        let report = transfer
            .write_file(&mut nav, &WriteRequest::overwrite("a.txt", "x"))
            .await
            .unwrap();
        assert!(report.relisted.is_none());
        assert!(!nav.is_browsing());

        nav.list_directory(None).await.unwrap();
        let report = transfer
            .write_file(&mut nav, &WriteRequest::overwrite("b.txt", "y"))
            .await
            .unwrap();
        let listing = report.relisted.unwrap().unwrap();
        let names: Vec<&str> = listing.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert_eq!(nav.current().unwrap().location(), ROOT);
    }

    #[tokio::test]
    async fn test_failed_relist_keeps_write() {
        let storage = Arc::new(MemoryStorage::new());
        let (mut nav, transfer) = setup(&storage).await;
        nav.list_directory(None).await.unwrap();
        storage.set_fail_list(true);

        let report = transfer
            .write_file(&mut nav, &WriteRequest::overwrite("a.txt", "x"))
            .await
            .unwrap();
        assert!(matches!(report.relisted, Some(Err(ExplorerError::List { .. }))));
        assert_eq!(storage.file("a.txt").unwrap(), "x");
    }
}
