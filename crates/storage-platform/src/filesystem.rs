use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("not a directory: {0}")]
    NotADirectory(String),
    #[error("not a file: {0}")]
    NotAFile(String),
    #[error("invalid name: {0:?}")]
    InvalidName(String),
    #[error("invalid location: {0}")]
    InvalidLocation(String),
    #[error("seek to {offset} past end of {location} (length {length})")]
    SeekOutOfRange {
        location: String,
        offset: u64,
        length: u64,
    },
    #[error("i/o error on {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },
}

/// Opaque handle to a directory known to the storage backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryHandle {
    location: String,
}

impl DirectoryHandle {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// Absolute location (URL-like, e.g. `file:///storage/emulated/0/`)
    pub fn location(&self) -> &str {
        &self.location
    }
}

/// Opaque handle to a regular file known to the storage backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHandle {
    name: String,
    location: String,
}

impl FileHandle {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

/// Result of resolving an arbitrary absolute location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handle {
    Directory(DirectoryHandle),
    File(FileHandle),
}

/// One unfiltered, unsorted entry as returned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntry {
    pub name: String,
    pub location: String,
    pub is_dir: bool,
}

/// Options for `get_file` / `get_directory`.
///
/// `None` at the call site means "open only, never create".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenOptions {
    /// Create the target when it does not exist
    pub create: bool,
    /// With `create`, fail if the target already exists
    pub exclusive: bool,
}

impl OpenOptions {
    pub fn create() -> Self {
        Self {
            create: true,
            exclusive: false,
        }
    }
}

/// Positioned text writer over a single file
#[async_trait]
pub trait FileWriter: Send {
    /// Current length of the file in bytes
    fn length(&self) -> u64;

    /// Current write position
    fn position(&self) -> u64;

    /// Move the write position; offsets past the end are rejected
    async fn seek(&mut self, offset: u64) -> Result<(), StorageError>;

    /// Shrink (or extend) the file to `size` bytes
    async fn truncate(&mut self, size: u64) -> Result<(), StorageError>;

    /// Write UTF-8 text at the current position and flush it
    async fn write(&mut self, text: &str) -> Result<(), StorageError>;
}

/// Device storage capability.
///
/// Every call completes exactly once with either a value or a `StorageError`.
/// Implementations never retry.
#[async_trait]
pub trait StorageApi: Send + Sync {
    /// Resolve the platform's well-known external storage directory
    async fn external_root(&self) -> Result<DirectoryHandle, StorageError>;

    /// Resolve an absolute location to a handle
    async fn resolve(&self, location: &str) -> Result<Handle, StorageError>;

    /// Open (or create) a directory relative to `dir`. `"/"` or `""` names `dir` itself.
    async fn get_directory(
        &self,
        dir: &DirectoryHandle,
        name: &str,
        options: Option<OpenOptions>,
    ) -> Result<DirectoryHandle, StorageError>;

    /// Open (or create) a file relative to `dir`
    async fn get_file(
        &self,
        dir: &DirectoryHandle,
        name: &str,
        options: Option<OpenOptions>,
    ) -> Result<FileHandle, StorageError>;

    /// Enumerate the direct children of `dir`
    async fn list_entries(&self, dir: &DirectoryHandle) -> Result<Vec<RawEntry>, StorageError>;

    /// Open a writer positioned at the start of `file`
    async fn create_writer(&self, file: &FileHandle) -> Result<Box<dyn FileWriter>, StorageError>;

    /// Read the whole file as text
    async fn read(&self, file: &FileHandle) -> Result<String, StorageError>;
}
