use std::io::{ErrorKind, SeekFrom};
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use storage_platform::filesystem::{
    DirectoryHandle, FileHandle, FileWriter, Handle, OpenOptions, RawEntry, StorageApi,
    StorageError,
};
use tokio::fs;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, warn};

/// Scheme prefix of every location this backend hands out
pub const FILE_SCHEME: &str = "file://";

/// Storage capability backed by a directory on the host filesystem.
///
/// Locations are `file://` URLs; directory locations carry a trailing `/`.
/// Only absolute Unix-style paths map to locations, so drive-letter roots
/// are rejected as invalid.
pub struct LocalStorage {
    root: PathBuf,
    create_root: bool,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            create_root: false,
        }
    }

    /// Create the external root directory when it is missing
    pub fn with_create_root(mut self, create_root: bool) -> Self {
        self.create_root = create_root;
        self
    }

    /// Build the location string for a host path
    pub fn location_for(path: &Path, is_dir: bool) -> String {
        let mut location = format!("{}{}", FILE_SCHEME, path.to_string_lossy());
        if is_dir && !location.ends_with('/') {
            location.push('/');
        }
        location
    }

    /// Map a `file://` location back to a host path
    pub fn path_for(location: &str) -> Result<PathBuf, StorageError> {
        let rest = location
            .strip_prefix(FILE_SCHEME)
            .ok_or_else(|| StorageError::InvalidLocation(location.to_string()))?;

        if !rest.starts_with('/') {
            return Err(StorageError::InvalidLocation(location.to_string()));
        }

        let path: PathBuf = Path::new(rest).components().collect();
        if path.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(StorageError::InvalidLocation(location.to_string()));
        }
        Ok(path)
    }

    /// Join a `/`-separated relative name onto `base`, rejecting traversal
    fn join_relative(base: &Path, name: &str) -> Result<PathBuf, StorageError> {
        let mut path = base.to_path_buf();
        for component in name.split('/').filter(|c| !c.is_empty()) {
            if component == "." || component == ".." || component.contains('\0') {
                return Err(StorageError::InvalidName(name.to_string()));
            }
            path.push(component);
        }
        Ok(path)
    }
}

fn map_io(location: &str, e: std::io::Error) -> StorageError {
    match e.kind() {
        ErrorKind::NotFound => StorageError::NotFound(location.to_string()),
        ErrorKind::PermissionDenied => StorageError::PermissionDenied(location.to_string()),
        _ => StorageError::Io {
            location: location.to_string(),
            source: e,
        },
    }
}

#[async_trait]
impl StorageApi for LocalStorage {
    async fn external_root(&self) -> Result<DirectoryHandle, StorageError> {
        let display = self.root.to_string_lossy().to_string();

        if self.create_root {
            fs::create_dir_all(&self.root)
                .await
                .map_err(|e| map_io(&display, e))?;
        }

        let root = fs::canonicalize(&self.root)
            .await
            .map_err(|e| map_io(&display, e))?;
        let meta = fs::metadata(&root).await.map_err(|e| map_io(&display, e))?;
        if !meta.is_dir() {
            return Err(StorageError::NotADirectory(display));
        }

        let location = Self::location_for(&root, true);
        debug!("external root resolved to {}", location);
        Ok(DirectoryHandle::new(location))
    }

    async fn resolve(&self, location: &str) -> Result<Handle, StorageError> {
        let path = Self::path_for(location)?;
        let meta = fs::metadata(&path).await.map_err(|e| map_io(location, e))?;

        if meta.is_dir() {
            Ok(Handle::Directory(DirectoryHandle::new(Self::location_for(
                &path, true,
            ))))
        } else {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            Ok(Handle::File(FileHandle::new(
                name,
                Self::location_for(&path, false),
            )))
        }
    }

    async fn get_directory(
        &self,
        dir: &DirectoryHandle,
        name: &str,
        options: Option<OpenOptions>,
    ) -> Result<DirectoryHandle, StorageError> {
        let base = Self::path_for(dir.location())?;
        let path = Self::join_relative(&base, name)?;
        let location = Self::location_for(&path, true);

        match options {
            Some(opts) if opts.create && opts.exclusive => {
                fs::create_dir(&path).await.map_err(|e| map_io(&location, e))?;
            }
            Some(opts) if opts.create => {
                fs::create_dir_all(&path)
                    .await
                    .map_err(|e| map_io(&location, e))?;
            }
            _ => {}
        }

        let meta = fs::metadata(&path).await.map_err(|e| map_io(&location, e))?;
        if !meta.is_dir() {
            return Err(StorageError::NotADirectory(location));
        }

        // Opening the listing is what trips permission checks on most platforms
        fs::read_dir(&path).await.map_err(|e| map_io(&location, e))?;

        Ok(DirectoryHandle::new(location))
    }

    async fn get_file(
        &self,
        dir: &DirectoryHandle,
        name: &str,
        options: Option<OpenOptions>,
    ) -> Result<FileHandle, StorageError> {
        if name.trim_matches('/').is_empty() {
            return Err(StorageError::InvalidName(name.to_string()));
        }

        let base = Self::path_for(dir.location())?;
        let path = Self::join_relative(&base, name)?;
        let location = Self::location_for(&path, false);

        if let Some(opts) = options.filter(|o| o.create) {
            let mut open = fs::OpenOptions::new();
            open.write(true);
            if opts.exclusive {
                open.create_new(true);
            } else {
                open.create(true);
            }
            open.open(&path).await.map_err(|e| map_io(&location, e))?;
        }

        let meta = fs::metadata(&path).await.map_err(|e| map_io(&location, e))?;
        if !meta.is_file() {
            return Err(StorageError::NotAFile(location));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| name.to_string());
        Ok(FileHandle::new(file_name, location))
    }

    async fn list_entries(&self, dir: &DirectoryHandle) -> Result<Vec<RawEntry>, StorageError> {
        let path = Self::path_for(dir.location())?;
        let mut entries = fs::read_dir(&path)
            .await
            .map_err(|e| map_io(dir.location(), e))?;

        let mut result = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(e)) => e,
                Ok(None) => break,
                Err(e) => return Err(map_io(dir.location(), e)),
            };

            let entry_path = entry.path();
            // Follow symlinks so a linked directory browses like a directory
            let meta = match fs::metadata(&entry_path).await {
                Ok(m) => m,
                Err(e) => {
                    warn!("skipping {}: {}", entry_path.display(), e);
                    continue;
                }
            };

            result.push(RawEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                location: Self::location_for(&entry_path, meta.is_dir()),
                is_dir: meta.is_dir(),
            });
        }

        Ok(result)
    }

    async fn create_writer(&self, file: &FileHandle) -> Result<Box<dyn FileWriter>, StorageError> {
        let path = Self::path_for(file.location())?;
        let handle = fs::OpenOptions::new()
            .write(true)
            .open(&path)
            .await
            .map_err(|e| map_io(file.location(), e))?;
        let length = handle
            .metadata()
            .await
            .map_err(|e| map_io(file.location(), e))?
            .len();

        Ok(Box::new(LocalFileWriter {
            file: handle,
            location: file.location().to_string(),
            length,
            position: 0,
        }))
    }

    async fn read(&self, file: &FileHandle) -> Result<String, StorageError> {
        let path = Self::path_for(file.location())?;
        let data = fs::read(&path)
            .await
            .map_err(|e| map_io(file.location(), e))?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }
}

/// Writer over an open host file
pub struct LocalFileWriter {
    file: fs::File,
    location: String,
    length: u64,
    position: u64,
}

#[async_trait]
impl FileWriter for LocalFileWriter {
    fn length(&self) -> u64 {
        self.length
    }

    fn position(&self) -> u64 {
        self.position
    }

    async fn seek(&mut self, offset: u64) -> Result<(), StorageError> {
        if offset > self.length {
            return Err(StorageError::SeekOutOfRange {
                location: self.location.clone(),
                offset,
                length: self.length,
            });
        }
        self.file
            .seek(SeekFrom::Start(offset))
            .await
            .map_err(|e| map_io(&self.location, e))?;
        self.position = offset;
        Ok(())
    }

    async fn truncate(&mut self, size: u64) -> Result<(), StorageError> {
        self.file
            .set_len(size)
            .await
            .map_err(|e| map_io(&self.location, e))?;
        self.length = size;
        if self.position > size {
            self.file
                .seek(SeekFrom::Start(size))
                .await
                .map_err(|e| map_io(&self.location, e))?;
            self.position = size;
        }
        Ok(())
    }

    async fn write(&mut self, text: &str) -> Result<(), StorageError> {
        self.file
            .write_all(text.as_bytes())
            .await
            .map_err(|e| map_io(&self.location, e))?;
        self.file
            .flush()
            .await
            .map_err(|e| map_io(&self.location, e))?;

        self.position += text.len() as u64;
        self.length = self.length.max(self.position);
        Ok(())
    }
}
