//! In-memory storage backend with failure injection for unit tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use storage_platform::filesystem::{
    DirectoryHandle, FileHandle, FileWriter, Handle, OpenOptions, RawEntry, StorageApi,
    StorageError,
};

use crate::location::{normalize_dir, normalize_file};

pub(crate) const ROOT: &str = "mem:///sdcard/";

#[derive(Default)]
struct Inner {
    dirs: BTreeSet<String>,
    files: BTreeMap<String, String>,
    fail_root: bool,
    deny_access: bool,
    fail_list: bool,
    fail_seek: bool,
    fail_write: bool,
    fail_read: bool,
    resolve_calls: usize,
    write_calls: usize,
}

fn injected(location: &str) -> StorageError {
    StorageError::Io {
        location: location.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::Other, "injected failure"),
    }
}

fn last_component(location: &str) -> String {
    location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

pub(crate) struct MemoryStorage {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        let mut inner = Inner::default();
        inner.dirs.insert(ROOT.to_string());
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    pub fn with_dir(self, rel: &str) -> Self {
        self.add_dir(rel);
        self
    }

    pub fn with_file(self, rel: &str, content: &str) -> Self {
        self.add_file(rel, content);
        self
    }

    pub fn add_dir(&self, rel: &str) {
        self.lock().dirs.insert(normalize_dir(&format!("{}{}", ROOT, rel)));
    }

    pub fn add_file(&self, rel: &str, content: &str) {
        self.lock()
            .files
            .insert(normalize_file(&format!("{}{}", ROOT, rel)), content.to_string());
    }

    pub fn file(&self, rel: &str) -> Option<String> {
        self.lock()
            .files
            .get(&normalize_file(&format!("{}{}", ROOT, rel)))
            .cloned()
    }

    pub fn set_fail_root(&self, fail: bool) {
        self.lock().fail_root = fail;
    }

    pub fn set_deny_access(&self, deny: bool) {
        self.lock().deny_access = deny;
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.lock().fail_list = fail;
    }

    pub fn set_fail_seek(&self, fail: bool) {
        self.lock().fail_seek = fail;
    }

    pub fn set_fail_write(&self, fail: bool) {
        self.lock().fail_write = fail;
    }

    pub fn set_fail_read(&self, fail: bool) {
        self.lock().fail_read = fail;
    }

    pub fn resolve_calls(&self) -> usize {
        self.lock().resolve_calls
    }

    pub fn write_calls(&self) -> usize {
        self.lock().write_calls
    }
}

#[async_trait]
impl StorageApi for MemoryStorage {
    async fn external_root(&self) -> Result<DirectoryHandle, StorageError> {
        if self.lock().fail_root {
            return Err(StorageError::NotFound("external storage".to_string()));
        }
        Ok(DirectoryHandle::new(ROOT))
    }

    async fn resolve(&self, location: &str) -> Result<Handle, StorageError> {
        let mut inner = self.lock();
        inner.resolve_calls += 1;

        let dir = normalize_dir(location);
        if inner.dirs.contains(&dir) {
            return Ok(Handle::Directory(DirectoryHandle::new(dir)));
        }
        let file = normalize_file(location);
        if inner.files.contains_key(&file) {
            return Ok(Handle::File(FileHandle::new(last_component(&file), file)));
        }
        Err(StorageError::NotFound(location.to_string()))
    }

    async fn get_directory(
        &self,
        dir: &DirectoryHandle,
        name: &str,
        options: Option<OpenOptions>,
    ) -> Result<DirectoryHandle, StorageError> {
        let mut inner = self.lock();
        if inner.deny_access {
            return Err(StorageError::PermissionDenied(dir.location().to_string()));
        }

        let location = normalize_dir(&format!("{}{}", dir.location(), name));
        if inner.dirs.contains(&location) {
            return Ok(DirectoryHandle::new(location));
        }
        match options {
            Some(opts) if opts.create => {
                inner.dirs.insert(location.clone());
                Ok(DirectoryHandle::new(location))
            }
            _ => Err(StorageError::NotFound(location)),
        }
    }

    async fn get_file(
        &self,
        dir: &DirectoryHandle,
        name: &str,
        options: Option<OpenOptions>,
    ) -> Result<FileHandle, StorageError> {
        let trimmed = name.trim_matches('/');
        if trimmed.is_empty() || trimmed.split('/').any(|c| c == "." || c == "..") {
            return Err(StorageError::InvalidName(name.to_string()));
        }

        let mut inner = self.lock();
        let location = normalize_file(&format!("{}{}", dir.location(), trimmed));
        if inner.dirs.contains(&normalize_dir(&location)) {
            return Err(StorageError::NotAFile(location));
        }

        if !inner.files.contains_key(&location) {
            let create = options.map(|o| o.create).unwrap_or(false);
            let parent = &location[..=location.rfind('/').unwrap_or(0)];
            if !create || !inner.dirs.contains(parent) {
                return Err(StorageError::NotFound(location));
            }
            inner.files.insert(location.clone(), String::new());
        }

        Ok(FileHandle::new(last_component(&location), location))
    }

    async fn list_entries(&self, dir: &DirectoryHandle) -> Result<Vec<RawEntry>, StorageError> {
        let inner = self.lock();
        if inner.deny_access {
            return Err(StorageError::PermissionDenied(dir.location().to_string()));
        }
        if inner.fail_list {
            return Err(injected(dir.location()));
        }

        let parent = normalize_dir(dir.location());
        if !inner.dirs.contains(&parent) {
            return Err(StorageError::NotFound(parent));
        }

        let is_child = |location: &str| {
            location != parent
                && location.starts_with(&parent)
                && !location[parent.len()..].trim_end_matches('/').contains('/')
        };

        let mut entries: Vec<RawEntry> = inner
            .dirs
            .iter()
            .filter(|d| is_child(d))
            .map(|d| RawEntry {
                name: last_component(d),
                location: d.clone(),
                is_dir: true,
            })
            .collect();
        entries.extend(inner.files.keys().filter(|f| is_child(f)).map(|f| RawEntry {
            name: last_component(f),
            location: f.clone(),
            is_dir: false,
        }));
        Ok(entries)
    }

    async fn create_writer(&self, file: &FileHandle) -> Result<Box<dyn FileWriter>, StorageError> {
        let inner = self.lock();
        let content = inner
            .files
            .get(file.location())
            .ok_or_else(|| StorageError::NotFound(file.location().to_string()))?;

        Ok(Box::new(MemoryWriter {
            inner: self.inner.clone(),
            location: file.location().to_string(),
            length: content.len() as u64,
            position: 0,
        }))
    }

    async fn read(&self, file: &FileHandle) -> Result<String, StorageError> {
        let inner = self.lock();
        if inner.fail_read {
            return Err(injected(file.location()));
        }
        inner
            .files
            .get(file.location())
            .cloned()
            .ok_or_else(|| StorageError::NotFound(file.location().to_string()))
    }
}

struct MemoryWriter {
    inner: Arc<Mutex<Inner>>,
    location: String,
    length: u64,
    position: u64,
}

#[async_trait]
impl FileWriter for MemoryWriter {
    fn length(&self) -> u64 {
        self.length
    }

    fn position(&self) -> u64 {
        self.position
    }

    async fn seek(&mut self, offset: u64) -> Result<(), StorageError> {
        if self.inner.lock().unwrap().fail_seek {
            return Err(injected(&self.location));
        }
        if offset > self.length {
            return Err(StorageError::SeekOutOfRange {
                location: self.location.clone(),
                offset,
                length: self.length,
            });
        }
        self.position = offset;
        Ok(())
    }

    async fn truncate(&mut self, size: u64) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_write {
            return Err(injected(&self.location));
        }
        let content = inner.files.entry(self.location.clone()).or_default();
        let mut bytes = std::mem::take(content).into_bytes();
        bytes.resize(size as usize, 0);
        *content = String::from_utf8_lossy(&bytes).into_owned();

        self.length = size;
        self.position = self.position.min(size);
        Ok(())
    }

    async fn write(&mut self, text: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_write {
            return Err(injected(&self.location));
        }
        inner.write_calls += 1;

        let content = inner.files.entry(self.location.clone()).or_default();
        let mut bytes = std::mem::take(content).into_bytes();
        let start = self.position as usize;
        let end = (start + text.len()).min(bytes.len());
        bytes.splice(start..end, text.bytes());
        *content = String::from_utf8_lossy(&bytes).into_owned();

        self.position += text.len() as u64;
        self.length = self.length.max(self.position);
        Ok(())
    }
}
