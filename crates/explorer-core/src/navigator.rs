use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use storage_platform::filesystem::{DirectoryHandle, Handle, RawEntry, StorageApi, StorageError};
use tracing::{debug, info, warn};

use crate::breadcrumb::Breadcrumb;
use crate::error::ExplorerError;
use crate::location;

/// The resolved external storage directory. Immutable once resolved.
#[derive(Debug, Clone)]
pub struct StorageRoot {
    handle: DirectoryHandle,
    location: String,
}

impl StorageRoot {
    pub fn handle(&self) -> &DirectoryHandle {
        &self.handle
    }

    /// Canonical location of the root (always ends with `/`)
    pub fn location(&self) -> &str {
        &self.location
    }
}

/// A visible child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub name: String,
    /// Absolute, normalized location
    pub location: String,
    pub is_directory: bool,
}

/// Result of listing a directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Location of the listed directory
    pub location: String,
    pub breadcrumb: Breadcrumb,
    pub entries: Vec<DirectoryEntry>,
}

/// Where the navigator is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    RootResolved,
    Browsing(String),
    Collapsed,
}

/// The directory being browsed and whether the explorer was closed
#[derive(Debug, Clone, Default)]
pub struct NavigationState {
    current: Option<DirectoryHandle>,
    collapsed: bool,
}

impl NavigationState {
    pub fn current(&self) -> Option<&DirectoryHandle> {
        self.current.as_ref()
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }
}

/// Owns the storage root and the directory currently being browsed
pub struct Navigator {
    storage: Arc<dyn StorageApi>,
    root: Option<StorageRoot>,
    state: NavigationState,
}

impl Navigator {
    pub fn new(storage: Arc<dyn StorageApi>) -> Self {
        Self {
            storage,
            root: None,
            state: NavigationState::default(),
        }
    }

    /// Resolve the external storage root. Once resolved it never changes;
    /// after a failure the call may be retried.
    pub async fn resolve_root(&mut self) -> Result<&StorageRoot, ExplorerError> {
        if self.root.is_none() {
            let handle = self.storage.external_root().await.map_err(|e| {
                warn!("storage root resolution failed: {}", e);
                ExplorerError::RootUnavailable {
                    reason: e.to_string(),
                }
            })?;
            let location = location::normalize_dir(handle.location());
            info!("storage root: {}", location);
            self.root = Some(StorageRoot { handle, location });
        }
        self.root()
    }

    pub fn root(&self) -> Result<&StorageRoot, ExplorerError> {
        self.root.as_ref().ok_or_else(ExplorerError::root_not_resolved)
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    /// Directory currently being browsed, if any
    pub fn current(&self) -> Option<&DirectoryHandle> {
        self.state.current()
    }

    pub fn is_browsing(&self) -> bool {
        self.state.current.is_some()
    }

    pub fn phase(&self) -> Phase {
        match (&self.root, &self.state.current) {
            (None, _) => Phase::Uninitialized,
            (Some(_), Some(dir)) => Phase::Browsing(dir.location().to_string()),
            (Some(_), None) if self.state.collapsed => Phase::Collapsed,
            (Some(_), None) => Phase::RootResolved,
        }
    }

    /// Open the root without creating anything so permission problems show
    /// up before the first listing. Returns whether access was granted.
    pub async fn ensure_access(&self) -> bool {
        let Ok(root) = self.root() else {
            return false;
        };
        match self.storage.get_directory(root.handle(), "/", None).await {
            Ok(_) => {
                debug!("access to {} granted", root.location());
                true
            }
            Err(e) => {
                warn!("access to {} not granted: {}", root.location(), e);
                false
            }
        }
    }

    /// List `dir` (the root when `None`) and make it the current directory.
    pub async fn list_directory(
        &mut self,
        dir: Option<DirectoryHandle>,
    ) -> Result<Listing, ExplorerError> {
        let root = self.root()?;
        let dir = dir.unwrap_or_else(|| root.handle().clone());
        let dir_location = location::normalize_dir(dir.location());

        let breadcrumb = Breadcrumb::derive(root.location(), &dir_location).ok_or_else(|| {
            ExplorerError::Resolution {
                location: dir_location.clone(),
                source: StorageError::InvalidLocation(dir_location.clone()),
            }
        })?;

        let raw = self.storage.list_entries(&dir).await.map_err(|e| match e {
            StorageError::PermissionDenied(_) => ExplorerError::AccessDenied {
                location: dir_location.clone(),
                source: e,
            },
            _ => ExplorerError::List {
                location: dir_location.clone(),
                source: e,
            },
        })?;

        let entries = visible_entries(raw);
        debug!("listed {}: {} entries", dir_location, entries.len());

        self.state.current = Some(dir);
        self.state.collapsed = false;

        Ok(Listing {
            location: dir_location,
            breadcrumb,
            entries,
        })
    }

    /// Resolve an absolute location under the root and list it.
    ///
    /// On any failure the current directory is left untouched.
    pub async fn change_path(&mut self, target: &str) -> Result<Listing, ExplorerError> {
        let root = self.root()?;

        if !location::is_within(root.location(), target) {
            warn!("refusing to leave storage root: {}", target);
            return Err(ExplorerError::Resolution {
                location: target.to_string(),
                source: StorageError::InvalidLocation(target.to_string()),
            });
        }

        let dir = match self.storage.resolve(target).await {
            Ok(Handle::Directory(dir)) => dir,
            Ok(Handle::File(file)) => {
                return Err(ExplorerError::Resolution {
                    location: target.to_string(),
                    source: StorageError::NotADirectory(file.location().to_string()),
                });
            }
            Err(e) => {
                return Err(ExplorerError::Resolution {
                    location: target.to_string(),
                    source: e,
                });
            }
        };

        self.list_directory(Some(dir)).await
    }

    /// Re-list the current directory; `None` when nothing is being browsed
    pub async fn refresh(&mut self) -> Option<Result<Listing, ExplorerError>> {
        let dir = self.state.current.clone()?;
        Some(self.list_directory(Some(dir)).await)
    }

    /// Stop browsing. The next listing starts from whatever is asked for.
    pub fn reset_navigation(&mut self) {
        self.state.current = None;
        self.state.collapsed = true;
    }
}

/// Directories first, then case-insensitive by name
pub fn compare_entries(a: &DirectoryEntry, b: &DirectoryEntry) -> Ordering {
    b.is_directory
        .cmp(&a.is_directory)
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
}

/// Drop hidden (dot-prefixed) entries and sort the rest
pub fn visible_entries(raw: Vec<RawEntry>) -> Vec<DirectoryEntry> {
    let mut entries: Vec<DirectoryEntry> = raw
        .into_iter()
        .filter(|e| !e.name.starts_with('.'))
        .map(|e| DirectoryEntry {
            location: if e.is_dir {
                location::normalize_dir(&e.location)
            } else {
                location::normalize_file(&e.location)
            },
            name: e.name,
            is_directory: e.is_dir,
        })
        .collect();

    entries.sort_by(compare_entries);
    entries
}
