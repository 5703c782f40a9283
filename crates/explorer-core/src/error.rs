use storage_platform::filesystem::StorageError;
use thiserror::Error;

/// Failures surfaced by the navigator and transfer operations.
///
/// Every variant is recoverable at the operation level; nothing is retried.
#[derive(Debug, Error)]
pub enum ExplorerError {
    #[error("storage root unavailable: {reason}")]
    RootUnavailable { reason: String },

    #[error("access denied to {location}")]
    AccessDenied {
        location: String,
        #[source]
        source: StorageError,
    },

    #[error("cannot resolve {location}")]
    Resolution {
        location: String,
        #[source]
        source: StorageError,
    },

    #[error("cannot create or open file {name:?}")]
    FileResolution {
        name: String,
        #[source]
        source: StorageError,
    },

    #[error("failed to list {location}")]
    List {
        location: String,
        #[source]
        source: StorageError,
    },

    #[error("cannot position at end of {name:?} for append")]
    AppendPosition {
        name: String,
        #[source]
        source: StorageError,
    },

    #[error("failed to write {name:?}")]
    WriteIo {
        name: String,
        #[source]
        source: StorageError,
    },

    #[error("failed to read {name:?}")]
    ReadIo {
        name: String,
        #[source]
        source: StorageError,
    },

    #[error("file {name:?} does not exist or is inaccessible")]
    FileNotFound {
        name: String,
        #[source]
        source: StorageError,
    },
}

impl ExplorerError {
    pub fn root_not_resolved() -> Self {
        Self::RootUnavailable {
            reason: "storage root has not been resolved".to_string(),
        }
    }

    /// The storage error underneath, if any
    pub fn storage_error(&self) -> Option<&StorageError> {
        match self {
            Self::RootUnavailable { .. } => None,
            Self::AccessDenied { source, .. }
            | Self::Resolution { source, .. }
            | Self::FileResolution { source, .. }
            | Self::List { source, .. }
            | Self::AppendPosition { source, .. }
            | Self::WriteIo { source, .. }
            | Self::ReadIo { source, .. }
            | Self::FileNotFound { source, .. } => Some(source),
        }
    }

    /// True when the operation was refused because the file name itself is unusable
    pub fn is_invalid_name(&self) -> bool {
        matches!(self.storage_error(), Some(StorageError::InvalidName(_)))
    }
}
