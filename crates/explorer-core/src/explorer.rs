use std::sync::Arc;

use storage_platform::filesystem::{DirectoryHandle, StorageApi, StorageError};
use storage_platform::notification::{Notifier, ToastLength};
use tracing::{error, info};

use crate::error::ExplorerError;
use crate::navigator::{Listing, Navigator, Phase};
use crate::transfer::{Transfer, WriteReport, WriteRequest};

pub const MSG_ROOT_UNAVAILABLE: &str = "File system not initiated.";
pub const MSG_ACCESS_DENIED: &str = "You need to give the app access to use all the features.";
pub const MSG_FILE_INACCESSIBLE: &str = "File does not exist or it is inaccessible.";
pub const MSG_INVALID_NAME: &str = "Invalid file name.";
pub const MSG_WRITE_OK: &str = "Successful file write!";
pub const MSG_WRITE_FAILED: &str = "Failed file write!";
pub const MSG_APPEND_FAILED: &str = "Failed append content!";
pub const MSG_READ_OK: &str = "Successful file read!";
pub const MSG_READ_FAILED: &str = "Failed file read!";

/// User-facing message for a failure, if it gets one
pub fn failure_message(err: &ExplorerError) -> Option<&'static str> {
    match err {
        ExplorerError::RootUnavailable { .. } => Some(MSG_ROOT_UNAVAILABLE),
        ExplorerError::AccessDenied { .. } => Some(MSG_ACCESS_DENIED),
        e if e.is_invalid_name() => Some(MSG_INVALID_NAME),
        ExplorerError::FileResolution { .. } | ExplorerError::FileNotFound { .. } => {
            Some(MSG_FILE_INACCESSIBLE)
        }
        ExplorerError::AppendPosition { .. } => Some(MSG_APPEND_FAILED),
        ExplorerError::WriteIo { .. } => Some(MSG_WRITE_FAILED),
        ExplorerError::ReadIo { .. } => Some(MSG_READ_FAILED),
        ExplorerError::Resolution { .. } | ExplorerError::List { .. } => None,
    }
}

/// Navigator and transfer behind one front door, reporting every outcome
/// through the notification surface.
pub struct FileExplorer {
    navigator: Navigator,
    transfer: Transfer,
    notifier: Box<dyn Notifier>,
}

impl FileExplorer {
    pub fn new(storage: Arc<dyn StorageApi>, notifier: Box<dyn Notifier>) -> Self {
        Self {
            navigator: Navigator::new(storage.clone()),
            transfer: Transfer::new(storage),
            notifier,
        }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn phase(&self) -> Phase {
        self.navigator.phase()
    }

    /// Resolve the storage root
    pub async fn start(&mut self) -> Result<String, ExplorerError> {
        let result = self
            .navigator
            .resolve_root()
            .await
            .map(|root| root.location().to_string());
        if let Ok(location) = &result {
            info!("explorer ready at {}", location);
        }
        self.report(result)
    }

    /// Check access, then list the root
    pub async fn open_explorer(&mut self) -> Result<Listing, ExplorerError> {
        let root = match self.navigator.root() {
            Ok(root) => root.location().to_string(),
            Err(e) => return self.report(Err(e)),
        };

        if !self.navigator.ensure_access().await {
            return self.report(Err(ExplorerError::AccessDenied {
                location: root.clone(),
                source: StorageError::PermissionDenied(root),
            }));
        }

        let result = self.navigator.list_directory(None).await;
        self.report(result)
    }

    pub async fn list_directory(
        &mut self,
        dir: Option<DirectoryHandle>,
    ) -> Result<Listing, ExplorerError> {
        let result = self.navigator.list_directory(dir).await;
        self.report(result)
    }

    pub async fn change_path(&mut self, location: &str) -> Result<Listing, ExplorerError> {
        let result = self.navigator.change_path(location).await;
        self.report(result)
    }

    /// Stop browsing
    pub fn close_explorer(&mut self) {
        self.navigator.reset_navigation();
    }

    pub async fn write_file(
        &mut self,
        file_name: &str,
        content: &str,
        append: bool,
    ) -> Result<WriteReport, ExplorerError> {
        let request = WriteRequest {
            file_name: file_name.to_string(),
            content: content.to_string(),
            append,
        };
        let result = self.transfer.write_file(&mut self.navigator, &request).await;
        if result.is_ok() {
            self.notifier.notify(MSG_WRITE_OK, ToastLength::Long);
        }
        self.report(result)
    }

    pub async fn read_file(&mut self, file_name: &str) -> Result<String, ExplorerError> {
        let result = self.transfer.read_file(&self.navigator, file_name).await;
        if result.is_ok() {
            self.notifier.notify(MSG_READ_OK, ToastLength::Short);
        }
        self.report(result)
    }

    /// Log and announce a failure; the result is handed back untouched
    fn report<T>(&self, result: Result<T, ExplorerError>) -> Result<T, ExplorerError> {
        result.map_err(|e| {
            if let Some(message) = failure_message(&e) {
                self.notifier.notify(message, ToastLength::Long);
            }
            let err = anyhow::Error::from(e);
            error!("{:#}", err);
            match err.downcast::<ExplorerError>() {
                Ok(e) => e,
                Err(_) => unreachable!("built from an ExplorerError"),
            }
        })
    }
}
