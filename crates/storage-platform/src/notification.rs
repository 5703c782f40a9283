use serde::{Deserialize, Serialize};

/// How long a transient message stays on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToastLength {
    Short,
    Long,
}

/// Fire-and-forget "tell the user X" surface.
///
/// Implementations must not block and must not fail: the caller never waits
/// on a notification and never branches on it.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, length: ToastLength);
}
