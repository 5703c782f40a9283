pub mod breadcrumb;
pub mod config;
pub mod error;
pub mod explorer;
pub mod location;
pub mod navigator;
pub mod transfer;

#[cfg(test)]
mod test_support;

pub use error::ExplorerError;
pub use explorer::FileExplorer;
pub use navigator::{DirectoryEntry, Listing, NavigationState, Navigator, Phase, StorageRoot};
pub use transfer::{Transfer, WriteReport, WriteRequest};
