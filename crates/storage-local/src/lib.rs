// Host filesystem implementation of the storage capability

pub mod filesystem;

pub use filesystem::LocalStorage;
