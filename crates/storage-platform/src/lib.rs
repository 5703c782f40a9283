// Capability traits consumed by the explorer core

pub mod filesystem;
pub mod notification;
