//! Storage module for report photos
//!
//! Provides the `PhotoStorage` abstraction and a local filesystem backend.

mod local_storage;

pub use local_storage::{LocalPhotoStorage, PhotoStorage};
