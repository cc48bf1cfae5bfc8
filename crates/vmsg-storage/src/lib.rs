//! Remote media storage for message assets.
//!
//! The upload gate talks to storage through the [`MediaStore`] trait;
//! [`S3MediaStore`] is the production implementation against any
//! S3-compatible endpoint.

pub mod client;
pub mod error;

pub use client::{message_asset_key, MediaStore, S3MediaStore, StoreConfig};
pub use error::{StorageError, StorageResult};
