//! Component sources.
//!
//! Sources are downloaded into the destination root, which doubles as the
//! download cache, and unpacked into the staging directory.

pub mod archive;
pub mod fetch;

pub use archive::ArchiveKind;
pub use fetch::{Fetcher, HttpFetcher};
