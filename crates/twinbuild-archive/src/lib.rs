//! Input resolution and diagnostics archiving for twinbuild.
//!
//! Each side of a comparison may be given as a directory or as a zip/jar
//! archive. Archives are extracted into temporary directories that live
//! as long as the returned [`ArtifactRoot`].
//!
//! # Key Types
//!
//! - [`resolve`] / [`ArtifactRoot`] -- input path to walkable directory
//! - [`pack_directory`] -- zip a diagnostics directory for upload

pub mod error;
pub mod pack;
pub mod resolve;

pub use error::{ArchiveError, ArchiveResult};
pub use pack::pack_directory;
pub use resolve::{is_archive, resolve, ArtifactRoot};
