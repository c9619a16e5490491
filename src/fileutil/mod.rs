//! File System Helpers
//!
//! Directory walking and template reading shared by the CLI and the tag
//! definition loader.

pub mod reader;
pub mod walk;

pub use reader::{decode, normalize, read_formatted};
pub use walk::{has_extension, list_matching_files};
