//! Unified data model for collection contents
//!
//! This module defines data structures that are independent of
//! both collection formats (Rekordbox and Traktor).

mod track;
mod playlist;
mod library;

pub use track::{is_drive_prefix, normalize_location, Track};
pub use playlist::{Folder, Playlist, PlaylistEntry, PlaylistNode};
pub use library::Library;
