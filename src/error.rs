//! Typed migration failures
//!
//! Operations return `anyhow::Result`; these errors travel inside the
//! `anyhow::Error` so callers can `downcast_ref::<MigrationError>()` to
//! tell them apart.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// The collection document is not well-formed or not in the expected schema
    #[error("Failed to parse {path:?} at byte {position}: {message}")]
    Parse {
        path: PathBuf,
        position: u64,
        message: String,
    },

    /// A track has no counterpart in the destination library
    #[error("Track {track} from playlist '{playlist}' doesn't exist in the destination collection. Please add it to the collection first")]
    Lookup { playlist: String, track: String },

    /// A playlist entry points at a track its own collection doesn't list
    #[error("Playlist '{playlist}' references unknown track '{reference}'")]
    DanglingReference { playlist: String, reference: String },

    /// The destination already has a sibling node with this name
    #[error("A playlist or folder named '{name}' already exists in '{parent}'")]
    NameCollision { name: String, parent: String },

    /// The collection format could not be detected
    #[error("Cannot detect collection format of {0:?} (expected .nml or .xml)")]
    UnknownFormat(PathBuf),
}
