//! Playlist Bridge - move playlists between DJ collections
//!
//! This library migrates playlists and playlist folders between Traktor
//! (collection.nml) and Rekordbox (rekordbox.xml) collection files,
//! rewriting track references and leaving the rest of the destination
//! document byte-for-byte intact.

pub mod collection;
pub mod error;
pub mod migrate;
pub mod model;
pub mod rekordbox;
pub mod traktor;
pub mod validation;

pub use collection::{Collection, Format};
pub use error::MigrationError;
pub use migrate::config::MigrationConfig;
pub use migrate::pipeline::MigrationPipeline;
