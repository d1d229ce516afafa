//! Playlist migration: selection, translation, merge and write-back

pub mod config;
pub mod pipeline;
pub mod translator;
pub mod writer;

pub use config::{BackupMode, MigrationConfig};
pub use pipeline::{MigrationPipeline, MigrationReport};
pub use translator::{TrackIndex, Translator};
pub use writer::{commit, merge_playlists};
