//! Migration configuration

use crate::collection::Format;
use std::path::PathBuf;

/// Configuration for one migration run
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Collection to read playlists from (never modified)
    pub source: PathBuf,

    /// Collection receiving the playlists
    pub destination: PathBuf,

    /// Source format (None = detect from extension)
    pub source_format: Option<Format>,

    /// Destination format (None = detect from extension)
    pub destination_format: Option<Format>,

    /// Specific playlist or folder names to migrate (None = migrate all)
    pub playlist_filter: Option<Vec<String>>,

    /// Folder at the destination root receiving the playlists (None = the root itself)
    pub target_folder: Option<String>,

    /// Also migrate application-managed playlists (Traktor _LOOPS, _RECORDINGS)
    pub include_system: bool,

    /// Match by (title, artist) when the file location has no match
    pub title_artist_fallback: bool,

    /// How the pre-migration copy of the destination is named
    pub backup: BackupMode,

    /// Translate and merge, but don't write anything
    pub dry_run: bool,
}

/// Naming of the destination backup file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupMode {
    /// `<file>.bak`, replaced on every run
    Sibling,

    /// `<file>.<YYYYmmdd-HHMMSS>.bak`
    Timestamped,
}

impl MigrationConfig {
    /// Create a new migration configuration
    pub fn new(source: PathBuf, destination: PathBuf) -> Self {
        Self {
            source,
            destination,
            source_format: None,
            destination_format: None,
            playlist_filter: None,
            target_folder: None,
            include_system: false,
            title_artist_fallback: true,
            backup: BackupMode::Sibling,
            dry_run: false,
        }
    }

    /// Set source and destination formats explicitly
    pub fn with_formats(mut self, source: Option<Format>, destination: Option<Format>) -> Self {
        self.source_format = source;
        self.destination_format = destination;
        self
    }

    /// Set specific playlists to migrate
    pub fn with_playlists(mut self, playlists: Vec<String>) -> Self {
        self.playlist_filter = Some(playlists);
        self
    }

    /// Put migrated playlists in a dedicated folder
    pub fn with_folder(mut self, folder: String) -> Self {
        self.target_folder = Some(folder);
        self
    }

    pub fn with_system_playlists(mut self, include: bool) -> Self {
        self.include_system = include;
        self
    }

    pub fn with_title_artist_fallback(mut self, enabled: bool) -> Self {
        self.title_artist_fallback = enabled;
        self
    }

    pub fn with_backup(mut self, backup: BackupMode) -> Self {
        self.backup = backup;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
