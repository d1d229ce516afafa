//! Main migration pipeline orchestration

use super::config::MigrationConfig;
use super::translator::{TrackIndex, Translator};
use super::writer::{commit, merge_playlists};
use crate::collection::{Collection, Format};
use crate::model::{Library, PlaylistNode};
use crate::validation::validate_migration;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;

/// Outcome of a migration run
#[derive(Debug, Clone)]
pub struct MigrationReport {
    /// Names of the top-level nodes that were migrated
    pub nodes: Vec<String>,

    /// Number of playlists, including those inside migrated folders
    pub playlist_count: usize,

    /// Number of playlist entries translated
    pub entry_count: usize,

    /// Backup of the destination, `None` for dry runs
    pub backup: Option<PathBuf>,
}

/// Main migration pipeline
pub struct MigrationPipeline {
    config: MigrationConfig,
    source_format: Format,
    destination_format: Format,
}

impl MigrationPipeline {
    /// Create a new pipeline, resolving the collection formats
    pub fn new(config: MigrationConfig) -> Result<Self> {
        let source_format = match config.source_format {
            Some(format) => format,
            None => Format::detect(&config.source)?,
        };
        let destination_format = match config.destination_format {
            Some(format) => format,
            None => Format::detect(&config.destination)?,
        };

        Ok(Self {
            config,
            source_format,
            destination_format,
        })
    }

    /// Run the complete migration
    ///
    /// The destination is only written after every playlist has been
    /// translated and merged; any failure leaves it untouched.
    pub fn run(&self) -> Result<MigrationReport> {
        log::info!(
            "Migrating playlists from {} ({:?}) to {} ({:?})",
            self.source_format.dialect().name(),
            self.config.source,
            self.destination_format.dialect().name(),
            self.config.destination
        );

        // Step 1: Load both collections
        let source = Collection::open(&self.config.source, self.source_format)?;
        let destination = Collection::open(&self.config.destination, self.destination_format)?;

        // Step 2: Pick the playlists to migrate
        let selected = self.select_playlists(source.library(), self.source_format);
        if selected.is_empty() {
            bail!("No playlists selected for migration");
        }

        // Step 3: Translate track references
        let index = TrackIndex::build(destination.library())
            .with_title_artist_fallback(self.config.title_artist_fallback);
        log::info!("Destination index: {} track locations", index.len());
        let translated = Translator::new(source.library(), index).translate(&selected)?;

        let report = MigrationReport {
            nodes: translated.iter().map(|n| n.name().to_string()).collect(),
            playlist_count: translated.iter().map(PlaylistNode::playlist_count).sum(),
            entry_count: translated.iter().map(PlaylistNode::entry_count).sum(),
            backup: None,
        };
        log::info!(
            "Translated {} playlist(s), {} entries",
            report.playlist_count,
            report.entry_count
        );

        // Step 4: Merge into the destination document
        let folder = self.config.target_folder.as_deref();
        let merged = merge_playlists(&destination, translated.clone(), folder)?;

        // Step 5: Check the merged document, then back up and write
        let backup = write_verified(
            &self.config,
            self.destination_format,
            merged,
            &translated,
        )?;

        Ok(MigrationReport { backup, ..report })
    }

    /// Filter the source playlist tree down to what should be migrated
    fn select_playlists<'a>(&self, library: &'a Library, format: Format) -> Vec<&'a PlaylistNode> {
        let dialect = format.dialect();

        let selected: Vec<&PlaylistNode> = match &self.config.playlist_filter {
            Some(filter) => {
                log::info!("Filtering to playlists: {:?}", filter);
                let selected = PlaylistNode::select(library.playlists(), filter);
                for name in filter {
                    if !selected.iter().any(|node| node.name() == name) {
                        log::warn!("Playlist '{}' not found in source collection", name);
                    }
                }
                selected
            }
            None => library.playlists().iter().collect(),
        };

        selected
            .into_iter()
            .filter(|node| {
                let skip = !self.config.include_system && dialect.is_system_node(node.name());
                if skip {
                    log::info!("Skipping {} system playlist '{}'", dialect.name(), node.name());
                }
                !skip
            })
            .collect()
    }
}

/// Re-parse the merged destination and check the inserted nodes before
/// anything on disk changes
///
/// Returns the backup path, or `None` for a dry run.
fn write_verified(
    config: &MigrationConfig,
    format: Format,
    merged: Vec<u8>,
    inserted: &[PlaylistNode],
) -> Result<Option<PathBuf>> {
    let merged = Collection::from_bytes(config.destination.clone(), format, merged)
        .context("Merged collection does not parse")?;
    validate_migration(&merged, config.target_folder.as_deref(), inserted)?;

    if config.dry_run {
        log::info!("Dry run: {:?} left unchanged", config.destination);
        return Ok(None);
    }

    commit(&config.destination, merged.source(), config.backup).map(Some)
}
