//! Round-trip validation of merged collections

use crate::collection::layout::Container;
use crate::collection::{Collection, Format};
use crate::error::MigrationError;
use crate::model::PlaylistNode;
use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::path::Path;

/// Summary of a stand-alone collection check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationSummary {
    pub tracks: usize,
    pub playlists: usize,
    pub entries: usize,
}

/// Check that a merged destination holds the inserted nodes
///
/// # Arguments
/// * `merged` - Destination document after the merge, re-parsed
/// * `folder` - Dedicated folder the nodes went into, if any
/// * `inserted` - Translated nodes as handed to the writer
///
/// # Returns
/// Ok(()) if every node is present with the same structure and entries
pub fn validate_migration(
    merged: &Collection,
    folder: Option<&str>,
    inserted: &[PlaylistNode],
) -> Result<()> {
    log::info!("Validating merged collection for {:?}", merged.path());

    let siblings = match folder {
        None => merged.library().playlists(),
        Some(name) => match merged.library().node(name) {
            Some(PlaylistNode::Folder(folder)) => folder.children.as_slice(),
            _ => bail!("Folder '{}' missing after merge", name),
        },
    };

    for node in inserted {
        let found = siblings
            .iter()
            .find(|n| n.name() == node.name())
            .with_context(|| format!("Playlist '{}' missing after merge", node.name()))?;

        if !same_shape(found, node) {
            bail!(
                "Playlist '{}' was not written as translated (structure or entries differ)",
                node.name()
            );
        }
        log::debug!("✓ {} ({} entries)", node.name(), node.entry_count());
    }

    log::info!("✅ {} migrated node(s) verified", inserted.len());
    Ok(())
}

/// Parse a collection and check it is loadable by its application:
/// node names are unique across the tree and every playlist entry resolves
pub fn validate_collection(path: &Path, format: Format) -> Result<ValidationSummary> {
    let collection = Collection::open(path, format)?;
    let library = collection.library();

    check_unique_names(collection.root(), format.dialect().root_label())?;

    let mut entries = 0;
    check_references(library.playlists(), &mut |playlist, track_id| {
        entries += 1;
        if library.get_track(track_id).is_none() {
            return Err(MigrationError::DanglingReference {
                playlist: playlist.to_string(),
                reference: track_id.to_string(),
            }
            .into());
        }
        Ok(())
    })?;

    let summary = ValidationSummary {
        tracks: library.track_count(),
        playlists: library.playlist_count(),
        entries,
    };
    log::info!(
        "Collection is valid: {} tracks, {} playlists, {} entries",
        summary.tracks,
        summary.playlists,
        summary.entries
    );
    Ok(summary)
}

fn same_shape(written: &PlaylistNode, expected: &PlaylistNode) -> bool {
    match (written, expected) {
        (PlaylistNode::Playlist(a), PlaylistNode::Playlist(b)) => {
            a.name == b.name
                && a.len() == b.len()
                && a.entries
                    .iter()
                    .zip(&b.entries)
                    .all(|(x, y)| x.track_id == y.track_id)
        }
        (PlaylistNode::Folder(a), PlaylistNode::Folder(b)) => {
            a.name == b.name
                && a.children.len() == b.children.len()
                && a.children
                    .iter()
                    .zip(&b.children)
                    .all(|(x, y)| same_shape(x, y))
        }
        _ => false,
    }
}

fn check_unique_names(container: &Container, root_label: &str) -> Result<()> {
    let mut seen = HashSet::new();
    for (name, parent) in container.names_in_tree(root_label) {
        if !seen.insert(name) {
            return Err(MigrationError::NameCollision {
                name: name.to_string(),
                parent: parent.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

fn check_references(
    nodes: &[PlaylistNode],
    check: &mut dyn FnMut(&str, &str) -> Result<()>,
) -> Result<()> {
    for node in nodes {
        match node {
            PlaylistNode::Playlist(playlist) => {
                for entry in &playlist.entries {
                    check(&playlist.name, &entry.track_id)?;
                }
            }
            PlaylistNode::Folder(folder) => check_references(&folder.children, check)?,
        }
    }
    Ok(())
}
