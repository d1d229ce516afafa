//! Track reference translation between collections

use crate::error::MigrationError;
use crate::model::{Folder, Library, Playlist, PlaylistNode, Track};
use anyhow::Result;
use std::collections::HashMap;

/// Destination tracks indexed by identity
///
/// Lookups are exact: normalized location first, then the case-insensitive
/// (title, artist) pair when it names exactly one track.
pub struct TrackIndex<'a> {
    by_location: HashMap<String, &'a Track>,
    /// `None` marks a pair shared by several tracks
    by_title_artist: HashMap<(String, String), Option<&'a Track>>,
    title_artist_fallback: bool,
}

impl<'a> TrackIndex<'a> {
    pub fn build(library: &'a Library) -> Self {
        let mut by_location: HashMap<String, &'a Track> = HashMap::new();
        let mut by_title_artist: HashMap<(String, String), Option<&'a Track>> = HashMap::new();

        for track in library.tracks() {
            for location in track.location_keys() {
                // Same file listed twice: keep the lowest ID so lookups are stable
                by_location
                    .entry(location)
                    .and_modify(|existing| {
                        // shorter first, so numeric TrackIDs compare by value
                        if (track.id.len(), &track.id) < (existing.id.len(), &existing.id) {
                            *existing = track;
                        }
                    })
                    .or_insert(track);
            }

            if let Some(key) = track.title_artist_key() {
                by_title_artist
                    .entry(key)
                    .and_modify(|existing| *existing = None)
                    .or_insert(Some(track));
            }
        }

        Self {
            by_location,
            by_title_artist,
            title_artist_fallback: true,
        }
    }

    pub fn with_title_artist_fallback(mut self, enabled: bool) -> Self {
        self.title_artist_fallback = enabled;
        self
    }

    /// Find the track matching `track` from another collection
    pub fn find(&self, track: &Track) -> Option<&'a Track> {
        if let Some(found) = track
            .location_keys()
            .iter()
            .find_map(|location| self.by_location.get(location))
        {
            return Some(*found);
        }

        if !self.title_artist_fallback {
            return None;
        }

        let found = track
            .title_artist_key()
            .and_then(|key| self.by_title_artist.get(&key).copied().flatten());
        if let Some(found) = found {
            log::debug!(
                "Matched {} by title/artist to {}",
                track.describe(),
                found.describe()
            );
        }
        found
    }

    pub fn len(&self) -> usize {
        self.by_location.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_location.is_empty()
    }
}

/// Rewrites playlists of one collection into references of another
pub struct Translator<'a> {
    source: &'a Library,
    index: TrackIndex<'a>,
}

impl<'a> Translator<'a> {
    /// `source` resolves the incoming entries, `index` covers the destination
    pub fn new(source: &'a Library, index: TrackIndex<'a>) -> Self {
        Self { source, index }
    }

    /// Translate nodes, keeping folder structure, names and track order
    ///
    /// Fails on the first entry without a destination match.
    pub fn translate(&self, nodes: &[&PlaylistNode]) -> Result<Vec<PlaylistNode>> {
        nodes.iter().map(|node| self.translate_node(node)).collect()
    }

    fn translate_node(&self, node: &PlaylistNode) -> Result<PlaylistNode> {
        match node {
            PlaylistNode::Folder(folder) => {
                let mut translated = Folder::new(folder.name.clone());
                for child in &folder.children {
                    translated.children.push(self.translate_node(child)?);
                }
                Ok(PlaylistNode::Folder(translated))
            }
            PlaylistNode::Playlist(playlist) => {
                Ok(PlaylistNode::Playlist(self.translate_playlist(playlist)?))
            }
        }
    }

    fn translate_playlist(&self, playlist: &Playlist) -> Result<Playlist> {
        let mut translated = Playlist::new(playlist.name.clone());

        for entry in &playlist.entries {
            let track = self.source.get_track(&entry.track_id).ok_or_else(|| {
                MigrationError::DanglingReference {
                    playlist: playlist.name.clone(),
                    reference: entry.track_id.clone(),
                }
            })?;

            let target = self.index.find(track).ok_or_else(|| {
                log::error!(
                    "No destination match for {} (playlist '{}')",
                    track.describe(),
                    playlist.name
                );
                MigrationError::Lookup {
                    playlist: playlist.name.clone(),
                    track: track.describe(),
                }
            })?;

            translated.add_track(target.id.clone());
        }

        log::debug!(
            "Translated playlist '{}' ({} tracks)",
            playlist.name,
            translated.len()
        );
        Ok(translated)
    }
}
