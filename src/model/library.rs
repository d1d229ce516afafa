use super::{PlaylistNode, Track};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Tracks and playlist tree of one collection document
#[derive(Debug, Clone, Default)]
pub struct Library {
    /// Tracks keyed by their collection-native reference
    tracks: HashMap<String, Track>,

    /// Top-level playlist nodes, in document order
    nodes: Vec<PlaylistNode>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a track under its reference
    ///
    /// A collection listing the same reference twice keeps the first entry,
    /// which is the one the DJ application resolves playlists against.
    /// Returns false when the track was ignored.
    pub fn add_track(&mut self, track: Track) -> bool {
        match self.tracks.entry(track.id.clone()) {
            Entry::Occupied(existing) => {
                log::warn!(
                    "Duplicate collection entry {}: keeping {}",
                    track.id,
                    existing.get().describe()
                );
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(track);
                true
            }
        }
    }

    /// Append a node at the playlist root
    pub fn add_playlist(&mut self, node: PlaylistNode) {
        self.nodes.push(node);
    }

    pub fn get_track(&self, reference: &str) -> Option<&Track> {
        self.tracks.get(reference)
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    /// Playlist root, in document order
    pub fn playlists(&self) -> &[PlaylistNode] {
        &self.nodes
    }

    /// Top-level node with this name
    pub fn node(&self, name: &str) -> Option<&PlaylistNode> {
        self.nodes.iter().find(|n| n.name() == name)
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Playlists anywhere in the tree; folders themselves don't count
    pub fn playlist_count(&self) -> usize {
        self.nodes.iter().map(PlaylistNode::playlist_count).sum()
    }
}
