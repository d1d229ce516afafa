use serde::{Deserialize, Serialize};

/// A node of the playlist tree: either a playlist or a folder of nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaylistNode {
    Playlist(Playlist),
    Folder(Folder),
}

/// Represents a playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    /// Playlist name
    pub name: String,

    /// Playlist entries (ordered)
    pub entries: Vec<PlaylistEntry>,
}

/// Entry in a playlist, referencing a track by ID
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    /// Track ID (references Track::id of the owning collection)
    pub track_id: String,

    /// Position in playlist (0-based)
    pub position: u32,
}

/// A named folder grouping child nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub name: String,
    pub children: Vec<PlaylistNode>,
}

impl Playlist {
    /// Create a new empty playlist
    pub fn new(name: String) -> Self {
        Self {
            name,
            entries: Vec::new(),
        }
    }

    /// Add a track to this playlist
    pub fn add_track(&mut self, track_id: String) {
        let position = self.entries.len() as u32;
        self.entries.push(PlaylistEntry { track_id, position });
    }

    /// Number of tracks in this playlist
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if playlist is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Folder {
    pub fn new(name: String) -> Self {
        Self {
            name,
            children: Vec::new(),
        }
    }
}

impl PlaylistNode {
    pub fn name(&self) -> &str {
        match self {
            PlaylistNode::Playlist(playlist) => &playlist.name,
            PlaylistNode::Folder(folder) => &folder.name,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, PlaylistNode::Folder(_))
    }

    /// Number of playlists in this subtree (a playlist counts itself)
    pub fn playlist_count(&self) -> usize {
        match self {
            PlaylistNode::Playlist(_) => 1,
            PlaylistNode::Folder(folder) => {
                folder.children.iter().map(PlaylistNode::playlist_count).sum()
            }
        }
    }

    /// Number of entries across all playlists in this subtree
    pub fn entry_count(&self) -> usize {
        match self {
            PlaylistNode::Playlist(playlist) => playlist.len(),
            PlaylistNode::Folder(folder) => {
                folder.children.iter().map(PlaylistNode::entry_count).sum()
            }
        }
    }

    /// Find nodes with one of the given names, searching depth-first in
    /// document order. A matching folder is returned whole and not searched
    /// further.
    pub fn select<'a>(nodes: &'a [PlaylistNode], names: &[String]) -> Vec<&'a PlaylistNode> {
        let mut selected = Vec::new();
        for node in nodes {
            if names.iter().any(|name| name == node.name()) {
                selected.push(node);
            } else if let PlaylistNode::Folder(folder) = node {
                selected.extend(Self::select(&folder.children, names));
            }
        }
        selected
    }
}
