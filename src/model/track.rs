use serde::{Deserialize, Serialize};

/// Represents a single music track as listed in a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Reference used by the owning collection's playlists
    /// (Rekordbox `TrackID`, Traktor primary key)
    pub id: String,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Normalized file location, see [`normalize_location`]
    pub location: Option<String>,

    /// macOS volume the location is relative to, when the collection stores
    /// it separately (Traktor `VOLUME` other than a drive letter)
    #[serde(default)]
    pub volume: Option<String>,

    /// Track duration in seconds
    pub duration_secs: Option<u32>,

    /// Bitrate in kbps
    pub bitrate_kbps: Option<u32>,
}

impl Track {
    /// Case-insensitive (title, artist) pair used when locations don't match
    pub fn title_artist_key(&self) -> Option<(String, String)> {
        let title = self.title.trim().to_lowercase();
        if title.is_empty() {
            return None;
        }
        Some((title, self.artist.trim().to_lowercase()))
    }

    /// Locations this track may be listed under in another collection,
    /// most specific first
    ///
    /// A Traktor track on volume `MyUSB` is `/Volumes/MyUSB/Music/x.mp3` to
    /// Rekordbox, while one on the startup disk is just `/Music/x.mp3`.
    pub fn location_keys(&self) -> Vec<String> {
        let Some(location) = &self.location else {
            return Vec::new();
        };
        match &self.volume {
            Some(volume) => vec![format!("/Volumes/{}{}", volume, location), location.clone()],
            None => vec![location.clone()],
        }
    }

    /// Short human-readable description for logs and errors
    pub fn describe(&self) -> String {
        match &self.location {
            Some(location) => format!("{} - {} ({})", self.artist, self.title, location),
            None => format!("{} - {}", self.artist, self.title),
        }
    }
}

/// Normalize a file path so both collection formats agree on it
///
/// Backslashes become slashes and Windows drive letters are upper-cased.
/// Everything else is kept as-is: matching is exact.
pub fn normalize_location(path: &str) -> String {
    let mut normalized = path.replace('\\', "/");

    // "/C:/Music" (from file:///C:/...) -> "C:/Music"
    if normalized.len() >= 3 && normalized.starts_with('/') && is_drive_prefix(&normalized[1..]) {
        normalized.remove(0);
    }

    if is_drive_prefix(&normalized) {
        let drive = normalized[..1].to_ascii_uppercase();
        normalized.replace_range(..1, &drive);
    }

    normalized
}

/// True when the string starts with a drive letter such as `C:`
pub fn is_drive_prefix(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
