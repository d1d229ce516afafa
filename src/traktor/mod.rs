//! Traktor NML collection support
//!
//! Reads tracks and the playlist tree from collection.nml and writes new
//! playlist nodes in the same schema.

mod reader;
mod writer;

pub use reader::parse_collection;
pub use writer::{playlist_uuid, render_nodes, render_nodes_with_salt};

use crate::collection::xml::XmlError;
use crate::collection::{Dialect, ParsedCollection};
use crate::model::{is_drive_prefix, normalize_location, PlaylistNode};
use anyhow::Result;

/// Name of the folder holding every Traktor playlist
pub const ROOT_NAME: &str = "$ROOT";

/// Playlists Traktor manages itself
pub const SYSTEM_PLAYLISTS: [&str; 2] = ["_LOOPS", "_RECORDINGS"];

/// Traktor (NML) dialect
#[derive(Debug, Clone, Copy, Default)]
pub struct Traktor;

impl Dialect for Traktor {
    fn name(&self) -> &'static str {
        "Traktor"
    }

    fn root_label(&self) -> &'static str {
        ROOT_NAME
    }

    fn parse(&self, source: &[u8]) -> Result<ParsedCollection, XmlError> {
        parse_collection(source)
    }

    fn count_attribute(&self) -> &'static str {
        "COUNT"
    }

    fn is_system_node(&self, name: &str) -> bool {
        SYSTEM_PLAYLISTS.contains(&name)
    }

    fn render(&self, nodes: &[PlaylistNode], parent_path: &str) -> Result<Vec<u8>> {
        render_nodes(nodes, parent_path)
    }
}

/// Convert a Traktor LOCATION (VOLUME, DIR, FILE) to a normalized path
///
/// `C:` + `/:Music/:House/:` + `A.mp3` becomes `C:/Music/House/A.mp3`.
/// Non-drive volumes are disk names (`Macintosh HD`), not path components.
pub fn location_from_parts(volume: &str, dir: &str, file: &str) -> String {
    let dir = dir.replace("/:", "/");
    let path = if is_drive_prefix(volume) {
        format!("{}{}{}", volume, dir, file)
    } else {
        format!("{}{}", dir, file)
    };
    normalize_location(&path)
}

/// Name of a macOS volume, `None` for drive letters and empty volumes
pub fn mac_volume(volume: &str) -> Option<String> {
    if volume.is_empty() || is_drive_prefix(volume) {
        None
    } else {
        Some(volume.to_string())
    }
}
