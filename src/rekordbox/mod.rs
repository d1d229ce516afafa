//! Rekordbox XML collection support
//!
//! Reads tracks and the playlist tree from rekordbox.xml and writes new
//! playlist nodes in the same schema.

mod reader;
mod writer;

pub use reader::parse_collection;
pub use writer::render_nodes;

use crate::collection::xml::XmlError;
use crate::collection::{Dialect, ParsedCollection};
use crate::model::{normalize_location, PlaylistNode};
use anyhow::Result;

/// Rekordbox (DJ_PLAYLISTS) dialect
#[derive(Debug, Clone, Copy, Default)]
pub struct Rekordbox;

impl Dialect for Rekordbox {
    fn name(&self) -> &'static str {
        "Rekordbox"
    }

    fn root_label(&self) -> &'static str {
        "ROOT"
    }

    fn parse(&self, source: &[u8]) -> Result<ParsedCollection, XmlError> {
        parse_collection(source)
    }

    fn count_attribute(&self) -> &'static str {
        "Count"
    }

    fn render(&self, nodes: &[PlaylistNode], _parent_path: &str) -> Result<Vec<u8>> {
        render_nodes(nodes)
    }
}

/// Convert a Rekordbox `Location` URI to a normalized path
///
/// `file://localhost/C:/Music/A%20B.mp3` becomes `C:/Music/A B.mp3`.
pub fn location_from_uri(uri: &str) -> String {
    let path = uri
        .strip_prefix("file://localhost")
        .or_else(|| uri.strip_prefix("file://"))
        .unwrap_or(uri);

    let decoded = urlencoding::decode(path)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| path.to_string());

    normalize_location(&decoded)
}
