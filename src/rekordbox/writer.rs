//! Rekordbox playlist node serialization

use crate::model::PlaylistNode;
use anyhow::Result;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Writer;

/// Serialize playlist nodes as Rekordbox `NODE` elements
///
/// Entries must already hold Rekordbox TrackIDs; playlists are written with
/// `KeyType="0"`.
pub fn render_nodes(nodes: &[PlaylistNode]) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    for node in nodes {
        write_node(&mut writer, node)?;
    }

    let mut out = writer.into_inner();
    out.push(b'\n');
    Ok(out)
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &PlaylistNode) -> Result<()> {
    match node {
        PlaylistNode::Folder(folder) => {
            let count = folder.children.len().to_string();
            let start = BytesStart::new("NODE").with_attributes([
                ("Type", "0"),
                ("Name", folder.name.as_str()),
                ("Count", count.as_str()),
            ]);
            writer.write_event(Event::Start(start))?;
            for child in &folder.children {
                write_node(writer, child)?;
            }
            writer.write_event(Event::End(BytesEnd::new("NODE")))?;
        }
        PlaylistNode::Playlist(playlist) => {
            let entries = playlist.len().to_string();
            let start = BytesStart::new("NODE").with_attributes([
                ("Name", playlist.name.as_str()),
                ("Type", "1"),
                ("KeyType", "0"),
                ("Entries", entries.as_str()),
            ]);
            writer.write_event(Event::Start(start))?;
            for entry in &playlist.entries {
                let track = BytesStart::new("TRACK").with_attributes([("Key", entry.track_id.as_str())]);
                writer.write_event(Event::Empty(track))?;
            }
            writer.write_event(Event::End(BytesEnd::new("NODE")))?;
        }
    }
    Ok(())
}
