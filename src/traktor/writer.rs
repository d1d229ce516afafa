//! Traktor playlist node serialization

use crate::model::{Playlist, PlaylistNode};
use anyhow::Result;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Serialize playlist nodes as Traktor `NODE` elements
///
/// Entries must already hold Traktor primary keys. Line breaks follow the
/// layout Traktor itself writes: one entry per line, every node closed on
/// its own line.
pub fn render_nodes(nodes: &[PlaylistNode], parent_path: &str) -> Result<Vec<u8>> {
    let salt = chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default()
        .to_string();
    render_nodes_with_salt(nodes, parent_path, &salt)
}

/// [`render_nodes`] with a fixed UUID salt
pub fn render_nodes_with_salt(nodes: &[PlaylistNode], parent_path: &str, salt: &str) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    for node in nodes {
        write_node(&mut writer, node, parent_path, salt)?;
    }
    Ok(writer.into_inner())
}

/// Playlist UUID: 32 lowercase hex digits
///
/// Hashes the salt, the node's path and its entries. A playlist that was
/// renamed in Traktor and then migrated again under its old name gets a
/// new UUID, as long as the salt differs between runs.
pub fn playlist_uuid(salt: &str, parent_path: &str, playlist: &Playlist) -> String {
    let mut context = md5::Context::new();
    context.consume(salt.as_bytes());
    context.consume(b"\0");
    context.consume(format!("{}/{}", parent_path, playlist.name).as_bytes());
    for entry in &playlist.entries {
        context.consume(b"\0");
        context.consume(entry.track_id.as_bytes());
    }
    format!("{:x}", context.compute())
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &PlaylistNode, parent_path: &str, salt: &str) -> Result<()> {
    match node {
        PlaylistNode::Folder(folder) => {
            let path = format!("{}/{}", parent_path, folder.name);
            let count = folder.children.len().to_string();

            let start = BytesStart::new("NODE")
                .with_attributes([("TYPE", "FOLDER"), ("NAME", folder.name.as_str())]);
            writer.write_event(Event::Start(start))?;
            let subnodes = BytesStart::new("SUBNODES").with_attributes([("COUNT", count.as_str())]);
            writer.write_event(Event::Start(subnodes))?;
            line_break(writer)?;

            for child in &folder.children {
                write_node(writer, child, &path, salt)?;
            }

            writer.write_event(Event::End(BytesEnd::new("SUBNODES")))?;
            line_break(writer)?;
        }
        PlaylistNode::Playlist(playlist) => {
            let start = BytesStart::new("NODE")
                .with_attributes([("TYPE", "PLAYLIST"), ("NAME", playlist.name.as_str())]);
            writer.write_event(Event::Start(start))?;
            write_playlist(writer, playlist, parent_path, salt)?;
        }
    }

    writer.write_event(Event::End(BytesEnd::new("NODE")))?;
    line_break(writer)?;
    Ok(())
}

fn write_playlist(
    writer: &mut Writer<Vec<u8>>,
    playlist: &Playlist,
    parent_path: &str,
    salt: &str,
) -> Result<()> {
    let entries = playlist.len().to_string();
    let uuid = playlist_uuid(salt, parent_path, playlist);

    let start = BytesStart::new("PLAYLIST").with_attributes([
        ("ENTRIES", entries.as_str()),
        ("TYPE", "LIST"),
        ("UUID", uuid.as_str()),
    ]);
    writer.write_event(Event::Start(start))?;

    for entry in &playlist.entries {
        writer.write_event(Event::Start(BytesStart::new("ENTRY")))?;
        let key = BytesStart::new("PRIMARYKEY")
            .with_attributes([("TYPE", "TRACK"), ("KEY", entry.track_id.as_str())]);
        // Traktor writes empty elements as start/end pairs
        writer.write_event(Event::Start(key))?;
        writer.write_event(Event::End(BytesEnd::new("PRIMARYKEY")))?;
        line_break(writer)?;
        writer.write_event(Event::End(BytesEnd::new("ENTRY")))?;
        line_break(writer)?;
    }

    writer.write_event(Event::End(BytesEnd::new("PLAYLIST")))?;
    line_break(writer)?;
    Ok(())
}

fn line_break(writer: &mut Writer<Vec<u8>>) -> Result<()> {
    writer.write_event(Event::Text(BytesText::from_escaped("\n")))?;
    Ok(())
}
