//! Merging translated playlists into a destination collection and writing it

use super::config::BackupMode;
use crate::collection::layout::{Container, NodeKind};
use crate::collection::Collection;
use crate::error::MigrationError;
use crate::model::{Folder, PlaylistNode};
use anyhow::{Context, Result};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Produce the destination document with `nodes` added
///
/// Nodes go to the playlist root, or into `folder` at the root (created
/// when missing). Every new name must be unused in the whole destination
/// tree. Only the receiving container's start tag is rewritten;
/// every other byte of the original document is kept. Nothing is written
/// to disk here.
pub fn merge_playlists(
    destination: &Collection,
    nodes: Vec<PlaylistNode>,
    folder: Option<&str>,
) -> Result<Vec<u8>> {
    if nodes.is_empty() {
        return Ok(destination.source().to_vec());
    }

    let dialect = destination.format().dialect();
    let root = destination.root();
    let root_label = dialect.root_label();
    let taken = root.names_in_tree(root_label);

    let (container, parent_label, parent_path, nodes) = match folder {
        None => (root, root_label, String::new(), nodes),
        Some(name) => match root.child(name) {
            Some(existing) if existing.kind == NodeKind::Folder => {
                let container = existing.container.as_ref().with_context(|| {
                    format!("Folder '{}' has no child container to insert into", name)
                })?;
                log::info!("Adding playlists to existing folder '{}'", name);
                (container, name, format!("/{}", name), nodes)
            }
            Some(_) => {
                return Err(MigrationError::NameCollision {
                    name: name.to_string(),
                    parent: root_label.to_string(),
                }
                .into());
            }
            None => {
                log::info!("Creating folder '{}'", name);
                let wrapper = PlaylistNode::Folder(Folder {
                    name: name.to_string(),
                    children: nodes,
                });
                (root, root_label, String::new(), vec![wrapper])
            }
        },
    };

    check_new_names(&taken, &nodes, parent_label)?;

    let fragment = dialect.render(&nodes, &parent_path)?;
    let open_tag =
        container.open_tag_with_count(dialect.count_attribute(), container.children.len() + nodes.len())?;

    // Application-managed playlists stay last at the root
    let insert_before = if std::ptr::eq(container, root) {
        container
            .children
            .iter()
            .find(|c| dialect.is_system_node(&c.name))
            .map(|c| c.start)
    } else {
        None
    };

    log::info!(
        "Inserting {} node(s) into '{}' of {:?}",
        nodes.len(),
        parent_label,
        destination.path()
    );

    splice(destination.source(), container, open_tag, &fragment, insert_before)
}

/// Fail if a name anywhere in `nodes` is already used in the destination
/// tree or appears twice among the new nodes
///
/// `taken` pairs each destination name with its parent folder.
fn check_new_names(taken: &[(&str, &str)], nodes: &[PlaylistNode], parent: &str) -> Result<()> {
    let mut seen: HashMap<String, String> = taken
        .iter()
        .map(|(name, parent)| (name.to_string(), parent.to_string()))
        .collect();
    claim_names(&mut seen, nodes, parent)
}

fn claim_names(seen: &mut HashMap<String, String>, nodes: &[PlaylistNode], parent: &str) -> Result<()> {
    for node in nodes {
        if let Some(existing) = seen.get(node.name()) {
            return Err(MigrationError::NameCollision {
                name: node.name().to_string(),
                parent: existing.clone(),
            }
            .into());
        }
        seen.insert(node.name().to_string(), parent.to_string());

        if let PlaylistNode::Folder(folder) = node {
            claim_names(seen, &folder.children, &folder.name)?;
        }
    }
    Ok(())
}

/// Copy `source`, replacing the container's start tag and inserting
/// `fragment` before `insert_before` (default: the container's end tag)
fn splice(
    source: &[u8],
    container: &Container,
    open_tag: BytesStart<'static>,
    fragment: &[u8],
    insert_before: Option<usize>,
) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::with_capacity(source.len() + fragment.len() + 32));
    writer
        .get_mut()
        .extend_from_slice(&source[..container.open_span.start]);

    match &container.close_span {
        Some(close) => {
            let insert_at = insert_before.unwrap_or(close.start);
            writer.write_event(Event::Start(open_tag))?;
            let out = writer.get_mut();
            out.extend_from_slice(&source[container.open_span.end..insert_at]);
            out.extend_from_slice(fragment);
            out.extend_from_slice(&source[insert_at..]);
        }
        None => {
            // <NODE .../> becomes <NODE ...>fragment</NODE>
            let name = String::from_utf8_lossy(open_tag.name().as_ref()).into_owned();
            writer.write_event(Event::Start(open_tag))?;
            writer.get_mut().extend_from_slice(fragment);
            writer.write_event(Event::End(BytesEnd::new(name)))?;
            writer
                .get_mut()
                .extend_from_slice(&source[container.open_span.end..]);
        }
    }

    Ok(writer.into_inner())
}

/// Where the pre-migration copy of `path` goes
pub fn backup_path(path: &Path, mode: BackupMode) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    match mode {
        BackupMode::Sibling => name.push(".bak"),
        BackupMode::Timestamped => {
            name.push(format!(".{}.bak", chrono::Local::now().format("%Y%m%d-%H%M%S")));
        }
    }
    path.with_file_name(name)
}

/// Back up the destination, then replace it with `contents`
///
/// The new document is written to a temporary sibling and renamed over the
/// original, so an interrupted write never leaves a truncated collection.
pub fn commit(path: &Path, contents: &[u8], mode: BackupMode) -> Result<PathBuf> {
    let backup = backup_path(path, mode);
    fs::copy(path, &backup)
        .with_context(|| format!("Failed to back up {:?} to {:?}", path, backup))?;
    log::info!("Backup written to {:?}", backup);

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, contents).with_context(|| format!("Failed to write {:?}", tmp))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace {:?} with {:?}", path, tmp))?;

    log::info!("Collection file saved: {:?}", path);
    Ok(backup)
}
