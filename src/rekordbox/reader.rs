//! Rekordbox collection (rekordbox.xml) parser

use super::location_from_uri;
use crate::collection::layout::{ChildNode, Container, NodeKind};
use crate::collection::xml::{Scanner, XmlError};
use crate::collection::ParsedCollection;
use crate::model::{Folder, Library, Playlist, PlaylistNode, Track};
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Outside,
    Collection,
    Playlists,
}

/// Playlist node being read
enum Frame {
    Folder {
        folder: Folder,
        container: Container,
        start: usize,
    },
    Playlist {
        playlist: Playlist,
        /// KeyType="1": entries reference tracks by Location
        keyed_by_location: bool,
        start: usize,
    },
}

struct RekordboxReader {
    library: Library,
    location_to_id: HashMap<String, String>,
    section: Section,
    frames: Vec<Frame>,
    root: Option<Container>,
}

/// Parse rekordbox.xml into tracks, playlists and the playlist root layout
pub fn parse_collection(source: &[u8]) -> Result<ParsedCollection, XmlError> {
    let mut scanner = Scanner::new(source, "DJ_PLAYLISTS");
    let mut reader = RekordboxReader {
        library: Library::new(),
        location_to_id: HashMap::new(),
        section: Section::Outside,
        frames: Vec::new(),
        root: None,
    };

    while let Some((event, span)) = scanner.next_event()? {
        match event {
            Event::Start(e) => reader.open(&scanner, &e, span)?,
            Event::Empty(e) => {
                reader.open(&scanner, &e, span)?;
                reader.close(&scanner, e.name().as_ref(), None)?;
            }
            Event::End(e) => reader.close(&scanner, e.name().as_ref(), Some(span))?,
            _ => {}
        }
    }

    let root = reader
        .root
        .ok_or_else(|| scanner.error("no playlist ROOT node found under PLAYLISTS"))?;

    log::debug!(
        "Parsed Rekordbox collection: {} tracks, {} top-level nodes",
        reader.library.track_count(),
        root.children.len()
    );

    Ok(ParsedCollection {
        library: reader.library,
        root,
    })
}

impl RekordboxReader {
    fn open(&mut self, scanner: &Scanner, e: &BytesStart, span: Range<usize>) -> Result<(), XmlError> {
        match e.name().as_ref() {
            b"COLLECTION" => self.section = Section::Collection,
            b"PLAYLISTS" => self.section = Section::Playlists,
            b"TRACK" => match self.frames.last_mut() {
                Some(Frame::Playlist {
                    playlist,
                    keyed_by_location,
                    ..
                }) => {
                    let key = scanner.required_attribute(e, "Key")?;
                    let track_id = if *keyed_by_location {
                        let location = location_from_uri(&key);
                        self.location_to_id.get(&location).cloned().unwrap_or(key)
                    } else {
                        key
                    };
                    playlist.add_track(track_id);
                }
                Some(Frame::Folder { folder, .. }) => {
                    return Err(scanner.error(format!(
                        "folder '{}' contains a TRACK entry",
                        folder.name
                    )));
                }
                None if self.section == Section::Collection => self.read_track(scanner, e)?,
                None => {}
            },
            b"NODE" if self.section == Section::Playlists => {
                let name = scanner.attribute(e, "Name")?.unwrap_or_default();
                let node_type = scanner.attribute(e, "Type")?;

                let frame = match node_type.as_deref() {
                    Some("0") => Frame::Folder {
                        folder: Folder::new(name),
                        container: Container::new(e.clone().into_owned(), span.clone()),
                        start: span.start,
                    },
                    Some("1") => Frame::Playlist {
                        playlist: Playlist::new(name),
                        keyed_by_location: scanner.attribute(e, "KeyType")?.as_deref() == Some("1"),
                        start: span.start,
                    },
                    other => {
                        return Err(scanner.error(format!(
                            "NODE '{}' has unknown Type {:?}",
                            name, other
                        )));
                    }
                };
                self.frames.push(frame);
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, scanner: &Scanner, name: &[u8], span: Option<Range<usize>>) -> Result<(), XmlError> {
        match name {
            b"COLLECTION" | b"PLAYLISTS" => self.section = Section::Outside,
            b"NODE" if self.section == Section::Playlists => {
                let frame = self
                    .frames
                    .pop()
                    .ok_or_else(|| scanner.error("unbalanced NODE element"))?;

                let (node, child) = match frame {
                    Frame::Folder {
                        folder,
                        mut container,
                        start,
                    } => {
                        container.close_span = span;
                        let child = ChildNode {
                            name: folder.name.clone(),
                            kind: NodeKind::Folder,
                            start,
                            container: Some(container),
                        };
                        (PlaylistNode::Folder(folder), child)
                    }
                    Frame::Playlist { playlist, start, .. } => {
                        let child = ChildNode {
                            name: playlist.name.clone(),
                            kind: NodeKind::Playlist,
                            start,
                            container: None,
                        };
                        (PlaylistNode::Playlist(playlist), child)
                    }
                };

                self.attach(scanner, node, child)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Hand a finished node to its parent folder, or make it the root
    fn attach(&mut self, scanner: &Scanner, node: PlaylistNode, child: ChildNode) -> Result<(), XmlError> {
        match self.frames.last_mut() {
            Some(Frame::Folder {
                folder, container, ..
            }) => {
                folder.children.push(node);
                container.children.push(child);
                Ok(())
            }
            Some(Frame::Playlist { playlist, .. }) => Err(scanner.error(format!(
                "playlist '{}' contains a child NODE",
                playlist.name
            ))),
            None => {
                if self.root.is_some() {
                    return Err(scanner.error("more than one root NODE under PLAYLISTS"));
                }
                match (node, child.container) {
                    (PlaylistNode::Folder(folder), Some(container)) => {
                        for node in folder.children {
                            self.library.add_playlist(node);
                        }
                        self.root = Some(container);
                        Ok(())
                    }
                    _ => Err(scanner.error("the root NODE under PLAYLISTS must be a folder")),
                }
            }
        }
    }

    fn read_track(&mut self, scanner: &Scanner, e: &BytesStart) -> Result<(), XmlError> {
        let Some(id) = scanner.attribute(e, "TrackID")? else {
            log::warn!("Skipping collection TRACK without TrackID");
            return Ok(());
        };

        let track = Track {
            id,
            title: scanner.attribute(e, "Name")?.unwrap_or_default(),
            artist: scanner.attribute(e, "Artist")?.unwrap_or_default(),
            location: scanner
                .attribute(e, "Location")?
                .map(|uri| location_from_uri(&uri)),
            volume: None,
            duration_secs: scanner
                .attribute(e, "TotalTime")?
                .and_then(|v| v.parse().ok()),
            bitrate_kbps: scanner
                .attribute(e, "BitRate")?
                .and_then(|v| v.parse().ok()),
        };

        if let Some(location) = &track.location {
            self.location_to_id
                .entry(location.clone())
                .or_insert_with(|| track.id.clone());
        }

        log::debug!("Track {}: {}", track.id, track.describe());
        self.library.add_track(track);
        Ok(())
    }
}
