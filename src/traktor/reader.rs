//! Traktor collection (collection.nml) parser

use super::{location_from_parts, mac_volume, ROOT_NAME};
use crate::collection::layout::{ChildNode, Container, NodeKind};
use crate::collection::xml::{Scanner, XmlError};
use crate::collection::ParsedCollection;
use crate::model::{Folder, Library, Playlist, PlaylistNode, Track};
use quick_xml::events::{BytesStart, Event};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Outside,
    Collection,
    Playlists,
}

/// Collection ENTRY being read
#[derive(Debug, Default)]
struct PendingEntry {
    title: String,
    artist: String,
    volume: String,
    dir: String,
    file: Option<String>,
    bitrate_kbps: Option<u32>,
    playtime_secs: Option<u32>,
}

/// Playlist node being read
enum Frame {
    Folder {
        folder: Folder,
        /// SUBNODES element, once seen
        container: Option<Container>,
        start: usize,
    },
    Playlist {
        playlist: Playlist,
        start: usize,
    },
    /// Smart lists and unknown node types
    Other {
        name: String,
        start: usize,
    },
}

struct TraktorReader {
    library: Library,
    section: Section,
    pending: Option<PendingEntry>,
    frames: Vec<Frame>,
    root: Option<Container>,
}

/// Parse collection.nml into tracks, playlists and the playlist root layout
pub fn parse_collection(source: &[u8]) -> Result<ParsedCollection, XmlError> {
    let mut scanner = Scanner::new(source, "NML");
    let mut reader = TraktorReader {
        library: Library::new(),
        section: Section::Outside,
        pending: None,
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

    let root = reader.root.ok_or_else(|| {
        scanner.error(format!("no {} folder found under PLAYLISTS", ROOT_NAME))
    })?;

    log::debug!(
        "Parsed Traktor collection: {} tracks, {} top-level nodes",
        reader.library.track_count(),
        root.children.len()
    );

    Ok(ParsedCollection {
        library: reader.library,
        root,
    })
}

impl TraktorReader {
    fn open(&mut self, scanner: &Scanner, e: &BytesStart, span: Range<usize>) -> Result<(), XmlError> {
        match (self.section, e.name().as_ref()) {
            (Section::Outside, b"COLLECTION") => self.section = Section::Collection,
            (Section::Outside, b"PLAYLISTS") => self.section = Section::Playlists,

            (Section::Collection, b"ENTRY") => {
                self.pending = Some(PendingEntry {
                    title: scanner.attribute(e, "TITLE")?.unwrap_or_default(),
                    artist: scanner.attribute(e, "ARTIST")?.unwrap_or_default(),
                    ..PendingEntry::default()
                });
            }
            (Section::Collection, b"LOCATION") => {
                if let Some(entry) = self.pending.as_mut() {
                    entry.volume = scanner.attribute(e, "VOLUME")?.unwrap_or_default();
                    entry.dir = scanner.attribute(e, "DIR")?.unwrap_or_default();
                    entry.file = scanner.attribute(e, "FILE")?;
                }
            }
            (Section::Collection, b"INFO") => {
                if let Some(entry) = self.pending.as_mut() {
                    // BITRATE is in bits per second
                    entry.bitrate_kbps = scanner
                        .attribute(e, "BITRATE")?
                        .and_then(|v| v.parse::<u32>().ok())
                        .map(|bps| bps / 1000);
                    entry.playtime_secs = scanner
                        .attribute(e, "PLAYTIME")?
                        .and_then(|v| v.parse().ok());
                }
            }

            (Section::Playlists, b"NODE") => {
                let name = scanner.attribute(e, "NAME")?.unwrap_or_default();
                let frame = match scanner.attribute(e, "TYPE")?.as_deref() {
                    Some("FOLDER") => Frame::Folder {
                        folder: Folder::new(name),
                        container: None,
                        start: span.start,
                    },
                    Some("PLAYLIST") => Frame::Playlist {
                        playlist: Playlist::new(name),
                        start: span.start,
                    },
                    _ => Frame::Other {
                        name,
                        start: span.start,
                    },
                };
                self.frames.push(frame);
            }
            (Section::Playlists, b"SUBNODES") => match self.frames.last_mut() {
                Some(Frame::Folder {
                    folder, container, ..
                }) => {
                    if container.is_some() {
                        return Err(scanner.error(format!(
                            "folder '{}' has more than one SUBNODES element",
                            folder.name
                        )));
                    }
                    *container = Some(Container::new(e.clone().into_owned(), span));
                }
                _ => return Err(scanner.error("SUBNODES outside of a folder NODE")),
            },
            (Section::Playlists, b"PRIMARYKEY") => {
                if let Some(Frame::Playlist { playlist, .. }) = self.frames.last_mut() {
                    if scanner.attribute(e, "TYPE")?.as_deref() == Some("TRACK") {
                        let key = scanner.required_attribute(e, "KEY")?;
                        playlist.add_track(key);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, scanner: &Scanner, name: &[u8], span: Option<Range<usize>>) -> Result<(), XmlError> {
        match (self.section, name) {
            (Section::Collection, b"COLLECTION") | (Section::Playlists, b"PLAYLISTS") => {
                self.section = Section::Outside;
            }
            (Section::Collection, b"ENTRY") => {
                if let Some(entry) = self.pending.take() {
                    self.finish_entry(entry);
                }
            }
            (Section::Playlists, b"SUBNODES") => {
                if let Some(Frame::Folder {
                    container: Some(container),
                    ..
                }) = self.frames.last_mut()
                {
                    container.close_span = span;
                }
            }
            (Section::Playlists, b"NODE") => {
                let frame = self
                    .frames
                    .pop()
                    .ok_or_else(|| scanner.error("unbalanced NODE element"))?;

                let (node, child) = match frame {
                    Frame::Folder {
                        folder,
                        container,
                        start,
                    } => {
                        let child = ChildNode {
                            name: folder.name.clone(),
                            kind: NodeKind::Folder,
                            start,
                            container,
                        };
                        (Some(PlaylistNode::Folder(folder)), child)
                    }
                    Frame::Playlist { playlist, start } => {
                        let child = ChildNode {
                            name: playlist.name.clone(),
                            kind: NodeKind::Playlist,
                            start,
                            container: None,
                        };
                        (Some(PlaylistNode::Playlist(playlist)), child)
                    }
                    Frame::Other { name, start } => {
                        log::debug!("Skipping smart list '{}'", name);
                        let child = ChildNode {
                            name,
                            kind: NodeKind::SmartList,
                            start,
                            container: None,
                        };
                        (None, child)
                    }
                };

                self.attach(scanner, node, child)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Hand a finished node to its parent folder, or make it the root
    fn attach(
        &mut self,
        scanner: &Scanner,
        node: Option<PlaylistNode>,
        child: ChildNode,
    ) -> Result<(), XmlError> {
        match self.frames.last_mut() {
            Some(Frame::Folder {
                folder, container, ..
            }) => {
                let container = container.as_mut().ok_or_else(|| {
                    scanner.error(format!("folder '{}' has nodes outside SUBNODES", folder.name))
                })?;
                container.children.push(child);
                if let Some(node) = node {
                    folder.children.push(node);
                }
                Ok(())
            }
            Some(Frame::Playlist { playlist, .. }) => Err(scanner.error(format!(
                "playlist '{}' contains a child NODE",
                playlist.name
            ))),
            Some(Frame::Other { .. }) => Ok(()),
            None => {
                if self.root.is_some() {
                    return Err(scanner.error("more than one root NODE under PLAYLISTS"));
                }
                match (node, child.container) {
                    (Some(PlaylistNode::Folder(folder)), Some(container)) => {
                        for node in folder.children {
                            self.library.add_playlist(node);
                        }
                        self.root = Some(container);
                        Ok(())
                    }
                    (Some(PlaylistNode::Folder(_)), None) => Err(scanner.error(format!(
                        "{} folder has no SUBNODES element",
                        ROOT_NAME
                    ))),
                    _ => Err(scanner.error(format!(
                        "the root NODE under PLAYLISTS must be the {} folder",
                        ROOT_NAME
                    ))),
                }
            }
        }
    }

    fn finish_entry(&mut self, entry: PendingEntry) {
        let Some(file) = entry.file else {
            log::warn!(
                "Skipping collection entry without a file location: {} - {}",
                entry.artist,
                entry.title
            );
            return;
        };

        let track = Track {
            // Playlist PRIMARYKEYs reference VOLUME + DIR + FILE
            id: format!("{}{}{}", entry.volume, entry.dir, file),
            title: entry.title,
            artist: entry.artist,
            location: Some(location_from_parts(&entry.volume, &entry.dir, &file)),
            volume: mac_volume(&entry.volume),
            duration_secs: entry.playtime_secs,
            bitrate_kbps: entry.bitrate_kbps,
        };

        log::debug!("Track {}: {}", track.id, track.describe());
        self.library.add_track(track);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no" ?>
<NML VERSION="19"><HEAD COMPANY="www.native-instruments.com" PROGRAM="Traktor"></HEAD>
<COLLECTION ENTRIES="2"><ENTRY TITLE="Brainchild (Original)" ARTIST="Nostrum"><LOCATION DIR="/:Users/:Nono/:Music/:MIX/:HARDTRANCE/:" FILE="nostrum-brainchild-1996.mp3" VOLUME="C:" VOLUMEID="32a20fa3"></LOCATION>
<INFO BITRATE="230000" PLAYTIME="450"></INFO>
</ENTRY>
<ENTRY TITLE="Time" ARTIST="Hans Zimmer"><LOCATION DIR="/:Users/:dj/:Music/:" FILE="Time.mp3" VOLUME="Macintosh HD" VOLUMEID="Macintosh HD"></LOCATION>
</ENTRY>
<ENTRY TITLE="Stream"></ENTRY>
</COLLECTION>
<PLAYLISTS><NODE TYPE="FOLDER" NAME="$ROOT"><SUBNODES COUNT="4">
<NODE TYPE="PLAYLIST" NAME="Trance"><PLAYLIST ENTRIES="2" TYPE="LIST" UUID="b5db9c6746634c1890bb53becfe90ad5"><ENTRY><PRIMARYKEY TYPE="TRACK" KEY="Macintosh HD/:Users/:dj/:Music/:Time.mp3"></PRIMARYKEY>
</ENTRY>
<ENTRY><PRIMARYKEY TYPE="TRACK" KEY="C:/:Users/:Nono/:Music/:MIX/:HARDTRANCE/:nostrum-brainchild-1996.mp3"></PRIMARYKEY>
</ENTRY>
</PLAYLIST>
</NODE>
<NODE TYPE="FOLDER" NAME="Gigs"><SUBNODES COUNT="1">
<NODE TYPE="PLAYLIST" NAME="Opening"><PLAYLIST ENTRIES="0" TYPE="LIST" UUID="0f4e1a6c5b2d4e7f8a9b0c1d2e3f4a5b"></PLAYLIST>
</NODE>
</SUBNODES>
</NODE>
<NODE TYPE="SMARTLIST" NAME="Recent"><SMARTLIST UUID="aa"><SEARCH_EXPRESSION VERSION="1" QUERY="$IMPORTDATE &gt; 30"></SEARCH_EXPRESSION>
</SMARTLIST>
</NODE>
<NODE TYPE="PLAYLIST" NAME="_LOOPS"><PLAYLIST ENTRIES="0" TYPE="LIST" UUID="c1"></PLAYLIST>
</NODE>
</SUBNODES>
</NODE>
</PLAYLISTS>
</NML>
"#;

    #[test]
    fn test_parse_tracks() {
        let parsed = parse_collection(SAMPLE.as_bytes()).unwrap();
        let library = &parsed.library;

        // The entry without LOCATION is skipped
        assert_eq!(library.track_count(), 2);

        let track = library
            .get_track("C:/:Users/:Nono/:Music/:MIX/:HARDTRANCE/:nostrum-brainchild-1996.mp3")
            .unwrap();
        assert_eq!(track.title, "Brainchild (Original)");
        assert_eq!(
            track.location.as_deref(),
            Some("C:/Users/Nono/Music/MIX/HARDTRANCE/nostrum-brainchild-1996.mp3")
        );
        assert_eq!(track.bitrate_kbps, Some(230));
        assert_eq!(track.duration_secs, Some(450));

        let mac = library
            .get_track("Macintosh HD/:Users/:dj/:Music/:Time.mp3")
            .unwrap();
        assert_eq!(mac.location.as_deref(), Some("/Users/dj/Music/Time.mp3"));
    }

    #[test]
    fn test_parse_playlist_tree() {
        let parsed = parse_collection(SAMPLE.as_bytes()).unwrap();
        let names: Vec<&str> = parsed.library.playlists().iter().map(|n| n.name()).collect();

        // Smart lists are not part of the playlist tree
        assert_eq!(names, vec!["Trance", "Gigs", "_LOOPS"]);

        let PlaylistNode::Playlist(trance) = &parsed.library.playlists()[0] else {
            panic!("expected a playlist");
        };
        assert_eq!(trance.len(), 2);
        assert_eq!(
            trance.entries[0].track_id,
            "Macintosh HD/:Users/:dj/:Music/:Time.mp3"
        );

        let PlaylistNode::Folder(gigs) = &parsed.library.playlists()[1] else {
            panic!("expected a folder");
        };
        assert_eq!(gigs.children[0].name(), "Opening");
    }

    #[test]
    fn test_root_layout() {
        let parsed = parse_collection(SAMPLE.as_bytes()).unwrap();
        let root = &parsed.root;

        assert_eq!(&SAMPLE[root.open_span.clone()], r#"<SUBNODES COUNT="4">"#);
        assert_eq!(&SAMPLE[root.close_span.clone().unwrap()], "</SUBNODES>");

        let kinds: Vec<NodeKind> = root.children.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Playlist,
                NodeKind::Folder,
                NodeKind::SmartList,
                NodeKind::Playlist
            ]
        );
        let loops = root.child("_LOOPS").unwrap();
        assert!(SAMPLE[loops.start..].starts_with(r#"<NODE TYPE="PLAYLIST" NAME="_LOOPS">"#));
        assert!(root.child("Gigs").unwrap().container.is_some());
    }

    #[test]
    fn test_root_without_subnodes_is_an_error() {
        let source = r#"<NML VERSION="19"><PLAYLISTS><NODE TYPE="FOLDER" NAME="$ROOT"></NODE></PLAYLISTS></NML>"#;
        let err = parse_collection(source.as_bytes()).unwrap_err();
        assert!(err.message.contains("SUBNODES"));
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        let source = r#"<NML VERSION="19"><COLLECTION><ENTRY TITLE="x"></COLLECTION></NML>"#;
        assert!(parse_collection(source.as_bytes()).is_err());
    }
}
