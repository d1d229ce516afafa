//! Collection documents and the per-format dialect interface
//!
//! A [`Collection`] keeps the original file bytes next to the parsed
//! library, so that writing back only touches the playlist container that
//! receives new nodes.

pub mod layout;
pub mod xml;

use crate::error::MigrationError;
use crate::model::{Library, PlaylistNode};
use crate::rekordbox::Rekordbox;
use crate::traktor::Traktor;
use anyhow::{Context, Result};
use layout::Container;
use std::fs;
use std::path::{Path, PathBuf};
use xml::XmlError;

/// Result of parsing a collection document
#[derive(Debug, Clone)]
pub struct ParsedCollection {
    pub library: Library,

    /// Playlist root container
    pub root: Container,
}

/// What a collection format has to provide
pub trait Dialect: Sync {
    /// Display name of the DJ application
    fn name(&self) -> &'static str;

    /// Name of the playlist root node as shown in errors
    fn root_label(&self) -> &'static str;

    /// Parse a complete collection document
    fn parse(&self, source: &[u8]) -> Result<ParsedCollection, XmlError>;

    /// Attribute on a container's start tag that holds its child count
    fn count_attribute(&self) -> &'static str;

    /// Application-managed playlists that are neither migrated nor displaced
    fn is_system_node(&self, _name: &str) -> bool {
        false
    }

    /// Serialize playlist nodes whose entries already hold this format's
    /// track references. `parent_path` is the slash-separated path of the
    /// folder receiving them.
    fn render(&self, nodes: &[PlaylistNode], parent_path: &str) -> Result<Vec<u8>>;
}

/// Supported collection formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// Rekordbox XML (rekordbox.xml)
    Rekordbox,
    /// Traktor NML (collection.nml)
    Traktor,
}

static REKORDBOX: Rekordbox = Rekordbox;
static TRAKTOR: Traktor = Traktor;

impl Format {
    /// Guess the format from the file extension
    pub fn detect(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());

        match extension.as_deref() {
            Some("nml") => Ok(Format::Traktor),
            Some("xml") => Ok(Format::Rekordbox),
            _ => Err(MigrationError::UnknownFormat(path.to_path_buf()).into()),
        }
    }

    pub fn dialect(self) -> &'static dyn Dialect {
        match self {
            Format::Rekordbox => &REKORDBOX,
            Format::Traktor => &TRAKTOR,
        }
    }
}

/// A parsed collection document
#[derive(Debug, Clone)]
pub struct Collection {
    path: PathBuf,
    format: Format,
    source: Vec<u8>,
    library: Library,
    root: Container,
}

impl Collection {
    /// Read and parse a collection file
    pub fn open(path: &Path, format: Format) -> Result<Self> {
        log::info!("Loading {} collection from {:?}", format.dialect().name(), path);

        let source = fs::read(path)
            .with_context(|| format!("Failed to open collection: {:?}", path))?;

        Self::from_bytes(path, format, source)
    }

    /// Parse a collection from bytes already in memory
    pub fn from_bytes(path: impl Into<PathBuf>, format: Format, source: Vec<u8>) -> Result<Self> {
        let path = path.into();
        let parsed = format
            .dialect()
            .parse(&source)
            .map_err(|e| MigrationError::Parse {
                path: path.clone(),
                position: e.position,
                message: e.message,
            })?;

        log::info!(
            "Loaded {} collection: {} tracks, {} playlists",
            format.dialect().name(),
            parsed.library.track_count(),
            parsed.library.playlist_count()
        );

        Ok(Self {
            path,
            format,
            source,
            library: parsed.library,
            root: parsed.root,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Original document bytes
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Byte layout of the playlist root
    pub fn root(&self) -> &Container {
        &self.root
    }
}
