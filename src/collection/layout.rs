//! Byte layout of the playlist tree inside a collection document

use anyhow::Result;
use quick_xml::events::BytesStart;
use std::ops::Range;

/// Element whose children are playlist nodes
///
/// Rekordbox folders are their own container (`NODE Type="0"`); Traktor
/// folders hold their children in a `SUBNODES` element.
#[derive(Debug, Clone)]
pub struct Container {
    /// Original start tag, rewritten when the child count changes
    pub open_tag: BytesStart<'static>,

    /// Span of the start tag (the whole element when self-closing)
    pub open_span: Range<usize>,

    /// Span of the end tag, `None` for a self-closing element
    pub close_span: Option<Range<usize>>,

    /// Child nodes in document order
    pub children: Vec<ChildNode>,
}

/// A playlist node as found in the document
#[derive(Debug, Clone)]
pub struct ChildNode {
    pub name: String,
    pub kind: NodeKind,

    /// Byte offset of the node's start tag
    pub start: usize,

    /// Where a folder keeps its children
    pub container: Option<Container>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Folder,
    Playlist,
    /// Traktor smart lists: never migrated, but their names are taken
    SmartList,
}

impl Container {
    pub fn new(open_tag: BytesStart<'static>, open_span: Range<usize>) -> Self {
        Self {
            open_tag,
            open_span,
            close_span: None,
            children: Vec::new(),
        }
    }

    /// Find a direct child by name
    pub fn child(&self, name: &str) -> Option<&ChildNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Every node name in this subtree, paired with the name of the folder
    /// holding it (`parent` for direct children), in document order
    pub fn names_in_tree<'a>(&'a self, parent: &'a str) -> Vec<(&'a str, &'a str)> {
        let mut names = Vec::new();
        self.collect_names(parent, &mut names);
        names
    }

    fn collect_names<'a>(&'a self, parent: &'a str, names: &mut Vec<(&'a str, &'a str)>) {
        for child in &self.children {
            names.push((child.name.as_str(), parent));
            if let Some(inner) = &child.container {
                inner.collect_names(&child.name, names);
            }
        }
    }

    /// Copy of the start tag with `count_attr` set to `count`
    ///
    /// Other attributes are copied as raw bytes, so they are written back
    /// exactly as they were read.
    pub fn open_tag_with_count(&self, count_attr: &str, count: usize) -> Result<BytesStart<'static>> {
        let name = std::str::from_utf8(self.open_tag.name().as_ref())?.to_string();
        let count = count.to_string();
        let mut tag = BytesStart::new(name);
        let mut replaced = false;

        for attr in self.open_tag.attributes() {
            let attr = attr?;
            if attr.key.as_ref() == count_attr.as_bytes() {
                tag.push_attribute((count_attr, count.as_str()));
                replaced = true;
            } else if attr.value.contains(&b'"') {
                // single-quoted value: re-escape so it survives double quotes
                let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
                let value = attr.unescape_value()?.into_owned();
                tag.push_attribute((key.as_str(), value.as_str()));
            } else {
                tag.push_attribute(attr);
            }
        }

        if !replaced {
            tag.push_attribute((count_attr, count.as_str()));
        }

        Ok(tag)
    }
}
