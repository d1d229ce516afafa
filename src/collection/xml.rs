//! Position-tracking XML event scanner shared by both collection readers

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::ops::Range;

/// Parse failure with the byte offset it was detected at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlError {
    pub position: u64,
    pub message: String,
}

impl XmlError {
    pub fn new(position: u64, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

/// Wraps a quick-xml reader over an in-memory document and reports the
/// byte span of every event.
///
/// Text is not trimmed, so the spans of consecutive events tile the input
/// without gaps. Writers rely on that to splice new content between events.
pub struct Scanner<'a> {
    reader: Reader<&'a [u8]>,
    root: &'static str,
    seen_root: bool,
    root_closed: bool,
    open: Vec<Vec<u8>>,
}

impl<'a> Scanner<'a> {
    /// Create a scanner that expects `root` as the document element
    pub fn new(source: &'a [u8], root: &'static str) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.config_mut().trim_text(false);

        Self {
            reader,
            root,
            seen_root: false,
            root_closed: false,
            open: Vec::new(),
        }
    }

    /// Read the next event and its byte span, or `None` at end of input
    pub fn next_event(&mut self) -> Result<Option<(Event<'a>, Range<usize>)>, XmlError> {
        let start = self.reader.buffer_position() as usize;
        let event = self
            .reader
            .read_event()
            .map_err(|e| XmlError::new(self.reader.error_position() as u64, e.to_string()))?;
        let end = self.reader.buffer_position() as usize;

        match &event {
            Event::Start(e) | Event::Empty(e) if !self.seen_root => {
                if e.name().as_ref() != self.root.as_bytes() {
                    return Err(XmlError::new(
                        start as u64,
                        format!(
                            "expected <{}> document element, found <{}>",
                            self.root,
                            String::from_utf8_lossy(e.name().as_ref())
                        ),
                    ));
                }
                self.seen_root = true;
                match event {
                    Event::Start(_) => self.open.push(e.name().as_ref().to_vec()),
                    _ => self.root_closed = true,
                }
            }
            Event::Start(e) | Event::Empty(e) if self.root_closed => {
                return Err(XmlError::new(
                    start as u64,
                    format!(
                        "unexpected <{}> after the <{}> document element",
                        String::from_utf8_lossy(e.name().as_ref()),
                        self.root
                    ),
                ));
            }
            Event::Start(e) => self.open.push(e.name().as_ref().to_vec()),
            Event::End(_) => {
                self.open.pop();
                self.root_closed = self.open.is_empty();
            }
            Event::Eof => {
                if let Some(name) = self.open.last() {
                    return Err(XmlError::new(
                        end as u64,
                        format!("unclosed element <{}>", String::from_utf8_lossy(name)),
                    ));
                }
                if !self.seen_root {
                    return Err(XmlError::new(
                        end as u64,
                        format!("missing <{}> document element", self.root),
                    ));
                }
                return Ok(None);
            }
            _ => {}
        }

        Ok(Some((event, start..end)))
    }

    /// Build an error at the current reader position
    pub fn error(&self, message: impl Into<String>) -> XmlError {
        XmlError::new(self.reader.buffer_position() as u64, message)
    }

    /// Read and unescape an attribute value
    pub fn attribute(&self, e: &BytesStart, key: &str) -> Result<Option<String>, XmlError> {
        attribute(e, key).map_err(|err| self.error(err.to_string()))
    }

    /// Read an attribute that must be present
    pub fn required_attribute(&self, e: &BytesStart, key: &str) -> Result<String, XmlError> {
        self.attribute(e, key)?.ok_or_else(|| {
            self.error(format!(
                "<{}> is missing the {} attribute",
                String::from_utf8_lossy(e.name().as_ref()),
                key
            ))
        })
    }
}

/// Read and unescape an attribute value from a start tag
pub fn attribute(e: &BytesStart, key: &str) -> quick_xml::Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == key.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}
