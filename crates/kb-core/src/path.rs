//! # Document Addressing
//!
//! Documents live at even-length segment paths (`cards/C1/members/u1`),
//! collections at odd-length ones (`cards/C1/members`).

use std::fmt;

use crate::error::{AppError, Result};

pub const LISTS: &str = "lists";
pub const CARDS: &str = "cards";
pub const MEMBERS: &str = "members";
pub const MESSAGES: &str = "messages";
pub const CONTENTS: &str = "contents";

fn check_segment(segment: &str) -> Result<()> {
    if segment.is_empty() || segment.contains('/') {
        return Err(AppError::store(format!("invalid path segment {segment:?}")));
    }
    Ok(())
}

/// Address of a collection of documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath {
    segments: Vec<String>,
}

/// Address of a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath {
    segments: Vec<String>,
}

impl CollectionPath {
    /// A top-level collection such as `lists`.
    pub fn root(name: &str) -> Result<Self> {
        check_segment(name)?;
        Ok(Self { segments: vec![name.to_string()] })
    }

    pub fn doc(&self, id: &str) -> Result<DocPath> {
        check_segment(id)?;
        let mut segments = self.segments.clone();
        segments.push(id.to_string());
        Ok(DocPath { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl DocPath {
    /// `{collection}/{id}` at the top level.
    pub fn root(collection: &str, id: &str) -> Result<Self> {
        CollectionPath::root(collection)?.doc(id)
    }

    /// A sub-collection owned by this document.
    pub fn collection(&self, name: &str) -> Result<CollectionPath> {
        check_segment(name)?;
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Ok(CollectionPath { segments })
    }

    /// The last segment.
    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// The collection this document belongs to.
    pub fn parent(&self) -> CollectionPath {
        CollectionPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

// Shorthands for the board's fixed layout.

pub fn list_doc(id: &str) -> Result<DocPath> {
    DocPath::root(LISTS, id)
}

pub fn card_doc(id: &str) -> Result<DocPath> {
    DocPath::root(CARDS, id)
}

pub fn members_of(card_id: &str) -> Result<CollectionPath> {
    card_doc(card_id)?.collection(MEMBERS)
}

pub fn message_doc(card_id: &str) -> Result<DocPath> {
    DocPath::root(MESSAGES, card_id)
}

pub fn contents_of(card_id: &str) -> Result<CollectionPath> {
    message_doc(card_id)?.collection(CONTENTS)
}
