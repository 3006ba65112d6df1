//! Redaction records in document-native units
//!
//! These are what the vector export consumes. They come from two places:
//! marks drawn on the rendered pages (converted through each page's scale
//! factor) and manual entries added to a [`RedactionLog`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placement of a redaction in PDF user space (points, bottom-left origin)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Redaction {
    pub id: String,
    /// 1-based page number. Signed so that bad input survives deserializing
    /// and is rejected by the export with a proper error.
    pub page: i64,
    pub coordinates: Coordinates,
}

impl Redaction {
    pub fn new(page: i64, coordinates: Coordinates) -> Self {
        Self {
            id: new_id(),
            page,
            coordinates,
        }
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Ordered list of manually added redactions
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RedactionLog {
    redactions: Vec<Redaction>,
}

impl RedactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, page: i64, coordinates: Coordinates) -> String {
        let redaction = Redaction::new(page, coordinates);
        let id = redaction.id.clone();
        self.redactions.push(redaction);
        id
    }

    /// Append a record as-is, keeping its id.
    pub fn push(&mut self, redaction: Redaction) {
        self.redactions.push(redaction);
    }

    pub fn remove(&mut self, id: &str) -> bool {
        if let Some(pos) = self.redactions.iter().position(|r| r.id == id) {
            self.redactions.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn all(&self) -> &[Redaction] {
        &self.redactions
    }

    pub fn for_page(&self, page: i64) -> Vec<&Redaction> {
        self.redactions.iter().filter(|r| r.page == page).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.redactions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.redactions.len()
    }

    pub fn clear(&mut self) {
        self.redactions.clear();
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
