//! The ancestor data-source boundary.
//!
//! The remote genealogy service is consumed as a batch person lookup:
//! one request per generation expansion, a flat list of person records
//! back. Implementations wrap whatever transport the host has; the rest
//! of the engine never sees it.

use std::collections::HashMap;

use crate::person::{Person, PersonId};

/// Error from the external data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Transport-level failure (network down, timeout, 5xx).
    Network(String),
    /// The response arrived but could not be decoded.
    Malformed(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Network(detail) => write!(f, "Data source unreachable: {}", detail),
            SourceError::Malformed(detail) => write!(f, "Bad data source response: {}", detail),
        }
    }
}

impl std::error::Error for SourceError {}

/// A batch person lookup against the remote service.
pub trait AncestorSource {
    fn fetch_persons(&mut self, ids: &[PersonId]) -> Result<Vec<Person>, SourceError>;
}

/// Decode a wire response: a JSON array of person records.
pub fn parse_person_response(json: &str) -> Result<Vec<Person>, SourceError> {
    serde_json::from_str(json).map_err(|e| SourceError::Malformed(e.to_string()))
}

/// In-memory source for tests and the headless harness.
#[derive(Debug, Default)]
pub struct StaticSource {
    records: HashMap<PersonId, Person>,
    /// When set, every fetch fails with this error.
    pub fail_with: Option<SourceError>,
    /// Requests answered so far; lets tests assert batching behavior.
    pub requests_served: u32,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = Person>) -> Self {
        let mut source = Self::new();
        for person in records {
            source.insert(person);
        }
        source
    }

    /// Build from a JSON fixture in the wire format.
    pub fn from_json(json: &str) -> Result<Self, SourceError> {
        Ok(Self::from_records(parse_person_response(json)?))
    }

    pub fn insert(&mut self, person: Person) {
        self.records.insert(person.id.clone(), person);
    }

    pub fn get(&self, id: &str) -> Option<&Person> {
        self.records.get(id)
    }
}

impl AncestorSource for StaticSource {
    fn fetch_persons(&mut self, ids: &[PersonId]) -> Result<Vec<Person>, SourceError> {
        if let Some(error) = &self.fail_with {
            return Err(error.clone());
        }
        self.requests_served += 1;
        Ok(ids
            .iter()
            .filter_map(|id| self.records.get(id))
            .cloned()
            .collect())
    }
}
