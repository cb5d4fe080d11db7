//! Domain types for the drug store
//!
//! These types are storage-agnostic - they don't know about SQLite or XML.
//! The parser produces them and the store persists and hydrates them.

use serde::{Deserialize, Serialize};

/// One canonical drug entity, keyed by its primary DrugBank id
///
/// Absent free-text fields are `None` everywhere (and `NULL` in SQLite).
/// `interactions` and `food_interactions` are populated by the parser; records
/// hydrated from the store leave them empty; use the store's fan-out queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugRecord {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub indication: Option<String>,
    pub mechanism_of_action: Option<String>,
    pub toxicity: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interactions: Vec<InteractionEdge>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub food_interactions: Vec<String>,
}

impl DrugRecord {
    /// Record with only the required fields set
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            indication: None,
            mechanism_of_action: None,
            toxicity: None,
            interactions: Vec::new(),
            food_interactions: Vec::new(),
        }
    }
}

/// Directed drug-drug interaction fact: `drug_id` interacts with the named drug
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionEdge {
    pub drug_id: String,
    pub interacting_drug_id: Option<String>, // source may omit it
    pub interacting_drug_name: String,
    pub description: Option<String>,
}

/// Row counts per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub drugs: usize,
    pub interactions: usize,
    pub food_interactions: usize,
}

/// Completion marker written as the last step of a successful ingestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub source: String,
    pub completed_at: String,
    pub records: usize,
}

/// Result of a bulk load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub records: usize,
    pub interactions: usize,
    pub food_interactions: usize,
    pub batches: usize,
}
