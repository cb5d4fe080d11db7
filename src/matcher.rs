//! Fuzzy drug name resolution
//!
//! Resolves a user-supplied name (brand name, partial name, colloquial term)
//! to one canonical record by trying increasingly permissive strategies and
//! stopping at the first hit:
//!
//! 1. exact, case-insensitive
//! 2. name starts with the term ("aspirin" -> "Aspirin 81mg Tablet")
//! 3. term starts a later word ("aspirin" -> "Low Dose Aspirin")
//! 4. synonym table, then prefix on the translated stem
//! 5. term anywhere in the name
//!
//! The order is significant: a plain substring hit ("Nitroaspirin") is only
//! accepted once every more specific tier came back empty.

use crate::error::Result;
use crate::store::{DrugRecord, DrugStore, NamePattern};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Which tier produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    Prefix,
    WordBoundary,
    Synonym,
    Substring,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTier::Exact => "exact",
            MatchTier::Prefix => "prefix",
            MatchTier::WordBoundary => "word_boundary",
            MatchTier::Synonym => "synonym",
            MatchTier::Substring => "substring",
        }
    }
}

/// A resolved record and the tier that found it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameMatch {
    pub record: DrugRecord,
    pub tier: MatchTier,
}

/// Colloquial or brand term -> generic/chemical name stem
#[derive(Debug, Clone)]
pub struct SynonymTable {
    entries: BTreeMap<String, String>,
}

impl Default for SynonymTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.insert("aspirin", "acetylsalicylic");
        table.insert("ibuprofen", "isobutylphenylpropionic");
        table.insert("tylenol", "acetaminophen");
        table.insert("paracetamol", "acetaminophen");
        table
    }
}

impl SynonymTable {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Add or replace an entry; keys are matched case-insensitively
    pub fn insert(&mut self, term: &str, stem: &str) {
        self.entries
            .insert(term.trim().to_lowercase(), stem.trim().to_string());
    }

    pub fn extend<'a, I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (term, stem) in entries {
            self.insert(term, stem);
        }
    }

    pub fn get(&self, term: &str) -> Option<&str> {
        self.entries
            .get(&term.trim().to_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Tiered name resolver over a [`DrugStore`]
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    synonyms: SynonymTable,
}

impl Matcher {
    pub fn new(synonyms: SynonymTable) -> Self {
        Self { synonyms }
    }

    pub fn synonyms(&self) -> &SynonymTable {
        &self.synonyms
    }

    /// Best single record for `name`, or `None`
    pub fn resolve(&self, store: &DrugStore, name: &str) -> Result<Option<DrugRecord>> {
        Ok(self.resolve_match(store, name)?.map(|m| m.record))
    }

    /// Like [`Matcher::resolve`], also reporting which tier matched
    pub fn resolve_match(&self, store: &DrugStore, name: &str) -> Result<Option<NameMatch>> {
        let term = name.trim();
        if term.is_empty() {
            return Ok(None);
        }

        let found = if let Some(record) = store.get_by_name(term)? {
            Some((record, MatchTier::Exact))
        } else if let Some(record) = store.first_name_match(NamePattern::Prefix(term))? {
            Some((record, MatchTier::Prefix))
        } else if let Some(record) = store.first_name_match(NamePattern::WordBoundary(term))? {
            Some((record, MatchTier::WordBoundary))
        } else if let Some(record) = self.synonym_match(store, term)? {
            Some((record, MatchTier::Synonym))
        } else {
            store
                .first_name_match(NamePattern::Substring(term))?
                .map(|record| (record, MatchTier::Substring))
        };

        match &found {
            Some((record, tier)) => debug!(
                "Resolved '{}' to {} ({}) via {} match",
                term,
                record.id,
                record.name,
                tier.as_str()
            ),
            None => debug!("No drug record matches '{}'", term),
        }

        Ok(found.map(|(record, tier)| NameMatch { record, tier }))
    }

    fn synonym_match(&self, store: &DrugStore, term: &str) -> Result<Option<DrugRecord>> {
        match self.synonyms.get(term) {
            Some(stem) => store.first_name_match(NamePattern::Prefix(stem)),
            None => Ok(None),
        }
    }
}
