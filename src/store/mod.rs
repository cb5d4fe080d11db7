//! Drug store - SQLite persistence and query surface
//!
//! Three related tables hold the ingested dump:
//! - `drugs` - one canonical record per primary id
//! - `drug_interactions` - directed edges, queried symmetrically
//! - `food_interactions` - opaque per-drug notes
//!
//! # Example
//!
//! ```no_run
//! use drugstore::store::DrugStore;
//!
//! let store = DrugStore::open("data/drugbank.db")?;
//! if let Some(drug) = store.get_by_name("warfarin")? {
//!     let edges = store.get_interactions_for(&drug.id)?;
//!     println!("{} has {} interactions", drug.name, edges.len());
//! }
//! # Ok::<(), drugstore::Error>(())
//! ```

pub mod schema;
pub mod types;

pub use types::{Completion, DrugRecord, InteractionEdge, LoadSummary, StoreStats};

use crate::db::SqliteDatabase;
use crate::error::{Error, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::{debug, info};

const DRUG_COLUMNS: &str = "id, name, description, indication, mechanism_of_action, toxicity";
const EDGE_COLUMNS: &str = "drug_id, interacting_drug_id, interacting_drug_name, description";

/// Looks up the first edge between two drugs in either direction.
///
/// An edge points at `?2` when its `interacting_drug_id` is `?2`, or when the
/// id is absent and its name equals `?2`'s canonical name. Ordering prefers
/// the `?1 -> ?2` direction, then id matches over name matches, then
/// insertion order.
const PAIR_EDGE_SQL: &str = "
    SELECT e.drug_id, e.interacting_drug_id, e.interacting_drug_name, e.description
    FROM drug_interactions e
    WHERE (e.drug_id = ?1 AND (e.interacting_drug_id = ?2
            OR (e.interacting_drug_id IS NULL
                AND e.interacting_drug_name = (SELECT name FROM drugs WHERE id = ?2) COLLATE NOCASE)))
       OR (e.drug_id = ?2 AND (e.interacting_drug_id = ?1
            OR (e.interacting_drug_id IS NULL
                AND e.interacting_drug_name = (SELECT name FROM drugs WHERE id = ?1) COLLATE NOCASE)))
    ORDER BY (e.drug_id = ?2), (e.interacting_drug_id IS NULL), e.id
    LIMIT 1";

/// Name pattern for the fuzzy lookup tiers
///
/// The term is matched literally: `%`, `_` and `\` are escaped before they
/// reach `LIKE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePattern<'a> {
    /// Name starts with the term
    Prefix(&'a str),
    /// Term starts a word after a space
    WordBoundary(&'a str),
    /// Term anywhere in the name
    Substring(&'a str),
}

impl NamePattern<'_> {
    fn like_pattern(&self) -> String {
        match self {
            NamePattern::Prefix(term) => format!("{}%", escape_like(term)),
            NamePattern::WordBoundary(term) => format!("% {}%", escape_like(term)),
            NamePattern::Substring(term) => format!("%{}%", escape_like(term)),
        }
    }

    fn term(&self) -> &str {
        match self {
            NamePattern::Prefix(term)
            | NamePattern::WordBoundary(term)
            | NamePattern::Substring(term) => term,
        }
    }
}

/// Escape LIKE special characters so the term is matched literally
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// SQLite-backed drug store
pub struct DrugStore {
    db: SqliteDatabase,
}

impl DrugStore {
    /// Create (or reopen for writing) a store file and ensure the schema exists
    ///
    /// Used by ingestion. Readers should use [`DrugStore::open`], which also
    /// checks the completion marker.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let db = SqliteDatabase::open(path)?;
        db.execute_batch(schema::SCHEMA)?;
        Ok(Self { db })
    }

    /// Open a fully ingested store
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let db = SqliteDatabase::open_existing(path)?;
        let store = Self { db };

        if store.completion()?.is_none() {
            return Err(Error::IncompleteStore {
                path: path.to_path_buf(),
            });
        }

        debug!("Opened drug store at {}", path.display());
        Ok(store)
    }

    /// Create an in-memory store for testing
    pub fn open_in_memory() -> Result<Self> {
        let db = SqliteDatabase::open_in_memory()?;
        db.execute_batch(schema::SCHEMA)?;
        Ok(Self { db })
    }

    /// Close the underlying connection
    pub fn close(self) -> Result<()> {
        self.db.close()
    }

    fn conn(&self) -> &Connection {
        self.db.connection()
    }
}

// ============================================================================
// POINT AND NAME LOOKUPS
// ============================================================================

impl DrugStore {
    /// Exact primary-key lookup
    pub fn get_by_id(&self, id: &str) -> Result<Option<DrugRecord>> {
        let sql = format!("SELECT {DRUG_COLUMNS} FROM drugs WHERE id = ?1");
        let record = self
            .conn()
            .prepare_cached(&sql)?
            .query_row(params![id], row_to_drug)
            .optional()?;
        Ok(record)
    }

    /// Exact case-insensitive name lookup
    ///
    /// Duplicate names are a property of the source data; the record with the
    /// lowest id wins.
    pub fn get_by_name(&self, name: &str) -> Result<Option<DrugRecord>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let sql = format!(
            "SELECT {DRUG_COLUMNS} FROM drugs WHERE name = ?1 COLLATE NOCASE ORDER BY id LIMIT 1"
        );
        let record = self
            .conn()
            .prepare_cached(&sql)?
            .query_row(params![name], row_to_drug)
            .optional()?;
        Ok(record)
    }

    /// First record (by id) whose name matches the pattern
    pub fn first_name_match(&self, pattern: NamePattern<'_>) -> Result<Option<DrugRecord>> {
        if pattern.term().trim().is_empty() {
            return Ok(None);
        }

        let sql = format!(
            "SELECT {DRUG_COLUMNS} FROM drugs WHERE name LIKE ?1 ESCAPE '\\' ORDER BY id LIMIT 1"
        );
        let record = self
            .conn()
            .prepare_cached(&sql)?
            .query_row(params![pattern.like_pattern()], row_to_drug)
            .optional()?;
        Ok(record)
    }

    /// Case-insensitive substring search, ordered by id
    ///
    /// A blank term or a zero limit returns nothing.
    pub fn search(&self, term: &str, limit: usize) -> Result<Vec<DrugRecord>> {
        let term = term.trim();
        if term.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {DRUG_COLUMNS} FROM drugs WHERE name LIKE ?1 ESCAPE '\\' ORDER BY id LIMIT ?2"
        );
        let pattern = NamePattern::Substring(term).like_pattern();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let mut stmt = self.conn().prepare_cached(&sql)?;
        let records = stmt
            .query_map(params![pattern, limit], row_to_drug)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}

// ============================================================================
// INTERACTION QUERIES
// ============================================================================

impl DrugStore {
    /// All outgoing edges of a drug, ordered by interacting drug name
    pub fn get_interactions_for(&self, drug_id: &str) -> Result<Vec<InteractionEdge>> {
        let sql = format!(
            "SELECT {EDGE_COLUMNS} FROM drug_interactions
             WHERE drug_id = ?1
             ORDER BY interacting_drug_name, id"
        );
        let mut stmt = self.conn().prepare_cached(&sql)?;
        let edges = stmt
            .query_map(params![drug_id], row_to_edge)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(edges)
    }

    /// Food notes of a drug in insertion order
    pub fn get_food_facts_for(&self, drug_id: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn().prepare_cached(
            "SELECT description FROM food_interactions WHERE drug_id = ?1 ORDER BY id",
        )?;
        let facts = stmt
            .query_map(params![drug_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(facts)
    }

    /// At most one edge for every unordered pair of the given drugs
    ///
    /// Pairs follow input order (`i < j`); repeated ids are ignored. For each
    /// pair the edge is looked up in both directions, preferring `i -> j`.
    pub fn get_interaction_matrix(&self, drug_ids: &[String]) -> Result<Vec<InteractionEdge>> {
        let mut ids: Vec<&str> = Vec::with_capacity(drug_ids.len());
        for id in drug_ids {
            if !ids.contains(&id.as_str()) {
                ids.push(id);
            }
        }

        let mut stmt = self.conn().prepare_cached(PAIR_EDGE_SQL)?;
        let mut edges = Vec::new();
        for (i, first) in ids.iter().enumerate() {
            for second in &ids[i + 1..] {
                if let Some(edge) = stmt
                    .query_row(params![first, second], row_to_edge)
                    .optional()?
                {
                    edges.push(edge);
                }
            }
        }

        debug!(
            "Interaction matrix over {} drugs found {} edges",
            ids.len(),
            edges.len()
        );
        Ok(edges)
    }
}

// ============================================================================
// BULK LOAD
// ============================================================================

impl DrugStore {
    /// Upsert a batch of records in a single transaction
    ///
    /// Each record replaces any previous version with the same id, including
    /// all of its edges and food notes.
    pub fn insert_batch(&mut self, records: &[DrugRecord]) -> Result<LoadSummary> {
        let mut summary = LoadSummary::default();
        if records.is_empty() {
            return Ok(summary);
        }

        let tx = self.db.connection_mut().transaction()?;
        for record in records {
            upsert_record(&tx, record)?;
            summary.records += 1;
            summary.interactions += record.interactions.len();
            summary.food_interactions += record.food_interactions.len();
        }
        tx.commit()?;

        summary.batches = 1;
        Ok(summary)
    }

    /// Load a record stream, committing every `batch_size` records
    ///
    /// The first stream error aborts the load; batches already committed stay
    /// in the store.
    pub fn bulk_load<I>(&mut self, records: I, batch_size: usize) -> Result<LoadSummary>
    where
        I: IntoIterator<Item = Result<DrugRecord>>,
    {
        let batch_size = batch_size.max(1);
        let mut summary = LoadSummary::default();
        let mut batch = Vec::with_capacity(batch_size);

        for record in records {
            batch.push(record?);
            if batch.len() >= batch_size {
                self.flush_batch(&mut batch, &mut summary)?;
            }
        }
        self.flush_batch(&mut batch, &mut summary)?;

        info!(
            "Loaded {} drugs ({} interactions, {} food notes) in {} batches",
            summary.records, summary.interactions, summary.food_interactions, summary.batches
        );
        Ok(summary)
    }

    fn flush_batch(
        &mut self,
        batch: &mut Vec<DrugRecord>,
        summary: &mut LoadSummary,
    ) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let committed = self.insert_batch(batch.as_slice())?;
        summary.records += committed.records;
        summary.interactions += committed.interactions;
        summary.food_interactions += committed.food_interactions;
        summary.batches += committed.batches;
        batch.clear();

        debug!("Committed batch {} ({} drugs so far)", summary.batches, summary.records);
        Ok(())
    }

    /// Record that ingestion finished; readers refuse stores without it
    pub fn mark_complete(&self, source: &str, records: usize) -> Result<()> {
        let completed_at = chrono::Utc::now().to_rfc3339();
        let records = records.to_string();
        let tx = self.conn().unchecked_transaction()?;
        for (key, value) in [
            ("source", source),
            ("records", records.as_str()),
            ("completed_at", completed_at.as_str()),
        ] {
            tx.execute(
                "INSERT OR REPLACE INTO store_meta (key, value) VALUES (?1, ?2)",
                params![key, value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Completion marker, if ingestion finished
    pub fn completion(&self) -> Result<Option<Completion>> {
        let has_meta: bool = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'store_meta')",
            [],
            |row| row.get(0),
        )?;
        if !has_meta {
            return Ok(None);
        }

        let Some(completed_at) = self.meta_value("completed_at")? else {
            return Ok(None);
        };
        let source = self.meta_value("source")?.unwrap_or_default();
        let records = self
            .meta_value("records")?
            .and_then(|value| value.parse().ok())
            .unwrap_or(0);

        Ok(Some(Completion {
            source,
            completed_at,
            records,
        }))
    }

    fn meta_value(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()
            .query_row(
                "SELECT value FROM store_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Row counts of the three data tables
    pub fn stats(&self) -> Result<StoreStats> {
        let count = |table: &str| -> Result<usize> {
            let n: i64 = self
                .conn()
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            Ok(n as usize)
        };

        Ok(StoreStats {
            drugs: count("drugs")?,
            interactions: count("drug_interactions")?,
            food_interactions: count("food_interactions")?,
        })
    }

    /// Number of drug records
    pub fn count(&self) -> Result<usize> {
        Ok(self.stats()?.drugs)
    }
}

/// Replace one drug and everything hanging off it
fn upsert_record(conn: &Connection, record: &DrugRecord) -> rusqlite::Result<()> {
    conn.prepare_cached(
        "INSERT OR REPLACE INTO drugs
         (id, name, description, indication, mechanism_of_action, toxicity)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?
    .execute(params![
        &record.id,
        &record.name,
        &record.description,
        &record.indication,
        &record.mechanism_of_action,
        &record.toxicity,
    ])?;

    conn.prepare_cached("DELETE FROM drug_interactions WHERE drug_id = ?1")?
        .execute(params![&record.id])?;
    conn.prepare_cached("DELETE FROM food_interactions WHERE drug_id = ?1")?
        .execute(params![&record.id])?;

    let mut insert_edge = conn.prepare_cached(
        "INSERT INTO drug_interactions
         (drug_id, interacting_drug_id, interacting_drug_name, description)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for edge in &record.interactions {
        insert_edge.execute(params![
            &record.id,
            &edge.interacting_drug_id,
            &edge.interacting_drug_name,
            &edge.description,
        ])?;
    }

    let mut insert_food = conn.prepare_cached(
        "INSERT INTO food_interactions (drug_id, description) VALUES (?1, ?2)",
    )?;
    for fact in &record.food_interactions {
        insert_food.execute(params![&record.id, fact])?;
    }

    Ok(())
}

fn row_to_drug(row: &Row<'_>) -> rusqlite::Result<DrugRecord> {
    Ok(DrugRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        indication: row.get(3)?,
        mechanism_of_action: row.get(4)?,
        toxicity: row.get(5)?,
        interactions: Vec::new(),
        food_interactions: Vec::new(),
    })
}

fn row_to_edge(row: &Row<'_>) -> rusqlite::Result<InteractionEdge> {
    Ok(InteractionEdge {
        drug_id: row.get(0)?,
        interacting_drug_id: row.get(1)?,
        interacting_drug_name: row.get(2)?,
        description: row.get(3)?,
    })
}
