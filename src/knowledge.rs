//! Caller-facing drug knowledge interface
//!
//! `DrugKnowledge` owns an opened store, the name matcher and the lookup
//! caches. It is `Send + Sync`; every query takes the store lock for its
//! duration, so it can be shared across threads behind an `Arc`.
//!
//! # Example
//!
//! ```no_run
//! use drugstore::{Config, DrugKnowledge};
//!
//! let knowledge = DrugKnowledge::open_or_initialize(&Config::default())?;
//! let names = vec!["warfarin".to_string(), "aspirin".to_string()];
//! for edge in knowledge.interactions_for_pair_set(&names)? {
//!     println!("{} -> {}", edge.drug_id, edge.interacting_drug_name);
//! }
//! # Ok::<(), drugstore::Error>(())
//! ```

use crate::cache::{drug_key, pair_key, CacheStats, LookupCache, TtlCache};
use crate::config::Config;
use crate::error::Result;
use crate::ingest::{self, IngestOptions};
use crate::matcher::{Matcher, NameMatch, SynonymTable};
use crate::store::{Completion, DrugRecord, DrugStore, InteractionEdge, StoreStats};
use parking_lot::Mutex;
use std::path::Path;
use tracing::{debug, info};

/// Read-side facade over a fully ingested store
pub struct DrugKnowledge {
    store: Mutex<DrugStore>,
    matcher: Matcher,
    names: Option<TtlCache<String, Option<DrugRecord>>>,
    pairs: Option<TtlCache<String, Vec<InteractionEdge>>>,
}

impl DrugKnowledge {
    /// Open an existing store
    pub fn open<P: AsRef<Path>>(store_path: P, config: &Config) -> Result<Self> {
        let store = DrugStore::open(store_path)?;
        Ok(Self::from_store(store, config))
    }

    /// Open the configured store, building it from the configured XML first
    /// when it does not exist yet
    pub fn open_or_initialize(config: &Config) -> Result<Self> {
        let store_path = &config.store.path;
        if !ingest::is_initialized(store_path) {
            info!(
                "No store at {}, ingesting {}",
                store_path.display(),
                config.source.xml_path.display()
            );
            ingest::initialize(
                &config.source.xml_path,
                store_path,
                &IngestOptions::from_config(config),
            )?;
        }
        Self::open(store_path, config)
    }

    /// Wrap an already opened store
    pub fn from_store(store: DrugStore, config: &Config) -> Self {
        let mut synonyms = SynonymTable::default();
        synonyms.extend(&config.matcher.synonyms);

        let (names, pairs) = if config.cache.enabled {
            (
                Some(TtlCache::from_config(&config.cache)),
                Some(TtlCache::from_config(&config.cache)),
            )
        } else {
            (None, None)
        };

        Self {
            store: Mutex::new(store),
            matcher: Matcher::new(synonyms),
            names,
            pairs,
        }
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Best single record for a free-text name, via the tiered matcher
    pub fn lookup_exact_or_fuzzy(&self, name: &str) -> Result<Option<DrugRecord>> {
        let key = drug_key(name);
        if key.is_empty() {
            return Ok(None);
        }
        if let Some(hit) = self.names.as_ref().and_then(|cache| cache.get(&key)) {
            return Ok(hit);
        }

        let found = self.matcher.resolve(&self.store.lock(), name)?;
        if let Some(cache) = &self.names {
            cache.insert(key, found.clone());
        }
        Ok(found)
    }

    /// Like [`DrugKnowledge::lookup_exact_or_fuzzy`], reporting the match tier
    pub fn lookup_match(&self, name: &str) -> Result<Option<NameMatch>> {
        self.matcher.resolve_match(&self.store.lock(), name)
    }

    /// Case-insensitive exact name lookup, no fuzzy fallback
    pub fn lookup_exact(&self, name: &str) -> Result<Option<DrugRecord>> {
        self.store.lock().get_by_name(name)
    }

    pub fn search(&self, term: &str, limit: usize) -> Result<Vec<DrugRecord>> {
        self.store.lock().search(term, limit)
    }

    /// Interactions among a set of free-text names
    ///
    /// Each name is resolved through the matcher; names that resolve to
    /// nothing are dropped. At most one edge per pair of resolved drugs.
    pub fn interactions_for_pair_set<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<InteractionEdge>> {
        let key = pair_key(names);
        if let Some(hit) = self.pairs.as_ref().and_then(|cache| cache.get(&key)) {
            return Ok(hit);
        }

        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            match self.lookup_exact_or_fuzzy(name)? {
                Some(record) => ids.push(record.id),
                None => debug!("Dropping unresolved drug name '{}'", name.trim()),
            }
        }

        let edges = if ids.len() < 2 {
            Vec::new()
        } else {
            self.store.lock().get_interaction_matrix(&ids)?
        };

        if let Some(cache) = &self.pairs {
            cache.insert(key, edges.clone());
        }
        Ok(edges)
    }

    /// All outgoing edges of the drug a name resolves to
    pub fn interactions_for(&self, name: &str) -> Result<Vec<InteractionEdge>> {
        match self.lookup_exact_or_fuzzy(name)? {
            Some(record) => self.store.lock().get_interactions_for(&record.id),
            None => Ok(Vec::new()),
        }
    }

    /// Food notes of the drug a name resolves to
    pub fn food_facts_for(&self, name: &str) -> Result<Vec<String>> {
        match self.lookup_exact_or_fuzzy(name)? {
            Some(record) => self.store.lock().get_food_facts_for(&record.id),
            None => Ok(Vec::new()),
        }
    }

    pub fn stats(&self) -> Result<StoreStats> {
        self.store.lock().stats()
    }

    /// Source, record count and timestamp of the ingestion that built the store
    pub fn completion(&self) -> Result<Option<Completion>> {
        self.store.lock().completion()
    }

    /// Combined hit/miss counters of the name and pair caches
    pub fn cache_stats(&self) -> CacheStats {
        [
            self.names.as_ref().map(TtlCache::stats),
            self.pairs.as_ref().map(TtlCache::stats),
        ]
        .into_iter()
        .flatten()
        .fold(CacheStats::default(), |acc, s| CacheStats {
            hits: acc.hits + s.hits,
            misses: acc.misses + s.misses,
            entries: acc.entries + s.entries,
        })
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.names {
            cache.clear();
        }
        if let Some(cache) = &self.pairs {
            cache.clear();
        }
    }
}
