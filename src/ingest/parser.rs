//! Streaming DrugBank XML parser
//!
//! Reads the dump event by event and yields one [`DrugRecord`] per top-level
//! `drug` element. Only the record being built is held in memory; the event
//! buffer is cleared after every event and reused, so memory use follows the
//! largest single record, not the size of the document.

use crate::error::{Error, Result};
use crate::store::{DrugRecord, InteractionEdge};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

/// Namespace of the public DrugBank schema
pub const DRUGBANK_NAMESPACE: &str = "http://www.drugbank.ca";

const READ_BUFFER_BYTES: usize = 64 * 1024;
const DEFAULT_PROGRESS_EVERY: usize = 1000;

/// Counters collected while streaming
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    pub records: usize,
    pub skipped_without_id: usize,
    pub skipped_malformed: usize,
}

/// Lazy, single-pass iterator of drug records
///
/// Restarting means opening the source again; there is no mid-stream resume.
/// A record without a primary id, or with malformed content (bad escapes,
/// bad attributes, undecodable text), is skipped and counted. Errors from the
/// XML reader itself mean the document is not well-formed; they end the
/// stream as an `Err` item.
pub struct RecordParser<R: BufRead> {
    reader: NsReader<R>,
    buf: Vec<u8>,
    namespace: Vec<u8>,
    depth: usize,
    progress_every: usize,
    stats: ParseStats,
    finished: bool,
}

impl RecordParser<BufReader<File>> {
    /// Open an XML file for streaming
    pub fn open<P: AsRef<Path>>(path: P, namespace: &str) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::SourceNotFound {
                path: path.to_path_buf(),
            });
        }

        let file = File::open(path)?;
        info!("Streaming drug records from {}", path.display());
        Ok(Self::from_reader(
            BufReader::with_capacity(READ_BUFFER_BYTES, file),
            namespace,
        ))
    }
}

impl<R: BufRead> RecordParser<R> {
    pub fn from_reader(source: R, namespace: &str) -> Self {
        let mut reader = NsReader::from_reader(source);
        reader.config_mut().expand_empty_elements = true;

        Self {
            reader,
            buf: Vec::new(),
            namespace: namespace.as_bytes().to_vec(),
            depth: 0,
            progress_every: DEFAULT_PROGRESS_EVERY,
            stats: ParseStats::default(),
            finished: false,
        }
    }

    /// Log a progress line every `every` records
    pub fn with_progress_every(mut self, every: usize) -> Self {
        self.progress_every = every.max(1);
        self
    }

    pub fn stats(&self) -> ParseStats {
        self.stats
    }

    /// Advance to the next top-level drug element and extract it
    fn next_record(&mut self, buf: &mut Vec<u8>) -> Result<Option<DrugRecord>> {
        loop {
            buf.clear();
            let position = self.reader.buffer_position() as u64;
            let (resolved, event) = self
                .reader
                .read_resolved_event_into(buf)
                .map_err(|source| Error::Xml { position, source })?;

            let in_namespace = matches!(
                resolved,
                ResolveResult::Bound(Namespace(ns)) if ns == self.namespace.as_slice()
            );
            drop(resolved);

            let record_start = match &event {
                Event::Start(start) => {
                    self.depth += 1;
                    self.depth == 2 && in_namespace && start.local_name().as_ref() == b"drug"
                }
                Event::End(_) => {
                    self.depth = self.depth.saturating_sub(1);
                    false
                }
                Event::Eof => return Ok(None),
                _ => false,
            };
            drop(event);

            if !record_start {
                continue;
            }

            let builder = self.read_record(buf)?;
            // read_record consumed the record's end tag
            self.depth -= 1;

            if let Some(reason) = builder.malformed {
                self.stats.skipped_malformed += 1;
                warn!(
                    "Skipping malformed drug record {}: {}",
                    builder.id.flatten().as_deref().unwrap_or("<no id>"),
                    reason
                );
                continue;
            }

            match builder.finish() {
                Some(record) => {
                    self.stats.records += 1;
                    if self.stats.records % self.progress_every == 0 {
                        info!("Parsed {} drugs...", self.stats.records);
                    }
                    return Ok(Some(record));
                }
                None => {
                    self.stats.skipped_without_id += 1;
                    debug!("Skipping drug element without a primary id");
                }
            }
        }
    }

    /// Consume events up to and including the record's end tag
    fn read_record(&mut self, buf: &mut Vec<u8>) -> Result<RecordBuilder> {
        let mut builder = RecordBuilder::default();
        let mut path: Vec<Tag> = Vec::with_capacity(8);

        loop {
            buf.clear();
            let position = self.reader.buffer_position() as u64;
            let event = self
                .reader
                .read_event_into(buf)
                .map_err(|source| Error::Xml { position, source })?;

            match event {
                Event::Start(start) => {
                    let tag = Tag::classify(&start, &mut builder);
                    path.push(tag);
                    builder.open(&path);
                }
                Event::End(_) => {
                    if path.is_empty() {
                        return Ok(builder);
                    }
                    builder.close(&path);
                    path.pop();
                }
                Event::Text(text) => {
                    if builder.is_capturing(path.len()) {
                        match text.unescape() {
                            Ok(value) => builder.text.push_str(&value),
                            Err(e) => builder.mark_malformed(format!("bad text content: {e}")),
                        }
                    }
                }
                Event::CData(cdata) => {
                    if builder.is_capturing(path.len()) {
                        match std::str::from_utf8(&cdata) {
                            Ok(value) => builder.text.push_str(value),
                            Err(e) => builder.mark_malformed(format!("bad CDATA content: {e}")),
                        }
                    }
                }
                Event::Eof => {
                    return Err(Error::Io(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "document ended inside a drug element",
                    )));
                }
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for RecordParser<R> {
    type Item = Result<DrugRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut buf = std::mem::take(&mut self.buf);
        let result = self.next_record(&mut buf);
        self.buf = buf;

        match result {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                info!(
                    "Finished parsing: {} drugs, {} without primary id, {} malformed",
                    self.stats.records, self.stats.skipped_without_id, self.stats.skipped_malformed
                );
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

// ============================================================================
// RECORD EXTRACTION
// ============================================================================

/// Element kinds the extractor cares about, relative to the drug element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Id,
    PrimaryId,
    Name,
    Description,
    Indication,
    Mechanism,
    Toxicity,
    DrugInteractions,
    DrugInteraction,
    FoodInteractions,
    FoodInteraction,
    Other,
}

impl Tag {
    fn classify(start: &BytesStart<'_>, builder: &mut RecordBuilder) -> Self {
        match start.local_name().as_ref() {
            b"drugbank-id" => match start.try_get_attribute("primary") {
                Ok(Some(attr)) if attr.value.as_ref() == b"true" => Tag::PrimaryId,
                Ok(_) => Tag::Id,
                Err(e) => {
                    builder.mark_malformed(format!("bad drugbank-id attribute: {e}"));
                    Tag::Id
                }
            },
            b"name" => Tag::Name,
            b"description" => Tag::Description,
            b"indication" => Tag::Indication,
            b"mechanism-of-action" => Tag::Mechanism,
            b"toxicity" => Tag::Toxicity,
            b"drug-interactions" => Tag::DrugInteractions,
            b"drug-interaction" => Tag::DrugInteraction,
            b"food-interactions" => Tag::FoodInteractions,
            b"food-interaction" => Tag::FoodInteraction,
            _ => Tag::Other,
        }
    }
}

/// Where captured text goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    PrimaryId,
    Name,
    Description,
    Indication,
    Mechanism,
    Toxicity,
    PartnerId,
    PartnerName,
    PartnerDescription,
    Food,
}

impl Field {
    fn at(path: &[Tag]) -> Option<Self> {
        use Tag::*;
        match path {
            [PrimaryId] => Some(Field::PrimaryId),
            [Name] => Some(Field::Name),
            [Description] => Some(Field::Description),
            [Indication] => Some(Field::Indication),
            [Mechanism] => Some(Field::Mechanism),
            [Toxicity] => Some(Field::Toxicity),
            [DrugInteractions, DrugInteraction, Id | PrimaryId] => Some(Field::PartnerId),
            [DrugInteractions, DrugInteraction, Name] => Some(Field::PartnerName),
            [DrugInteractions, DrugInteraction, Description] => Some(Field::PartnerDescription),
            [FoodInteractions, FoodInteraction] => Some(Field::Food),
            _ => None,
        }
    }
}

/// Interaction block being read
#[derive(Debug, Default)]
struct PendingInteraction {
    id: Option<Option<String>>,
    name: Option<Option<String>>,
    description: Option<Option<String>>,
}

/// Accumulates one record
///
/// Scalar slots are `Option<Option<String>>`: the outer level records that the
/// element was seen, so only the first occurrence counts even when it is empty.
#[derive(Debug, Default)]
struct RecordBuilder {
    id: Option<Option<String>>,
    name: Option<Option<String>>,
    description: Option<Option<String>>,
    indication: Option<Option<String>>,
    mechanism: Option<Option<String>>,
    toxicity: Option<Option<String>>,
    interactions: Vec<PendingInteraction>,
    food: Vec<String>,
    capture: Option<(Field, usize)>,
    text: String,
    malformed: Option<String>,
}

fn set_first(slot: &mut Option<Option<String>>, value: Option<String>) {
    if slot.is_none() {
        *slot = Some(value);
    }
}

impl RecordBuilder {
    fn open(&mut self, path: &[Tag]) {
        if path == [Tag::DrugInteractions, Tag::DrugInteraction] {
            self.interactions.push(PendingInteraction::default());
        }
        if let Some(field) = Field::at(path) {
            self.capture = Some((field, path.len()));
            self.text.clear();
        }
    }

    fn is_capturing(&self, depth: usize) -> bool {
        matches!(self.capture, Some((_, d)) if d == depth)
    }

    fn close(&mut self, path: &[Tag]) {
        let Some((field, depth)) = self.capture else {
            return;
        };
        if depth != path.len() {
            return;
        }
        self.capture = None;

        let trimmed = self.text.trim();
        let value = (!trimmed.is_empty()).then(|| trimmed.to_string());

        match field {
            Field::PrimaryId => set_first(&mut self.id, value),
            Field::Name => set_first(&mut self.name, value),
            Field::Description => set_first(&mut self.description, value),
            Field::Indication => set_first(&mut self.indication, value),
            Field::Mechanism => set_first(&mut self.mechanism, value),
            Field::Toxicity => set_first(&mut self.toxicity, value),
            Field::Food => self.food.extend(value),
            Field::PartnerId | Field::PartnerName | Field::PartnerDescription => {
                if let Some(pending) = self.interactions.last_mut() {
                    let slot = match field {
                        Field::PartnerId => &mut pending.id,
                        Field::PartnerName => &mut pending.name,
                        _ => &mut pending.description,
                    };
                    set_first(slot, value);
                }
            }
        }
    }

    fn mark_malformed(&mut self, reason: String) {
        if self.malformed.is_none() {
            self.malformed = Some(reason);
        }
    }

    /// Build the record; `None` when there is no primary id
    fn finish(self) -> Option<DrugRecord> {
        let id = self.id.flatten()?;

        let interactions = self
            .interactions
            .into_iter()
            .filter_map(|pending| {
                let name = pending.name.flatten()?;
                Some(InteractionEdge {
                    drug_id: id.clone(),
                    interacting_drug_id: pending.id.flatten(),
                    interacting_drug_name: name,
                    description: pending.description.flatten(),
                })
            })
            .collect();

        Some(DrugRecord {
            name: self.name.flatten().unwrap_or_default(),
            description: self.description.flatten(),
            indication: self.indication.flatten(),
            mechanism_of_action: self.mechanism.flatten(),
            toxicity: self.toxicity.flatten(),
            interactions,
            food_interactions: self.food,
            id,
        })
    }
}
