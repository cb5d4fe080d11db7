//! One-shot ingestion: DrugBank XML -> drug store
//!
//! Thin orchestration layer over the parser and the store:
//! 1. check the source and the target
//! 2. stream records into `<store>.partial` with batched commits
//! 3. write the completion marker and rename the file into place
//!
//! Any failure, panic or cancellation removes the partial file, so a store
//! that exists at the final path is always complete. When rebuilding, the old
//! store stays in place until the new one is ready to replace it.

pub mod parser;

pub use parser::{ParseStats, RecordParser, DRUGBANK_NAMESPACE};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::{DrugStore, LoadSummary};
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Knobs for a single ingestion run
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub namespace: String,
    pub batch_size: usize,
    pub progress_every: usize,
    /// Replace an existing store instead of refusing to run
    pub recreate: bool,
    /// Set from another thread (e.g. a Ctrl-C handler) to abandon the load
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            namespace: DRUGBANK_NAMESPACE.to_string(),
            batch_size: 5000,
            progress_every: 1000,
            recreate: false,
            cancel: None,
        }
    }
}

impl IngestOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            namespace: config.source.namespace.clone(),
            batch_size: config.ingest.batch_size,
            progress_every: config.ingest.progress_every,
            recreate: false,
            cancel: None,
        }
    }

    pub fn recreate(mut self, recreate: bool) -> Self {
        self.recreate = recreate;
        self
    }

    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::SeqCst) => Err(Error::Interrupted),
            _ => Ok(()),
        }
    }
}

/// Outcome of a successful ingestion
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub store_path: PathBuf,
    pub parse: ParseStats,
    pub load: LoadSummary,
    pub elapsed_secs: f64,
}

/// Build a complete store at `store_path` from the XML dump at `xml_path`
///
/// Fails with `SourceNotFound` before touching the filesystem when the XML is
/// missing, and with `StoreExists` when the target exists and
/// `options.recreate` is not set. Errors during the load, including
/// cancellation, come back as `IncompleteIngestion`; the partial file is
/// removed and an existing store is left untouched.
pub fn initialize<X, S>(xml_path: X, store_path: S, options: &IngestOptions) -> Result<IngestReport>
where
    X: AsRef<Path>,
    S: AsRef<Path>,
{
    let xml_path = xml_path.as_ref();
    let store_path = store_path.as_ref();

    if !xml_path.is_file() {
        return Err(Error::SourceNotFound {
            path: xml_path.to_path_buf(),
        });
    }

    if store_path.exists() && !options.recreate {
        return Err(Error::StoreExists {
            path: store_path.to_path_buf(),
        });
    }

    if let Some(parent) = store_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let partial = partial_path(store_path);
    if partial.exists() {
        warn!("Removing stale partial store at {}", partial.display());
        remove_store_files(&partial)?;
    }

    info!(
        "Ingesting {} into {}",
        xml_path.display(),
        store_path.display()
    );
    let started = Instant::now();
    let guard = PartialStore::new(partial.clone());

    let (parse, load) =
        load_into(xml_path, &partial, options).map_err(|e| Error::incomplete(store_path, e))?;
    replace_store(&partial, store_path).map_err(|e| Error::incomplete(store_path, e))?;
    guard.disarm();

    let report = IngestReport {
        store_path: store_path.to_path_buf(),
        parse,
        load,
        elapsed_secs: started.elapsed().as_secs_f64(),
    };
    info!(
        "✓ Store ready at {} ({} drugs in {:.1}s)",
        store_path.display(),
        report.load.records,
        report.elapsed_secs
    );
    Ok(report)
}

/// Whether a store file is present at `store_path`
///
/// Presence is the completion signal: ingestion only renames the file into
/// place after it finished.
pub fn is_initialized<P: AsRef<Path>>(store_path: P) -> bool {
    store_path.as_ref().is_file()
}

fn load_into(
    xml_path: &Path,
    partial: &Path,
    options: &IngestOptions,
) -> Result<(ParseStats, LoadSummary)> {
    let mut parser = RecordParser::open(xml_path, &options.namespace)?
        .with_progress_every(options.progress_every);
    let mut store = DrugStore::create(partial)?;

    let records = parser.by_ref().map(|record| {
        options.check_cancelled()?;
        record
    });
    let load = store.bulk_load(records, options.batch_size)?;
    options.check_cancelled()?;
    store.mark_complete(&xml_path.display().to_string(), load.records)?;
    store.close()?;

    Ok((parser.stats(), load))
}

/// `drugbank.db` -> `drugbank.db.partial`
pub fn partial_path(store_path: &Path) -> PathBuf {
    let mut name = OsString::from(store_path.as_os_str());
    name.push(".partial");
    PathBuf::from(name)
}

/// Move a finished partial store over the final path
///
/// `rename` replaces an existing store in one step; its sidecars belong to
/// the old file and are removed first.
fn replace_store(partial: &Path, store_path: &Path) -> Result<()> {
    if store_path.exists() {
        info!("Replacing existing store at {}", store_path.display());
        remove_sidecars(store_path)?;
    }
    std::fs::rename(partial, store_path)?;
    Ok(())
}

/// Remove a store file and any SQLite sidecars next to it
fn remove_store_files(path: &Path) -> Result<()> {
    remove_if_present(path)?;
    remove_sidecars(path)
}

fn remove_sidecars(path: &Path) -> Result<()> {
    for suffix in ["-journal", "-wal", "-shm"] {
        let mut name = OsString::from(path.as_os_str());
        name.push(suffix);
        remove_if_present(Path::new(&name))?;
    }
    Ok(())
}

fn remove_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Removes the partial store on drop unless disarmed
struct PartialStore {
    path: PathBuf,
    armed: bool,
}

impl PartialStore {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PartialStore {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match remove_store_files(&self.path) {
            Ok(()) => warn!("Cleaned up incomplete store {}", self.path.display()),
            Err(e) => warn!(
                "Failed to clean up incomplete store {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FIXTURE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<drugbank xmlns="http://www.drugbank.ca">
  <drug><drugbank-id primary="true">DB001</drugbank-id><name>Warfarin</name></drug>
  <drug><drugbank-id primary="true">DB002</drugbank-id><name>Aspirin</name></drug>
</drugbank>"#;

    fn write(dir: &TempDir, name: &str, content: &str) -> Result<PathBuf> {
        let path = dir.path().join(name);
        std::fs::write(&path, content)?;
        Ok(path)
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("data/drugbank.db")),
            PathBuf::from("data/drugbank.db.partial")
        );
    }

    #[test]
    fn test_initialize_builds_store() -> Result<()> {
        let temp = TempDir::new()?;
        let xml = write(&temp, "drugs.xml", FIXTURE)?;
        let store_path = temp.path().join("nested").join("drugs.db");

        let report = initialize(&xml, &store_path, &IngestOptions::default())?;
        assert_eq!(report.load.records, 2);
        assert_eq!(report.parse.records, 2);
        assert!(is_initialized(&store_path));
        assert!(!partial_path(&store_path).exists());

        let store = DrugStore::open(&store_path)?;
        assert_eq!(store.count()?, 2);
        Ok(())
    }

    #[test]
    fn test_missing_source_creates_nothing() -> Result<()> {
        let temp = TempDir::new()?;
        let store_path = temp.path().join("drugs.db");

        let err = initialize(
            temp.path().join("missing.xml"),
            &store_path,
            &IngestOptions::default(),
        )
        .err();
        assert!(matches!(err, Some(Error::SourceNotFound { .. })));
        assert!(!store_path.exists());
        assert!(!partial_path(&store_path).exists());
        Ok(())
    }

    #[test]
    fn test_existing_store_is_not_overwritten() -> Result<()> {
        let temp = TempDir::new()?;
        let xml = write(&temp, "drugs.xml", FIXTURE)?;
        let store_path = write(&temp, "drugs.db", "not a database")?;

        let err = initialize(&xml, &store_path, &IngestOptions::default()).err();
        assert!(matches!(err, Some(Error::StoreExists { .. })));
        assert_eq!(std::fs::read_to_string(&store_path)?, "not a database");

        initialize(&xml, &store_path, &IngestOptions::default().recreate(true))?;
        assert_eq!(DrugStore::open(&store_path)?.count()?, 2);
        Ok(())
    }

    #[test]
    fn test_failed_load_leaves_no_artifact() -> Result<()> {
        let temp = TempDir::new()?;
        let truncated = &FIXTURE[..FIXTURE.find("<name>Aspirin").unwrap_or(FIXTURE.len())];
        let xml = write(&temp, "broken.xml", truncated)?;
        let store_path = temp.path().join("drugs.db");

        let options = IngestOptions {
            batch_size: 1,
            ..IngestOptions::default()
        };
        let err = initialize(&xml, &store_path, &options).err();
        assert!(matches!(err, Some(Error::IncompleteIngestion { .. })));
        assert!(!store_path.exists());
        assert!(!partial_path(&store_path).exists());
        Ok(())
    }

    #[test]
    fn test_failed_recreate_keeps_existing_store() -> Result<()> {
        let temp = TempDir::new()?;
        let xml = write(&temp, "drugs.xml", FIXTURE)?;
        let store_path = temp.path().join("drugs.db");
        initialize(&xml, &store_path, &IngestOptions::default())?;

        let truncated = &FIXTURE[..FIXTURE.find("<name>Aspirin").unwrap_or(FIXTURE.len())];
        let broken = write(&temp, "broken.xml", truncated)?;
        let err = initialize(&broken, &store_path, &IngestOptions::default().recreate(true)).err();
        assert!(matches!(err, Some(Error::IncompleteIngestion { .. })));

        let store = DrugStore::open(&store_path)?;
        assert_eq!(store.count()?, 2);
        assert!(!partial_path(&store_path).exists());
        Ok(())
    }

    #[test]
    fn test_cancelled_load_leaves_no_artifact() -> Result<()> {
        let temp = TempDir::new()?;
        let xml = write(&temp, "drugs.xml", FIXTURE)?;
        let store_path = temp.path().join("drugs.db");

        let cancel = Arc::new(AtomicBool::new(true));
        let options = IngestOptions::default().with_cancel(Arc::clone(&cancel));
        let err = initialize(&xml, &store_path, &options).err();
        match err {
            Some(Error::IncompleteIngestion { source, .. }) => {
                assert!(matches!(*source, Error::Interrupted))
            }
            other => panic!("expected an interrupted ingestion, got {other:?}"),
        }
        assert!(!store_path.exists());
        assert!(!partial_path(&store_path).exists());

        cancel.store(false, Ordering::SeqCst);
        initialize(&xml, &store_path, &options)?;
        assert_eq!(DrugStore::open(&store_path)?.count()?, 2);
        Ok(())
    }

    #[test]
    fn test_stale_partial_is_replaced() -> Result<()> {
        let temp = TempDir::new()?;
        let xml = write(&temp, "drugs.xml", FIXTURE)?;
        let store_path = temp.path().join("drugs.db");
        std::fs::write(partial_path(&store_path), "left over from a killed run")?;

        initialize(&xml, &store_path, &IngestOptions::default())?;
        assert_eq!(DrugStore::open(&store_path)?.count()?, 2);
        assert!(!partial_path(&store_path).exists());
        Ok(())
    }
}
