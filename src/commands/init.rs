use anyhow::{Context, Result};
use drugstore::{initialize, Config, IngestOptions};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

pub fn execute(
    config: &Config,
    xml: Option<PathBuf>,
    store: Option<PathBuf>,
    force: bool,
    json: bool,
) -> Result<()> {
    let xml_path = xml.unwrap_or_else(|| config.source.xml_path.clone());
    let store_path = store.unwrap_or_else(|| config.store.path.clone());
    let options = IngestOptions::from_config(config)
        .recreate(force)
        .with_cancel(cancel_on_signal()?);

    if !json {
        println!(
            "📦 Ingesting {} into {}",
            xml_path.display(),
            store_path.display()
        );
    }

    let report = initialize(&xml_path, &store_path, &options)
        .with_context(|| format!("Failed to build drug store from {}", xml_path.display()))?;

    if json {
        return super::print_json(&report);
    }

    println!("✓ Store ready at {}", report.store_path.display());
    println!("  Drugs:             {}", report.load.records);
    println!("  Interactions:      {}", report.load.interactions);
    println!("  Food interactions: {}", report.load.food_interactions);
    if report.parse.skipped_without_id > 0 || report.parse.skipped_malformed > 0 {
        println!(
            "  Skipped:           {} without id, {} malformed",
            report.parse.skipped_without_id, report.parse.skipped_malformed
        );
    }
    println!("  Elapsed:           {:.1}s", report.elapsed_secs);
    Ok(())
}

/// Flag raised on Ctrl-C or SIGTERM; the load stops at the next record
/// and the partial store is removed on the way out
fn cancel_on_signal() -> Result<Arc<AtomicBool>> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        if !flag.swap(true, Ordering::SeqCst) {
            warn!("Interrupt received, stopping ingestion");
        }
    })
    .context("Failed to install interrupt handler")?;
    Ok(cancel)
}
