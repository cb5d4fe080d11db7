pub mod food;
pub mod init;
pub mod interactions;
pub mod lookup;
pub mod search;
pub mod stats;

use anyhow::{Context, Result};
use drugstore::{Config, DrugKnowledge};

/// Open the configured store for a read command
pub(crate) fn open_knowledge(config: &Config) -> Result<DrugKnowledge> {
    DrugKnowledge::open(&config.store.path, config).with_context(|| {
        format!(
            "Failed to open drug store at {}. Run 'drugstore init' first.",
            config.store.path.display()
        )
    })
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
