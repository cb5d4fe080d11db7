use anyhow::Result;
use drugstore::Config;
use serde_json::json;

pub fn execute(config: &Config, json: bool) -> Result<()> {
    let knowledge = super::open_knowledge(config)?;
    let stats = knowledge.stats()?;
    let completion = knowledge.completion()?;

    if json {
        return super::print_json(&json!({
            "store": config.store.path,
            "stats": stats,
            "completion": completion,
        }));
    }

    println!("Drug store: {}", config.store.path.display());
    println!("  Drugs:             {}", stats.drugs);
    println!("  Interactions:      {}", stats.interactions);
    println!("  Food interactions: {}", stats.food_interactions);
    if let Some(completion) = completion {
        println!(
            "  Ingested {} from {} at {}",
            completion.records, completion.source, completion.completed_at
        );
    }
    Ok(())
}
