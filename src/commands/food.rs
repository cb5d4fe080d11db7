use anyhow::Result;
use drugstore::Config;
use serde_json::json;

pub fn execute(config: &Config, name: &str, json: bool) -> Result<()> {
    let knowledge = super::open_knowledge(config)?;
    let facts = knowledge.food_facts_for(name)?;

    if json {
        return super::print_json(&json!({
            "query": name,
            "food_interactions": facts,
        }));
    }

    if facts.is_empty() {
        println!("No food interactions recorded for '{name}'");
        return Ok(());
    }
    for fact in &facts {
        println!("• {fact}");
    }
    Ok(())
}
