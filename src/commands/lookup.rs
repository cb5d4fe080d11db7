use anyhow::Result;
use drugstore::{Config, DrugRecord};
use serde_json::json;

pub fn execute(config: &Config, name: &str, exact: bool, json: bool) -> Result<()> {
    let knowledge = super::open_knowledge(config)?;

    let (record, tier) = if exact {
        (knowledge.lookup_exact(name)?, None)
    } else {
        match knowledge.lookup_match(name)? {
            Some(found) => (Some(found.record), Some(found.tier)),
            None => (None, None),
        }
    };

    if json {
        return super::print_json(&json!({
            "query": name,
            "match": tier.map(|t| t.as_str()),
            "drug": record,
        }));
    }

    match record {
        Some(record) => {
            if let Some(tier) = tier {
                println!("Matched '{}' ({} match)\n", name, tier.as_str());
            }
            print_record(&record);
        }
        None => println!("No drug found for '{name}'"),
    }
    Ok(())
}

fn print_record(record: &DrugRecord) {
    println!("{} ({})", record.name, record.id);
    let sections = [
        ("Description", &record.description),
        ("Indication", &record.indication),
        ("Mechanism of action", &record.mechanism_of_action),
        ("Toxicity", &record.toxicity),
    ];
    for (label, value) in sections {
        if let Some(text) = value {
            println!("\n{label}:\n  {text}");
        }
    }
}
