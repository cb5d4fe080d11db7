use anyhow::{bail, Result};
use drugstore::{Config, InteractionEdge};
use std::collections::HashMap;

pub fn execute(config: &Config, names: &[String], json: bool) -> Result<()> {
    if names.len() < 2 {
        bail!("Need at least two drug names to check interactions");
    }

    let knowledge = super::open_knowledge(config)?;
    let edges = knowledge.interactions_for_pair_set(names)?;

    if json {
        return super::print_json(&edges);
    }

    if edges.is_empty() {
        println!("No known interactions among: {}", names.join(", "));
        return Ok(());
    }

    // id -> canonical name for the drugs the edges start from
    let mut resolved = HashMap::new();
    for name in names {
        if let Some(record) = knowledge.lookup_exact_or_fuzzy(name)? {
            resolved.insert(record.id, record.name);
        }
    }

    for edge in &edges {
        println!("⚠ {}", edge_label(edge, &resolved));
        if let Some(description) = &edge.description {
            println!("  {description}");
        }
    }
    Ok(())
}

/// `Warfarin ↔ Aspirin`, falling back to the id when the source drug has no known name
fn edge_label(edge: &InteractionEdge, names: &HashMap<String, String>) -> String {
    let from = names
        .get(&edge.drug_id)
        .filter(|name| !name.is_empty())
        .map(String::as_str)
        .unwrap_or(&edge.drug_id);
    format!("{} ↔ {}", from, edge.interacting_drug_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(from: &str, to: &str) -> InteractionEdge {
        InteractionEdge {
            drug_id: from.to_string(),
            interacting_drug_id: None,
            interacting_drug_name: to.to_string(),
            description: None,
        }
    }

    #[test]
    fn test_label_uses_names_on_both_sides() {
        let names = HashMap::from([("DB001".to_string(), "Warfarin".to_string())]);
        assert_eq!(edge_label(&edge("DB001", "Aspirin"), &names), "Warfarin ↔ Aspirin");
    }

    #[test]
    fn test_label_falls_back_to_id() {
        let names = HashMap::from([("DB002".to_string(), String::new())]);
        assert_eq!(edge_label(&edge("DB002", "Aspirin"), &names), "DB002 ↔ Aspirin");
        assert_eq!(edge_label(&edge("DB003", "Aspirin"), &HashMap::new()), "DB003 ↔ Aspirin");
    }
}
