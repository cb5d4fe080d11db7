use anyhow::Result;
use drugstore::Config;

pub fn execute(config: &Config, term: &str, limit: usize, json: bool) -> Result<()> {
    let knowledge = super::open_knowledge(config)?;
    let records = knowledge.search(term, limit)?;

    if json {
        return super::print_json(&records);
    }

    if records.is_empty() {
        println!("No drugs match '{term}'");
        return Ok(());
    }
    for record in &records {
        println!("{:<10} {}", record.id, record.name);
    }
    println!("\n{} result(s)", records.len());
    Ok(())
}
