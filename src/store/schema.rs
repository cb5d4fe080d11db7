/// Drug store schema
///
/// `interacting_drug_id` is deliberately not a foreign key: the dump does not
/// guarantee every interacting drug has its own record.
pub const SCHEMA: &str = r#"
-- Canonical drug records, one per primary DrugBank id
CREATE TABLE IF NOT EXISTS drugs (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    indication TEXT,
    mechanism_of_action TEXT,
    toxicity TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

-- Directed drug-drug interaction edges
CREATE TABLE IF NOT EXISTS drug_interactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    drug_id TEXT NOT NULL,
    interacting_drug_id TEXT, -- NULL when the source omitted it
    interacting_drug_name TEXT NOT NULL,
    description TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

-- Free-text food interaction notes
CREATE TABLE IF NOT EXISTS food_interactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    drug_id TEXT NOT NULL,
    description TEXT NOT NULL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

-- Ingestion metadata (completion marker)
CREATE TABLE IF NOT EXISTS store_meta (
    key TEXT PRIMARY KEY,
    value TEXT
);

-- Indexes for name lookups and per-drug fan-out
CREATE INDEX IF NOT EXISTS idx_drugs_name ON drugs(name COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS idx_drug_interactions_drug_id ON drug_interactions(drug_id);
CREATE INDEX IF NOT EXISTS idx_drug_interactions_target ON drug_interactions(interacting_drug_id);
CREATE INDEX IF NOT EXISTS idx_food_interactions_drug_id ON food_interactions(drug_id);
"#;
