//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Wrap drug elements in a DrugBank root element
pub fn document(drugs: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <drugbank xmlns=\"http://www.drugbank.ca\" version=\"5.1\">\n{drugs}</drugbank>\n"
    )
}

/// The two-record dump: Warfarin interacting with "Aspirin" by name only
pub fn warfarin_aspirin() -> String {
    document(
        r#"  <drug type="small molecule">
    <drugbank-id primary="true">DB001</drugbank-id>
    <drugbank-id>APRD00001</drugbank-id>
    <name>Warfarin</name>
    <description>Vitamin K antagonist anticoagulant.</description>
    <drug-interactions>
      <drug-interaction>
        <name>Aspirin</name>
        <description>Increased risk of bleeding.</description>
      </drug-interaction>
    </drug-interactions>
    <food-interactions>
      <food-interaction>Reduces effect with vitamin K rich foods</food-interaction>
    </food-interactions>
  </drug>
  <drug type="small molecule">
    <drugbank-id primary="true">DB002</drugbank-id>
    <name>Aspirin</name>
    <drug-interactions/>
    <food-interactions/>
  </drug>
"#,
    )
}

/// `count` minimal records with one interaction and one food note each
pub fn synthetic(count: usize) -> String {
    let mut drugs = String::with_capacity(count * 400);
    for i in 0..count {
        let _ = write!(
            drugs,
            "  <drug><drugbank-id primary=\"true\">DB{i:07}</drugbank-id>\
             <name>Synthetic compound {i}</name>\
             <description>Generated record number {i} used for load testing.</description>\
             <drug-interactions><drug-interaction>\
             <drugbank-id>DB{next:07}</drugbank-id><name>Synthetic compound {next}</name>\
             <description>May increase serum concentration.</description>\
             </drug-interaction></drug-interactions>\
             <food-interactions><food-interaction>Take with food.</food-interaction></food-interactions>\
             </drug>\n",
            next = (i + 1) % count.max(1)
        );
    }
    document(&drugs)
}

pub fn write_xml(dir: &Path, name: &str, content: &str) -> std::io::Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, content)?;
    Ok(path)
}
