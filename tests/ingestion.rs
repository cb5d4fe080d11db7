//! End-to-end ingestion properties: XML on disk -> store on disk -> queries

mod common;

use drugstore::store::DrugStore;
use drugstore::{initialize, Config, DrugKnowledge, Error, IngestOptions};
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn test_warfarin_aspirin_scenario() -> TestResult {
    let temp = TempDir::new()?;
    let xml = common::write_xml(temp.path(), "drugs.xml", &common::warfarin_aspirin())?;
    let store_path = temp.path().join("drugs.db");

    initialize(&xml, &store_path, &IngestOptions::default())?;
    let store = DrugStore::open(&store_path)?;

    let warfarin = store.get_by_name("warfarin")?.ok_or("warfarin missing")?;
    assert_eq!(warfarin.id, "DB001");
    assert_eq!(
        warfarin.description.as_deref(),
        Some("Vitamin K antagonist anticoagulant.")
    );

    let edges = store.get_interaction_matrix(&["DB001".to_string(), "DB002".to_string()])?;
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].drug_id, "DB001");
    assert_eq!(edges[0].interacting_drug_id, None);
    assert_eq!(edges[0].interacting_drug_name, "Aspirin");

    assert_eq!(
        store.get_food_facts_for("DB001")?,
        vec!["Reduces effect with vitamin K rich foods".to_string()]
    );
    assert!(store.get_food_facts_for("DB002")?.is_empty());
    Ok(())
}

#[test]
fn test_reingestion_is_idempotent() -> TestResult {
    let temp = TempDir::new()?;
    let xml = common::write_xml(temp.path(), "drugs.xml", &common::synthetic(250))?;
    let first_path = temp.path().join("first.db");
    let second_path = temp.path().join("second.db");

    let options = IngestOptions {
        batch_size: 64,
        ..IngestOptions::default()
    };
    let first_report = initialize(&xml, &first_path, &options)?;
    let second_report = initialize(&xml, &second_path, &options)?;
    assert_eq!(first_report.load, second_report.load);

    let first = DrugStore::open(&first_path)?;
    let second = DrugStore::open(&second_path)?;
    assert_eq!(first.stats()?, second.stats()?);
    assert_eq!(first.stats()?.drugs, 250);

    let probe_ids: Vec<String> = ["DB0000000", "DB0000001", "DB0000100", "DB0000249"]
        .iter()
        .map(|id| id.to_string())
        .collect();
    for id in &probe_ids {
        assert_eq!(first.get_by_id(id)?, second.get_by_id(id)?);
        assert_eq!(first.get_interactions_for(id)?, second.get_interactions_for(id)?);
        assert_eq!(first.get_food_facts_for(id)?, second.get_food_facts_for(id)?);
    }
    assert_eq!(
        first.search("compound 12", 10)?,
        second.search("compound 12", 10)?
    );
    assert_eq!(
        first.get_interaction_matrix(&probe_ids)?,
        second.get_interaction_matrix(&probe_ids)?
    );
    Ok(())
}

#[test]
fn test_recreate_replaces_existing_store() -> TestResult {
    let temp = TempDir::new()?;
    let xml = common::write_xml(temp.path(), "drugs.xml", &common::warfarin_aspirin())?;
    let store_path = temp.path().join("drugs.db");

    initialize(&xml, &store_path, &IngestOptions::default())?;
    let again = initialize(&xml, &store_path, &IngestOptions::default());
    assert!(matches!(again, Err(Error::StoreExists { .. })));

    let report = initialize(&xml, &store_path, &IngestOptions::default().recreate(true))?;
    assert_eq!(report.load.records, 2);
    assert_eq!(DrugStore::open(&store_path)?.count()?, 2);
    Ok(())
}

#[test]
fn test_failed_rebuild_keeps_existing_store() -> TestResult {
    let temp = TempDir::new()?;
    let good = common::warfarin_aspirin();
    let xml = common::write_xml(temp.path(), "drugs.xml", &good)?;
    let store_path = temp.path().join("drugs.db");
    initialize(&xml, &store_path, &IngestOptions::default())?;

    let cut = good.find("<name>Aspirin</name>\n    <drug-interactions/>").ok_or("fixture")?;
    let broken = common::write_xml(temp.path(), "broken.xml", &good[..cut])?;
    let rebuild = initialize(&broken, &store_path, &IngestOptions::default().recreate(true));
    assert!(matches!(rebuild, Err(Error::IncompleteIngestion { .. })));

    let store = DrugStore::open(&store_path)?;
    assert_eq!(store.count()?, 2);
    assert!(store.get_by_name("aspirin")?.is_some());
    Ok(())
}

#[test]
fn test_record_without_primary_id_is_skipped() -> TestResult {
    let temp = TempDir::new()?;
    let xml = common::write_xml(
        temp.path(),
        "drugs.xml",
        &common::document(
            r#"<drug><drugbank-id>BTD00001</drugbank-id><name>No primary id</name></drug>
<drug><drugbank-id primary="true">DB00682</drugbank-id><name>Warfarin</name></drug>
"#,
        ),
    )?;
    let store_path = temp.path().join("drugs.db");

    let report = initialize(&xml, &store_path, &IngestOptions::default())?;
    assert_eq!(report.parse.records, 1);
    assert_eq!(report.parse.skipped_without_id, 1);

    let store = DrugStore::open(&store_path)?;
    assert_eq!(store.count()?, 1);
    assert!(store.get_by_id("DB00682")?.is_some());
    Ok(())
}

#[test]
fn test_malformed_record_does_not_abort_ingestion() -> TestResult {
    let temp = TempDir::new()?;
    let xml = common::write_xml(
        temp.path(),
        "drugs.xml",
        &common::document(
            r#"<drug><drugbank-id primary="true">DB1</drugbank-id><name>Broken &undefined; name</name></drug>
<drug><drugbank-id primary="true">DB2</drugbank-id><name>Intact</name></drug>
"#,
        ),
    )?;
    let store_path = temp.path().join("drugs.db");

    let report = initialize(&xml, &store_path, &IngestOptions::default())?;
    assert_eq!(report.parse.skipped_malformed, 1);

    let store = DrugStore::open(&store_path)?;
    assert!(store.get_by_id("DB1")?.is_none());
    assert!(store.get_by_id("DB2")?.is_some());
    Ok(())
}

#[test]
fn test_blank_food_notes_are_dropped() -> TestResult {
    let temp = TempDir::new()?;
    let xml = common::write_xml(
        temp.path(),
        "drugs.xml",
        &common::document(
            r#"<drug><drugbank-id primary="true">DB1</drugbank-id><name>Calcium</name>
<food-interactions>
  <food-interaction>  </food-interaction>
  <food-interaction>Avoid dairy</food-interaction>
  <food-interaction></food-interaction>
</food-interactions>
</drug>
"#,
        ),
    )?;
    let store_path = temp.path().join("drugs.db");

    initialize(&xml, &store_path, &IngestOptions::default())?;
    let store = DrugStore::open(&store_path)?;
    assert_eq!(store.get_food_facts_for("DB1")?, vec!["Avoid dairy".to_string()]);
    Ok(())
}

#[test]
fn test_matrix_ignores_input_order() -> TestResult {
    let temp = TempDir::new()?;
    let xml = common::write_xml(temp.path(), "drugs.xml", &common::warfarin_aspirin())?;
    let store_path = temp.path().join("drugs.db");
    initialize(&xml, &store_path, &IngestOptions::default())?;
    let store = DrugStore::open(&store_path)?;

    let forward = store.get_interaction_matrix(&["DB001".to_string(), "DB002".to_string()])?;
    let backward = store.get_interaction_matrix(&["DB002".to_string(), "DB001".to_string()])?;
    assert_eq!(forward.len(), 1);
    assert_eq!(forward, backward);
    Ok(())
}

#[test]
fn test_knowledge_bootstraps_missing_store() -> TestResult {
    let temp = TempDir::new()?;
    let xml = common::write_xml(temp.path(), "drugs.xml", &common::warfarin_aspirin())?;

    let mut config = Config::default();
    config.source.xml_path = xml;
    config.store.path = temp.path().join("data").join("drugs.db");

    let knowledge = DrugKnowledge::open_or_initialize(&config)?;
    assert_eq!(knowledge.stats()?.drugs, 2);

    let edges = knowledge.interactions_for_pair_set(&["Warfarin", "aspirin", "unobtainium"])?;
    assert_eq!(edges.len(), 1);
    assert_eq!(
        knowledge.food_facts_for("warfarin")?,
        vec!["Reduces effect with vitamin K rich foods".to_string()]
    );

    let completion = knowledge.completion()?.ok_or("completion marker missing")?;
    assert_eq!(completion.records, 2);

    // second call opens the existing store instead of ingesting again
    drop(knowledge);
    let reopened = DrugKnowledge::open_or_initialize(&config)?;
    assert_eq!(reopened.stats()?.drugs, 2);
    Ok(())
}

#[test]
fn test_open_rejects_missing_store() {
    let temp = TempDir::new().expect("temp dir");
    let result = DrugKnowledge::open(temp.path().join("absent.db"), &Config::default());
    assert!(matches!(result, Err(Error::StoreNotFound { .. })));
}
