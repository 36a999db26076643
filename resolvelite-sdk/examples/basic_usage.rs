//! Basic usage example for the ResolveLite SDK
//!
//! This example demonstrates the core features of the ResolveLite Rust SDK:
//! - Opening an engine on a project directory
//! - Registering data sources
//! - Adding records and reading resolved entities
//! - Searching by attributes
//! - Relationship paths and why analysis
//!
//! Run with: cargo run --example basic_usage

use resolvelite_sdk::{
    AddRecordFlags, EngineConfig, EntityFlags, Error, PathFlags, PathOutcome, Record, ResolveLite,
    SearchAttributes, SearchFlags, WhyFlags,
};

fn main() -> Result<(), Error> {
    println!("=== ResolveLite SDK Basic Usage Example ===\n");

    // 1. Open the engine
    println!("1. Opening engine...");
    let project_dir = "/tmp/resolvelite_sdk_example";
    let config = EngineConfig::init_project_dir(project_dir)
        .map_err(|e| Error::Configuration(e.to_string()))?;
    let db = ResolveLite::open("basic-usage", &config)?;
    println!("   ✓ Engine opened on {}\n", project_dir);

    // 2. Register a data source
    println!("2. Registering data source...");
    let id = db.config().ensure_data_source("CUSTOMERS")?;
    println!("   ✓ CUSTOMERS has id {}\n", id);

    // 3. Add records
    println!("3. Adding records...");
    let engine = db.engine();
    let people = [
        ("1001", "Robert Smith", "1978-12-11", "123 Main Street, Las Vegas NV 89132"),
        ("1002", "Bob Smith", "1978-12-11", "123 Main Street, Las Vegas NV 89132"),
        ("1003", "Robert Smith", "1978-12-11", "1515 Adela Lane, Las Vegas NV 89111"),
    ];
    for (record_id, name, dob, address) in people {
        let record = Record::builder()
            .data_source("CUSTOMERS")
            .record_id(record_id)
            .attribute("NAME_FULL", name)
            .attribute("DATE_OF_BIRTH", dob)
            .attribute("ADDR_FULL", address)
            .build();
        let info = engine.add_record_with_info(
            "CUSTOMERS",
            record_id,
            &record,
            AddRecordFlags::default(),
        )?;
        println!(
            "   ✓ {} affected entities {:?}",
            record_id,
            info.affected_entity_ids()
        );
    }
    println!();

    // 4. Read the resolved entity
    println!("4. Reading entity for CUSTOMERS/1001...");
    let entity = engine.get_entity_by_record_id("CUSTOMERS", "1001", EntityFlags::default())?;
    println!(
        "   Entity {} '{}' with {} records:",
        entity.entity_id(),
        entity.resolved_entity.entity_name,
        entity.resolved_entity.records.len()
    );
    for record in &entity.resolved_entity.records {
        println!("   - {}/{}", record.data_source, record.record_id);
    }
    println!();

    // 5. Search by attributes
    println!("5. Searching for Robert Smith...");
    let attributes = SearchAttributes::builder()
        .name_full("Robert Smith")
        .date_of_birth("1978-12-11")
        .build();
    let results = engine.search_by_attributes(&attributes, SearchFlags::default())?;
    for candidate in &results.entities {
        println!(
            "   - Entity {} score {} ({})",
            candidate.entity_id, candidate.match_score, candidate.match_key
        );
    }
    println!();

    // 6. Relationship path
    println!("6. Finding a path between the first two entities...");
    let start = entity.entity_id();
    let end = engine
        .get_entity_by_record_id("CUSTOMERS", "1003", EntityFlags::minimal())?
        .entity_id();
    match engine.find_path_by_entity_id(start, end, 3, PathFlags::default())? {
        PathOutcome::Found(path) => println!("   Path: {:?}\n", path.entity_ids()),
        PathOutcome::NoPath => println!("   No path within 3 degrees\n"),
        PathOutcome::EntityNotFound(id) => println!("   Entity {} does not exist\n", id),
    }

    // 7. Why analysis
    println!("7. Explaining 1001 vs 1002...");
    let why = engine.why_records("CUSTOMERS", "1001", "CUSTOMERS", "1002", WhyFlags::default())?;
    if let Some(result) = why.first() {
        println!(
            "   Why key '{}', level '{}'",
            result.match_info.why_key,
            result.match_level()
        );
        for (feature, scores) in result.feature_scores() {
            for score in scores {
                println!(
                    "   - {}: {} vs {} -> {}",
                    feature, score.inbound_feat_desc, score.candidate_feat_desc, score.score_bucket
                );
            }
        }
    }
    println!();

    // 8. Clean up
    println!("8. Closing engine...");
    for (record_id, ..) in people {
        engine.delete_record("CUSTOMERS", record_id)?;
    }
    db.close()?;
    println!("   ✓ Engine released\n");

    println!("=== Example completed successfully ===");
    Ok(())
}
