// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! The six demonstration examples
//!
//! Each example prints a banner, then `✓` and its findings or `✗` and the
//! error. A failing or panicking example never stops the ones after it.

use colored::Colorize;
use resolvelite_sdk::{
    AddRecordFlags, EntityFlags, Error, PathFlags, PathOutcome, Record, ResolveLite,
    SearchAttributes, SearchFlags, WhyFlags,
};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

const RULE_WIDTH: usize = 60;

/// Outcome counts of one run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExampleSummary {
    pub passed: usize,
    pub failed: usize,
    pub interrupted: bool,
}

type Example = fn(&ResolveLite) -> Result<(), Error>;

/// Run Examples 1-6 in order against an open engine
///
/// Stops before the next example once `interrupted` is set.
pub fn run_examples(db: &ResolveLite, interrupted: &AtomicBool) -> ExampleSummary {
    println!("\n{}", "=".repeat(RULE_WIDTH));
    println!("{}", "RESOLVELITE SDK EXAMPLES".bold());
    println!("{}\n", "=".repeat(RULE_WIDTH));

    let examples: [(String, Example); 6] = [
        ("EXAMPLE 1: Adding a New Record".to_string(), add_new_record),
        (
            "EXAMPLE 2: Getting Entity for CUSTOMERS 1070".to_string(),
            get_entity_by_record,
        ),
        ("EXAMPLE 3: Searching by Attributes".to_string(), search_by_attributes),
        (
            "EXAMPLE 4: Finding Path Between Entities 1 and 2".to_string(),
            find_path_between_entities,
        ),
        (
            "EXAMPLE 5: Why Analysis - CUSTOMERS 1001 vs CUSTOMERS 1002".to_string(),
            why_records,
        ),
        ("EXAMPLE 6: System Statistics".to_string(), statistics),
    ];

    let mut summary = ExampleSummary::default();
    for (title, example) in examples {
        if interrupted.load(Ordering::SeqCst) {
            log::warn!("Keyboard interrupt received, skipping remaining examples");
            println!("\n{}\n", "Execution interrupted by user.".yellow());
            summary.interrupted = true;
            return summary;
        }
        if run_example(&title, example, db) {
            summary.passed += 1;
        } else {
            summary.failed += 1;
        }
    }

    println!("{}", "=".repeat(RULE_WIDTH));
    if summary.failed == 0 {
        println!("{}", "All examples completed successfully!".bold().green());
    } else {
        println!(
            "{}",
            format!(
                "{} of {} examples failed",
                summary.failed,
                summary.passed + summary.failed
            )
            .yellow()
        );
    }
    println!("{}\n", "=".repeat(RULE_WIDTH));
    summary
}

fn run_example(title: &str, example: Example, db: &ResolveLite) -> bool {
    println!("{}", "=".repeat(RULE_WIDTH));
    println!("{}", title.bold());
    println!("{}", "=".repeat(RULE_WIDTH));

    match panic::catch_unwind(AssertUnwindSafe(|| example(db))) {
        Ok(Ok(())) => {
            println!();
            true
        }
        Ok(Err(e)) => {
            println!("{}\n", format!("✗ {}", e).red());
            false
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            log::error!("{} panicked: {}", title, message);
            println!("{}\n", format!("✗ Unexpected error: {}", message).red());
            false
        }
    }
}

fn add_new_record(db: &ResolveLite) -> Result<(), Error> {
    let record = Record::builder()
        .data_source("CUSTOMERS")
        .record_id("NEW_001")
        .record_type("PERSON")
        .attribute("PRIMARY_NAME_LAST", "Smith")
        .attribute("PRIMARY_NAME_FIRST", "Jane")
        .attribute("DATE_OF_BIRTH", "1985-03-15")
        .attribute("ADDR_LINE1", "123 Main Street")
        .attribute("ADDR_CITY", "Las Vegas")
        .attribute("ADDR_STATE", "NV")
        .attribute("ADDR_POSTAL_CODE", "89101")
        .attribute("PHONE_NUMBER", "702-555-1234")
        .attribute("EMAIL_ADDRESS", "jane.smith@example.com")
        .build();

    let info = db.engine().add_record_with_info(
        "CUSTOMERS",
        "NEW_001",
        &record,
        AddRecordFlags::default(),
    )?;

    println!("{}", "✓ Record added successfully!".green());
    println!("  Data Source: {}", info.data_source);
    println!("  Record ID: {}", info.record_id);
    println!("  Affected Entities: {}", info.affected_entities.len());
    Ok(())
}

fn get_entity_by_record(db: &ResolveLite) -> Result<(), Error> {
    let flags = EntityFlags::default()
        .with_all_features(true)
        .with_record_data(true);
    let entity = db
        .engine()
        .get_entity_by_record_id("CUSTOMERS", "1070", flags)?;
    let resolved = &entity.resolved_entity;

    println!("{}", "✓ Entity found!".green());
    println!("  Entity ID: {}", resolved.entity_id);
    println!("  Entity Name: {}", resolved.entity_name);
    println!("  Total Records: {}", resolved.records.len());
    for record in &resolved.records {
        println!("    - {}: {}", record.data_source, record.record_id);
    }

    if !entity.related_entities.is_empty() {
        println!("  Related Entities: {}", entity.related_entities.len());
        for rel in entity.related_entities.iter().take(3) {
            println!(
                "    - Entity {}: {} ({})",
                rel.entity_id, rel.entity_name, rel.match_level_code
            );
        }
    }
    Ok(())
}

fn search_by_attributes(db: &ResolveLite) -> Result<(), Error> {
    let attributes = SearchAttributes::builder()
        .name_full("Robert Smith")
        .date_of_birth("1978-12-11")
        .build();
    let response = db
        .engine()
        .search_by_attributes(&attributes, SearchFlags::default().with_stats(true))?;

    println!("{}", "✓ Search completed!".green());
    println!("  Search criteria: {}", attributes.to_json()?);
    println!("  Entities found: {}", response.entities.len());
    for (i, entity) in response.entities.iter().take(5).enumerate() {
        println!("\n  Result {}:", i + 1);
        println!("    Entity ID: {}", entity.entity_id);
        println!("    Entity Name: {}", entity.entity_name);
        println!("    Match Score: {}", entity.match_score);
        let names = entity.names();
        if !names.is_empty() {
            println!("    Features:");
            for name in names.iter().take(2) {
                println!("      - Name: {}", name);
            }
        }
    }
    Ok(())
}

fn find_path_between_entities(db: &ResolveLite) -> Result<(), Error> {
    let flags = PathFlags::default().with_matching_info(true);
    let outcome = db.engine().find_path_by_entity_id(1, 2, 3, flags)?;

    println!("{}", "✓ Path analysis completed!".green());
    match outcome {
        PathOutcome::Found(path) => {
            println!("  Path found with {} entities:", path.entities.len());
            for (i, entity) in path.entities.iter().enumerate() {
                println!(
                    "    {}. Entity {}: {}",
                    i + 1,
                    entity.entity_id,
                    entity.entity_name.as_deref().unwrap_or("")
                );
            }
        }
        PathOutcome::NoPath => println!("  No path found between these entities"),
        PathOutcome::EntityNotFound(id) => println!("  Entity {} does not exist", id),
    }
    Ok(())
}

fn why_records(db: &ResolveLite) -> Result<(), Error> {
    let response =
        db.engine()
            .why_records("CUSTOMERS", "1001", "CUSTOMERS", "1002", WhyFlags::default())?;

    println!("{}", "✓ Why analysis completed!".green());
    let Some(result) = response.first() else {
        println!("  Result: NO MATCH");
        return Ok(());
    };
    if result.is_match() {
        println!("  Result: MATCH");
        println!("  Reason: {}", result.match_info.why_key);
        println!("  Match Level: {}", result.match_level());
    } else {
        println!("  Result: NO MATCH");
    }

    if !result.feature_scores().is_empty() {
        println!("\n  Matching Features:");
        for (feature_type, scores) in result.feature_scores().iter().take(3) {
            println!("    - {}: {} feature(s)", feature_type, scores.len());
        }
    }
    Ok(())
}

fn statistics(db: &ResolveLite) -> Result<(), Error> {
    let info = db.diagnostic().get_datastore_info()?;

    println!("{}", "✓ Database Statistics:".green());
    println!("\n  Data Sources: {}", info.data_sources.len());
    for ds in &info.data_sources {
        println!("    - {}: {} records", ds.code, ds.record_count);
    }
    println!("\n  Total Entities Resolved: {}", info.entity_count);
    Ok(())
}
