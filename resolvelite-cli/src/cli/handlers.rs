// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI command handlers for ResolveLite

use colored::Colorize;
use resolvelite::ConnectionTarget;
use resolvelite_sdk::{
    AddRecordFlags, EngineConfig, EntityFlags, Error, PathFlags, Record, ResolveLite,
    SearchAttributes, SearchFlags, WhyFlags,
};

use super::commands::{Cli, OutputFormat};
use super::output::ResultFormatter;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Data sources registered by `setup`
pub const SAMPLE_DATA_SOURCES: [&str; 3] = ["CUSTOMERS", "REFERENCE", "WATCHLIST"];

/// Sample records loaded by `setup`, one JSON document per line
pub const SAMPLE_RECORDS: &str = include_str!("../../data/sample_records.jsonl");

const INSTANCE_NAME: &str = "resolvelite-cli";

/// Engine configuration selected by the global flags
///
/// `--config-json` wins over `--project-dir`; with neither, the environment
/// decides.
pub fn engine_config(cli: &Cli) -> Result<EngineConfig, resolvelite::EngineError> {
    if let Some(json) = &cli.config_json {
        return EngineConfig::from_json(json);
    }
    match &cli.project_dir {
        Some(dir) => Ok(EngineConfig::for_project_dir(dir)),
        None => EngineConfig::from_env(),
    }
}

/// Open the engine or exit with status 1
pub fn open_engine(cli: &Cli) -> ResolveLite {
    let opened = engine_config(cli)
        .map_err(|e| Error::Configuration(e.to_string()))
        .and_then(|config| ResolveLite::open(INSTANCE_NAME, &config));
    match opened {
        Ok(db) => db,
        Err(e) => {
            eprintln!(
                "{}",
                format!("✗ Error initializing ResolveLite: {}", e).red()
            );
            std::process::exit(1);
        }
    }
}

/// Release the engine, logging rather than propagating a failure
pub fn release_engine(db: ResolveLite) -> bool {
    match db.close() {
        Ok(()) => true,
        Err(e) => {
            log::error!("Failed to release ResolveLite: {}", e);
            false
        }
    }
}

/// Register the sample data sources and load the bundled records
pub fn load_sample_data(db: &ResolveLite) -> Result<usize, Error> {
    for code in SAMPLE_DATA_SOURCES {
        db.config().ensure_data_source(code)?;
    }
    let engine = db.engine();
    let mut loaded = 0;
    for line in SAMPLE_RECORDS.lines().filter(|l| !l.trim().is_empty()) {
        let record = Record::from_json(line)?;
        let (Some(data_source), Some(record_id)) = (record.data_source(), record.record_id())
        else {
            return Err(Error::Record(format!(
                "Sample record without DATA_SOURCE / RECORD_ID: {}",
                line
            )));
        };
        engine.add_record(data_source, record_id, &record)?;
        loaded += 1;
    }
    Ok(loaded)
}

/// Handle the setup command
///
/// Creates the project layout the configuration points at, then registers
/// the sample data sources and optionally loads the sample records.
pub fn handle_setup(cli: &Cli, no_sample: bool) -> CliResult {
    println!("{}", "Setting up ResolveLite...".bold().green());

    let config = engine_config(cli)?;
    println!("  → Creating project layout...");
    for dir in [
        &config.pipeline.config_path,
        &config.pipeline.support_path,
        &config.pipeline.resource_path,
    ] {
        std::fs::create_dir_all(dir)?;
    }
    if let ConnectionTarget::Sled { path } = config.connection_target()? {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db = open_engine(cli);
    if no_sample {
        println!("  → Registering data sources...");
        for code in SAMPLE_DATA_SOURCES {
            let id = db.config().ensure_data_source(code)?;
            println!("    {} (id {})", code, id);
        }
    } else {
        println!("  → Loading sample records...");
        let loaded = load_sample_data(&db)?;
        println!("    {} records loaded", loaded);
    }
    db.close()?;

    println!("{}", "\nResolveLite is ready to use!".bold().green());
    println!("{}", "\nRun the examples with:".yellow());
    println!("{}", "  cargo run -- examples".cyan());
    Ok(())
}

/// Handle the add command
pub fn handle_add(db: &ResolveLite, record: &str, info: bool, format: OutputFormat) -> CliResult {
    let record = Record::from_json(record)?;
    let data_source = record.data_source().unwrap_or_default().to_string();
    let record_id = record.record_id().unwrap_or_default().to_string();
    let engine = db.engine();

    if info {
        let info = engine.add_record_with_info(
            &data_source,
            &record_id,
            &record,
            AddRecordFlags::default().with_interesting_entities(true),
        )?;
        print!("{}", ResultFormatter::add_info(&info, format));
    } else {
        engine.add_record(&data_source, &record_id, &record)?;
        println!(
            "{}",
            format!("✓ Added {}/{}", data_source, record_id).green()
        );
    }
    Ok(())
}

/// Handle the get command
pub fn handle_get(
    db: &ResolveLite,
    data_source: Option<&str>,
    record_id: Option<&str>,
    entity_id: Option<i64>,
    format: OutputFormat,
) -> CliResult {
    let engine = db.engine();
    let entity = match (entity_id, data_source, record_id) {
        (Some(id), _, _) => engine.get_entity_by_entity_id(id, EntityFlags::default())?,
        (None, Some(ds), Some(id)) => {
            engine.get_entity_by_record_id(ds, id, EntityFlags::default())?
        }
        _ => return Err("either --entity-id or DATA_SOURCE RECORD_ID is required".into()),
    };
    print!("{}", ResultFormatter::entity(&entity, format));
    Ok(())
}

/// Handle the search command
pub fn handle_search(
    db: &ResolveLite,
    attributes: &str,
    limit: usize,
    format: OutputFormat,
) -> CliResult {
    let attributes = SearchAttributes::from_json(attributes)?;
    let response = db
        .engine()
        .search_by_attributes(&attributes, SearchFlags::default().with_stats(true))?;
    print!("{}", ResultFormatter::search(&response, limit, format));
    Ok(())
}

/// Handle the path command
pub fn handle_path(
    db: &ResolveLite,
    start: i64,
    end: i64,
    max_degrees: u32,
    format: OutputFormat,
) -> CliResult {
    let outcome = db.engine().find_path_by_entity_id(
        start,
        end,
        max_degrees,
        PathFlags::default().with_matching_info(true),
    )?;
    print!("{}", ResultFormatter::path(&outcome, format));
    Ok(())
}

/// Handle the why command
pub fn handle_why(
    db: &ResolveLite,
    first: (&str, &str),
    second: (&str, &str),
    format: OutputFormat,
) -> CliResult {
    let response =
        db.engine()
            .why_records(first.0, first.1, second.0, second.1, WhyFlags::default())?;
    print!("{}", ResultFormatter::why(&response, format));
    Ok(())
}

/// Handle the stats command
pub fn handle_stats(db: &ResolveLite, format: OutputFormat) -> CliResult {
    let info = db.diagnostic().get_datastore_info()?;
    let stats = db.engine().get_stats()?;
    print!("{}", ResultFormatter::stats(&info, &stats, format));
    Ok(())
}
