// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Result formatting for CLI output

use colored::*;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use resolvelite_sdk::{
    AddRecordInfo, DatastoreInfo, EngineStats, EntityResponse, PathOutcome, SearchResponse,
    WhyResponse,
};
use serde::Serialize;

use super::commands::OutputFormat;

/// Result formatter for the one-off commands
pub struct ResultFormatter;

impl ResultFormatter {
    pub fn add_info(info: &AddRecordInfo, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => Self::to_json(info),
            OutputFormat::Table => {
                let mut output = format!(
                    "{}\n",
                    format!("✓ Added {}/{}", info.data_source, info.record_id).green()
                );
                output.push_str(&format!(
                    "Affected entities: {:?}\n",
                    info.affected_entity_ids()
                ));
                output
            }
        }
    }

    pub fn entity(entity: &EntityResponse, format: OutputFormat) -> String {
        if format == OutputFormat::Json {
            return Self::to_json(entity);
        }
        let resolved = &entity.resolved_entity;
        let mut output = format!(
            "{} {} {}\n",
            "Entity".bold().green(),
            resolved.entity_id,
            resolved.entity_name.bold()
        );

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec![
            Cell::new("DATA_SOURCE").fg(Color::Green),
            Cell::new("RECORD_ID").fg(Color::Green),
            Cell::new("LAST_SEEN").fg(Color::Green),
        ]);
        for record in &resolved.records {
            table.add_row(vec![
                record.data_source.clone(),
                record.record_id.clone(),
                record
                    .last_seen
                    .map(|dt| dt.to_rfc3339())
                    .unwrap_or_default(),
            ]);
        }
        output.push_str(&table.to_string());
        output.push('\n');

        if !entity.related_entities.is_empty() {
            output.push_str(&format!("\n{}\n", "Related entities:".bold().yellow()));
            for rel in &entity.related_entities {
                output.push_str(&format!(
                    "  - Entity {}: {} ({}, {})\n",
                    rel.entity_id, rel.entity_name, rel.match_level_code, rel.match_key
                ));
            }
        }
        output
    }

    pub fn search(response: &SearchResponse, limit: usize, format: OutputFormat) -> String {
        if format == OutputFormat::Json {
            return Self::to_json(response);
        }
        if response.is_empty() {
            return format!("{}\n", "No matching entities".yellow());
        }

        let mut output = format!(
            "{}\nEntities found: {}\n\n",
            "Search Results".bold().green(),
            response.entities.len()
        );
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec![
            Cell::new("ENTITY_ID").fg(Color::Green),
            Cell::new("ENTITY_NAME").fg(Color::Green),
            Cell::new("SCORE").fg(Color::Green),
            Cell::new("LEVEL").fg(Color::Green),
            Cell::new("MATCH_KEY").fg(Color::Green),
        ]);
        for candidate in response.entities.iter().take(limit) {
            table.add_row(vec![
                candidate.entity_id.to_string(),
                candidate.entity_name.clone(),
                candidate.match_score.to_string(),
                candidate.match_level_code.clone(),
                candidate.match_key.clone(),
            ]);
        }
        output.push_str(&table.to_string());
        output.push('\n');
        output
    }

    pub fn path(outcome: &PathOutcome, format: OutputFormat) -> String {
        match (outcome, format) {
            (PathOutcome::Found(path), OutputFormat::Json) => Self::to_json(path),
            (PathOutcome::NoPath, OutputFormat::Json) => Self::to_json(&serde_json::json!({
                "ENTITY_PATHS": [],
                "ENTITIES": [],
            })),
            (PathOutcome::EntityNotFound(id), OutputFormat::Json) => {
                Self::to_json(&serde_json::json!({ "ENTITY_NOT_FOUND": id }))
            }
            (PathOutcome::Found(path), OutputFormat::Table) => {
                let mut output = format!(
                    "{} ({} hops)\n",
                    "Path found".bold().green(),
                    path.hop_count()
                );
                for (i, entity) in path.entities.iter().enumerate() {
                    output.push_str(&format!(
                        "  {}. Entity {}: {}",
                        i + 1,
                        entity.entity_id,
                        entity.entity_name.as_deref().unwrap_or("")
                    ));
                    if let Some(info) = &entity.match_info {
                        output.push_str(&format!(
                            " [{} {}]",
                            info.match_level_code,
                            info.match_key.cyan()
                        ));
                    }
                    output.push('\n');
                }
                output
            }
            (PathOutcome::NoPath, OutputFormat::Table) => {
                format!("{}\n", "No path found between these entities".yellow())
            }
            (PathOutcome::EntityNotFound(id), OutputFormat::Table) => {
                format!("{}\n", format!("Entity {} does not exist", id).yellow())
            }
        }
    }

    pub fn why(response: &WhyResponse, format: OutputFormat) -> String {
        if format == OutputFormat::Json {
            return Self::to_json(response);
        }
        let Some(result) = response.first() else {
            return format!("{}\n", "No why result".yellow());
        };

        let mut output = if result.is_match() {
            format!(
                "Result: {}\nReason: {}\nMatch Level: {}\n",
                "MATCH".bold().green(),
                result.match_info.why_key,
                result.match_level()
            )
        } else {
            format!("Result: {}\n", "NO MATCH".bold().red())
        };

        if !result.feature_scores().is_empty() {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec![
                Cell::new("FEATURE").fg(Color::Green),
                Cell::new("INBOUND").fg(Color::Green),
                Cell::new("CANDIDATE").fg(Color::Green),
                Cell::new("BUCKET").fg(Color::Green),
            ]);
            for (feature_type, scores) in result.feature_scores() {
                for score in scores {
                    table.add_row(vec![
                        feature_type.clone(),
                        score.inbound_feat_desc.clone(),
                        score.candidate_feat_desc.clone(),
                        score.score_bucket.clone(),
                    ]);
                }
            }
            output.push('\n');
            output.push_str(&table.to_string());
            output.push('\n');
        }
        output
    }

    pub fn stats(info: &DatastoreInfo, stats: &EngineStats, format: OutputFormat) -> String {
        if format == OutputFormat::Json {
            return Self::to_json(&serde_json::json!({
                "DATASTORE": info,
                "STATS": stats.raw,
            }));
        }

        let mut output = format!("{}\n", "Database Statistics".bold().green());
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec![
            Cell::new("DATA_SOURCE").fg(Color::Green),
            Cell::new("RECORDS").fg(Color::Green),
        ]);
        for ds in &info.data_sources {
            table.add_row(vec![ds.code.clone(), ds.record_count.to_string()]);
        }
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\nTotal Entities Resolved: {}\n",
            info.entity_count
        ));

        if let Some(workload) = &stats.workload {
            output.push_str(&format!(
                "Workload: {} added, {} deleted, {} reevaluated, {} searches\n",
                workload.added_records,
                workload.deleted_records,
                workload.reevaluations,
                workload.searches
            ));
        }
        output
    }

    fn to_json<T: Serialize>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| {
            "{\"status\": \"error\", \"error\": \"Could not serialize result to JSON\"}".to_string()
        })
    }
}
