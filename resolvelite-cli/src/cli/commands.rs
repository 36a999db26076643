// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Command-line definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// ResolveLite - entity resolution client and demonstration runner
#[derive(Parser, Debug)]
#[command(name = "resolvelite")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Project directory (defaults to $RESOLVELITE_PROJECT_DIR or /var/resolvelite/project)
    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Complete engine configuration document; overrides --project-dir
    #[arg(long, global = true)]
    pub config_json: Option<String>,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level
    #[arg(long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the six demonstration examples (default)
    Examples,

    /// Create the project layout, register data sources and load sample records
    Setup {
        /// Register data sources only
        #[arg(long)]
        no_sample: bool,
    },

    /// Add a record from its JSON definition
    Add {
        /// Record JSON; DATA_SOURCE and RECORD_ID are read from it
        record: String,

        /// Report affected entities
        #[arg(long)]
        info: bool,
    },

    /// Show the entity a record resolved to
    Get {
        /// Data source code
        #[arg(required_unless_present = "entity_id")]
        data_source: Option<String>,

        /// Record ID
        #[arg(required_unless_present = "entity_id")]
        record_id: Option<String>,

        /// Look up by entity ID instead
        #[arg(long, conflicts_with_all = ["data_source", "record_id"])]
        entity_id: Option<i64>,
    },

    /// Search entities by attributes
    Search {
        /// Search attributes as JSON
        attributes: String,

        /// Maximum number of results to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Find a relationship path between two entities
    Path {
        start: i64,
        end: i64,

        /// Maximum degrees of separation
        #[arg(long, default_value = "3")]
        max_degrees: u32,
    },

    /// Explain why two records did or did not resolve
    Why {
        data_source_1: String,
        record_id_1: String,
        data_source_2: String,
        record_id_2: String,
    },

    /// Datastore statistics and engine workload
    Stats,

    /// Show version information
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_runs_examples() {
        let cli = Cli::try_parse_from(["resolvelite"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.format, OutputFormat::Table);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "resolvelite",
            "path",
            "1",
            "2",
            "--max-degrees",
            "2",
            "--project-dir",
            "/tmp/p",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.project_dir, Some(PathBuf::from("/tmp/p")));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(
            cli.command,
            Some(Commands::Path {
                start: 1,
                end: 2,
                max_degrees: 2
            })
        ));
    }

    #[test]
    fn test_get_by_entity_id() {
        let cli = Cli::try_parse_from(["resolvelite", "get", "--entity-id", "7"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Get {
                entity_id: Some(7),
                ..
            })
        ));
        assert!(Cli::try_parse_from(["resolvelite", "get"]).is_err());
    }

    #[test]
    fn test_log_level_maps_to_filter() {
        let cli = Cli::try_parse_from(["resolvelite", "stats", "--log-level", "info"]).unwrap();
        assert_eq!(
            cli.log_level.map(LogLevel::to_level_filter),
            Some(log::LevelFilter::Info)
        );
    }
}
