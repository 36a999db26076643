// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! ResolveLite CLI entry point

use clap::Parser;
use colored::Colorize;

mod cli;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments first to get log level
    let cli = Cli::parse();

    // Determine log level from CLI args or environment variable
    let log_level = if cli.verbose {
        // -v/--verbose flag takes precedence
        log::LevelFilter::Debug
    } else if let Some(level) = cli.log_level {
        // --log-level flag
        level.to_level_filter()
    } else {
        // Default to Warn (can still be overridden by RUST_LOG env var)
        log::LevelFilter::Warn
    };

    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    let format = cli.format;
    match &cli.command {
        Some(Commands::Version) => {
            println!("{} {}", "ResolveLite".bold().green(), resolvelite::VERSION);
            println!("Entity resolution client");
            Ok(())
        }

        Some(Commands::Setup { no_sample }) => cli::handle_setup(&cli, *no_sample),

        None | Some(Commands::Examples) => {
            let interrupted = cli::install_interrupt_flag();
            println!("Initializing ResolveLite...");
            let db = cli::open_engine(&cli);
            println!("{}\n", "✓ ResolveLite initialized successfully".green());
            cli::run_examples(&db, &interrupted);
            println!("Cleaning up...\n");
            cli::release_engine(db);
            Ok(())
        }

        Some(command) => {
            let db = cli::open_engine(&cli);
            let result = match command {
                Commands::Add { record, info } => cli::handle_add(&db, record, *info, format),
                Commands::Get {
                    data_source,
                    record_id,
                    entity_id,
                } => cli::handle_get(
                    &db,
                    data_source.as_deref(),
                    record_id.as_deref(),
                    *entity_id,
                    format,
                ),
                Commands::Search { attributes, limit } => {
                    cli::handle_search(&db, attributes, *limit, format)
                }
                Commands::Path {
                    start,
                    end,
                    max_degrees,
                } => cli::handle_path(&db, *start, *end, *max_degrees, format),
                Commands::Why {
                    data_source_1,
                    record_id_1,
                    data_source_2,
                    record_id_2,
                } => cli::handle_why(
                    &db,
                    (data_source_1.as_str(), record_id_1.as_str()),
                    (data_source_2.as_str(), record_id_2.as_str()),
                    format,
                ),
                Commands::Stats => cli::handle_stats(&db, format),
                Commands::Version | Commands::Setup { .. } | Commands::Examples => Ok(()),
            };
            db.close()?;
            result
        }
    }
}
