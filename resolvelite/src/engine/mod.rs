// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Backend traits - the JSON contract with an entity-resolution engine
//!
//! Requests carry identifiers, serialized JSON documents and named detail
//! flags; responses are JSON documents. Bindings to an external engine
//! implement these traits; the bundled [`loopback::LoopbackEngine`] does too.

pub mod loopback;

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::flags::{EntityFlags, InfoFlags, PathFlags, SearchFlags, WhyFlags};
use std::sync::Arc;

/// Record, entity, search, path and why operations
pub trait EngineBackend: Send + Sync {
    /// Submit a record for resolution
    ///
    /// Returns `"{}"` unless `flags.with_info` is set, in which case the
    /// response lists `AFFECTED_ENTITIES`.
    fn add_record(
        &self,
        data_source_code: &str,
        record_id: &str,
        record_definition: &str,
        flags: InfoFlags,
    ) -> EngineResult<String>;

    /// Remove a record and re-resolve whatever it touched
    fn delete_record(
        &self,
        data_source_code: &str,
        record_id: &str,
        flags: InfoFlags,
    ) -> EngineResult<String>;

    /// Resolved entity currently containing a record
    fn get_entity_by_record_id(
        &self,
        data_source_code: &str,
        record_id: &str,
        flags: EntityFlags,
    ) -> EngineResult<String>;

    /// Resolved entity by its identifier
    fn get_entity_by_entity_id(&self, entity_id: i64, flags: EntityFlags)
        -> EngineResult<String>;

    /// Candidate entities for a set of identifying attributes
    fn search_by_attributes(&self, attributes: &str, flags: SearchFlags) -> EngineResult<String>;

    /// Shortest relationship path between two entities
    fn find_path_by_entity_id(
        &self,
        start_entity_id: i64,
        end_entity_id: i64,
        max_degrees: u32,
        flags: PathFlags,
    ) -> EngineResult<String>;

    /// Explain the resolution decision between two records
    fn why_records(
        &self,
        data_source_code_1: &str,
        record_id_1: &str,
        data_source_code_2: &str,
        record_id_2: &str,
        flags: WhyFlags,
    ) -> EngineResult<String>;

    /// Engine-internal workload counters
    fn get_stats(&self) -> EngineResult<String>;

    /// Release engine resources; later calls fail with `NotInitialized`
    fn destroy(&self) -> EngineResult<()>;
}

/// Datastore-level diagnostics
pub trait DiagnosticBackend: Send + Sync {
    /// Record counts per data source and the resolved entity count
    fn get_datastore_info(&self) -> EngineResult<String>;
}

/// Engine configuration management
pub trait ConfigBackend: Send + Sync {
    /// Register a data source code
    fn add_data_source(&self, data_source_code: &str) -> EngineResult<String>;

    /// Registered data sources
    fn get_data_sources(&self) -> EngineResult<String>;
}

/// Everything a client needs from one engine instance
pub trait Backend: EngineBackend + DiagnosticBackend + ConfigBackend {}

impl<T: EngineBackend + DiagnosticBackend + ConfigBackend> Backend for T {}

/// Validate a configuration and open the bundled backend on it
pub fn open_backend(instance_name: &str, config: &EngineConfig) -> EngineResult<Arc<dyn Backend>> {
    let target = config.validate()?;
    log::info!(
        "Opening engine instance '{}' on {}",
        instance_name,
        target
    );
    let engine = loopback::LoopbackEngine::open(instance_name, &target)?;
    Ok(Arc::new(engine))
}
