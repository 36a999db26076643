//! Test fixture for ResolveLite integration tests
//!
//! Provides isolated engine instances using ONLY the public backend API.

use resolvelite::{
    open_backend, Backend, ConfigBackend, EngineBackend, EngineConfig, EntityFlags, InfoFlags,
};
use serde_json::Value;
use std::sync::Arc;

/// Test fixture with an isolated engine instance
pub struct TestFixture {
    engine: Arc<dyn Backend>,
    config: EngineConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestFixture {
    /// Engine on a sled datastore inside a fresh temporary project directory
    ///
    /// Falls back to a memory datastore when built without sled.
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        if !cfg!(feature = "sled-backend") {
            return Self::memory();
        }
        let temp_dir = tempfile::tempdir()?;
        let config = EngineConfig::init_project_dir(temp_dir.path())?;
        Self::open(config, temp_dir)
    }

    /// Engine on a volatile memory datastore
    pub fn memory() -> Result<Self, Box<dyn std::error::Error>> {
        let temp_dir = tempfile::tempdir()?;
        let config = EngineConfig::init_project_dir(temp_dir.path())?
            .with_connection(format!("memory://test_{}", fastrand::u64(..)));
        Self::open(config, temp_dir)
    }

    fn open(
        config: EngineConfig,
        temp_dir: tempfile::TempDir,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let engine = open_backend("resolvelite-test", &config)?;
        engine.add_data_source("CUSTOMERS")?;
        Ok(TestFixture {
            engine,
            config,
            _temp_dir: temp_dir,
        })
    }

    pub fn engine(&self) -> &dyn Backend {
        self.engine.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Unique record ID for tests that must not collide
    pub fn unique_id(prefix: &str) -> String {
        format!("{}_{}", prefix, fastrand::u32(..))
    }

    /// Add a CUSTOMERS record and return its entity ID
    pub fn add(&self, record_id: &str, definition: Value) -> i64 {
        self.engine
            .add_record(
                "CUSTOMERS",
                record_id,
                &definition.to_string(),
                InfoFlags::default(),
            )
            .unwrap_or_else(|e| panic!("add_record {} failed: {}", record_id, e));
        self.entity_id_of(record_id)
    }

    /// Entity currently holding a CUSTOMERS record
    pub fn entity_id_of(&self, record_id: &str) -> i64 {
        let doc = self.json(
            &self
                .engine
                .get_entity_by_record_id("CUSTOMERS", record_id, EntityFlags::minimal())
                .unwrap_or_else(|e| panic!("lookup {} failed: {}", record_id, e)),
        );
        doc["RESOLVED_ENTITY"]["ENTITY_ID"]
            .as_i64()
            .expect("ENTITY_ID is an integer")
    }

    pub fn json(&self, response: &str) -> Value {
        serde_json::from_str(response)
            .unwrap_or_else(|e| panic!("Response is not JSON ({}): {}", e, response))
    }
}
