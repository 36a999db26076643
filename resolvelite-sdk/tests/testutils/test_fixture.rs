//! Test fixture for ResolveLite SDK integration tests
//!
//! Each fixture owns a temporary project directory and a factory opened on
//! it, with the CUSTOMERS data source registered.

use resolvelite_sdk::{EngineConfig, EntityFlags, Record, ResolveLite};
use serde_json::{Map, Value};

pub struct SdkFixture {
    db: ResolveLite,
    _temp_dir: tempfile::TempDir,
}

impl SdkFixture {
    /// Factory on a memory datastore
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let temp_dir = tempfile::tempdir()?;
        let config = EngineConfig::init_project_dir(temp_dir.path())?
            .with_connection(format!("memory://sdk_{}", fastrand::u64(..)));
        Self::open(config, temp_dir)
    }

    /// Factory on a sled datastore under the project directory
    pub fn persistent() -> Result<Self, Box<dyn std::error::Error>> {
        let temp_dir = tempfile::tempdir()?;
        let config = EngineConfig::init_project_dir(temp_dir.path())?;
        Self::open(config, temp_dir)
    }

    fn open(
        config: EngineConfig,
        temp_dir: tempfile::TempDir,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let db = ResolveLite::open("sdk-test", &config)?;
        db.config().ensure_data_source("CUSTOMERS")?;
        Ok(SdkFixture {
            db,
            _temp_dir: temp_dir,
        })
    }

    pub fn db(&self) -> &ResolveLite {
        &self.db
    }

    /// Unique record ID so property loops never collide
    pub fn unique_id(prefix: &str) -> String {
        format!("{}_{}", prefix, fastrand::u64(..))
    }

    /// CUSTOMERS record with the given attributes
    pub fn record(record_id: &str, attributes: Value) -> Record {
        let mut fields = match attributes {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        fields.insert("DATA_SOURCE".into(), Value::from("CUSTOMERS"));
        fields.insert("RECORD_ID".into(), Value::from(record_id));
        Record::from_value(Value::Object(fields)).expect("record is an object")
    }

    /// Add a CUSTOMERS record and return its entity ID
    pub fn add(&self, record_id: &str, attributes: Value) -> i64 {
        let record = Self::record(record_id, attributes);
        let engine = self.db.engine();
        engine
            .add_record("CUSTOMERS", record_id, &record)
            .unwrap_or_else(|e| panic!("add_record {} failed: {}", record_id, e));
        engine
            .get_entity_by_record_id("CUSTOMERS", record_id, EntityFlags::minimal())
            .unwrap_or_else(|e| panic!("lookup {} failed: {}", record_id, e))
            .entity_id()
    }

    /// Release the factory but keep the project directory for a reopen
    pub fn close(self) -> Result<tempfile::TempDir, resolvelite_sdk::Error> {
        self.db.close()?;
        Ok(self._temp_dir)
    }
}
