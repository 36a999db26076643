//! ResolveLite SDK - typed Rust client for entity-resolution engines
//!
//! This crate wraps the JSON contract of the `resolvelite` engine boundary in
//! typed requests and responses, lifetime-checked handles and a per-operation
//! error taxonomy.
//!
//! # Quick Start
//!
//! ```no_run
//! use resolvelite_sdk::{EntityFlags, Error, Record, ResolveLite};
//!
//! # fn main() -> Result<(), Error> {
//! // Initialize from RESOLVELITE_PROJECT_DIR / RESOLVELITE_ENGINE_CONFIGURATION_JSON
//! let db = ResolveLite::from_env("quick-start")?;
//! let engine = db.engine();
//!
//! let record = Record::builder()
//!     .data_source("CUSTOMERS")
//!     .record_id("NEW_001")
//!     .attribute("NAME_FULL", "Jane Smith")
//!     .attribute("DATE_OF_BIRTH", "1985-03-15")
//!     .build();
//! engine.add_record("CUSTOMERS", "NEW_001", &record)?;
//!
//! let entity = engine.get_entity_by_record_id("CUSTOMERS", "NEW_001", EntityFlags::default())?;
//! for record in &entity.resolved_entity.records {
//!     println!("{}/{}", record.data_source, record.record_id);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Factory** - one engine instance per [`ResolveLite`], released exactly once
//! - **Borrowed handles** - [`Engine`], [`Diagnostic`], [`ConfigManager`] cannot outlive the factory
//! - **Builders** - [`RecordBuilder`] and [`SearchBuilder`] instead of hand-written JSON
//! - **Typed results** - serde DTOs for every response document
//! - **Named flags** - detail flag structures instead of bitmasks
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │   Application Code (Your Rust App)      │
//! └─────────────────────────────────────────┘
//!                  │
//!                  ▼
//! ┌─────────────────────────────────────────┐
//! │  ResolveLite SDK (this crate)           │
//! │  - ResolveLite (factory)                │
//! │  - Engine / Diagnostic / ConfigManager  │
//! │  - Record / SearchAttributes builders   │
//! │  - Typed response documents             │
//! └─────────────────────────────────────────┘
//!                  │ JSON
//!                  ▼
//! ┌─────────────────────────────────────────┐
//! │  ResolveLite Core (resolvelite crate)   │
//! │  - Backend traits                       │
//! │  - Loopback engine + storage            │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! - [`connection`] - Factory and lifetime management
//! - [`engine`] - Record, entity, search, path and why operations
//! - [`diagnostic`] - Datastore diagnostics
//! - [`config_manager`] - Data source registration
//! - [`record`] - Request builders
//! - [`result`] - Response documents
//! - [`error`] - Error types and handling

// Re-export core types for convenience
pub use resolvelite::{
    EngineConfig, EntityFlags, InfoFlags, PathFlags, SearchFlags, WhyFlags,
};

// SDK modules
pub mod config_manager;
pub mod connection;
pub mod diagnostic;
pub mod engine;
pub mod error;
pub mod record;
pub mod result;

// Re-export main types for convenience
pub use config_manager::ConfigManager;
pub use connection::ResolveLite;
pub use diagnostic::Diagnostic;
pub use engine::{AddRecordFlags, Engine};
pub use error::{Error, Result};
pub use record::{Record, RecordBuilder, SearchAttributes, SearchBuilder};
pub use result::{
    AddRecordInfo, DataSource, DataSourceCount, DatastoreInfo, EngineStats, EntityResponse,
    FeatureScore, MatchInfo, PathEntity, PathOutcome, PathResponse, RecordRef, RelatedEntity,
    ResolvedEntity, SearchResponse, SearchResultEntity, WhyResponse, WhyResult, Workload,
};
