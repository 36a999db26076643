// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! ResolveLite - engine boundary for entity resolution
//!
//! This crate defines the contract between a client and an entity-resolution
//! engine: the initialization configuration, the named detail flags that
//! control response verbosity, the engine error taxonomy, and the backend
//! traits every engine binding implements. All requests and responses cross
//! the boundary as JSON documents with upper-case keys.
//!
//! # Backends
//!
//! The resolution logic of a production engine is a closed box. This crate
//! ships one backend, the [`LoopbackEngine`], a deterministic stand-in that
//! resolves records on exact normalized feature values. It exists so the
//! client contract can be exercised end to end (demos, tests, benches); it is
//! not a probabilistic matcher.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │  resolvelite-sdk (client)    │
//! └──────────────────────────────┘
//!                │ JSON
//!                ▼
//! ┌──────────────────────────────┐
//! │  Backend traits (this crate) │
//! │  EngineBackend               │
//! │  DiagnosticBackend           │
//! │  ConfigBackend               │
//! └──────────────────────────────┘
//!                │
//!                ▼
//! ┌──────────────────────────────┐
//! │  LoopbackEngine              │
//! │  └─ storage (sled / memory)  │
//! └──────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use resolvelite::{open_backend, EngineBackend, EngineConfig, EntityFlags};
//!
//! let config = EngineConfig::from_env()?;
//! let backend = open_backend("example", &config)?;
//! let entity = backend.get_entity_by_record_id("CUSTOMERS", "1001", EntityFlags::default())?;
//! println!("{}", entity);
//! # Ok::<(), resolvelite::EngineError>(())
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod flags;

pub(crate) mod storage;

pub use config::{ConnectionTarget, EngineConfig, PipelineConfig, SqlConfig};
pub use engine::loopback::LoopbackEngine;
pub use engine::{open_backend, Backend, ConfigBackend, DiagnosticBackend, EngineBackend};
pub use error::{EngineError, EngineResult};
pub use flags::{EntityFlags, InfoFlags, PathFlags, SearchFlags, WhyFlags};

/// ResolveLite version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// ResolveLite crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
