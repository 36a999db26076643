// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Datastore drivers for the loopback engine
//!
//! Trait-based key-value abstraction so the engine can keep its records on
//! disk (Sled) or in memory without caring which.
//!
//! ```text
//! LoopbackEngine (records, assignments, data sources)
//!     ↓
//! StorageDriver (named trees)
//!     ↓
//! SledDriver | MemoryStorageDriver
//! ```

pub mod factory;
pub mod memory;
#[cfg(feature = "sled-backend")]
pub mod sled;
pub mod traits;
pub mod types;

pub use factory::{create_storage_driver, BoxedDriver};
pub use traits::{StorageDriver, StorageTree};
pub use types::{StorageError, StorageResult, StorageType};
