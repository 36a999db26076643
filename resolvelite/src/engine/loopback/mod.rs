// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Loopback engine
//!
//! A deterministic, exact-key stand-in for an external entity-resolution
//! engine. It speaks the same JSON contract as a real engine so the client,
//! the demonstrations and the tests can run without one. Records are kept in
//! a storage driver (sled or memory); resolution is recomputed in memory
//! after every mutation.
//!
//! Resolution is intentionally simple: two records resolve when they share an
//! SSN, or a name plus another feature without conflicting dates of birth.
//! Entities sharing a name or contact feature without resolving are reported
//! as related.

mod documents;
mod features;
mod resolver;

use crate::config::ConnectionTarget;
use crate::error::{EngineError, EngineResult};
use crate::flags::{EntityFlags, InfoFlags, PathFlags, SearchFlags, WhyFlags};
use crate::storage::{
    create_storage_driver, BoxedDriver, StorageDriver, StorageTree, StorageType,
};
use chrono::Utc;
use features::FeatureSet;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use resolver::{RecordEntry, RecordKey, ResolutionState, StoredRecord};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};

use super::{ConfigBackend, DiagnosticBackend, EngineBackend};

/// Data sources every fresh datastore starts with
const SEEDED_DATA_SOURCES: [&str; 2] = ["TEST", "SEARCH"];

const NEXT_ENTITY_ID_KEY: &[u8] = b"next_entity_id";

static DATA_SOURCE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9_-]+$").expect("valid data source regex"));

/// Open storage: the driver plus its named trees
struct Store {
    driver: BoxedDriver,
    records: Box<dyn StorageTree>,
    assignments: Box<dyn StorageTree>,
    data_sources: Box<dyn StorageTree>,
    meta: Box<dyn StorageTree>,
}

/// Live engine state; `None` once destroyed
struct Inner {
    store: Store,
    state: ResolutionState,
    data_sources: BTreeMap<String, u32>,
}

#[derive(Default)]
struct Workload {
    added: AtomicU64,
    deleted: AtomicU64,
    reevaluations: AtomicU64,
    entity_lookups: AtomicU64,
    searches: AtomicU64,
    path_queries: AtomicU64,
    why_queries: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

fn encode_key(key: &RecordKey) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(key.0.len() + key.1.len() + 1);
    bytes.extend_from_slice(key.0.as_bytes());
    bytes.push(0);
    bytes.extend_from_slice(key.1.as_bytes());
    bytes
}

fn decode_key(bytes: &[u8]) -> EngineResult<RecordKey> {
    let split = bytes
        .iter()
        .position(|b| *b == 0)
        .ok_or_else(|| EngineError::Storage("Corrupt record key".to_string()))?;
    let text = |part: &[u8]| {
        String::from_utf8(part.to_vec())
            .map_err(|e| EngineError::Storage(format!("Corrupt record key: {}", e)))
    };
    Ok((text(&bytes[..split])?, text(&bytes[split + 1..])?))
}

fn normalize_code(code: &str) -> EngineResult<String> {
    let code = code.trim().to_uppercase();
    if code.is_empty() {
        return Err(EngineError::BadInput(
            "Data source code must not be empty".to_string(),
        ));
    }
    Ok(code)
}

fn record_key(data_source_code: &str, record_id: &str) -> EngineResult<RecordKey> {
    let data_source = normalize_code(data_source_code)?;
    let record_id = record_id.trim();
    if record_id.is_empty() {
        return Err(EngineError::BadInput(
            "Record ID must not be empty".to_string(),
        ));
    }
    Ok((data_source, record_id.to_string()))
}

fn parse_object(json: &str, what: &str) -> EngineResult<Map<String, Value>> {
    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(EngineError::BadInput(format!("{} must be a JSON object", what))),
        Err(e) => Err(EngineError::BadInput(format!("{} is not valid JSON: {}", what, e))),
    }
}

fn text_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Definition fields that name the record must agree with the call
fn check_identity(definition: &Map<String, Value>, key: &RecordKey) -> EngineResult<()> {
    if let Some(data_source) = text_field(definition, "DATA_SOURCE") {
        if data_source.to_uppercase() != key.0 {
            return Err(EngineError::BadInput(format!(
                "DATA_SOURCE '{}' does not match '{}'",
                data_source, key.0
            )));
        }
    }
    if let Some(record_id) = text_field(definition, "RECORD_ID") {
        if record_id != key.1 {
            return Err(EngineError::BadInput(format!(
                "RECORD_ID '{}' does not match '{}'",
                record_id, key.1
            )));
        }
    }
    Ok(())
}

fn info_document(
    state: &ResolutionState,
    key: &RecordKey,
    affected: &BTreeSet<i64>,
    flags: InfoFlags,
) -> Value {
    let mut doc = Map::new();
    doc.insert("DATA_SOURCE".into(), json!(key.0));
    doc.insert("RECORD_ID".into(), json!(key.1));
    let affected_entities: Vec<Value> = affected
        .iter()
        .map(|id| json!({ "ENTITY_ID": id }))
        .collect();
    doc.insert("AFFECTED_ENTITIES".into(), Value::Array(affected_entities));

    if flags.include_interesting_entities {
        // Entities related to what changed, excluding the changed ones
        let interesting: BTreeSet<i64> = affected
            .iter()
            .flat_map(|id| state.related_entities(*id))
            .map(|(id, _)| id)
            .filter(|id| !affected.contains(id))
            .collect();
        let entities: Vec<Value> = interesting
            .into_iter()
            .map(|id| json!({ "ENTITY_ID": id, "ENTITY_NAME": state.entity_name(id) }))
            .collect();
        doc.insert(
            "INTERESTING_ENTITIES".into(),
            json!({ "ENTITIES": entities }),
        );
    }
    Value::Object(doc)
}

impl Store {
    fn open(target: &ConnectionTarget) -> EngineResult<Self> {
        let driver = match target {
            ConnectionTarget::Memory { .. } => create_storage_driver(StorageType::Memory, "")?,
            ConnectionTarget::Sled { path } => create_storage_driver(StorageType::Sled, path)?,
        };
        Ok(Store {
            records: driver.open_tree("records")?,
            assignments: driver.open_tree("assignments")?,
            data_sources: driver.open_tree("data_sources")?,
            meta: driver.open_tree("meta")?,
            driver,
        })
    }

    fn load_data_sources(&self) -> EngineResult<BTreeMap<String, u32>> {
        let mut data_sources = BTreeMap::new();
        for item in self.data_sources.iter()? {
            let (key, value) = item?;
            let code = String::from_utf8(key)
                .map_err(|e| EngineError::Storage(format!("Corrupt data source code: {}", e)))?;
            data_sources.insert(code, bincode::deserialize(&value)?);
        }
        if data_sources.is_empty() {
            for (id, code) in SEEDED_DATA_SOURCES.iter().enumerate() {
                let id = id as u32 + 1;
                self.data_sources
                    .insert(code.as_bytes(), &bincode::serialize(&id)?)?;
                data_sources.insert(code.to_string(), id);
            }
        }
        Ok(data_sources)
    }

    fn load_state(&self) -> EngineResult<ResolutionState> {
        let next_entity_id = match self.meta.get(NEXT_ENTITY_ID_KEY)? {
            Some(bytes) => bincode::deserialize(&bytes)?,
            None => 1,
        };
        let mut state = ResolutionState::new(next_entity_id);

        for item in self.records.iter()? {
            let (key, value) = item?;
            let key = decode_key(&key)?;
            let stored: StoredRecord = bincode::deserialize(&value)?;
            let definition = parse_object(&stored.json, "Stored record")?;
            let features = FeatureSet::extract(&definition);
            state.records.insert(key, RecordEntry { stored, features });
        }

        // Previous assignments seed entity ID reuse
        for item in self.assignments.iter()? {
            let (key, value) = item?;
            let key = decode_key(&key)?;
            let entity_id: i64 = bincode::deserialize(&value)?;
            state.entities.entry(entity_id).or_default().push(key.clone());
            state.entity_of.insert(key, entity_id);
        }
        state.resolve();
        Ok(state)
    }

    fn save_assignments(&self, state: &ResolutionState) -> EngineResult<()> {
        let encoded: Vec<(Vec<u8>, Vec<u8>)> = state
            .entity_of
            .iter()
            .map(|(key, id)| Ok((encode_key(key), bincode::serialize(id)?)))
            .collect::<EngineResult<_>>()?;
        let entries: Vec<(&[u8], &[u8])> = encoded
            .iter()
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
            .collect();
        self.assignments.clear()?;
        self.assignments.batch_insert(&entries)?;
        self.meta
            .insert(NEXT_ENTITY_ID_KEY, &bincode::serialize(&state.next_entity_id)?)?;
        Ok(())
    }
}

impl Inner {
    fn require_data_source(&self, code: &str) -> EngineResult<()> {
        if self.data_sources.contains_key(code) {
            Ok(())
        } else {
            Err(EngineError::UnknownDataSource(code.to_string()))
        }
    }

    fn entity_of(&self, key: &RecordKey) -> EngineResult<i64> {
        self.state.entity_of.get(key).copied().ok_or_else(|| {
            EngineError::NotFound(format!("Record {}/{} not found", key.0, key.1))
        })
    }

    fn require_entity(&self, entity_id: i64) -> EngineResult<()> {
        if self.state.entity_exists(entity_id) {
            Ok(())
        } else {
            Err(EngineError::NotFound(format!("Entity {} not found", entity_id)))
        }
    }
}

/// Deterministic in-process engine
pub struct LoopbackEngine {
    instance_name: String,
    target: ConnectionTarget,
    inner: RwLock<Option<Inner>>,
    workload: Workload,
}

impl LoopbackEngine {
    /// Open (or create) the datastore behind `target`
    pub fn open(instance_name: &str, target: &ConnectionTarget) -> EngineResult<Self> {
        let store = Store::open(target)?;
        let data_sources = store.load_data_sources()?;
        let state = store.load_state()?;
        log::info!(
            "Loopback engine '{}' loaded {} records, {} entities, {} data sources",
            instance_name,
            state.records.len(),
            state.entities.len(),
            data_sources.len()
        );
        Ok(LoopbackEngine {
            instance_name: instance_name.to_string(),
            target: target.clone(),
            inner: RwLock::new(Some(Inner {
                store,
                state,
                data_sources,
            })),
            workload: Workload::default(),
        })
    }

    fn read<T>(&self, f: impl FnOnce(&Inner) -> EngineResult<T>) -> EngineResult<T> {
        let guard = self.inner.read();
        let inner = guard.as_ref().ok_or_else(|| self.not_initialized())?;
        f(inner)
    }

    fn write<T>(&self, f: impl FnOnce(&mut Inner) -> EngineResult<T>) -> EngineResult<T> {
        let mut guard = self.inner.write();
        let inner = guard.as_mut().ok_or_else(|| self.not_initialized())?;
        f(inner)
    }

    fn not_initialized(&self) -> EngineError {
        EngineError::NotInitialized(format!(
            "Engine instance '{}' has been destroyed",
            self.instance_name
        ))
    }

    fn mutation_response(
        state: &ResolutionState,
        key: &RecordKey,
        affected: &BTreeSet<i64>,
        flags: InfoFlags,
    ) -> EngineResult<String> {
        if flags.with_info {
            let doc = info_document(state, key, affected, flags);
            Ok(serde_json::to_string(&doc)?)
        } else {
            Ok("{}".to_string())
        }
    }
}

impl EngineBackend for LoopbackEngine {
    fn add_record(
        &self,
        data_source_code: &str,
        record_id: &str,
        record_definition: &str,
        flags: InfoFlags,
    ) -> EngineResult<String> {
        let key = record_key(data_source_code, record_id)?;
        let definition = parse_object(record_definition, "Record definition")?;
        check_identity(&definition, &key)?;

        self.write(|inner| {
            inner.require_data_source(&key.0)?;

            let now = Utc::now();
            let previous = inner.state.records.get(&key);
            if previous.is_some() {
                bump(&self.workload.reevaluations);
            }
            let stored = StoredRecord {
                json: record_definition.to_string(),
                record_type: text_field(&definition, "RECORD_TYPE").filter(|t| !t.is_empty()),
                first_seen: previous.map_or(now, |p| p.stored.first_seen),
                last_seen: now,
            };
            inner
                .store
                .records
                .insert(&encode_key(&key), &bincode::serialize(&stored)?)?;

            let features = FeatureSet::extract(&definition);
            inner
                .state
                .records
                .insert(key.clone(), RecordEntry { stored, features });
            let mut affected = inner.state.resolve();
            affected.insert(inner.entity_of(&key)?);
            inner.store.save_assignments(&inner.state)?;

            bump(&self.workload.added);
            log::debug!(
                "Added {}/{} ({} entities affected)",
                key.0,
                key.1,
                affected.len()
            );
            Self::mutation_response(&inner.state, &key, &affected, flags)
        })
    }

    fn delete_record(
        &self,
        data_source_code: &str,
        record_id: &str,
        flags: InfoFlags,
    ) -> EngineResult<String> {
        let key = record_key(data_source_code, record_id)?;
        self.write(|inner| {
            inner.require_data_source(&key.0)?;
            if inner.state.records.remove(&key).is_none() {
                log::debug!("Delete of absent record {}/{} ignored", key.0, key.1);
                return Self::mutation_response(&inner.state, &key, &BTreeSet::new(), flags);
            }
            inner.store.records.remove(&encode_key(&key))?;
            let affected = inner.state.resolve();
            inner.store.save_assignments(&inner.state)?;

            bump(&self.workload.deleted);
            Self::mutation_response(&inner.state, &key, &affected, flags)
        })
    }

    fn get_entity_by_record_id(
        &self,
        data_source_code: &str,
        record_id: &str,
        flags: EntityFlags,
    ) -> EngineResult<String> {
        let key = record_key(data_source_code, record_id)?;
        bump(&self.workload.entity_lookups);
        self.read(|inner| {
            inner.require_data_source(&key.0)?;
            let entity_id = inner.entity_of(&key)?;
            let doc = documents::entity_document(&inner.state, entity_id, flags);
            Ok(serde_json::to_string(&doc)?)
        })
    }

    fn get_entity_by_entity_id(
        &self,
        entity_id: i64,
        flags: EntityFlags,
    ) -> EngineResult<String> {
        bump(&self.workload.entity_lookups);
        self.read(|inner| {
            inner.require_entity(entity_id)?;
            let doc = documents::entity_document(&inner.state, entity_id, flags);
            Ok(serde_json::to_string(&doc)?)
        })
    }

    fn search_by_attributes(&self, attributes: &str, flags: SearchFlags) -> EngineResult<String> {
        let attributes = parse_object(attributes, "Search attributes")?;
        if attributes.is_empty() {
            return Err(EngineError::BadInput(
                "Search attributes must not be empty".to_string(),
            ));
        }
        let query = FeatureSet::extract(&attributes);
        if query.is_empty() {
            return Err(EngineError::BadInput(
                "Search attributes contain no searchable features".to_string(),
            ));
        }

        bump(&self.workload.searches);
        self.read(|inner| {
            let candidates = inner.state.candidates(&query);
            let doc = documents::search_document(&inner.state, &query, &candidates, flags);
            Ok(serde_json::to_string(&doc)?)
        })
    }

    fn find_path_by_entity_id(
        &self,
        start_entity_id: i64,
        end_entity_id: i64,
        max_degrees: u32,
        flags: PathFlags,
    ) -> EngineResult<String> {
        bump(&self.workload.path_queries);
        self.read(|inner| {
            inner.require_entity(start_entity_id)?;
            inner.require_entity(end_entity_id)?;
            let path = inner
                .state
                .find_path(start_entity_id, end_entity_id, max_degrees)
                .unwrap_or_default();
            let doc = documents::path_document(
                &inner.state,
                start_entity_id,
                end_entity_id,
                &path,
                flags,
            );
            Ok(serde_json::to_string(&doc)?)
        })
    }

    fn why_records(
        &self,
        data_source_code_1: &str,
        record_id_1: &str,
        data_source_code_2: &str,
        record_id_2: &str,
        flags: WhyFlags,
    ) -> EngineResult<String> {
        let first = record_key(data_source_code_1, record_id_1)?;
        let second = record_key(data_source_code_2, record_id_2)?;
        bump(&self.workload.why_queries);
        self.read(|inner| {
            inner.require_data_source(&first.0)?;
            inner.require_data_source(&second.0)?;
            inner.entity_of(&first)?;
            inner.entity_of(&second)?;
            let doc = documents::why_document(&inner.state, &first, &second, flags);
            Ok(serde_json::to_string(&doc)?)
        })
    }

    fn get_stats(&self) -> EngineResult<String> {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        self.read(|inner| {
            let doc = json!({
                "workload": {
                    "apiVersion": crate::VERSION,
                    "instanceName": self.instance_name,
                    "datastore": self.target.to_string(),
                    "loadedRecords": inner.state.records.len(),
                    "entityCount": inner.state.entities.len(),
                    "addedRecords": load(&self.workload.added),
                    "deletedRecords": load(&self.workload.deleted),
                    "reevaluations": load(&self.workload.reevaluations),
                    "entityLookups": load(&self.workload.entity_lookups),
                    "searches": load(&self.workload.searches),
                    "pathQueries": load(&self.workload.path_queries),
                    "whyQueries": load(&self.workload.why_queries),
                }
            });
            Ok(serde_json::to_string(&doc)?)
        })
    }

    fn destroy(&self) -> EngineResult<()> {
        let inner = self.inner.write().take();
        match inner {
            Some(mut inner) => {
                inner.store.driver.shutdown()?;
                log::info!("Loopback engine '{}' destroyed", self.instance_name);
                Ok(())
            }
            None => Err(self.not_initialized()),
        }
    }
}

impl DiagnosticBackend for LoopbackEngine {
    fn get_datastore_info(&self) -> EngineResult<String> {
        self.read(|inner| {
            let mut counts: BTreeMap<&str, usize> = inner
                .data_sources
                .keys()
                .map(|code| (code.as_str(), 0))
                .collect();
            for (data_source, _) in inner.state.records.keys() {
                *counts.entry(data_source.as_str()).or_default() += 1;
            }
            let data_sources: Vec<Value> = counts
                .into_iter()
                .map(|(code, count)| json!({ "DSRC_CODE": code, "DSRC_RECORD_COUNT": count }))
                .collect();
            let doc = json!({
                "DATA_SOURCES": data_sources,
                "ENTITY_COUNT": inner.state.entities.len(),
            });
            Ok(serde_json::to_string(&doc)?)
        })
    }
}

impl ConfigBackend for LoopbackEngine {
    fn add_data_source(&self, data_source_code: &str) -> EngineResult<String> {
        let code = normalize_code(data_source_code)?;
        if !DATA_SOURCE_CODE.is_match(&code) {
            return Err(EngineError::BadInput(format!(
                "Invalid data source code '{}'",
                code
            )));
        }
        self.write(|inner| {
            if inner.data_sources.contains_key(&code) {
                return Err(EngineError::BadInput(format!(
                    "Data source '{}' already exists",
                    code
                )));
            }
            let id = inner.data_sources.values().max().copied().unwrap_or(0) + 1;
            inner
                .store
                .data_sources
                .insert(code.as_bytes(), &bincode::serialize(&id)?)?;
            inner.data_sources.insert(code.clone(), id);
            log::info!("Registered data source {} ({})", code, id);
            Ok(json!({ "DSRC_ID": id }).to_string())
        })
    }

    fn get_data_sources(&self) -> EngineResult<String> {
        self.read(|inner| {
            let mut data_sources: Vec<(&String, &u32)> = inner.data_sources.iter().collect();
            data_sources.sort_by_key(|(_, id)| **id);
            let data_sources: Vec<Value> = data_sources
                .into_iter()
                .map(|(code, id)| json!({ "DSRC_ID": id, "DSRC_CODE": code }))
                .collect();
            Ok(json!({ "DATA_SOURCES": data_sources }).to_string())
        })
    }
}

impl Drop for LoopbackEngine {
    fn drop(&mut self) {
        if let Some(mut inner) = self.inner.get_mut().take() {
            if let Err(e) = inner.store.driver.shutdown() {
                log::warn!("Failed to flush engine '{}': {}", self.instance_name, e);
            }
        }
    }
}
