// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! JSON response documents of the loopback engine

use super::features::{match_key, FeatureSet, FeatureType};
use super::resolver::{Candidate, MatchLevel, RecordKey, ResolutionState};
use crate::flags::{EntityFlags, PathFlags, SearchFlags, WhyFlags};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// `FEATURES` block: distinct descriptions per feature type
pub fn features_document(state: &ResolutionState, entity_id: i64) -> Value {
    let mut by_type: BTreeMap<FeatureType, BTreeSet<String>> = BTreeMap::new();
    for key in state.entities.get(&entity_id).into_iter().flatten() {
        for (ftype, feature) in state.records[key].features.iter() {
            by_type.entry(ftype).or_default().insert(feature.desc.clone());
        }
    }
    let features: Map<String, Value> = by_type
        .into_iter()
        .map(|(ftype, descs)| {
            let values: Vec<Value> = descs
                .into_iter()
                .map(|desc| json!({ "FEAT_DESC": desc }))
                .collect();
            (ftype.code().to_string(), Value::Array(values))
        })
        .collect();
    Value::Object(features)
}

fn record_document(state: &ResolutionState, key: &RecordKey, flags: EntityFlags) -> Value {
    let entry = &state.records[key];
    let mut record = Map::new();
    record.insert("DATA_SOURCE".into(), json!(key.0));
    record.insert("RECORD_ID".into(), json!(key.1));
    if let Some(record_type) = &entry.stored.record_type {
        record.insert("RECORD_TYPE".into(), json!(record_type));
    }
    record.insert(
        "FIRST_SEEN_DT".into(),
        json!(entry.stored.first_seen.to_rfc3339()),
    );
    record.insert(
        "LAST_SEEN_DT".into(),
        json!(entry.stored.last_seen.to_rfc3339()),
    );
    if flags.include_record_data {
        let data = serde_json::from_str(&entry.stored.json).unwrap_or(Value::Null);
        record.insert("JSON_DATA".into(), data);
    }
    Value::Object(record)
}

/// `{"RESOLVED_ENTITY": {...}, "RELATED_ENTITIES": [...]}`
pub fn entity_document(state: &ResolutionState, entity_id: i64, flags: EntityFlags) -> Value {
    let keys = state
        .entities
        .get(&entity_id)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut resolved = Map::new();
    resolved.insert("ENTITY_ID".into(), json!(entity_id));
    if flags.include_entity_name {
        resolved.insert("ENTITY_NAME".into(), json!(state.entity_name(entity_id)));
    }
    if flags.include_record_summary {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for (data_source, _) in keys {
            *counts.entry(data_source.as_str()).or_default() += 1;
        }
        let summary: Vec<Value> = counts
            .into_iter()
            .map(|(ds, count)| json!({ "DATA_SOURCE": ds, "RECORD_COUNT": count }))
            .collect();
        resolved.insert("RECORD_SUMMARY".into(), Value::Array(summary));
    }
    if flags.include_all_features {
        resolved.insert("FEATURES".into(), features_document(state, entity_id));
    }
    if flags.include_records {
        let records: Vec<Value> = keys
            .iter()
            .map(|key| record_document(state, key, flags))
            .collect();
        resolved.insert("RECORDS".into(), Value::Array(records));
    }

    let mut doc = Map::new();
    doc.insert("RESOLVED_ENTITY".into(), Value::Object(resolved));
    if flags.include_related_entities {
        let related: Vec<Value> = state
            .related_entities(entity_id)
            .into_iter()
            .map(|(id, rel)| {
                json!({
                    "ENTITY_ID": id,
                    "ENTITY_NAME": state.entity_name(id),
                    "MATCH_LEVEL": (rel.level as i32),
                    "MATCH_LEVEL_CODE": rel.level.code(),
                    "MATCH_KEY": rel.match_key,
                })
            })
            .collect();
        doc.insert("RELATED_ENTITIES".into(), Value::Array(related));
    }
    Value::Object(doc)
}

/// `{"RESOLVED_ENTITIES": [...], "SEARCH_STATISTICS": {...}}`
pub fn search_document(
    state: &ResolutionState,
    query: &FeatureSet,
    candidates: &[Candidate],
    flags: SearchFlags,
) -> Value {
    let wanted = |level: MatchLevel| match level {
        MatchLevel::Resolved => flags.include_resolved,
        MatchLevel::PossiblySame => flags.include_possibly_same,
        MatchLevel::PossiblyRelated => flags.include_possibly_related,
    };
    let entities: Vec<Value> = candidates
        .iter()
        .filter(|c| wanted(c.level))
        .map(|c| {
            let mut entity = Map::new();
            entity.insert("ENTITY_ID".into(), json!(c.entity_id));
            entity.insert("ENTITY_NAME".into(), json!(state.entity_name(c.entity_id)));
            entity.insert("MATCH_SCORE".into(), json!(c.score));
            entity.insert("MATCH_LEVEL".into(), json!(c.level as i32));
            entity.insert("MATCH_LEVEL_CODE".into(), json!(c.level.code()));
            entity.insert("MATCH_KEY".into(), json!(c.match_key));
            if flags.include_features {
                entity.insert("FEATURES".into(), features_document(state, c.entity_id));
            }
            Value::Object(entity)
        })
        .collect();

    let mut doc = Map::new();
    if flags.include_stats {
        let feature_types: Vec<&str> = query.iter().map(|(t, _)| t.code()).collect();
        doc.insert(
            "SEARCH_STATISTICS".into(),
            json!({
                "CANDIDATE_COUNT": candidates.len(),
                "RETURNED_COUNT": entities.len(),
                "SEARCH_FEATURE_TYPES": feature_types,
            }),
        );
    }
    doc.insert("RESOLVED_ENTITIES".into(), Value::Array(entities));
    Value::Object(doc)
}

/// `{"ENTITY_PATHS": [...], "ENTITIES": [...]}`
pub fn path_document(
    state: &ResolutionState,
    start: i64,
    end: i64,
    path: &[i64],
    flags: PathFlags,
) -> Value {
    let entities: Vec<Value> = path
        .iter()
        .enumerate()
        .map(|(hop, id)| {
            let mut entity = Map::new();
            entity.insert("ENTITY_ID".into(), json!(id));
            if flags.include_entity_name {
                entity.insert("ENTITY_NAME".into(), json!(state.entity_name(*id)));
            }
            if flags.include_matching_info && hop > 0 {
                if let Some(rel) = state.relation(path[hop - 1], *id) {
                    entity.insert(
                        "MATCH_INFO".into(),
                        json!({
                            "MATCH_LEVEL_CODE": rel.level.code(),
                            "MATCH_KEY": rel.match_key,
                        }),
                    );
                }
            }
            Value::Object(entity)
        })
        .collect();

    json!({
        "ENTITY_PATHS": [{
            "START_ENTITY_ID": start,
            "END_ENTITY_ID": end,
            "ENTITIES": path,
        }],
        "ENTITIES": entities,
    })
}

/// `{"WHY_RESULTS": [{"MATCH_INFO": {...}, ...}]}`
pub fn why_document(
    state: &ResolutionState,
    first: &RecordKey,
    second: &RecordKey,
    flags: WhyFlags,
) -> Value {
    let a = &state.records[first].features;
    let b = &state.records[second].features;
    let (entity_a, entity_b) = (state.entity_of[first], state.entity_of[second]);

    let (shared, level) = if entity_a == entity_b {
        let mut shared = a.shared_with(b);
        for ftype in state.resolution_features(first, second) {
            if !shared.contains(&ftype) {
                shared.push(ftype);
            }
        }
        shared.sort();
        (shared, Some(MatchLevel::Resolved))
    } else {
        let shared = a.shared_with(b);
        let level = MatchLevel::for_shared(&shared);
        (shared, level)
    };
    let conflicts: Vec<FeatureType> = a
        .conflicts_with(b)
        .into_iter()
        .filter(|t| !shared.contains(t))
        .collect();

    let mut match_info = Map::new();
    match_info.insert("WHY_KEY".into(), json!(match_key(&shared, &conflicts)));
    match_info.insert(
        "MATCH_LEVEL_CODE".into(),
        json!(level.map(|l| l.code()).unwrap_or_default()),
    );
    if flags.include_feature_scores {
        let mut scores = Map::new();
        for ftype in FeatureType::ALL {
            if let (Some(fa), Some(fb)) = (a.get(ftype), b.get(ftype)) {
                let same = fa.value == fb.value;
                scores.insert(
                    ftype.code().to_string(),
                    json!([{
                        "INBOUND_FEAT_DESC": fa.desc,
                        "CANDIDATE_FEAT_DESC": fb.desc,
                        "SCORE": if same { 100 } else { 0 },
                        "SCORE_BUCKET": if same { "SAME" } else { "NO_CHANCE" },
                    }]),
                );
            }
        }
        match_info.insert("FEATURE_SCORES".into(), Value::Object(scores));
    }

    let mut doc = Map::new();
    doc.insert(
        "WHY_RESULTS".into(),
        json!([{
            "ENTITY_ID": entity_a,
            "ENTITY_ID_2": entity_b,
            "FOCUS_RECORDS": [{ "DATA_SOURCE": first.0, "RECORD_ID": first.1 }],
            "FOCUS_RECORDS_2": [{ "DATA_SOURCE": second.0, "RECORD_ID": second.1 }],
            "MATCH_INFO": Value::Object(match_info),
        }]),
    );
    if flags.include_entities {
        let mut ids = vec![entity_a];
        if entity_b != entity_a {
            ids.push(entity_b);
        }
        let entities: Vec<Value> = ids
            .into_iter()
            .map(|id| entity_document(state, id, EntityFlags::default()))
            .collect();
        doc.insert("ENTITIES".into(), Value::Array(entities));
    }
    Value::Object(doc)
}
