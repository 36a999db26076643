// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Entity assignment, relationships and paths for the loopback engine
//!
//! Every mutation re-clusters the whole record set: records that satisfy the
//! exact resolution rule are unioned, and each cluster keeps the smallest
//! entity ID any of its records held before, so IDs stay stable across
//! unrelated inserts.

use super::features::{match_key, FeatureSet, FeatureType};
use chrono::{DateTime, Utc};
use petgraph::graphmap::UnGraphMap;
use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// (data source code, record ID)
pub type RecordKey = (String, String);

/// Persisted form of a record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    pub json: String,
    pub record_type: Option<String>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// A record with its extracted features
#[derive(Debug, Clone)]
pub struct RecordEntry {
    pub stored: StoredRecord,
    pub features: FeatureSet,
}

/// How strongly two records or entities are tied
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchLevel {
    Resolved = 1,
    PossiblySame = 2,
    PossiblyRelated = 3,
}

impl MatchLevel {
    pub fn code(&self) -> &'static str {
        match self {
            MatchLevel::Resolved => "RESOLVED",
            MatchLevel::PossiblySame => "POSSIBLY_SAME",
            MatchLevel::PossiblyRelated => "POSSIBLY_RELATED",
        }
    }

    /// Level implied by the shared features of two unresolved sides
    pub fn for_shared(shared: &[FeatureType]) -> Option<Self> {
        if shared.contains(&FeatureType::Name) {
            Some(MatchLevel::PossiblySame)
        } else if shared.iter().any(FeatureType::is_relationship) {
            Some(MatchLevel::PossiblyRelated)
        } else {
            None
        }
    }
}

/// Relationship between two distinct entities
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub level: MatchLevel,
    pub match_key: String,
}

/// Ranked search candidate
#[derive(Debug, Clone)]
pub struct Candidate {
    pub entity_id: i64,
    pub score: u32,
    pub level: MatchLevel,
    pub match_key: String,
}

/// In-memory resolution state of the loopback engine
#[derive(Debug, Default)]
pub struct ResolutionState {
    pub records: BTreeMap<RecordKey, RecordEntry>,
    pub entity_of: HashMap<RecordKey, i64>,
    pub entities: BTreeMap<i64, Vec<RecordKey>>,
    pub next_entity_id: i64,
    relations: BTreeMap<(i64, i64), Relation>,
    index: HashMap<(FeatureType, String), Vec<RecordKey>>,
}

impl ResolutionState {
    pub fn new(next_entity_id: i64) -> Self {
        ResolutionState {
            next_entity_id: next_entity_id.max(1),
            ..Default::default()
        }
    }

    /// Re-cluster every record and return the entities whose record sets changed
    pub fn resolve(&mut self) -> BTreeSet<i64> {
        let keys: Vec<RecordKey> = self.records.keys().cloned().collect();

        let mut index: HashMap<(FeatureType, String), Vec<RecordKey>> = HashMap::new();
        let mut positions: HashMap<&RecordKey, usize> = HashMap::new();
        for (pos, key) in keys.iter().enumerate() {
            positions.insert(key, pos);
            for (ftype, feature) in self.records[key].features.iter() {
                index
                    .entry((ftype, feature.value.clone()))
                    .or_default()
                    .push(key.clone());
            }
        }

        let mut clusters = UnionFind::<usize>::new(keys.len());
        for (pos, key) in keys.iter().enumerate() {
            let features = &self.records[key].features;
            for (ftype, feature) in features.iter() {
                for other in &index[&(ftype, feature.value.clone())] {
                    let other_pos = positions[other];
                    if other_pos > pos && features.resolves_with(&self.records[other].features) {
                        clusters.union(pos, other_pos);
                    }
                }
            }
        }

        // Groups ordered by their first record so ID reuse is deterministic
        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        let mut root_first: HashMap<usize, usize> = HashMap::new();
        for pos in 0..keys.len() {
            let root = clusters.find(pos);
            let first = *root_first.entry(root).or_insert(pos);
            groups.entry(first).or_default().push(pos);
        }

        let mut claimed: BTreeSet<i64> = BTreeSet::new();
        let mut entity_of = HashMap::new();
        let mut entities: BTreeMap<i64, Vec<RecordKey>> = BTreeMap::new();
        for members in groups.values() {
            let previous: BTreeSet<i64> = members
                .iter()
                .filter_map(|pos| self.entity_of.get(&keys[*pos]).copied())
                .collect();
            let entity_id = match previous.iter().find(|id| !claimed.contains(id)) {
                Some(id) => *id,
                None => {
                    let id = self.next_entity_id;
                    self.next_entity_id += 1;
                    id
                }
            };
            claimed.insert(entity_id);
            let record_keys: Vec<RecordKey> =
                members.iter().map(|pos| keys[*pos].clone()).collect();
            for key in &record_keys {
                entity_of.insert(key.clone(), entity_id);
            }
            entities.insert(entity_id, record_keys);
        }

        let affected: BTreeSet<i64> = self
            .entities
            .keys()
            .chain(entities.keys())
            .filter(|id| self.entities.get(*id) != entities.get(*id))
            .copied()
            .collect();

        self.entity_of = entity_of;
        self.entities = entities;
        self.index = index;
        self.relations = self.compute_relations();

        log::debug!(
            "Resolved {} records into {} entities ({} affected)",
            self.records.len(),
            self.entities.len(),
            affected.len()
        );
        affected
    }

    fn compute_relations(&self) -> BTreeMap<(i64, i64), Relation> {
        let mut relations: BTreeMap<(i64, i64), Relation> = BTreeMap::new();
        for bucket in self.index.values() {
            for (i, a) in bucket.iter().enumerate() {
                for b in &bucket[i + 1..] {
                    let (ea, eb) = (self.entity_of[a], self.entity_of[b]);
                    if ea == eb {
                        continue;
                    }
                    let fa = &self.records[a].features;
                    let fb = &self.records[b].features;
                    let shared = fa.shared_with(fb);
                    let Some(level) = MatchLevel::for_shared(&shared) else {
                        continue;
                    };
                    let candidate = Relation {
                        level,
                        match_key: match_key(&shared, &[]),
                    };
                    let pair = (ea.min(eb), ea.max(eb));
                    // Strongest level wins; key order breaks ties deterministically
                    let stronger = relations.get(&pair).map_or(true, |existing| {
                        (candidate.level, &candidate.match_key)
                            < (existing.level, &existing.match_key)
                    });
                    if stronger {
                        relations.insert(pair, candidate);
                    }
                }
            }
        }
        relations
    }

    pub fn entity_exists(&self, entity_id: i64) -> bool {
        self.entities.contains_key(&entity_id)
    }

    /// Display name: the first named record of the entity
    pub fn entity_name(&self, entity_id: i64) -> String {
        self.entities
            .get(&entity_id)
            .into_iter()
            .flatten()
            .find_map(|key| self.records[key].features.get(FeatureType::Name))
            .map(|f| f.desc.clone())
            .unwrap_or_default()
    }

    /// Relationship between two entities, if any
    pub fn relation(&self, a: i64, b: i64) -> Option<&Relation> {
        self.relations.get(&(a.min(b), a.max(b)))
    }

    /// Entities related to `entity_id`, ordered by entity ID
    pub fn related_entities(&self, entity_id: i64) -> Vec<(i64, &Relation)> {
        let mut related: Vec<(i64, &Relation)> = self
            .relations
            .iter()
            .filter_map(|((a, b), rel)| {
                if *a == entity_id {
                    Some((*b, rel))
                } else if *b == entity_id {
                    Some((*a, rel))
                } else {
                    None
                }
            })
            .collect();
        related.sort_by_key(|(id, _)| *id);
        related
    }

    /// Shortest relationship path within `max_degrees` hops
    ///
    /// Returns the entity IDs from start to end inclusive, or `None` when no
    /// path exists inside the bound.
    pub fn find_path(&self, start: i64, end: i64, max_degrees: u32) -> Option<Vec<i64>> {
        if start == end {
            return Some(vec![start]);
        }
        let mut graph: UnGraphMap<i64, ()> = UnGraphMap::new();
        for id in self.entities.keys() {
            graph.add_node(*id);
        }
        for (a, b) in self.relations.keys() {
            graph.add_edge(*a, *b, ());
        }
        let (hops, path) =
            petgraph::algo::astar(&graph, start, |n| n == end, |_| 1u32, |_| 0u32)?;
        if hops > max_degrees {
            return None;
        }
        Some(path)
    }

    /// Features along the resolution chain linking two records of one entity
    ///
    /// Walks the shortest chain of pairwise resolutions between the records
    /// and collects what each link shares. Empty when the records sit in
    /// different entities.
    pub fn resolution_features(&self, first: &RecordKey, second: &RecordKey) -> Vec<FeatureType> {
        let entity_id = match (self.entity_of.get(first), self.entity_of.get(second)) {
            (Some(a), Some(b)) if a == b => *a,
            _ => return Vec::new(),
        };
        let members = self
            .entities
            .get(&entity_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let position = |key: &RecordKey| members.iter().position(|m| m == key);
        let (Some(a), Some(b)) = (position(first), position(second)) else {
            return Vec::new();
        };
        let (start, end) = (a.min(b), a.max(b));

        let mut graph: UnGraphMap<usize, ()> = UnGraphMap::new();
        for (pos, key) in members.iter().enumerate() {
            graph.add_node(pos);
            let features = &self.records[key].features;
            for (other_pos, other) in members.iter().enumerate().skip(pos + 1) {
                if features.resolves_with(&self.records[other].features) {
                    graph.add_edge(pos, other_pos, ());
                }
            }
        }

        let mut linked: BTreeSet<FeatureType> = BTreeSet::new();
        if start == end {
            linked.extend(self.records[first].features.iter().map(|(t, _)| t));
        } else if let Some((_, chain)) =
            petgraph::algo::astar(&graph, start, |n| n == end, |_| 1u32, |_| 0u32)
        {
            for link in chain.windows(2) {
                let a = &self.records[&members[link[0]]].features;
                let b = &self.records[&members[link[1]]].features;
                linked.extend(a.shared_with(b));
            }
        }
        linked.into_iter().collect()
    }

    /// Entities sharing at least one feature with `query`, best first
    pub fn candidates(&self, query: &FeatureSet) -> Vec<Candidate> {
        let mut hits: BTreeMap<i64, BTreeSet<FeatureType>> = BTreeMap::new();
        let mut resolved: BTreeSet<i64> = BTreeSet::new();
        for (ftype, feature) in query.iter() {
            let Some(bucket) = self.index.get(&(ftype, feature.value.clone())) else {
                continue;
            };
            for key in bucket {
                let entity_id = self.entity_of[key];
                let record = &self.records[key].features;
                hits.entry(entity_id)
                    .or_default()
                    .extend(query.shared_with(record));
                if query.resolves_with(record) {
                    resolved.insert(entity_id);
                }
            }
        }

        let mut candidates: Vec<Candidate> = hits
            .into_iter()
            .filter_map(|(entity_id, shared)| {
                let shared: Vec<FeatureType> = shared.into_iter().collect();
                let level = if resolved.contains(&entity_id) {
                    MatchLevel::Resolved
                } else {
                    MatchLevel::for_shared(&shared)?
                };
                let score = shared.iter().map(FeatureType::weight).sum::<u32>().min(100);
                Some(Candidate {
                    entity_id,
                    score,
                    level,
                    match_key: match_key(&shared, &[]),
                })
            })
            .collect();
        candidates.sort_by(|a, b| b.score.cmp(&a.score).then(a.entity_id.cmp(&b.entity_id)));
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(value: serde_json::Value) -> RecordEntry {
        let now = Utc::now();
        RecordEntry {
            features: FeatureSet::extract(value.as_object().unwrap()),
            stored: StoredRecord {
                json: value.to_string(),
                record_type: None,
                first_seen: now,
                last_seen: now,
            },
        }
    }

    fn key(id: &str) -> RecordKey {
        ("CUSTOMERS".to_string(), id.to_string())
    }

    fn state_with(records: Vec<(&str, serde_json::Value)>) -> ResolutionState {
        let mut state = ResolutionState::new(1);
        for (id, value) in records {
            state.records.insert(key(id), entry(value));
        }
        state.resolve();
        state
    }

    #[test]
    fn test_duplicates_share_an_entity() {
        let state = state_with(vec![
            ("1", json!({"NAME_FULL": "Jane Smith", "DATE_OF_BIRTH": "1985-03-15"})),
            ("2", json!({"NAME_FULL": "Smith Jane", "DATE_OF_BIRTH": "1985-03-15"})),
            ("3", json!({"NAME_FULL": "Bob Jones", "DATE_OF_BIRTH": "1970-01-01"})),
        ]);
        assert_eq!(state.entity_of[&key("1")], state.entity_of[&key("2")]);
        assert_ne!(state.entity_of[&key("1")], state.entity_of[&key("3")]);
        assert_eq!(state.entities.len(), 2);
    }

    #[test]
    fn test_entity_ids_survive_unrelated_inserts() {
        let mut state = state_with(vec![
            ("1", json!({"NAME_FULL": "Jane Smith", "DATE_OF_BIRTH": "1985-03-15"})),
            ("2", json!({"NAME_FULL": "Bob Jones", "DATE_OF_BIRTH": "1970-01-01"})),
        ]);
        let before = state.entity_of[&key("2")];
        state
            .records
            .insert(key("0"), entry(json!({"NAME_FULL": "Amy Adams"})));
        let affected = state.resolve();
        assert_eq!(state.entity_of[&key("2")], before);
        assert_eq!(affected.len(), 1);
    }

    #[test]
    fn test_merge_reports_both_entities() {
        let mut state = state_with(vec![
            ("1", json!({"NAME_FULL": "Jane Smith", "PHONE_NUMBER": "702-555-1234"})),
            ("2", json!({"NAME_FULL": "Jane Smith", "EMAIL_ADDRESS": "jane@example.com"})),
        ]);
        let (e1, e2) = (state.entity_of[&key("1")], state.entity_of[&key("2")]);
        assert_ne!(e1, e2);
        state.records.insert(
            key("3"),
            entry(json!({
                "NAME_FULL": "Jane Smith",
                "PHONE_NUMBER": "7025551234",
                "EMAIL_ADDRESS": "jane@example.com"
            })),
        );
        let affected = state.resolve();
        assert!(affected.contains(&e1) && affected.contains(&e2));
        assert_eq!(state.entity_of[&key("3")], e1.min(e2));
    }

    #[test]
    fn test_relationships_and_paths() {
        let state = state_with(vec![
            ("1", json!({"NAME_FULL": "Ann Lee", "PHONE_NUMBER": "111-1111"})),
            ("2", json!({"NAME_FULL": "Ben Cho", "PHONE_NUMBER": "111-1111", "EMAIL_ADDRESS": "b@x.io"})),
            ("3", json!({"NAME_FULL": "Cat Poe", "EMAIL_ADDRESS": "b@x.io"})),
            ("4", json!({"NAME_FULL": "Dan Roe"})),
        ]);
        let ids: Vec<i64> = ["1", "2", "3", "4"]
            .iter()
            .map(|id| state.entity_of[&key(id)])
            .collect();

        let rel = state.relation(ids[0], ids[1]).unwrap();
        assert_eq!(rel.level, MatchLevel::PossiblyRelated);
        assert_eq!(rel.match_key, "+PHONE");

        assert_eq!(
            state.find_path(ids[0], ids[2], 3),
            Some(vec![ids[0], ids[1], ids[2]])
        );
        assert_eq!(state.find_path(ids[0], ids[2], 1), None);
        assert_eq!(state.find_path(ids[0], ids[3], 3), None);
        assert_eq!(state.find_path(ids[3], ids[3], 0), Some(vec![ids[3]]));
    }

    #[test]
    fn test_candidates_sorted_by_score() {
        let state = state_with(vec![
            ("1", json!({"NAME_FULL": "Robert Smith", "DATE_OF_BIRTH": "1978-12-11"})),
            ("2", json!({"NAME_FULL": "Robert Smith", "DATE_OF_BIRTH": "1960-02-02"})),
        ]);
        let query = FeatureSet::extract(
            json!({"NAME_FULL": "Robert Smith", "DATE_OF_BIRTH": "1978-12-11"})
                .as_object()
                .unwrap(),
        );
        let candidates = state.candidates(&query);
        assert_eq!(candidates.len(), 2);
        assert!(candidates[0].score >= candidates[1].score);
        assert_eq!(candidates[0].level, MatchLevel::Resolved);
        assert_eq!(candidates[0].match_key, "+NAME+DOB");
        assert_eq!(candidates[1].level, MatchLevel::PossiblySame);
    }

    #[test]
    fn test_resolution_features_follow_the_chain() {
        let state = state_with(vec![
            ("A", json!({"NAME_FULL": "Ann Lee", "SSN_NUMBER": "111-22-3333"})),
            ("B", json!({"NAME_FULL": "Bob Roe", "SSN_NUMBER": "111223333", "PHONE_NUMBER": "555-0199"})),
            ("C", json!({"NAME_FULL": "Bob Roe", "PHONE_NUMBER": "555 0199"})),
            ("D", json!({"NAME_FULL": "Dee Poe"})),
        ]);
        assert_eq!(state.entity_of[&key("A")], state.entity_of[&key("C")]);
        assert!(state.records[&key("A")]
            .features
            .shared_with(&state.records[&key("C")].features)
            .is_empty());

        assert_eq!(
            state.resolution_features(&key("A"), &key("C")),
            vec![FeatureType::Name, FeatureType::Ssn, FeatureType::Phone]
        );
        assert!(state.resolution_features(&key("A"), &key("D")).is_empty());
    }
}
