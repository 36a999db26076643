//! Typed response documents
//!
//! Engine responses are JSON documents with upper-case keys. The types here
//! deserialize them with serde; sections a detail flag turned off are simply
//! empty (`#[serde(default)]`).

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Deserialize an engine response
pub(crate) fn parse<T: DeserializeOwned>(json: &str) -> Result<T> {
    Ok(serde_json::from_str(json)?)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    #[serde(rename = "ENTITY_ID")]
    pub entity_id: i64,
}

/// Resolution impact of an add (or delete)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddRecordInfo {
    #[serde(rename = "DATA_SOURCE")]
    pub data_source: String,

    #[serde(rename = "RECORD_ID")]
    pub record_id: String,

    #[serde(rename = "AFFECTED_ENTITIES", default)]
    pub affected_entities: Vec<EntityRef>,

    #[serde(rename = "INTERESTING_ENTITIES", default)]
    pub interesting_entities: InterestingEntities,
}

impl AddRecordInfo {
    pub fn affected_entity_ids(&self) -> Vec<i64> {
        self.affected_entities.iter().map(|e| e.entity_id).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterestingEntities {
    #[serde(rename = "ENTITIES", default)]
    pub entities: Vec<InterestingEntity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestingEntity {
    #[serde(rename = "ENTITY_ID")]
    pub entity_id: i64,

    #[serde(rename = "ENTITY_NAME", default)]
    pub entity_name: String,
}

/// Entity lookup response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityResponse {
    #[serde(rename = "RESOLVED_ENTITY")]
    pub resolved_entity: ResolvedEntity,

    #[serde(rename = "RELATED_ENTITIES", default)]
    pub related_entities: Vec<RelatedEntity>,
}

impl EntityResponse {
    pub fn entity_id(&self) -> i64 {
        self.resolved_entity.entity_id
    }

    /// True when the entity holds the given record
    pub fn contains_record(&self, data_source: &str, record_id: &str) -> bool {
        self.resolved_entity
            .records
            .iter()
            .any(|r| r.data_source == data_source && r.record_id == record_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEntity {
    #[serde(rename = "ENTITY_ID")]
    pub entity_id: i64,

    #[serde(rename = "ENTITY_NAME", default)]
    pub entity_name: String,

    #[serde(rename = "RECORD_SUMMARY", default)]
    pub record_summary: Vec<RecordSummary>,

    #[serde(rename = "RECORDS", default)]
    pub records: Vec<RecordRef>,

    /// Feature type code to feature values
    #[serde(rename = "FEATURES", default)]
    pub features: BTreeMap<String, Vec<FeatureValue>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSummary {
    #[serde(rename = "DATA_SOURCE")]
    pub data_source: String,

    #[serde(rename = "RECORD_COUNT")]
    pub record_count: usize,
}

/// A record inside a resolved entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRef {
    #[serde(rename = "DATA_SOURCE")]
    pub data_source: String,

    #[serde(rename = "RECORD_ID")]
    pub record_id: String,

    #[serde(rename = "RECORD_TYPE", default)]
    pub record_type: Option<String>,

    #[serde(rename = "FIRST_SEEN_DT", default)]
    pub first_seen: Option<DateTime<Utc>>,

    #[serde(rename = "LAST_SEEN_DT", default)]
    pub last_seen: Option<DateTime<Utc>>,

    /// Original record definition, when record data was requested
    #[serde(rename = "JSON_DATA", default)]
    pub json_data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureValue {
    #[serde(rename = "FEAT_DESC")]
    pub feat_desc: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedEntity {
    #[serde(rename = "ENTITY_ID")]
    pub entity_id: i64,

    #[serde(rename = "ENTITY_NAME", default)]
    pub entity_name: String,

    #[serde(rename = "MATCH_LEVEL_CODE", default)]
    pub match_level_code: String,

    #[serde(rename = "MATCH_KEY", default)]
    pub match_key: String,
}

/// Attribute search response, best match first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "RESOLVED_ENTITIES", default)]
    pub entities: Vec<SearchResultEntity>,

    #[serde(rename = "SEARCH_STATISTICS", default)]
    pub statistics: Option<SearchStatistics>,
}

impl SearchResponse {
    /// Order by score descending, then entity ID ascending
    pub(crate) fn sort(&mut self) {
        self.entities.sort_by(|a, b| {
            b.match_score
                .cmp(&a.match_score)
                .then(a.entity_id.cmp(&b.entity_id))
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultEntity {
    #[serde(rename = "ENTITY_ID")]
    pub entity_id: i64,

    #[serde(rename = "ENTITY_NAME", default)]
    pub entity_name: String,

    #[serde(rename = "MATCH_SCORE", default)]
    pub match_score: i64,

    #[serde(rename = "MATCH_LEVEL_CODE", default)]
    pub match_level_code: String,

    #[serde(rename = "MATCH_KEY", default)]
    pub match_key: String,

    #[serde(rename = "FEATURES", default)]
    pub features: BTreeMap<String, Vec<FeatureValue>>,
}

impl SearchResultEntity {
    /// Distinct name values of the candidate
    pub fn names(&self) -> Vec<&str> {
        self.features
            .get("NAME")
            .into_iter()
            .flatten()
            .map(|f| f.feat_desc.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStatistics {
    #[serde(rename = "CANDIDATE_COUNT")]
    pub candidate_count: usize,

    #[serde(rename = "RETURNED_COUNT")]
    pub returned_count: usize,

    #[serde(rename = "SEARCH_FEATURE_TYPES", default)]
    pub feature_types: Vec<String>,
}

/// Path response; `entities` is empty when no path exists within the bound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathResponse {
    #[serde(rename = "ENTITY_PATHS", default)]
    pub paths: Vec<EntityPath>,

    #[serde(rename = "ENTITIES", default)]
    pub entities: Vec<PathEntity>,
}

impl PathResponse {
    pub fn entity_ids(&self) -> Vec<i64> {
        self.entities.iter().map(|e| e.entity_id).collect()
    }

    /// Number of relationship hops on the path
    pub fn hop_count(&self) -> usize {
        self.entities.len().saturating_sub(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityPath {
    #[serde(rename = "START_ENTITY_ID")]
    pub start_entity_id: i64,

    #[serde(rename = "END_ENTITY_ID")]
    pub end_entity_id: i64,

    #[serde(rename = "ENTITIES", default)]
    pub entities: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntity {
    #[serde(rename = "ENTITY_ID")]
    pub entity_id: i64,

    #[serde(rename = "ENTITY_NAME", default)]
    pub entity_name: Option<String>,

    /// How this entity is tied to the previous one on the path
    #[serde(rename = "MATCH_INFO", default)]
    pub match_info: Option<PathMatchInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMatchInfo {
    #[serde(rename = "MATCH_LEVEL_CODE")]
    pub match_level_code: String,

    #[serde(rename = "MATCH_KEY")]
    pub match_key: String,
}

/// Outcome of a path request
///
/// Distinguishes an absent entity from two entities with no path between
/// them.
#[derive(Debug, Clone, PartialEq)]
pub enum PathOutcome {
    Found(PathResponse),
    NoPath,
    EntityNotFound(i64),
}

/// Why-analysis response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhyResponse {
    #[serde(rename = "WHY_RESULTS", default)]
    pub results: Vec<WhyResult>,

    #[serde(rename = "ENTITIES", default)]
    pub entities: Vec<EntityResponse>,
}

impl WhyResponse {
    pub fn first(&self) -> Option<&WhyResult> {
        self.results.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhyResult {
    #[serde(rename = "ENTITY_ID")]
    pub entity_id: i64,

    #[serde(rename = "ENTITY_ID_2")]
    pub entity_id_2: i64,

    #[serde(rename = "FOCUS_RECORDS", default)]
    pub focus_records: Vec<FocusRecord>,

    #[serde(rename = "FOCUS_RECORDS_2", default)]
    pub focus_records_2: Vec<FocusRecord>,

    #[serde(rename = "MATCH_INFO")]
    pub match_info: MatchInfo,
}

impl WhyResult {
    /// True when the records resolved together or share at least one feature
    pub fn is_match(&self) -> bool {
        self.resolved_together() || !self.match_info.why_key.is_empty()
    }

    pub fn match_level(&self) -> &str {
        &self.match_info.match_level_code
    }

    pub fn feature_scores(&self) -> &BTreeMap<String, Vec<FeatureScore>> {
        &self.match_info.feature_scores
    }

    /// Both records belong to the same entity
    pub fn resolved_together(&self) -> bool {
        self.entity_id == self.entity_id_2
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusRecord {
    #[serde(rename = "DATA_SOURCE")]
    pub data_source: String,

    #[serde(rename = "RECORD_ID")]
    pub record_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchInfo {
    #[serde(rename = "WHY_KEY", default)]
    pub why_key: String,

    #[serde(rename = "MATCH_LEVEL_CODE", default)]
    pub match_level_code: String,

    #[serde(rename = "FEATURE_SCORES", default)]
    pub feature_scores: BTreeMap<String, Vec<FeatureScore>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureScore {
    #[serde(rename = "INBOUND_FEAT_DESC")]
    pub inbound_feat_desc: String,

    #[serde(rename = "CANDIDATE_FEAT_DESC")]
    pub candidate_feat_desc: String,

    #[serde(rename = "SCORE")]
    pub score: i64,

    #[serde(rename = "SCORE_BUCKET")]
    pub score_bucket: String,
}

/// Datastore diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatastoreInfo {
    #[serde(rename = "DATA_SOURCES", default)]
    pub data_sources: Vec<DataSourceCount>,

    #[serde(rename = "ENTITY_COUNT", default)]
    pub entity_count: usize,
}

impl DatastoreInfo {
    pub fn record_count(&self, data_source: &str) -> usize {
        self.data_sources
            .iter()
            .find(|ds| ds.code == data_source)
            .map_or(0, |ds| ds.record_count)
    }

    pub fn total_records(&self) -> usize {
        self.data_sources.iter().map(|ds| ds.record_count).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceCount {
    #[serde(rename = "DSRC_CODE")]
    pub code: String,

    #[serde(rename = "DSRC_RECORD_COUNT")]
    pub record_count: usize,
}

/// A registered data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    #[serde(rename = "DSRC_ID")]
    pub id: u32,

    #[serde(rename = "DSRC_CODE")]
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DataSourceList {
    #[serde(rename = "DATA_SOURCES", default)]
    pub data_sources: Vec<DataSource>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DataSourceId {
    #[serde(rename = "DSRC_ID")]
    pub id: u32,
}

/// Engine statistics
///
/// The document is engine-specific, so it is kept verbatim in `raw`; the
/// `workload` section is additionally parsed when present.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineStats {
    pub raw: Value,
    pub workload: Option<Workload>,
}

impl EngineStats {
    pub(crate) fn from_json(json: &str) -> Result<Self> {
        let raw: Value = parse(json)?;
        let workload = match raw.get("workload") {
            Some(section) => Some(serde_json::from_value(section.clone())?),
            None => None,
        };
        Ok(EngineStats { raw, workload })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Workload {
    pub api_version: String,
    pub instance_name: String,
    pub datastore: String,
    pub loaded_records: u64,
    pub entity_count: u64,
    pub added_records: u64,
    pub deleted_records: u64,
    pub reevaluations: u64,
    pub entity_lookups: u64,
    pub searches: u64,
    pub path_queries: u64,
    pub why_queries: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_response_optional_sections() {
        let response: EntityResponse =
            parse(r#"{"RESOLVED_ENTITY": {"ENTITY_ID": 7}}"#).unwrap();
        assert_eq!(response.entity_id(), 7);
        assert!(response.related_entities.is_empty());
        assert!(response.resolved_entity.records.is_empty());
    }

    #[test]
    fn test_search_sort_is_score_then_id() {
        let mut response: SearchResponse = parse(
            r#"{"RESOLVED_ENTITIES": [
                {"ENTITY_ID": 9, "MATCH_SCORE": 30},
                {"ENTITY_ID": 4, "MATCH_SCORE": 50},
                {"ENTITY_ID": 2, "MATCH_SCORE": 30}
            ]}"#,
        )
        .unwrap();
        response.sort();
        let ids: Vec<i64> = response.entities.iter().map(|e| e.entity_id).collect();
        assert_eq!(ids, vec![4, 2, 9]);
    }

    #[test]
    fn test_why_result_helpers() {
        let response: WhyResponse = parse(
            r#"{"WHY_RESULTS": [{
                "ENTITY_ID": 1, "ENTITY_ID_2": 1,
                "MATCH_INFO": {"WHY_KEY": "+NAME+DOB", "MATCH_LEVEL_CODE": "RESOLVED",
                    "FEATURE_SCORES": {"NAME": [{"INBOUND_FEAT_DESC": "A", "CANDIDATE_FEAT_DESC": "A",
                        "SCORE": 100, "SCORE_BUCKET": "SAME"}]}}
            }]}"#,
        )
        .unwrap();
        let result = response.first().unwrap();
        assert!(result.is_match());
        assert!(result.resolved_together());
        assert_eq!(result.match_level(), "RESOLVED");
        assert_eq!(result.feature_scores()["NAME"][0].score, 100);
    }

    #[test]
    fn test_same_entity_is_match_without_shared_features() {
        let response: WhyResponse = parse(
            r#"{"WHY_RESULTS": [{
                "ENTITY_ID": 3, "ENTITY_ID_2": 3,
                "MATCH_INFO": {"WHY_KEY": "", "MATCH_LEVEL_CODE": "RESOLVED"}
            }]}"#,
        )
        .unwrap();
        assert!(response.first().unwrap().is_match());
    }

    #[test]
    fn test_stats_keep_unknown_sections() {
        let stats = EngineStats::from_json(
            r#"{"workload": {"addedRecords": 3, "futureCounter": 1}, "other": {}}"#,
        )
        .unwrap();
        assert_eq!(stats.workload.unwrap().added_records, 3);
        assert!(stats.raw.get("other").is_some());

        let bare = EngineStats::from_json("{}").unwrap();
        assert!(bare.workload.is_none());
    }
}
