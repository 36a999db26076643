// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Detail flags controlling response verbosity
//!
//! Each request family has its own flag structure with named options. The
//! `Default` of every structure is the engine's default detail level; the
//! builder-style `with_*` methods toggle individual sections.

use serde::{Deserialize, Serialize};

/// Options for record mutations (add / delete)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InfoFlags {
    /// Return resolution-impact information (`AFFECTED_ENTITIES`)
    pub with_info: bool,
    /// Also return `INTERESTING_ENTITIES` (only meaningful with `with_info`)
    pub include_interesting_entities: bool,
}

impl InfoFlags {
    /// Request resolution-impact information
    pub fn with_info() -> Self {
        InfoFlags {
            with_info: true,
            include_interesting_entities: false,
        }
    }

    pub fn with_interesting_entities(mut self, on: bool) -> Self {
        self.include_interesting_entities = on;
        self
    }
}

/// Options for entity responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityFlags {
    /// Include `ENTITY_NAME`
    pub include_entity_name: bool,
    /// Include `RECORD_SUMMARY` (record counts per data source)
    pub include_record_summary: bool,
    /// Include the `RECORDS` list
    pub include_records: bool,
    /// Include each record's original `JSON_DATA`
    pub include_record_data: bool,
    /// Include every feature value under `FEATURES`
    pub include_all_features: bool,
    /// Include `RELATED_ENTITIES`
    pub include_related_entities: bool,
}

impl Default for EntityFlags {
    fn default() -> Self {
        EntityFlags {
            include_entity_name: true,
            include_record_summary: true,
            include_records: true,
            include_record_data: false,
            include_all_features: false,
            include_related_entities: true,
        }
    }
}

impl EntityFlags {
    /// Only the entity identifier
    pub fn minimal() -> Self {
        EntityFlags {
            include_entity_name: false,
            include_record_summary: false,
            include_records: false,
            include_record_data: false,
            include_all_features: false,
            include_related_entities: false,
        }
    }

    /// Every section of the entity document
    pub fn full() -> Self {
        EntityFlags {
            include_record_data: true,
            include_all_features: true,
            ..EntityFlags::default()
        }
    }

    pub fn with_entity_name(mut self, on: bool) -> Self {
        self.include_entity_name = on;
        self
    }

    pub fn with_records(mut self, on: bool) -> Self {
        self.include_records = on;
        self
    }

    pub fn with_record_data(mut self, on: bool) -> Self {
        self.include_record_data = on;
        self
    }

    pub fn with_all_features(mut self, on: bool) -> Self {
        self.include_all_features = on;
        self
    }

    pub fn with_related_entities(mut self, on: bool) -> Self {
        self.include_related_entities = on;
        self
    }
}

/// Options for attribute searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFlags {
    /// Return candidates that would resolve with the search attributes
    pub include_resolved: bool,
    /// Return candidates that are possibly the same entity
    pub include_possibly_same: bool,
    /// Return candidates that are possibly related
    pub include_possibly_related: bool,
    /// Include the matched entity's `FEATURES`
    pub include_features: bool,
    /// Include `SEARCH_STATISTICS`
    pub include_stats: bool,
}

impl Default for SearchFlags {
    fn default() -> Self {
        SearchFlags {
            include_resolved: true,
            include_possibly_same: true,
            include_possibly_related: true,
            include_features: true,
            include_stats: false,
        }
    }
}

impl SearchFlags {
    /// Resolved candidates only
    pub fn resolved_only() -> Self {
        SearchFlags {
            include_possibly_same: false,
            include_possibly_related: false,
            ..SearchFlags::default()
        }
    }

    pub fn with_stats(mut self, on: bool) -> Self {
        self.include_stats = on;
        self
    }

    pub fn with_features(mut self, on: bool) -> Self {
        self.include_features = on;
        self
    }
}

/// Options for path requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathFlags {
    /// Include per-hop `MATCH_INFO`
    pub include_matching_info: bool,
    /// Include `ENTITY_NAME` for each entity on the path
    pub include_entity_name: bool,
}

impl Default for PathFlags {
    fn default() -> Self {
        PathFlags {
            include_matching_info: false,
            include_entity_name: true,
        }
    }
}

impl PathFlags {
    pub fn with_matching_info(mut self, on: bool) -> Self {
        self.include_matching_info = on;
        self
    }
}

/// Options for why-analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhyFlags {
    /// Include `FEATURE_SCORES`
    pub include_feature_scores: bool,
    /// Include the two entities under `ENTITIES`
    pub include_entities: bool,
}

impl Default for WhyFlags {
    fn default() -> Self {
        WhyFlags {
            include_feature_scores: true,
            include_entities: false,
        }
    }
}

impl WhyFlags {
    pub fn with_entities(mut self, on: bool) -> Self {
        self.include_entities = on;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_presets() {
        let minimal = EntityFlags::minimal();
        assert!(!minimal.include_records && !minimal.include_related_entities);

        let full = EntityFlags::full();
        assert!(full.include_all_features && full.include_record_data);
        assert!(full.include_related_entities);
    }

    #[test]
    fn test_info_flags() {
        assert!(!InfoFlags::default().with_info);
        let flags = InfoFlags::with_info().with_interesting_entities(true);
        assert!(flags.with_info && flags.include_interesting_entities);
    }

    #[test]
    fn test_search_resolved_only() {
        let flags = SearchFlags::resolved_only().with_stats(true);
        assert!(flags.include_resolved);
        assert!(!flags.include_possibly_same);
        assert!(flags.include_stats);
    }
}
