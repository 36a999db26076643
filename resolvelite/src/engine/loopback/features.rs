// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Feature extraction and exact-value comparison
//!
//! A record's attribute fields are reduced to at most one value per feature
//! type. Values are normalized (case, punctuation, digit runs) and compared
//! for equality only; there is no similarity scoring.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Feature types known to the loopback engine, in canonical key order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureType {
    Name,
    Dob,
    Ssn,
    Address,
    Phone,
    Email,
}

impl FeatureType {
    pub const ALL: [FeatureType; 6] = [
        FeatureType::Name,
        FeatureType::Dob,
        FeatureType::Ssn,
        FeatureType::Address,
        FeatureType::Phone,
        FeatureType::Email,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            FeatureType::Name => "NAME",
            FeatureType::Dob => "DOB",
            FeatureType::Ssn => "SSN",
            FeatureType::Address => "ADDRESS",
            FeatureType::Phone => "PHONE",
            FeatureType::Email => "EMAIL",
        }
    }

    /// Contribution of an exact hit to a search score
    pub fn weight(&self) -> u32 {
        match self {
            FeatureType::Name => 30,
            FeatureType::Dob => 20,
            FeatureType::Ssn => 40,
            FeatureType::Address | FeatureType::Phone | FeatureType::Email => 15,
        }
    }

    /// Shared contact features relate entities without resolving them
    pub fn is_relationship(&self) -> bool {
        matches!(
            self,
            FeatureType::Address | FeatureType::Phone | FeatureType::Email
        )
    }
}

/// One normalized feature value plus its display form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub value: String,
    pub desc: String,
}

/// Features of one record (or one set of search attributes)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureSet {
    features: BTreeMap<FeatureType, Feature>,
}

fn field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| field(map, key))
}

fn joined(map: &Map<String, Value>, parts: &[&[&str]], sep: &str) -> Option<String> {
    let values: Vec<String> = parts
        .iter()
        .filter_map(|keys| first_field(map, keys))
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.join(sep))
    }
}

fn alnum_tokens(s: &str) -> Vec<String> {
    s.to_uppercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn digits(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

fn normalize(ftype: FeatureType, raw: &str) -> String {
    match ftype {
        FeatureType::Name => {
            // Token order does not matter: "SMITH ROBERT" == "Robert Smith"
            let mut tokens = alnum_tokens(raw);
            tokens.sort();
            tokens.join(" ")
        }
        FeatureType::Address => alnum_tokens(raw).join(" "),
        FeatureType::Dob | FeatureType::Ssn | FeatureType::Phone => digits(raw),
        FeatureType::Email => raw.trim().to_lowercase(),
    }
}

impl FeatureSet {
    /// Extract features from a record definition or search attributes
    pub fn extract(map: &Map<String, Value>) -> Self {
        let mut set = FeatureSet::default();

        let name = first_field(
            map,
            &["NAME_FULL", "PRIMARY_NAME_FULL", "NAME_ORG", "PRIMARY_NAME_ORG"],
        )
        .or_else(|| {
            joined(
                map,
                &[
                    &["PRIMARY_NAME_FIRST", "NAME_FIRST"],
                    &["PRIMARY_NAME_MIDDLE", "NAME_MIDDLE"],
                    &["PRIMARY_NAME_LAST", "NAME_LAST"],
                ],
                " ",
            )
        });
        let address = first_field(map, &["ADDR_FULL"]).or_else(|| {
            joined(
                map,
                &[
                    &["ADDR_LINE1"],
                    &["ADDR_LINE2"],
                    &["ADDR_CITY"],
                    &["ADDR_STATE"],
                    &["ADDR_POSTAL_CODE"],
                ],
                ", ",
            )
        });

        let raw = [
            (FeatureType::Name, name),
            (FeatureType::Dob, first_field(map, &["DATE_OF_BIRTH", "DOB"])),
            (FeatureType::Ssn, first_field(map, &["SSN_NUMBER", "SSN"])),
            (FeatureType::Address, address),
            (FeatureType::Phone, first_field(map, &["PHONE_NUMBER"])),
            (FeatureType::Email, first_field(map, &["EMAIL_ADDRESS"])),
        ];
        for (ftype, desc) in raw {
            if let Some(desc) = desc {
                set.insert(ftype, &desc);
            }
        }
        set
    }

    fn insert(&mut self, ftype: FeatureType, desc: &str) {
        let value = normalize(ftype, desc);
        if !value.is_empty() {
            self.features.insert(
                ftype,
                Feature {
                    value,
                    desc: desc.to_string(),
                },
            );
        }
    }

    pub fn get(&self, ftype: FeatureType) -> Option<&Feature> {
        self.features.get(&ftype)
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeatureType, &Feature)> {
        self.features.iter().map(|(t, f)| (*t, f))
    }

    /// Feature types where both sides carry the same normalized value
    pub fn shared_with(&self, other: &FeatureSet) -> Vec<FeatureType> {
        FeatureType::ALL
            .iter()
            .copied()
            .filter(|t| match (self.get(*t), other.get(*t)) {
                (Some(a), Some(b)) => a.value == b.value,
                _ => false,
            })
            .collect()
    }

    /// Feature types present on both sides with different values
    pub fn conflicts_with(&self, other: &FeatureSet) -> Vec<FeatureType> {
        FeatureType::ALL
            .iter()
            .copied()
            .filter(|t| match (self.get(*t), other.get(*t)) {
                (Some(a), Some(b)) => a.value != b.value,
                _ => false,
            })
            .collect()
    }

    /// Exact resolution rule
    ///
    /// Same SSN, or same name plus one corroborating feature, unless the
    /// dates of birth disagree.
    pub fn resolves_with(&self, other: &FeatureSet) -> bool {
        let shared = self.shared_with(other);
        if shared.contains(&FeatureType::Ssn) {
            return true;
        }
        if self.conflicts_with(other).contains(&FeatureType::Dob) {
            return false;
        }
        shared.contains(&FeatureType::Name) && shared.len() > 1
    }
}

/// `+NAME+DOB-PHONE` style key; empty when nothing is shared
pub fn match_key(shared: &[FeatureType], conflicts: &[FeatureType]) -> String {
    if shared.is_empty() {
        return String::new();
    }
    let mut key: String = shared.iter().map(|t| format!("+{}", t.code())).collect();
    for t in conflicts {
        key.push('-');
        key.push_str(t.code());
    }
    key
}
