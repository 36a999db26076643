//! Loopback engine behaviour through the backend traits

#[path = "testutils/mod.rs"]
mod testutils;

use resolvelite::{
    ConfigBackend, DiagnosticBackend, EngineBackend, EngineError, EntityFlags, InfoFlags,
    PathFlags, SearchFlags, WhyFlags,
};
use serde_json::json;
use testutils::test_fixture::TestFixture;

#[test]
fn test_duplicate_records_resolve_together() {
    let fixture = TestFixture::new().expect("Failed to create test fixture");
    fixture.add(
        "1001",
        json!({"NAME_FULL": "Robert Smith", "DATE_OF_BIRTH": "1978-12-11", "ADDR_FULL": "123 Main St, Las Vegas NV"}),
    );
    fixture.add(
        "1002",
        json!({"NAME_FIRST": "Bob", "NAME_LAST": "Smith", "SSN_NUMBER": "123-45-6789"}),
    );
    fixture.add(
        "1003",
        json!({"NAME_FULL": "Smith Robert", "DATE_OF_BIRTH": "1978/12/11", "SSN_NUMBER": "123456789"}),
    );

    assert_eq!(fixture.entity_id_of("1001"), fixture.entity_id_of("1003"));
    assert_eq!(fixture.entity_id_of("1002"), fixture.entity_id_of("1003"));

    let doc = fixture.json(
        &fixture
            .engine()
            .get_entity_by_record_id("CUSTOMERS", "1001", EntityFlags::default())
            .unwrap(),
    );
    assert_eq!(
        doc["RESOLVED_ENTITY"]["RECORDS"].as_array().unwrap().len(),
        3
    );
    assert_eq!(
        doc["RESOLVED_ENTITY"]["RECORD_SUMMARY"][0]["RECORD_COUNT"],
        3
    );
}

#[test]
fn test_entity_flags_shape_the_document() {
    let fixture = TestFixture::memory().expect("Failed to create test fixture");
    let id = fixture.add("1", json!({"NAME_FULL": "Ann Lee", "PHONE_NUMBER": "555-0100"}));

    let minimal = fixture.json(
        &fixture
            .engine()
            .get_entity_by_entity_id(id, EntityFlags::minimal())
            .unwrap(),
    );
    assert!(minimal["RESOLVED_ENTITY"].get("RECORDS").is_none());
    assert!(minimal.get("RELATED_ENTITIES").is_none());

    let full = fixture.json(
        &fixture
            .engine()
            .get_entity_by_entity_id(id, EntityFlags::full())
            .unwrap(),
    );
    let record = &full["RESOLVED_ENTITY"]["RECORDS"][0];
    assert_eq!(record["JSON_DATA"]["PHONE_NUMBER"], "555-0100");
    assert_eq!(
        full["RESOLVED_ENTITY"]["FEATURES"]["PHONE"][0]["FEAT_DESC"],
        "555-0100"
    );
}

#[test]
fn test_missing_record_and_entity_are_not_found() {
    let fixture = TestFixture::memory().expect("Failed to create test fixture");
    assert!(matches!(
        fixture
            .engine()
            .get_entity_by_record_id("CUSTOMERS", "missing", EntityFlags::default()),
        Err(EngineError::NotFound(_))
    ));
    assert!(matches!(
        fixture
            .engine()
            .get_entity_by_entity_id(987_654, EntityFlags::default()),
        Err(EngineError::NotFound(_))
    ));
}

#[test]
fn test_search_orders_by_score() {
    let fixture = TestFixture::memory().expect("Failed to create test fixture");
    fixture.add(
        "1",
        json!({"NAME_FULL": "Robert Smith", "DATE_OF_BIRTH": "1978-12-11"}),
    );
    fixture.add("2", json!({"NAME_FULL": "Robert Smith", "DATE_OF_BIRTH": "1981-01-01"}));
    fixture.add("3", json!({"NAME_FULL": "Unrelated Person"}));

    let attributes = json!({"NAME_FULL": "Robert Smith", "DATE_OF_BIRTH": "1978-12-11"});
    let doc = fixture.json(
        &fixture
            .engine()
            .search_by_attributes(&attributes.to_string(), SearchFlags::default().with_stats(true))
            .unwrap(),
    );
    let results = doc["RESOLVED_ENTITIES"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    let scores: Vec<i64> = results
        .iter()
        .map(|r| r["MATCH_SCORE"].as_i64().unwrap())
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(results[0]["MATCH_LEVEL_CODE"], "RESOLVED");
    assert_eq!(doc["SEARCH_STATISTICS"]["CANDIDATE_COUNT"], 2);

    let resolved_only = fixture.json(
        &fixture
            .engine()
            .search_by_attributes(&attributes.to_string(), SearchFlags::resolved_only())
            .unwrap(),
    );
    assert_eq!(resolved_only["RESOLVED_ENTITIES"].as_array().unwrap().len(), 1);
}

#[test]
fn test_search_without_matches_is_empty() {
    let fixture = TestFixture::memory().expect("Failed to create test fixture");
    fixture.add("1", json!({"NAME_FULL": "Ann Lee"}));
    let doc = fixture.json(
        &fixture
            .engine()
            .search_by_attributes(r#"{"NAME_FULL": "Nobody Here"}"#, SearchFlags::default())
            .unwrap(),
    );
    assert!(doc["RESOLVED_ENTITIES"].as_array().unwrap().is_empty());
}

#[test]
fn test_path_respects_max_degrees() {
    let fixture = TestFixture::memory().expect("Failed to create test fixture");
    let a = fixture.add("a", json!({"NAME_FULL": "Ann Lee", "PHONE_NUMBER": "111"}));
    let b = fixture.add(
        "b",
        json!({"NAME_FULL": "Ben Cho", "PHONE_NUMBER": "111", "EMAIL_ADDRESS": "x@y.io"}),
    );
    let c = fixture.add("c", json!({"NAME_FULL": "Cat Poe", "EMAIL_ADDRESS": "x@y.io"}));

    let doc = fixture.json(
        &fixture
            .engine()
            .find_path_by_entity_id(a, c, 3, PathFlags::default().with_matching_info(true))
            .unwrap(),
    );
    let ids: Vec<i64> = doc["ENTITIES"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["ENTITY_ID"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![a, b, c]);
    assert_eq!(doc["ENTITIES"][1]["MATCH_INFO"]["MATCH_KEY"], "+PHONE");

    let bounded = fixture.json(
        &fixture
            .engine()
            .find_path_by_entity_id(a, c, 1, PathFlags::default())
            .unwrap(),
    );
    assert!(bounded["ENTITIES"].as_array().unwrap().is_empty());
}

#[test]
fn test_why_identical_records() {
    let fixture = TestFixture::memory().expect("Failed to create test fixture");
    let record = json!({"NAME_FULL": "Jane Smith", "DATE_OF_BIRTH": "1985-03-15"});
    fixture.add("1001", record.clone());
    fixture.add("1002", record);

    let doc = fixture.json(
        &fixture
            .engine()
            .why_records("CUSTOMERS", "1001", "CUSTOMERS", "1002", WhyFlags::default())
            .unwrap(),
    );
    let info = &doc["WHY_RESULTS"][0]["MATCH_INFO"];
    assert_eq!(info["WHY_KEY"], "+NAME+DOB");
    assert_eq!(info["MATCH_LEVEL_CODE"], "RESOLVED");
    assert_eq!(info["FEATURE_SCORES"]["NAME"][0]["SCORE_BUCKET"], "SAME");
}

#[test]
fn test_why_missing_record_is_not_found() {
    let fixture = TestFixture::memory().expect("Failed to create test fixture");
    fixture.add("1001", json!({"NAME_FULL": "Jane Smith"}));
    assert!(matches!(
        fixture
            .engine()
            .why_records("CUSTOMERS", "1001", "CUSTOMERS", "404", WhyFlags::default()),
        Err(EngineError::NotFound(_))
    ));
}

#[test]
fn test_replacing_a_record_moves_it() {
    let fixture = TestFixture::memory().expect("Failed to create test fixture");
    let id = TestFixture::unique_id("R");
    fixture.add("anchor", json!({"NAME_FULL": "Jane Smith", "EMAIL_ADDRESS": "j@s.io"}));
    let before = fixture.add(&id, json!({"NAME_FULL": "Tom Tee"}));
    let after = fixture.add(&id, json!({"NAME_FULL": "Jane Smith", "EMAIL_ADDRESS": "j@s.io"}));

    assert_ne!(before, after);
    assert_eq!(after, fixture.entity_id_of("anchor"));
}

#[test]
fn test_delete_with_info_reports_affected() {
    let fixture = TestFixture::memory().expect("Failed to create test fixture");
    let entity = fixture.add("1", json!({"NAME_FULL": "Ann Lee"}));
    let doc = fixture.json(
        &fixture
            .engine()
            .delete_record("CUSTOMERS", "1", InfoFlags::with_info())
            .unwrap(),
    );
    assert_eq!(doc["AFFECTED_ENTITIES"][0]["ENTITY_ID"], entity);
}

#[test]
fn test_datastore_info_and_stats() {
    let fixture = TestFixture::new().expect("Failed to create test fixture");
    fixture.add("1", json!({"NAME_FULL": "Ann Lee"}));
    fixture.add("2", json!({"NAME_FULL": "Ben Cho"}));

    let info = fixture.json(&fixture.engine().get_datastore_info().unwrap());
    assert_eq!(info["ENTITY_COUNT"], 2);
    let customers = info["DATA_SOURCES"]
        .as_array()
        .unwrap()
        .iter()
        .find(|ds| ds["DSRC_CODE"] == "CUSTOMERS")
        .expect("CUSTOMERS listed");
    assert_eq!(customers["DSRC_RECORD_COUNT"], 2);

    let stats = fixture.json(&fixture.engine().get_stats().unwrap());
    assert_eq!(stats["workload"]["addedRecords"], 2);
    assert_eq!(stats["workload"]["loadedRecords"], 2);
}

#[test]
fn test_duplicate_data_source_is_rejected() {
    let fixture = TestFixture::memory().expect("Failed to create test fixture");
    assert!(matches!(
        fixture.engine().add_data_source("customers"),
        Err(EngineError::BadInput(_))
    ));
    assert!(fixture.engine().add_data_source("WATCH LIST").is_err());
    assert!(fixture.config().validate().is_ok());
}
