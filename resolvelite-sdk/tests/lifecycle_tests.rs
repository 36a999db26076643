//! Factory lifecycle, handles and error mapping

#[path = "testutils/mod.rs"]
mod testutils;

use resolvelite::config::{ENGINE_CONFIGURATION_ENV, PROJECT_DIR_ENV};
use resolvelite_sdk::{AddRecordFlags, EngineConfig, EntityFlags, Error, Record, ResolveLite};
use serde_json::json;
use serial_test::serial;
use testutils::test_fixture::SdkFixture;

#[test]
fn test_entities_survive_reopen() {
    let fixture = SdkFixture::persistent().expect("Failed to create fixture");
    let entity_id = fixture.add("1", json!({"NAME_FULL": "Ann Lee", "SSN_NUMBER": "123-45-6789"}));
    fixture.add("2", json!({"NAME_FULL": "Ann B Lee", "SSN_NUMBER": "123456789"}));
    let project_dir = fixture.close().expect("close failed");

    let config = EngineConfig::for_project_dir(project_dir.path());
    let entity = ResolveLite::with_session("reopened", &config, |db| {
        db.engine()
            .get_entity_by_record_id("CUSTOMERS", "2", EntityFlags::default())
    })
    .unwrap();
    assert_eq!(entity.entity_id(), entity_id);
    assert_eq!(entity.resolved_entity.records.len(), 2);
}

#[test]
fn test_closed_factory_releases_datastore() {
    let fixture = SdkFixture::persistent().expect("Failed to create fixture");
    fixture.add("1", json!({"NAME_FULL": "Ann Lee"}));
    let project_dir = fixture.close().expect("close failed");

    // sled holds an exclusive lock until the engine is destroyed
    let config = EngineConfig::for_project_dir(project_dir.path());
    let db = ResolveLite::open("second", &config).unwrap();
    assert_eq!(db.diagnostic().get_datastore_info().unwrap().record_count("CUSTOMERS"), 1);
    db.close().unwrap();
}

#[test]
fn test_unknown_data_source_is_record_error() {
    let fixture = SdkFixture::new().expect("Failed to create fixture");
    let record = Record::builder()
        .data_source("NOPE")
        .record_id("1")
        .attribute("NAME_FULL", "Ann Lee")
        .build();
    let err = fixture
        .db()
        .engine()
        .add_record("NOPE", "1", &record)
        .unwrap_err();
    assert!(matches!(err, Error::Record(_)), "got {:?}", err);
    assert!(!err.is_fatal());
}

#[test]
fn test_mismatched_identity_is_record_error() {
    let fixture = SdkFixture::new().expect("Failed to create fixture");
    let record = SdkFixture::record("1", json!({"NAME_FULL": "Ann Lee"}));
    assert!(matches!(
        fixture.db().engine().add_record("CUSTOMERS", "2", &record),
        Err(Error::Record(_))
    ));
}

#[test]
fn test_missing_record_is_not_found() {
    let fixture = SdkFixture::new().expect("Failed to create fixture");
    let engine = fixture.db().engine();
    assert!(matches!(
        engine.get_entity_by_record_id("CUSTOMERS", "missing", EntityFlags::default()),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        engine.get_entity_by_entity_id(987_654, EntityFlags::default()),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_lookup_under_unregistered_data_source_is_not_found() {
    let fixture = SdkFixture::new().expect("Failed to create fixture");
    fixture.add("1", json!({"NAME_FULL": "Ann Lee"}));
    let err = fixture
        .db()
        .engine()
        .get_entity_by_record_id("NOSUCH", "1", EntityFlags::default())
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "got {:?}", err);
    assert!(!err.is_fatal());
}

#[test]
fn test_add_with_info_reports_affected_entities() {
    let fixture = SdkFixture::new().expect("Failed to create fixture");
    let engine = fixture.db().engine();
    let first = fixture.add("1", json!({"NAME_FULL": "Ann Lee", "PHONE_NUMBER": "555-0100"}));

    let record = SdkFixture::record(
        "2",
        json!({"NAME_FULL": "Ben Cho", "PHONE_NUMBER": "555-0100"}),
    );
    let info = engine
        .add_record_with_info(
            "CUSTOMERS",
            "2",
            &record,
            AddRecordFlags::default().with_interesting_entities(true),
        )
        .unwrap();
    assert_eq!(info.data_source, "CUSTOMERS");
    assert_eq!(info.record_id, "2");
    assert_eq!(info.affected_entity_ids().len(), 1);
    let interesting: Vec<i64> = info
        .interesting_entities
        .entities
        .iter()
        .map(|e| e.entity_id)
        .collect();
    assert_eq!(interesting, vec![first]);
}

#[test]
fn test_delete_with_info_and_absent_delete() {
    let fixture = SdkFixture::new().expect("Failed to create fixture");
    let engine = fixture.db().engine();
    let entity_id = fixture.add("1", json!({"NAME_FULL": "Ann Lee"}));

    let info = engine
        .delete_record_with_info("CUSTOMERS", "1", AddRecordFlags::default())
        .unwrap();
    assert_eq!(info.affected_entity_ids(), vec![entity_id]);
    assert!(matches!(
        engine.get_entity_by_record_id("CUSTOMERS", "1", EntityFlags::minimal()),
        Err(Error::NotFound(_))
    ));

    engine.delete_record("CUSTOMERS", "1").unwrap();
}

#[test]
fn test_config_manager_registration() {
    let fixture = SdkFixture::new().expect("Failed to create fixture");
    let config = fixture.db().config();

    let customers = config.ensure_data_source("CUSTOMERS").unwrap();
    assert_eq!(config.ensure_data_source("CUSTOMERS").unwrap(), customers);
    assert!(config.add_data_source("CUSTOMERS").is_err());

    let watchlist = config.add_data_source("WATCHLIST").unwrap();
    assert!(watchlist > customers);
    let codes: Vec<String> = config
        .data_sources()
        .unwrap()
        .into_iter()
        .map(|ds| ds.code)
        .collect();
    assert!(codes.contains(&"WATCHLIST".to_string()));
}

#[test]
fn test_stats_track_workload() {
    let fixture = SdkFixture::new().expect("Failed to create fixture");
    fixture.add("1", json!({"NAME_FULL": "Ann Lee"}));
    fixture.add("2", json!({"NAME_FULL": "Ben Cho"}));

    let stats = fixture.db().engine().get_stats().unwrap();
    let workload = stats.workload.expect("workload section");
    assert_eq!(workload.added_records, 2);
    assert_eq!(workload.entity_count, 2);
    assert_eq!(workload.instance_name, "sdk-test");
    assert!(stats.raw.get("workload").is_some());
}

#[test]
fn test_with_session_returns_closure_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::init_project_dir(temp_dir.path()).unwrap();
    let result: resolvelite_sdk::Result<()> = ResolveLite::with_session("scoped", &config, |db| {
        db.engine()
            .get_entity_by_entity_id(1, EntityFlags::default())
            .map(|_| ())
    });
    assert!(matches!(result, Err(Error::NotFound(_))));

    // The failed session still released the datastore lock
    ResolveLite::open("after", &config).unwrap().close().unwrap();
}

#[test]
fn test_missing_project_is_fatal() {
    let config = EngineConfig::for_project_dir("/definitely/not/a/resolvelite/project");
    let err = ResolveLite::open("missing", &config).err().expect("open should fail");
    assert!(matches!(err, Error::Configuration(_)));
    assert!(err.is_fatal());
}

#[test]
#[serial]
fn test_from_env_uses_project_dir() {
    let temp_dir = tempfile::tempdir().unwrap();
    EngineConfig::init_project_dir(temp_dir.path()).unwrap();
    std::env::remove_var(ENGINE_CONFIGURATION_ENV);
    std::env::set_var(PROJECT_DIR_ENV, temp_dir.path());

    let db = ResolveLite::from_env("env");
    std::env::remove_var(PROJECT_DIR_ENV);

    let db = db.unwrap();
    assert_eq!(db.instance_name(), "env");
    db.config().ensure_data_source("CUSTOMERS").unwrap();
    db.close().unwrap();
}

#[test]
#[serial]
fn test_from_env_configuration_document_wins() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::init_project_dir(temp_dir.path())
        .unwrap()
        .with_connection(format!("memory://env_{}", fastrand::u64(..)));
    std::env::set_var(ENGINE_CONFIGURATION_ENV, config.to_json().unwrap());
    std::env::set_var(PROJECT_DIR_ENV, "/definitely/not/a/resolvelite/project");

    let db = ResolveLite::from_env("env");
    std::env::remove_var(ENGINE_CONFIGURATION_ENV);
    std::env::remove_var(PROJECT_DIR_ENV);

    let db = db.unwrap();
    let stats = db.engine().get_stats().unwrap();
    assert!(stats.workload.unwrap().datastore.starts_with("memory://"));
    db.close().unwrap();
}
