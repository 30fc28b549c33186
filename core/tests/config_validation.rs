//! Loading configuration and reference tables from a data directory.

use msgfraud_core::{
    config::GeneratorConfig,
    reference::{ReferenceTables, Tier},
    EventSimulator, GenError,
};
use std::fs;
use std::path::PathBuf;

fn data_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("msgfraud-data-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(dir.join("reference")).expect("create data dir");
    dir
}

const AGGREGATORS: &str = r#"{
  "aggregators": [
    { "aggregator_id": "AGG9", "aggregator_name": "Test_Route", "country": "Japan",
      "tier": "tier-2", "trust_score": 0.5 }
  ]
}"#;

#[test]
fn reference_file_overrides_only_its_table() {
    let dir = data_dir("override");
    fs::write(dir.join("reference/aggregators.json"), AGGREGATORS).expect("write");

    let (config, tables) = GeneratorConfig::load(dir.to_str().expect("utf-8 path")).expect("load");
    let builtin = ReferenceTables::builtin();
    assert_eq!(config, GeneratorConfig::default());
    assert_eq!(tables.aggregators.len(), 1);
    assert_eq!(tables.aggregators[0].tier, Tier::Tier2);
    assert_eq!(tables.customers, builtin.customers);
    assert_eq!(tables.error_codes, builtin.error_codes);

    let sim = EventSimulator::new(GeneratorConfig::default_test(), tables).expect("valid");
    let ds = sim.generate().expect("generation");
    assert!(ds.billing.iter().all(|b| b.aggregator_id == "AGG9"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn malformed_reference_file_is_an_error() {
    let dir = data_dir("malformed");
    fs::write(dir.join("reference/customers.json"), "{ not json").expect("write");
    assert!(GeneratorConfig::load(dir.to_str().expect("utf-8 path")).is_err());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn out_of_range_trust_score_is_rejected() {
    let mut tables = ReferenceTables::builtin();
    tables.aggregators[0].trust_score = 1.5;
    let err = EventSimulator::new(GeneratorConfig::default_test(), tables)
        .err()
        .expect("should fail");
    assert!(matches!(err, GenError::Config(_)), "{err}");
}

#[test]
fn duplicate_ids_are_rejected() {
    let mut tables = ReferenceTables::builtin();
    let dup = tables.customers[0].clone();
    tables.customers.push(dup);
    assert!(EventSimulator::new(GeneratorConfig::default_test(), tables).is_err());
}

#[test]
fn surge_customer_must_exist() {
    let mut config = GeneratorConfig::default_test();
    config.content.surge_customer = Some("C404".into());
    let err = EventSimulator::new(config, ReferenceTables::builtin())
        .err()
        .expect("should fail");
    assert!(matches!(err, GenError::UnknownReference { .. }), "{err}");
}
