//! Configuration parsing, value coercion and the resource registry.

use serde_json::json;
use std::collections::HashMap;
use unineeds::domain::model::{
    catalog, coerce_record, coerce_scalar_for_type, ColumnType, MarketplaceModel, ResourceRegistry,
};
use unineeds::infra::{AppConfig, ConfigError, LogFormat};
use unineeds::Role;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| vars.get(name).cloned()
}

#[test]
fn config_defaults() {
    let cfg = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/unineeds")])).unwrap();
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3000");
    assert_eq!(cfg.db_max_connections, 5);
    assert!(cfg.role_claim_fallback);
    assert!(!cfg.auto_migrate);
    assert_eq!(cfg.realtime_capacity, 256);
    assert_eq!(cfg.log_format, LogFormat::Text);
}

#[test]
fn config_overrides_and_errors() {
    let cfg = AppConfig::from_lookup(lookup(&[
        ("DATABASE_URL", "postgres://db/unineeds"),
        ("BIND_ADDR", "127.0.0.1:8080"),
        ("ROLE_CLAIM_FALLBACK", "false"),
        ("LOG_FORMAT", "json"),
    ]))
    .unwrap();
    assert_eq!(cfg.bind_addr.port(), 8080);
    assert!(!cfg.role_claim_fallback);
    assert_eq!(cfg.log_format, LogFormat::Json);

    assert_eq!(
        AppConfig::from_lookup(lookup(&[])).unwrap_err(),
        ConfigError::Missing("DATABASE_URL")
    );
    assert!(matches!(
        AppConfig::from_lookup(lookup(&[("DATABASE_URL", "x"), ("DB_MAX_CONNECTIONS", "many")])),
        Err(ConfigError::Invalid { name: "DB_MAX_CONNECTIONS", .. })
    ));
}

#[test]
fn log_format_is_parsed_strictly() {
    assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
    assert_eq!("".parse::<LogFormat>(), Ok(LogFormat::Text));
    assert!("xml".parse::<LogFormat>().is_err());
    assert!(matches!(
        AppConfig::from_lookup(lookup(&[("DATABASE_URL", "x"), ("LOG_FORMAT", "xml")])),
        Err(ConfigError::Invalid { name: "LOG_FORMAT", .. })
    ));
}

#[test]
fn scalars_coerce_to_column_types() {
    assert_eq!(coerce_scalar_for_type(ColumnType::Int, &json!("42")).unwrap(), json!(42));
    assert!(coerce_scalar_for_type(ColumnType::Int, &json!(5_000_000_000i64)).is_err());
    assert_eq!(coerce_scalar_for_type(ColumnType::Bool, &json!("t")).unwrap(), json!(true));
    assert_eq!(
        coerce_scalar_for_type(ColumnType::Uuid, &json!("6F9619FF-8B86-D011-B42D-00CF4FC964FF")).unwrap(),
        json!("6f9619ff-8b86-d011-b42d-00cf4fc964ff")
    );
    assert!(coerce_scalar_for_type(ColumnType::Uuid, &json!("nope")).is_err());
    assert_eq!(
        coerce_scalar_for_type(ColumnType::Timestamptz, &json!("2026-03-01T10:00:00+01:00")).unwrap(),
        json!("2026-03-01T09:00:00.000000Z")
    );
    assert_eq!(coerce_scalar_for_type(ColumnType::Text, &json!(7)).unwrap(), json!("7"));
    assert_eq!(coerce_scalar_for_type(ColumnType::Text, &json!(false)).unwrap(), json!("false"));
    assert!(coerce_scalar_for_type(ColumnType::Text, &json!({ "x": [1, 2] })).is_err());
    assert!(coerce_scalar_for_type(ColumnType::Text, &json!(["a"])).is_err());
    assert_eq!(coerce_scalar_for_type(ColumnType::Float, &json!(null)).unwrap(), json!(null));
}

#[test]
fn records_report_every_bad_field() {
    let record = json!({
        "name": { "x": [1, 2] },
        "price": "cheap",
        "colour": "red",
        "category": ["snacks"],
        "description": true
    });
    let errors = coerce_record(&catalog::PRODUCTS, record.as_object().unwrap()).unwrap_err();
    let mut fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    fields.sort();
    assert_eq!(fields, vec!["category", "colour", "name", "price"]);
    let name = errors.iter().find(|e| e.field == "name").unwrap();
    assert_eq!(name.expected, "expected text");
    assert_eq!(name.got, "object");
}

#[test]
fn updates_cannot_clear_defaulted_enumerations() {
    let patch = json!({ "status": null, "category": null });
    let errors = catalog::PRODUCTS
        .validate_update_payload(patch.as_object().unwrap())
        .unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "status");
    assert_eq!(errors[0].got, "null");

    let patch = json!({ "service_type": null });
    let errors = catalog::ORDERS
        .validate_update_payload(patch.as_object().unwrap())
        .unwrap_err();
    assert_eq!(errors[0].field, "service_type");
}

#[test]
fn defaults_fill_missing_statuses() {
    let mut payload = json!({ "title": "Tutoring" }).as_object().unwrap().clone();
    catalog::JOBS.apply_defaults(&mut payload);
    assert_eq!(payload["status"], "open");
}

#[test]
fn registry_lists_every_role_resource() {
    let registry = ResourceRegistry::marketplace();
    assert_eq!(
        registry.list_resources(),
        vec![
            "customer/offers",
            "customer/orders",
            "driver/tasks",
            "freelancer/jobs",
            "freelancer/offers",
            "freelancer/services",
            "seller/food-items",
            "seller/products",
        ]
    );
    let offers = registry.get(Role::Freelancer, "offers").unwrap();
    assert_eq!(offers.scope.owner_field, "freelancer_id");
    assert!(!offers.scope.permissions.create);
    assert!(offers.scope.permissions.can_update("status"));
    assert!(!offers.scope.permissions.can_update("proposed_price"));
    assert!(registry.get(Role::Driver, "products").is_none());
}
