use paramforge::allocator::TokenStyle;
use paramforge::config::{BoundsPolicy, Config, MaterializeOptions, PrepareOptions};
use paramforge::error::ParamForgeError;
use paramforge::format::UnitOrder;
use std::io::Write;
use std::str::FromStr;
use tempfile::NamedTempFile;

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.materialize.bounds_policy, BoundsPolicy::Reject);
    assert_eq!(config.materialize.precision, None);
    assert_eq!(config.prepare.gru_units(), UnitOrder::Sequential);
    assert_eq!(config.prepare.token_style, None);
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_json_fills_defaults() {
    let config = Config::from_json_str(
        r#"{
            "prepare": {"gru_order": [1, 5, 6], "token_style": "compact"},
            "materialize": {"bounds_policy": "warn"}
        }"#,
    )
    .unwrap();

    assert_eq!(config.prepare.gru_units(), UnitOrder::Declared(vec![1, 5, 6]));
    assert_eq!(config.prepare.routing_units(), UnitOrder::Sequential);
    assert_eq!(config.prepare.token_style, Some(TokenStyle::Compact));
    assert_eq!(config.materialize.bounds_policy, BoundsPolicy::Warn);
    assert_eq!(config.materialize.output_name, None);
}

#[test]
fn test_policy_names_are_snake_case() {
    assert_eq!(BoundsPolicy::from_str("warn").unwrap(), BoundsPolicy::Warn);
    assert_eq!(BoundsPolicy::Reject.to_string(), "reject");
    assert!(Config::from_json_str(r#"{"materialize": {"bounds_policy": "Clamp"}}"#).is_err());
}

#[test]
fn test_validate_rejects_bad_values() {
    let duplicate_gru = Config {
        prepare: PrepareOptions {
            gru_order: Some(vec![1, 2, 1]),
            ..Default::default()
        },
        ..Default::default()
    };
    assert!(matches!(
        duplicate_gru.validate(),
        Err(ParamForgeError::Config(_))
    ));

    for name in ["", "..", "trials/out.ini"] {
        let config = Config {
            materialize: MaterializeOptions {
                output_name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err(), "'{name}' accepted");
    }
}

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{"prepare": {{"routing_order": [2, 1]}}, "materialize": {{"precision": 4, "output_name": "trial.ini"}}}}"#
    )
    .unwrap();

    let config = Config::load_from_file(file.path()).unwrap();
    assert_eq!(config.prepare.routing_units(), UnitOrder::Declared(vec![2, 1]));
    assert_eq!(config.materialize.precision, Some(4));
    assert_eq!(config.materialize.output_name.as_deref(), Some("trial.ini"));
}

#[test]
fn test_load_from_missing_file_is_io_error() {
    let err = Config::load_from_file("/nonexistent/paramforge.json").unwrap_err();
    assert!(matches!(err, ParamForgeError::Io(_)));
}
