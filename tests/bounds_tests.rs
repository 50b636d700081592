use paramforge::bounds::{Bound, BoundSet};
use paramforge::error::ParamForgeError;
use paramforge::format::{FormatDescriptor, UnitOrder};
use paramforge::model::{Group, ParamId};
use paramforge::parser::ParsedFile;
use std::io::Write;
use tempfile::NamedTempFile;

mod common;
use common::{CLASS_INI, HYDROLOGY_GRU_ORDER, HYDROLOGY_INI};

fn hydrology() -> ParsedFile {
    let descriptor = FormatDescriptor::mesh_hydrology(
        UnitOrder::Declared(HYDROLOGY_GRU_ORDER.to_vec()),
        UnitOrder::Sequential,
    );
    ParsedFile::parse(HYDROLOGY_INI, &descriptor).unwrap()
}

// --- LOADING ---

#[test]
fn test_nested_json_becomes_ordered_list() {
    let set = BoundSet::from_json_str(
        r#"{
            "routing": {"2": {"WF_R2": [0.1, 0.5]}},
            "hydrology": {"5": {"zsnl": [0.03, 0.6]}, "1": {"ZSNL": [0.03, 0.6]}}
        }"#,
    )
    .unwrap();

    let ids: Vec<String> = set.iter().map(|b| b.id.to_string()).collect();
    assert_eq!(
        ids,
        vec!["hydrology:1:zsnl", "hydrology:5:zsnl", "routing:2:wf_r2"]
    );
    assert_eq!(set.len(), 3);
}

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, r#"{{"class": {{"1": {{"sand1": [10.0, 60.0]}}}}}}"#).unwrap();

    let set = BoundSet::load_from_file(file.path()).unwrap();
    let bound = set.get(&ParamId::new(Group::Class, 1, "sand1")).unwrap();
    assert_eq!((bound.min, bound.max), (10.0, 60.0));
}

#[test]
fn test_invalid_bounds_are_config_errors() {
    let cases = [
        r#"{"hydrology": {"1": {"zsnl": [0.6, 0.03]}}}"#,
        r#"{"hydrology": {"1": {"zsnl": [0.1, 0.2], "ZSNL": [0.1, 0.2]}}}"#,
        r#"{"snowpack": {"1": {"zsnl": [0.1, 0.2]}}}"#,
        r#"{"hydrology": {"first": {"zsnl": [0.1, 0.2]}}}"#,
        r#"{"hydrology": {"1": {"z-snl": [0.1, 0.2]}}}"#,
    ];
    for json in cases {
        let err = BoundSet::from_json_str(json).unwrap_err();
        assert!(matches!(err, ParamForgeError::Config(_)), "{json}: {err}");
    }
}

#[test]
fn test_bound_rejects_non_finite() {
    let id = ParamId::new(Group::Hydrology, 1, "zsnl");
    assert!(Bound::new(id.clone(), f64::NEG_INFINITY, 1.0).is_err());
    assert!(Bound::new(id.clone(), 0.0, f64::NAN).is_err());

    let bound = Bound::new(id, 0.03, 0.6).unwrap();
    assert!(bound.contains(0.03));
    assert!(bound.contains(0.6));
    assert!(!bound.contains(0.61));
}

// --- RESOLUTION ---

#[test]
fn test_resolve_selects_only_bounded_columns() {
    let parsed = hydrology();
    let set = BoundSet::from_json_str(r#"{"hydrology": {"1": {"zsnl": [0.03, 0.6]}}}"#).unwrap();

    let selected = set.resolve(&parsed).unwrap();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].record.id, ParamId::new(Group::Hydrology, 1, "zsnl"));
    assert_eq!(selected[0].record.span.original, "0.5");
}

#[test]
fn test_resolve_ignores_groups_the_file_does_not_serve() {
    let parsed = hydrology();
    let set = BoundSet::from_json_str(
        r#"{"class": {"7": {"sand1": [10, 60]}}, "routing": {"1": {"flz": [0.0001, 0.01]}}}"#,
    )
    .unwrap();

    let selected = set.resolve(&parsed).unwrap();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].record.id.group, Group::Routing);
}

#[test]
fn test_unknown_unit_is_unresolved() {
    let parsed = hydrology();
    let set = BoundSet::from_json_str(r#"{"hydrology": {"2": {"zsnl": [0.03, 0.6]}}}"#).unwrap();

    match set.resolve(&parsed).unwrap_err() {
        ParamForgeError::UnresolvedBound { group, unit, name, .. } => {
            assert_eq!(group, Group::Hydrology);
            assert_eq!(unit, 2);
            assert_eq!(name, "zsnl");
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_unknown_parameter_in_known_unit_is_unresolved() {
    let class = ParsedFile::parse(CLASS_INI, &FormatDescriptor::mesh_class()).unwrap();
    let set = BoundSet::from_json_str(r#"{"class": {"1": {"sand4": [10, 60]}}}"#).unwrap();

    let err = set.resolve(&class).unwrap_err();
    assert!(matches!(err, ParamForgeError::UnresolvedBound { unit: 1, .. }));
}
