use paramforge::allocator::{Allocation, PlaceholderToken, TokenStyle};
use paramforge::api::{prepare_template, ModelFile};
use paramforge::config::{MaterializeOptions, PrepareOptions};
use paramforge::materializer::{TrialMaterializer, ValueMap};
use paramforge::model::{Group, ParamId};
use paramforge::parser::ParsedFile;
use paramforge::writer::write_template;
use proptest::prelude::*;

mod common;
use common::{bounds, hydrology_options, prepare_hydrology, HYDROLOGY_INI};

// --- STRATEGIES ---

fn arb_group() -> impl Strategy<Value = Group> {
    prop_oneof![Just(Group::Class), Just(Group::Hydrology), Just(Group::Routing)]
}

fn arb_style() -> impl Strategy<Value = TokenStyle> {
    prop_oneof![Just(TokenStyle::Delimited), Just(TokenStyle::Compact)]
}

prop_compose! {
    fn arb_id()(
        group in arb_group(),
        unit in 0u32..10_000,
        name in "[a-z][a-z0-9_]{0,10}"
    ) -> ParamId {
        ParamId::new(group, unit, &name)
    }
}

/// A value rendered with a random number of decimals.
fn arb_value() -> impl Strategy<Value = String> {
    (0.0..50.0f64, 0usize..4).prop_map(|(v, p)| format!("{:.*}", p, v))
}

fn arb_pad() -> impl Strategy<Value = String> {
    (1usize..5).prop_map(|n| " ".repeat(n))
}

prop_compose! {
    /// Hydrology file with `routing` routing classes and `grus` GRU columns,
    /// numbered sequentially.
    fn arb_hydrology()(routing in 1usize..4, grus in 1usize..6)(
        wf_r2 in proptest::collection::vec((arb_pad(), arb_value()), routing),
        depth in (arb_pad(), arb_value()),
        zsnl in proptest::collection::vec((arb_pad(), arb_value()), grus),
        zpls in proptest::collection::vec((arb_pad(), arb_value()), grus),
        crlf in any::<bool>()
    ) -> String {
        let row = |label: &str, cells: &[(String, String)]| {
            let mut line = label.to_string();
            for (pad, value) in cells {
                line.push_str(pad);
                line.push_str(value);
            }
            line
        };
        let lines = [
            "2.0: MESH_parameters_hydrology.ini".to_string(),
            "##### Option Flags #####".to_string(),
            "----#".to_string(),
            "    0                                   # Number of option flags".to_string(),
            "##### Channel routing parameters #####".to_string(),
            "-----#".to_string(),
            "    1                                   # Number of channel routing parameters".to_string(),
            row("WF_R2", &wf_r2),
            "##### GRU class independent hydrologic parameters #####".to_string(),
            "-------#".to_string(),
            "    1".to_string(),
            row("SOIL_DEPTH", &[depth]),
            "##### GRU class dependent hydrologic parameters #####".to_string(),
            "-------#".to_string(),
            "    2                                   # Number of GRU dependent hydrologic parameters".to_string(),
            row("ZSNL", &zsnl),
            row("ZPLS", &zpls),
        ];
        let eol = if crlf { "\r\n" } else { "\n" };
        let mut text = lines.join(eol);
        text.push_str(eol);
        text
    }
}

// --- PROPERTIES ---

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn test_token_identity_bijection(id in arb_id(), style in arb_style()) {
        let token = PlaceholderToken::synthesize(&id, style).unwrap();
        prop_assert_eq!(token.identity(), Some(id.clone()));

        // The other style never reads the token as a different identity.
        let other = match style {
            TokenStyle::Delimited => TokenStyle::Compact,
            TokenStyle::Compact => TokenStyle::Delimited,
        };
        let other_token = PlaceholderToken::synthesize(&id, other).unwrap();
        prop_assert_ne!(token.as_str(), other_token.as_str());
        prop_assert_eq!(other_token.identity(), Some(id));
    }

    #[test]
    fn test_materialized_value_parses_back(value in 0.03..=0.6f64, precision in 1usize..7) {
        let expected: f64 = format!("{:.*}", precision, value).parse().unwrap();
        prop_assume!((0.03..=0.6).contains(&expected));

        let prepared = prepare_hydrology(r#"{"hydrology": {"1": {"zsnl": [0.03, 0.6]}}}"#);
        let options = MaterializeOptions { precision: Some(precision), ..Default::default() };

        let mut values = ValueMap::new();
        values.insert("T_ZSNL_1", value.to_string());
        let text = TrialMaterializer::new(&prepared.context, options).render(&values).unwrap();

        let descriptor = ModelFile::Hydrology.descriptor(&hydrology_options());
        let parsed = ParsedFile::parse(text, &descriptor).unwrap();
        prop_assert_eq!(parsed.value(&ParamId::new(Group::Hydrology, 1, "zsnl")), Some(expected));
        prop_assert_eq!(
            parsed.value(&ParamId::new(Group::Hydrology, 5, "zsnl")),
            Some(0.14)
        );
    }

    #[test]
    fn test_generated_file_round_trips(text in arb_hydrology()) {
        let descriptor = ModelFile::Hydrology.descriptor(&PrepareOptions::default());
        let parsed = ParsedFile::parse(text.as_str(), &descriptor).unwrap();
        let allocation = Allocation::allocate(&parsed, Vec::new(), TokenStyle::Delimited).unwrap();
        prop_assert_eq!(write_template(&parsed, &allocation).unwrap(), text.clone());

        // Templating every ZSNL column and substituting the originals back
        // reproduces the file.
        let units = parsed.units(Group::Hydrology);
        let json = units
            .iter()
            .filter(|&&u| u > 0)
            .map(|u| format!(r#""{}": {{"zsnl": [0, 100]}}"#, u))
            .collect::<Vec<_>>()
            .join(", ");
        let set = bounds(&format!(r#"{{"hydrology": {{{}}}}}"#, json));
        let prepared =
            prepare_template(ModelFile::Hydrology, text.as_str(), &set, &PrepareOptions::default())
                .unwrap();

        let values: ValueMap = prepared
            .context
            .manifest()
            .entries
            .iter()
            .map(|e| (e.token.to_string(), e.original.clone()))
            .collect();
        let rendered = TrialMaterializer::new(&prepared.context, MaterializeOptions::default())
            .render(&values)
            .unwrap();
        prop_assert_eq!(rendered, text);
    }
}

#[test]
fn test_fixture_units_match_declared_order() {
    let descriptor = ModelFile::Hydrology.descriptor(&hydrology_options());
    let parsed = ParsedFile::parse(HYDROLOGY_INI, &descriptor).unwrap();
    let units: Vec<u32> = parsed.units(Group::Hydrology).into_iter().collect();
    assert_eq!(units, vec![0, 1, 5, 6, 8, 10]);
}
