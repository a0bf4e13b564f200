use crate::error::Error;
use crate::options::{AstFormat, LocationMode, ParserOptions, RecoveryMode};
use serde_json::{json, Value};

#[test]
fn defaults() {
    let options = ParserOptions::default();

    assert!(options.get_comments);
    assert!(options.get_locations);
    assert!(!options.simplify_locations);
    assert_eq!(options.ast_format, AstFormat::Gml);
    assert!(!options.as_json);
    assert_eq!(options.recovery, RecoveryMode::None);
    assert_eq!(options.location_mode(), LocationMode::Full);
}

#[test]
fn null_means_defaults() {
    assert_eq!(ParserOptions::from_value(&json!(null)).unwrap(), ParserOptions::default());
    assert_eq!(ParserOptions::from_value(&json!({})).unwrap(), ParserOptions::default());
}

#[test]
fn overrides_merge_over_defaults() {
    let options = ParserOptions::from_value(&json!({
        "astFormat": "estree",
        "asJSON": true,
        "recovery": "limited",
        "getComments": false
    }))
    .unwrap();

    assert_eq!(options.ast_format, AstFormat::Estree);
    assert!(options.as_json);
    assert_eq!(options.recovery, RecoveryMode::Limited);
    assert!(!options.get_comments);
    assert!(options.get_locations);
}

#[test]
fn merge_keeps_the_base_values() {
    let base = ParserOptions {
        recovery: RecoveryMode::Limited,
        ..ParserOptions::default()
    };
    let merged = base.merge(&json!({ "getLocations": false })).unwrap();

    assert_eq!(merged.recovery, RecoveryMode::Limited);
    assert!(!merged.get_locations);
}

#[test]
fn unknown_keys_and_null_values_are_ignored() {
    let options = ParserOptions::from_value(&json!({
        "someFutureOption": [1, 2],
        "getComments": null
    }))
    .unwrap();

    assert_eq!(options, ParserOptions::default());
}

#[test]
fn wrong_types_name_the_option() {
    let err = ParserOptions::from_value(&json!({ "getComments": "yes" })).unwrap_err();
    assert!(matches!(&err, Error::InvalidOption { name, .. } if name == "getComments"));
    assert!(err.is_type_error());

    let err = ParserOptions::from_value(&json!({ "recovery": "everything" })).unwrap_err();
    assert!(matches!(&err, Error::InvalidOption { name, .. } if name == "recovery"));
}

#[test]
fn options_must_be_an_object() {
    let err = ParserOptions::from_value(&json!([true])).unwrap_err();

    assert!(matches!(&err, Error::InvalidOption { name, .. } if name == "options"));
}

#[test]
fn location_modes() {
    let mode = |value: Value| ParserOptions::from_value(&value).unwrap().location_mode();

    assert_eq!(mode(json!({ "getLocations": false })), LocationMode::None);
    assert_eq!(
        mode(json!({ "getLocations": false, "simplifyLocations": true })),
        LocationMode::None
    );
    assert_eq!(mode(json!({ "simplifyLocations": true })), LocationMode::Simplified);
    assert_eq!(
        mode(json!({ "simplifyLocations": true, "astFormat": "estree" })),
        LocationMode::Full
    );
}

#[test]
fn serializes_with_public_names() {
    let value = serde_json::to_value(ParserOptions::default()).unwrap();

    assert_eq!(
        value,
        json!({
            "getComments": true,
            "getLocations": true,
            "simplifyLocations": false,
            "astFormat": "gml",
            "asJSON": false,
            "recovery": "none"
        })
    );
}
