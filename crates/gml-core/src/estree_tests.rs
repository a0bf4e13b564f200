use crate::estree::{convert, EstreeOptions};
use serde_json::{json, Value};

fn point(index: u64, line: u64, column: u64) -> Value {
    json!({ "index": index, "line": line, "column": column })
}

fn sample() -> Value {
    json!({
        "type": "Program",
        "body": [{
            "type": "ExpressionStatement",
            "expression": {
                "type": "Identifier",
                "name": "x",
                "start": point(0, 1, 0),
                "end": point(1, 1, 1),
                "loc": { "start": { "line": 1, "column": 0 }, "end": { "line": 1, "column": 1 } }
            },
            "start": point(0, 1, 0),
            "end": point(2, 1, 2)
        }],
        "comments": [{
            "type": "CommentLine",
            "value": " hi",
            "start": point(3, 1, 3),
            "end": point(8, 1, 8)
        }],
        "tokens": [],
        "sourceType": "script",
        "start": point(0, 1, 0),
        "end": point(8, 1, 8)
    })
}

#[test]
fn adds_loc_and_range() {
    let converted = convert(&sample(), &EstreeOptions::default());
    let identifier = &converted["body"][0]["expression"];

    assert_eq!(
        identifier,
        &json!({
            "type": "Identifier",
            "name": "x",
            "loc": { "start": { "line": 1, "column": 0 }, "end": { "line": 1, "column": 1 } },
            "start": 0,
            "end": 1,
            "range": [0, 1]
        })
    );
    assert_eq!(converted["range"], json!([0, 8]));
}

#[test]
fn renames_comment_types() {
    let converted = convert(&sample(), &EstreeOptions::default());

    assert_eq!(converted["comments"][0]["type"], json!("Line"));
    assert_eq!(converted["comments"][0]["value"], json!(" hi"));

    let block = convert(&json!({ "type": "CommentBlock", "value": "*" }), &EstreeOptions::default());
    assert_eq!(block["type"], json!("Block"));
}

#[test]
fn drops_what_the_options_exclude() {
    let options = EstreeOptions {
        include_locations: false,
        include_range: false,
        include_comments: false,
    };
    let converted = convert(&sample(), &options);

    assert!(converted.get("comments").is_none());
    assert!(converted.get("loc").is_none());
    assert!(converted.get("range").is_none());
    assert!(converted["body"][0].get("start").is_none());
    assert_eq!(converted["sourceType"], json!("script"));
}

#[test]
fn range_reads_alternative_offset_keys() {
    let node = json!({
        "type": "Literal",
        "value": "1",
        "start": { "offset": 4, "line": 2, "column": 0 },
        "end": 5
    });
    let converted = convert(&node, &EstreeOptions::default());

    assert_eq!(converted["range"], json!([4, 5]));
    // `end` has no line, so there is no `loc`.
    assert!(converted.get("loc").is_none());
}

#[test]
fn missing_columns_default_to_zero() {
    let node = json!({
        "type": "Identifier",
        "name": "y",
        "start": { "index": 0, "line": 3 },
        "end": { "index": 1, "line": 3 }
    });
    let converted = convert(&node, &EstreeOptions::default());

    assert_eq!(
        converted["loc"],
        json!({ "start": { "line": 3, "column": 0 }, "end": { "line": 3, "column": 0 } })
    );
}

#[test]
fn unknown_node_types_and_plain_values_pass_through() {
    let node = json!({
        "type": "FancyNewNode",
        "declaration": true,
        "payload": { "nested": [1, "two", null] }
    });
    let converted = convert(&node, &EstreeOptions::default());

    assert_eq!(
        converted,
        json!({ "type": "FancyNewNode", "payload": { "nested": [1, "two", null] } })
    );
    assert_eq!(convert(&json!(42), &EstreeOptions::default()), json!(42));
}
