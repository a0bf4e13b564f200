//! End-to-end runs of the parse pipeline

use gml_core::{
    parse, parse_with_overrides, Ast, Error, NodeKind, ParseOutput, ParserOptions, RecoveryMode,
    RecoveryPath,
};
use indoc::indoc;
use serde_json::{json, Value};

fn limited() -> ParserOptions {
    ParserOptions {
        recovery: RecoveryMode::Limited,
        ..ParserOptions::default()
    }
}

fn json_ast(output: &ParseOutput) -> Value {
    serde_json::to_value(&output.ast).unwrap()
}

/// Every `type` tag anywhere in a serialized tree.
fn type_tags(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(tag)) = map.get("type") {
                out.push(tag.clone());
            }
            for child in map.values() {
                type_tags(child, out);
            }
        }
        Value::Array(items) => items.iter().for_each(|item| type_tags(item, out)),
        _ => {}
    }
}

#[test]
fn missing_argument_separator_is_recovered() {
    let output = parse("foo(1 2)", &limited()).unwrap();
    let ast = json_ast(&output);
    let call = &ast["body"][0]["expression"];

    assert_eq!(call["type"], json!("CallExpression"));
    assert_eq!(call["object"]["name"], json!("foo"));
    assert_eq!(call["arguments"][0]["value"], json!("1"));
    assert_eq!(call["arguments"][1]["value"], json!("2"));
    assert_eq!(call["arguments"][1]["start"]["index"], json!(6));
    assert_eq!(call["end"]["index"], json!(8));

    assert_eq!(
        serde_json::to_value(&output.services.recovery).unwrap(),
        json!([{
            "kind": "InsertedArgumentSeparator",
            "recoveredOffset": 5,
            "originalOffset": 5,
            "insertedText": ","
        }])
    );
    assert_eq!(output.stats.attempts, 2);
    assert_eq!(output.stats.recovery, RecoveryPath::ArgumentSeparators);
}

#[test]
fn strict_mode_reports_the_original_error() {
    let err = parse("foo(1 2)", &ParserOptions::default()).unwrap_err();

    let Error::Syntax(syntax) = err else {
        panic!("expected a syntax error");
    };
    assert_eq!((syntax.line, syntax.column), (1, 6));
    assert_eq!(syntax.message, "unexpected symbol '2'");
}

#[test]
fn failed_retry_surfaces_the_strict_error() {
    // Word operators get separators like any other word, so the retry fails.
    let err = parse("foo(a and b c);", &limited()).unwrap_err();

    let Error::Syntax(syntax) = err else {
        panic!("expected a syntax error");
    };
    assert_eq!((syntax.line, syntax.column), (1, 12));
    assert_eq!(syntax.message, "unexpected symbol 'c'");
}

#[test]
fn unclosed_blocks_are_closed() {
    let source = "function f() { if (true) {";
    let err = parse(source, &ParserOptions::default()).unwrap_err();
    assert!(err.to_string().contains("missing associated closing brace"));

    let output = parse(source, &limited()).unwrap();
    let Ast::Gml(program) = &output.ast else {
        panic!("expected a GML tree");
    };

    assert_eq!(program.body.len(), 1);
    let NodeKind::FunctionDeclaration { body, .. } = &program.body[0].kind else {
        panic!("expected a function");
    };
    let NodeKind::BlockStatement { body: statements } = &body.kind else {
        panic!("expected a block");
    };
    let NodeKind::IfStatement { consequent, .. } = &statements[0].kind else {
        panic!("expected an if statement");
    };
    assert_eq!(consequent.type_name(), "BlockStatement");

    // Appended braces fall outside the original text.
    assert_eq!(program.end.index, source.len());
    assert_eq!(body.end.index, source.len());
    assert!(output.services.recovery.is_empty());
    assert_eq!(output.stats.recovery, RecoveryPath::ClosingBraces);
}

#[test]
fn control_heads_are_not_argument_lists() {
    let output = parse("if (x) foo(1 2);", &limited()).unwrap();

    let offsets: Vec<usize> = output
        .services
        .recovery
        .iter()
        .map(|insertion| insertion.original_offset)
        .collect();
    assert_eq!(offsets, vec![12]);

    let ast = json_ast(&output);
    let call = &ast["body"][0]["consequent"]["expression"];
    assert_eq!(call["arguments"].as_array().unwrap().len(), 2);
}

#[test]
fn comments_off_skips_the_hidden_pass() {
    let output = parse_with_overrides("x = 1; // note", &json!({ "getComments": false })).unwrap();

    assert_eq!(json_ast(&output)["comments"], json!([]));
    assert_eq!(output.stats.hidden_tokens, None);

    let with_comments = parse("x = 1; // note", &ParserOptions::default()).unwrap();
    assert_eq!(with_comments.stats.hidden_tokens, Some(4));
}

#[test]
fn estree_comments_use_estree_tags() {
    let source = indoc! {"
        // line
        /* block */
        x = 1;
    "};
    let output = parse_with_overrides(source, &json!({ "astFormat": "estree" })).unwrap();
    let ast = json_ast(&output);

    let comment_types: Vec<_> = ast["comments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|comment| comment["type"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(comment_types, vec!["Line", "Block"]);

    let mut tags = Vec::new();
    type_tags(&ast, &mut tags);
    assert!(!tags.iter().any(|tag| tag == "CommentLine" || tag == "CommentBlock"));
}

#[test]
fn locations_point_into_the_original_text() {
    let source = indoc! {r#"
        / @description hello
        show_debug_message("A\Nb" 2);
    "#};
    let output = parse(source, &limited()).unwrap();
    let ast = json_ast(&output);
    let call = &ast["body"][0]["expression"];

    assert_eq!(call["start"], json!({ "index": 21, "line": 2, "column": 0 }));
    assert_eq!(call["arguments"][0]["value"], json!(r#""A\Nb""#));
    assert_eq!(call["arguments"][1]["start"]["index"], json!(47));
    assert_eq!(ast["comments"][0]["start"]["index"], json!(0));
}

#[test]
fn simplified_locations_are_plain_offsets() {
    let output = parse_with_overrides("x = 1;", &json!({ "simplifyLocations": true })).unwrap();
    let ast = json_ast(&output);

    assert_eq!(ast["start"], json!(0));
    assert_eq!(ast["body"][0]["end"], json!(6));
    assert!(ast["body"][0].get("loc").is_none());
}

#[test]
fn no_locations_at_all() {
    let output = parse_with_overrides(
        "x = 1;",
        &json!({ "getLocations": false, "astFormat": "estree" }),
    )
    .unwrap();
    let ast = json_ast(&output);

    assert!(ast.get("range").is_none());
    assert!(ast["body"][0].get("loc").is_none());
    assert!(ast["body"][0].get("start").is_none());
}

#[test]
fn as_json_returns_a_string() {
    let output = parse_with_overrides("x = 1;", &json!({ "asJSON": true })).unwrap();

    let Ast::Json(text) = &output.ast else {
        panic!("expected serialized output");
    };
    let value: Value = serde_json::from_str(text).unwrap();
    assert_eq!(value["type"], json!("Program"));
}

#[test]
fn empty_input_is_an_empty_program() {
    let output = parse("", &ParserOptions::default()).unwrap();
    let ast = json_ast(&output);

    assert_eq!(ast["body"], json!([]));
    assert_eq!(ast["sourceType"], json!("script"));
    assert_eq!(ast["start"]["index"], json!(0));
}

#[test]
fn option_type_errors_are_not_syntax_errors() {
    let err = parse_with_overrides("x = 1;", &json!({ "recovery": true })).unwrap_err();

    assert!(err.is_type_error());
}

#[test]
fn parsing_is_deterministic() {
    let source = indoc! {"
        enum Colour { Red, Green }
        function draw(c) {
            // pick
            return c == Colour.Red ? 1 : 2;
        }
    "};
    let options = ParserOptions::default();

    let first = json_ast(&parse(source, &options).unwrap());
    let second = json_ast(&parse(source, &options).unwrap());

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn visitor_keys_cover_every_emitted_type() {
    let source = indoc! {r#"
        #macro LIMIT 10
        var s = { a: [1, 2], b: $"{LIMIT}" };
        with (obj) { s.a[| 0] += new Vec(1, , 2); }
        try { throw "e" } catch (err) { delete s } finally { exit }
    "#};
    let output = parse(source, &ParserOptions::default()).unwrap();

    let mut tags = Vec::new();
    type_tags(&json_ast(&output), &mut tags);
    for tag in tags {
        assert!(output.visitor_keys.contains_key(tag.as_str()), "{tag}");
    }
}
