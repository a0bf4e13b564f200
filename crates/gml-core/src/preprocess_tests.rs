use crate::preprocess::{
    fix_malformed_comments, is_missing_brace_error, normalize_escape_case,
    recover_source_from_missing_brace, IndexMapper, Shift,
};
use gml_grammar::parser::MISSING_CLOSING_BRACE;
use gml_grammar::{tokenize_and_parse, RecognitionError};
use indoc::indoc;
use proptest::prelude::*;

#[test]
fn lowercases_escape_letters_in_strings() {
    assert_eq!(normalize_escape_case(r#"s = "a\Nb\T";"#), r#"s = "a\nb\t";"#);
    assert_eq!(normalize_escape_case(r#"s = 'x\U00e9';"#), r#"s = 'x\u00e9';"#);
}

#[test]
fn leaves_verbatim_strings_and_comments_alone() {
    let source = indoc! {r#"
        a = @"C:\New\Test";
        // \N stays
        b = "\\N";
    "#};

    assert_eq!(normalize_escape_case(source), source);
}

#[test]
fn escape_normalization_lets_the_engine_accept_uppercase_escapes() {
    let source = r#"show_debug_message("line\Nbreak");"#;

    assert!(tokenize_and_parse(source).is_err());
    assert!(tokenize_and_parse(&normalize_escape_case(source)).is_ok());
}

#[test]
fn repairs_single_slash_doc_comments() {
    let fix = fix_malformed_comments("/ @param x\nfoo();");

    assert_eq!(fix.text, "// @param x\nfoo();");
    assert_eq!(fix.index_mapper.shifts(), &[Shift { at: 1, len: 1 }]);
    assert_eq!(fix.index_mapper.map(0), 0);
    assert_eq!(fix.index_mapper.map(2), 1);
    assert_eq!(fix.index_mapper.map(fix.text.len()), 17);
}

#[test]
fn repairs_indented_markers_on_every_line() {
    let fix = fix_malformed_comments("/ @a\n  / @b");

    assert_eq!(fix.text, "// @a\n  // @b");
    assert_eq!(fix.index_mapper.shifts().len(), 2);
    // The space after the second marker.
    assert_eq!(fix.index_mapper.map(10), 8);
}

#[test]
fn division_is_not_a_comment_marker() {
    let fix = fix_malformed_comments("a = b / @c;");

    assert_eq!(fix.text, "a = b / @c;");
    assert!(fix.index_mapper.is_identity());
}

#[test]
fn identity_mapper_maps_to_itself() {
    let mapper = IndexMapper::identity();

    assert_eq!(mapper.map(0), 0);
    assert_eq!(mapper.map(42), 42);
}

#[test]
fn recognizes_the_missing_brace_error_case_insensitively() {
    assert!(is_missing_brace_error(&RecognitionError::at(MISSING_CLOSING_BRACE, 1, 0)));
    assert!(is_missing_brace_error(&RecognitionError::at(
        "Missing Associated Closing Brace",
        1,
        0
    )));
    assert!(!is_missing_brace_error(&RecognitionError::at("unexpected symbol '2'", 1, 6)));
}

#[test]
fn brace_recovery_appends_one_line_per_open_block() {
    let source = indoc! {"
        function f() {
            if (x) {
                y = 1;
    "};
    let error = tokenize_and_parse(source).unwrap_err();
    let patched = recover_source_from_missing_brace(source, &error).unwrap();

    assert_eq!(patched, format!("{source}}}\n}}\n"));
    assert!(tokenize_and_parse(&patched).is_ok());
}

#[test]
fn brace_recovery_declines_unrelated_errors() {
    let error = RecognitionError::at("unexpected symbol ')'", 1, 3);

    assert_eq!(recover_source_from_missing_brace("{ a )", &error), None);
}

#[test]
fn brace_recovery_declines_balanced_text() {
    let error = RecognitionError::at(MISSING_CLOSING_BRACE, 1, 0);

    assert_eq!(recover_source_from_missing_brace("{ }", &error), None);
}

proptest! {
    #[test]
    fn escape_normalization_preserves_length(source in "[a-zA-Z \"'@\\\\\n]*") {
        let normalized = normalize_escape_case(&source);
        prop_assert_eq!(normalized.len(), source.len());
        prop_assert_eq!(normalized.matches('\n').count(), source.matches('\n').count());
    }

    #[test]
    fn comment_fix_maps_back_onto_the_same_characters(
        lines in prop::collection::vec("( *)(/ @)?[a-z ]{0,6}", 0..6)
    ) {
        let source = lines.join("\n");
        let fix = fix_malformed_comments(&source);
        let inserted: usize = fix.index_mapper.shifts().iter().map(|shift| shift.len).sum();
        prop_assert_eq!(fix.text.len(), source.len() + inserted);

        let shifted: Vec<usize> = fix.index_mapper.shifts().iter().map(|shift| shift.at).collect();
        for (i, byte) in fix.text.bytes().enumerate() {
            if shifted.contains(&i) {
                continue;
            }
            prop_assert_eq!(source.as_bytes()[fix.index_mapper.map(i)], byte);
        }
    }
}
