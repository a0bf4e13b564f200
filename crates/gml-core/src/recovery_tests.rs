use crate::recovery::{map_recovered_index_to_original, project, InsertionKind, RecoveryInsertion};
use gml_grammar::tokenize_and_parse;
use proptest::prelude::*;

fn separator(original_offset: usize, recovered_offset: usize) -> RecoveryInsertion {
    RecoveryInsertion {
        kind: InsertionKind::InsertedArgumentSeparator,
        recovered_offset,
        original_offset,
        inserted_text: ",".to_string(),
    }
}

#[test]
fn inserts_a_separator_between_call_arguments() {
    let projection = project("foo(1 2)");

    assert_eq!(projection.patched_text, "foo(1, 2)");
    assert_eq!(projection.insertions, vec![separator(5, 5)]);
}

#[test]
fn recovered_offsets_account_for_earlier_insertions() {
    let projection = project("foo(1 2 3)");

    assert_eq!(projection.patched_text, "foo(1, 2, 3)");
    assert_eq!(projection.insertions, vec![separator(5, 5), separator(7, 8)]);
}

#[test]
fn separates_strings_nested_calls_and_line_breaks() {
    assert_eq!(project(r#"foo("a" "b")"#).patched_text, r#"foo("a", "b")"#);
    assert_eq!(project("foo(bar(x) 1)").patched_text, "foo(bar(x), 1)");
    assert_eq!(project("foo(a[1] b)").patched_text, "foo(a[1], b)");
    assert_eq!(project("foo(1\n    2)").patched_text, "foo(1,\n    2)");
}

#[test]
fn leaves_control_heads_and_declarations_alone() {
    assert!(project("if (a b) {}").is_empty());
    assert!(project("while (a b) {}").is_empty());
    assert!(project("function f(a b) {}").is_empty());
    assert!(project("x = (a b);").is_empty());
}

#[test]
fn leaves_gaps_outside_argument_lists_alone() {
    assert!(project("foo(x) bar(y)").is_empty());
    assert!(project("foo([1 2])").is_empty());
    assert!(project("var a = 1\nvar b = 2").is_empty());
}

#[test]
fn word_operators_are_treated_like_any_other_word() {
    let projection = project("foo(a and b c)");

    assert_eq!(projection.patched_text, "foo(a, and, b, c)");
    assert_eq!(
        projection.insertions,
        vec![separator(5, 5), separator(9, 10), separator(11, 13)]
    );
}

#[test]
fn gaps_inside_comments_and_strings_are_ignored() {
    assert!(project("foo(\"a b\")").is_empty());
    assert!(project("foo(a) // bar(1 2)").is_empty());
    assert!(project("foo(a) /* bar(1 2) */").is_empty());
}

#[test]
fn patched_text_parses() {
    let source = "draw_text(x y \"hello\")";
    let projection = project(source);

    assert!(tokenize_and_parse(source).is_err());
    assert_eq!(projection.insertions.len(), 2);
    assert!(tokenize_and_parse(&projection.patched_text).is_ok());
}

#[test]
fn maps_recovered_indices_back() {
    let insertions = vec![separator(5, 5), separator(7, 8)];

    assert_eq!(map_recovered_index_to_original(0, &insertions), 0);
    assert_eq!(map_recovered_index_to_original(5, &insertions), 5);
    assert_eq!(map_recovered_index_to_original(6, &insertions), 5);
    assert_eq!(map_recovered_index_to_original(9, &insertions), 7);
    assert_eq!(map_recovered_index_to_original(12, &insertions), 10);
    assert_eq!(map_recovered_index_to_original(3, &[]), 3);
}

proptest! {
    #[test]
    fn every_kept_character_maps_back_to_itself(source in "[a-z0-9 ()\\[\\]\"\n]{0,40}") {
        let projection = project(&source);
        let recovered: Vec<usize> = projection
            .insertions
            .iter()
            .map(|insertion| insertion.recovered_offset)
            .collect();

        prop_assert_eq!(projection.patched_text.len(), source.len() + recovered.len());
        for (i, byte) in projection.patched_text.bytes().enumerate() {
            if recovered.contains(&i) {
                prop_assert_eq!(byte, b',');
                continue;
            }
            let original = map_recovered_index_to_original(i, &projection.insertions);
            prop_assert_eq!(source.as_bytes()[original], byte);
        }
    }

    #[test]
    fn projecting_a_patched_text_adds_nothing(source in "[a-z0-9 ()\"]{0,40}") {
        let projection = project(&source);
        prop_assert!(project(&projection.patched_text).is_empty());
    }
}
