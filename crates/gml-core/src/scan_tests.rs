use crate::preprocess::append_missing_closing_braces;
use crate::scan::{count_unclosed_braces, mask_comments_and_strings};
use proptest::prelude::*;

#[test]
fn masks_comment_and_string_interiors() {
    let source = "a(\"x y\", 'z') // one two\nb /* c\nd */ e";
    let masked = mask_comments_and_strings(source);

    assert_eq!(masked, "a(\"###\", '#') //########\nb /*##\n##*/ e");
}

#[test]
fn escaped_quotes_stay_inside_the_string() {
    assert_eq!(mask_comments_and_strings(r#""a\"b" c"#), r#####""####" c"#####);
}

#[test]
fn strings_end_at_line_breaks() {
    assert_eq!(mask_comments_and_strings("\"abc\nx y"), "\"###\nx y");
    assert_eq!(mask_comments_and_strings("\"ab\\\nx y"), "\"###\nx y");
}

#[test]
fn verbatim_strings_span_lines() {
    assert_eq!(mask_comments_and_strings("@\"a\\\nb\" c"), "@\"##\n#\" c");
}

#[test]
fn multibyte_content_is_masked_per_byte() {
    let source = "\"é\" x";
    let masked = mask_comments_and_strings(source);

    assert_eq!(masked, "\"##\" x");
    assert_eq!(masked.len(), source.len());
}

#[test]
fn counts_braces_in_code_only() {
    assert_eq!(count_unclosed_braces("{ \"{\" // {\n /* { */ {"), 2);
    assert_eq!(count_unclosed_braces("{ } }"), 0);
    assert_eq!(count_unclosed_braces("} {"), 1);
}

#[test]
fn closing_braces_follow_a_line_break() {
    assert_eq!(
        append_missing_closing_braces("function f() { if (true) {"),
        "function f() { if (true) {\n}\n}\n"
    );
    assert_eq!(append_missing_closing_braces("{ x /* open"), "{ x /* open*/\n}\n");
    assert_eq!(append_missing_closing_braces("{}"), "{}");
}

#[test]
fn appended_braces_reuse_a_trailing_line_break() {
    assert_eq!(append_missing_closing_braces("{\n"), "{\n}\n");
    assert_eq!(append_missing_closing_braces("{\r\n"), "{\r\n}\n");
    assert_eq!(append_missing_closing_braces("{ x // note"), "{ x // note\n}\n");
}

proptest! {
    #[test]
    fn masking_preserves_length(source in "\\PC*") {
        prop_assert_eq!(mask_comments_and_strings(&source).len(), source.len());
    }

    #[test]
    fn masking_preserves_line_breaks(source in "[a-z \"'/*@\\\\\n\r]*") {
        let masked = mask_comments_and_strings(&source);
        let breaks = |text: &str| -> Vec<usize> {
            text.bytes()
                .enumerate()
                .filter(|(_, byte)| *byte == b'\n' || *byte == b'\r')
                .map(|(i, _)| i)
                .collect()
        };
        prop_assert_eq!(breaks(&masked), breaks(&source));
    }

    #[test]
    fn appending_braces_balances_the_text(source in "[a-z {}\"'/*@\\\\\n]*") {
        prop_assert_eq!(count_unclosed_braces(&append_missing_closing_braces(&source)), 0);
    }
}
