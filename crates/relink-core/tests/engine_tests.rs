//! Field-level rewrite behavior: classification, structural rewriting,
//! literal fallback and the change gate.

use relink_core::{
    decode, is_encoded, like_pattern, normalize_base_url, process, process_detailed, replace_all,
    rewrite, rewrite_counted, Key, PayloadKind, Value,
};

const OLD: &[u8] = b"https://a.com";
const NEW: &[u8] = b"https://bb.com";

fn text(out: Option<Vec<u8>>) -> String {
    String::from_utf8(out.expect("expected a rewrite")).unwrap()
}

// ============================================================================
// Substring rewriting
// ============================================================================

#[test]
fn replace_all_literal_and_non_overlapping() {
    assert_eq!(replace_all(b"aaaa", b"aa", b"b"), b"bb");
    assert_eq!(replace_all(b"aaa", b"aa", b"b"), b"ba");
}

#[test]
fn replace_all_does_not_rescan_replacement() {
    // The inserted text contains the pattern; it must not be replaced again.
    assert_eq!(replace_all(b"x.com", b"x.com", b"www.x.com"), b"www.x.com");
}

#[test]
fn replace_all_has_no_pattern_syntax() {
    assert_eq!(replace_all(b"a.c abc", b"a.c", b"Z"), b"Z abc");
    assert_eq!(replace_all(b"(.*)", b".*", b"+"), b"(+)");
}

#[test]
fn replace_all_empty_pattern_is_no_op() {
    assert_eq!(replace_all(b"abc", b"", b"X"), b"abc");
    assert_eq!(replace_all(b"", b"", b"X"), b"");
}

// ============================================================================
// Classification
// ============================================================================

#[test]
fn boolean_false_is_encoded() {
    assert!(is_encoded(b"b:0;"));
}

#[test]
fn empty_is_not_encoded() {
    assert!(!is_encoded(b""));
}

#[test]
fn well_formed_payloads_are_encoded() {
    assert!(is_encoded(b"N;"));
    assert!(is_encoded(b"b:1;"));
    assert!(is_encoded(b"i:0;"));
    assert!(is_encoded(b"d:0.5;"));
    assert!(is_encoded(b"a:0:{}"));
    assert!(is_encoded(br#"O:8:"stdClass":0:{}"#));
}

#[test]
fn malformed_payloads_are_not_encoded() {
    assert!(!is_encoded(br#"s:99:"https://a.com";"#));
    assert!(!is_encoded(b"a:1:{"));
    assert!(!is_encoded(b"b:0; "));
    assert!(!is_encoded(b"<p>https://a.com</p>"));
}

// ============================================================================
// Tree rewriting
// ============================================================================

#[test]
fn rewrite_leaves_keys_alone() {
    let tree = Value::Sequence(vec![(Key::from("https://a.com"), Value::from("https://a.com/x"))]);
    assert_eq!(
        rewrite(tree, OLD, NEW),
        Value::Sequence(vec![(
            Key::from("https://a.com"),
            Value::from("https://bb.com/x")
        )])
    );
}

#[test]
fn rewrite_leaves_struct_names_alone() {
    let tree = Value::Struct {
        name: b"https://a.com".to_vec(),
        fields: vec![(b"https://a.com".to_vec(), Value::from("https://a.com"))],
    };
    assert_eq!(
        rewrite(tree, OLD, NEW),
        Value::Struct {
            name: b"https://a.com".to_vec(),
            fields: vec![(b"https://a.com".to_vec(), Value::from("https://bb.com"))],
        }
    );
}

#[test]
fn rewrite_keeps_scalars() {
    for scalar in [
        Value::Null,
        Value::Bool(true),
        Value::Integer(7),
        Value::Float(1.5),
    ] {
        assert_eq!(rewrite(scalar.clone(), OLD, NEW), scalar);
    }
}

#[test]
fn rewrite_counts_across_nested_leaves() {
    let tree = Value::Sequence(vec![
        (Key::Int(0), Value::from("https://a.com https://a.com")),
        (
            Key::Int(1),
            Value::Sequence(vec![(Key::Int(0), Value::from("https://a.com/deep"))]),
        ),
        (Key::Int(2), Value::from("none")),
    ]);
    let (_, count) = rewrite_counted(tree, OLD, NEW);
    assert_eq!(count, 3);
}

#[test]
fn rewrite_handles_deep_trees_without_recursion() {
    let mut tree = Value::from("https://a.com");
    for _ in 0..10_000 {
        tree = Value::Sequence(vec![(Key::Int(0), tree)]);
    }
    let (mut tree, count) = rewrite_counted(tree, OLD, NEW);
    assert_eq!(count, 1);

    // Unwind iteratively so the test itself does not recurse on drop.
    loop {
        match tree {
            Value::Sequence(mut entries) => tree = entries.pop().unwrap().1,
            leaf => {
                assert_eq!(leaf, Value::from("https://bb.com"));
                break;
            }
        }
    }
}

// ============================================================================
// process
// ============================================================================

#[test]
fn worked_example_recomputes_length() {
    let raw = br#"a:1:{s:3:"url";s:15:"https://a.com/x";}"#;
    assert_eq!(
        text(process(raw, OLD, NEW)),
        r#"a:1:{s:3:"url";s:16:"https://bb.com/x";}"#
    );
}

#[test]
fn nested_payload_updates_every_length() {
    let raw = br#"a:2:{s:4:"home";s:13:"https://a.com";s:4:"menu";a:1:{i:0;s:19:"https://a.com/about";}}"#;
    assert_eq!(
        text(process(raw, OLD, NEW)),
        r#"a:2:{s:4:"home";s:14:"https://bb.com";s:4:"menu";a:1:{i:0;s:20:"https://bb.com/about";}}"#
    );
}

#[test]
fn struct_payload_is_rewritten() {
    let raw = br#"O:8:"stdClass":1:{s:4:"link";s:18:"https://a.com/page";}"#;
    assert_eq!(
        text(process(raw, OLD, NEW)),
        r#"O:8:"stdClass":1:{s:4:"link";s:19:"https://bb.com/page";}"#
    );
}

#[test]
fn multibyte_content_uses_byte_lengths() {
    let raw = "a:1:{i:0;s:19:\"https://a.com/café\";}".as_bytes();
    assert_eq!(
        text(process(raw, OLD, NEW)),
        "a:1:{i:0;s:20:\"https://bb.com/café\";}"
    );
}

#[test]
fn plain_text_gets_literal_replacement() {
    let raw = br#"<a href="https://a.com/x">x</a> and https://a.com"#;
    assert_eq!(
        text(process(raw, OLD, NEW)),
        r#"<a href="https://bb.com/x">x</a> and https://bb.com"#
    );
}

#[test]
fn malformed_length_falls_back_to_literal_replace() {
    let raw = br#"a:1:{s:3:"url";s:99:"https://a.com/x";}"#;
    let outcome = process_detailed(raw, OLD, NEW);
    assert_eq!(outcome.kind, PayloadKind::Opaque);
    assert_eq!(
        text(outcome.payload),
        r#"a:1:{s:3:"url";s:99:"https://bb.com/x";}"#
    );
}

#[test]
fn previously_corrupted_payload_is_treated_as_text() {
    // Declares 16 bytes for 15 bytes of content, so it does not decode; the
    // literal replacement happens to make the length right again.
    let raw = br#"a:1:{s:3:"url";s:16:"https://a.com/x";}"#;
    assert!(!is_encoded(raw));
    let out = process(raw, OLD, NEW).unwrap();
    assert_eq!(out, br#"a:1:{s:3:"url";s:16:"https://bb.com/x";}"#.to_vec());
    assert!(decode(&out).is_ok());
}

#[test]
fn key_only_match_is_no_op() {
    let raw = br#"a:1:{s:13:"https://a.com";s:3:"yes";}"#;
    let outcome = process_detailed(raw, OLD, NEW);
    assert_eq!(outcome.kind, PayloadKind::Structured);
    assert_eq!(outcome.replacements, 0);
    assert_eq!(outcome.payload, None);
}

#[test]
fn untouched_non_canonical_payload_is_not_rewritten() {
    // `i:+5;` would re-encode as `i:5;`, but nothing was replaced.
    let raw = br#"a:2:{i:0;i:+5;i:1;s:13:"https://x.org";}"#;
    assert_eq!(process(raw, OLD, NEW), None);
}

#[test]
fn boolean_false_payload_is_unchanged() {
    let outcome = process_detailed(b"b:0;", OLD, NEW);
    assert_eq!(outcome.kind, PayloadKind::Structured);
    assert_eq!(outcome.payload, None);
}

#[test]
fn empty_raw_is_skipped() {
    assert_eq!(process(b"", OLD, NEW), None);
}

#[test]
fn no_occurrence_is_no_op() {
    assert_eq!(process(b"nothing to see", OLD, NEW), None);
    assert_eq!(process(br#"s:5:"hello";"#, OLD, NEW), None);
}

#[test]
fn empty_old_is_no_op() {
    assert_eq!(process(b"https://a.com", b"", NEW), None);
    assert_eq!(process(br#"s:5:"hello";"#, b"", NEW), None);
}

#[test]
fn identical_urls_produce_no_write() {
    assert_eq!(process(br#"s:13:"https://a.com";"#, OLD, OLD), None);
    assert_eq!(process(b"https://a.com", OLD, OLD), None);
}

#[test]
fn outcome_counts_replacements() {
    let outcome = process_detailed(b"https://a.com https://a.com/y", OLD, NEW);
    assert_eq!(outcome.kind, PayloadKind::Opaque);
    assert_eq!(outcome.replacements, 2);
    assert!(outcome.is_changed());
}

// ============================================================================
// URL helpers
// ============================================================================

#[test]
fn normalize_trims_trailing_slashes_only() {
    assert_eq!(normalize_base_url("https://a.com/"), "https://a.com");
    assert_eq!(normalize_base_url("https://a.com///"), "https://a.com");
    assert_eq!(normalize_base_url("https://a.com/wp"), "https://a.com/wp");
    assert_eq!(normalize_base_url("HTTPS://A.COM"), "HTTPS://A.COM");
}

#[test]
fn like_pattern_escapes_metacharacters() {
    assert_eq!(like_pattern("https://a.com"), "%https://a.com%");
    assert_eq!(like_pattern("https://a_b.com"), r"%https://a\_b.com%");
    assert_eq!(like_pattern(r"50%\off"), r"%50\%\\off%");
}
