//! Property-based tests for the write/read round trip.
//!
//! Documents are built through the public accessors from generated paths,
//! keys, values and comments, then written and read back. Values are read
//! back through the same typed getters a host would use.

use cfgtree::{from_str, from_str_with_options, to_string_at, Document, DocumentOptions, LineEnding};
use chrono::{NaiveDate, NaiveDateTime};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Value {
    Int(i32),
    Bool(bool),
    Text(String),
    List(Vec<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    path: String,
    key: String,
    value: Value,
    comment: Option<String>,
}

fn at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap()
}

fn path() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z][a-z0-9_\n]{0,5}", 1..4).prop_map(|parts| parts.join("."))
}

fn value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i32>().prop_map(Value::Int),
        any::<bool>().prop_map(Value::Bool),
        "[a-zA-Z0-9 ,.#=!\\[\\]\"\\\\\n]{0,20}".prop_map(Value::Text),
        prop::collection::vec("[a-zA-Z0-9 ,\"\\\\]{0,8}", 0..4).prop_map(Value::List),
    ]
}

fn comment() -> impl Strategy<Value = Option<String>> {
    proptest::option::of(prop::collection::vec("[a-zA-Z0-9 #=]{0,16}", 1..3).prop_map(|l| l.join("\n")))
}

fn entry() -> impl Strategy<Value = Entry> {
    (path(), "[a-zA-Z][a-zA-Z0-9 ._\"\n-]{0,8}", value(), comment()).prop_map(
        |(path, key, value, comment)| Entry {
            path,
            key,
            value,
            comment,
        },
    )
}

fn lf() -> DocumentOptions {
    DocumentOptions::new().with_line_ending(LineEnding::Lf)
}

fn build(entries: &[Entry], category_comments: &[(String, String)]) -> Document {
    let mut doc = Document::new(lf());
    apply(&mut doc, entries, category_comments);
    doc
}

fn apply(doc: &mut Document, entries: &[Entry], category_comments: &[(String, String)]) {
    for entry in entries {
        let prop = match &entry.value {
            Value::Int(n) => doc.get_int(&entry.path, &entry.key, *n),
            Value::Bool(b) => doc.get_bool(&entry.path, &entry.key, *b),
            Value::Text(s) => doc.get_string(&entry.path, &entry.key, s),
            Value::List(items) => {
                let items: Vec<&str> = items.iter().map(String::as_str).collect();
                doc.get_list(&entry.path, &entry.key, &items)
            }
        };
        if let Some(comment) = &entry.comment {
            prop.set_comment(comment.clone());
        }
    }
    for (path, comment) in category_comments {
        doc.add_comment(path, comment);
    }
}

proptest! {
    #[test]
    fn prop_round_trip_is_equivalent(
        entries in prop::collection::vec(entry(), 0..12),
        comments in prop::collection::vec((path(), "[a-zA-Z0-9 #=]{0,16}"), 0..4),
    ) {
        let doc = build(&entries, &comments);
        let text = to_string_at(&doc, at());
        let mut back = from_str(&text).unwrap();
        apply(&mut back, &entries, &comments);
        prop_assert!(doc.is_equivalent(&back), "not equivalent after reading:\n{}", text);
    }

    #[test]
    fn prop_output_is_a_fixed_point(entries in prop::collection::vec(entry(), 0..12)) {
        let doc = build(&entries, &[]);
        let text = to_string_at(&doc, at());
        let again = to_string_at(&from_str_with_options(&text, lf()).unwrap(), at());
        prop_assert_eq!(text, again);
    }

    #[test]
    fn prop_category_order_does_not_matter(paths in prop::collection::vec(path(), 1..8)) {
        let mut forward = Document::new(DocumentOptions::default());
        for p in &paths {
            forward.get_int(p, "k", 1);
        }
        let mut backward = Document::new(DocumentOptions::default());
        for p in paths.iter().rev() {
            backward.get_int(p, "k", 1);
        }
        prop_assert_eq!(to_string_at(&forward, at()), to_string_at(&backward, at()));
    }

    #[test]
    fn prop_int_reads_back(n in any::<i32>()) {
        let mut doc = Document::new(DocumentOptions::default());
        doc.get_int("general", "n", n);
        let mut back = from_str(&to_string_at(&doc, at())).unwrap();
        prop_assert_eq!(back.get_int("general", "n", 0).as_int(0), n);
    }
}
