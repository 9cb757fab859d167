//! Checks of the exact on-disk text, independent of the in-memory API.

use cfgtree::{
    from_str, from_str_with_options, to_string_at, Document, DocumentOptions, Error, LineEnding,
    PropertyKind,
};
use chrono::{NaiveDate, NaiveDateTime};

fn at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap()
}

fn lf() -> DocumentOptions {
    DocumentOptions::new().with_line_ending(LineEnding::Lf)
}

fn body(doc: &Document) -> String {
    let text = to_string_at(doc, at());
    let header = "# Configuration file\n# Generated on 2024-01-15 10:30:00\n\n";
    assert!(text.starts_with(header), "missing header in:\n{}", text);
    text[header.len()..].to_string()
}

#[test]
fn test_empty_document_is_only_header() {
    let doc = Document::new(lf());
    assert_eq!(body(&doc), "");
}

#[test]
fn test_category_banner_and_properties() {
    let mut doc = Document::new(lf());
    doc.get_string("general", "motd", "Hello, world");
    doc.get_list("general", "admins", &["alice", "bob"]);
    doc.get_list("general", "empty", &[]);

    assert_eq!(
        body(&doc),
        "\
####################
# general
####################

general {
   motd=Hello, world
   admins=[\"alice\", \"bob\"]
   empty=[]
}

"
    );
}

#[test]
fn test_multi_line_comments() {
    let mut doc = Document::new(lf());
    doc.get_int("general", "port", 1)
        .set_comment("first\r\nsecond");
    doc.add_comment("general", "one\ntwo");

    assert_eq!(
        body(&doc),
        "\
####################
# general
#===================
# one
# two
####################

general {
   # first
   # second
   port=1
}

"
    );
}

#[test]
fn test_quoted_names_in_output() {
    let mut doc = Document::new(lf());
    doc.get_int("my category", "a key", 1);
    doc.get_int("", "k", 2);

    let text = body(&doc);
    assert!(text.contains("\"\" {\n   k=2\n}\n"));
    assert!(text.contains("\"my category\" {\n   \"a key\"=1\n}\n"));
    assert!(text.find("\"\" {").unwrap() < text.find("\"my category\" {").unwrap());

    let back = from_str(&to_string_at(&doc, at())).unwrap();
    assert!(back.has_category("my category"));
    assert!(back.has_category(""));
    assert!(doc.is_equivalent(&back));
}

#[test]
fn test_children_sorted_and_indented() {
    let mut doc = Document::new(lf());
    doc.get_int("root.zulu", "z", 1);
    doc.get_int("root.alpha.deep", "d", 2);

    assert_eq!(
        body(&doc),
        "\
####################
# root
####################

root {
   ####################
   # alpha
   ####################

   alpha {
      ####################
      # deep
      ####################

      deep {
         d=2
      }

   }

   ####################
   # zulu
   ####################

   zulu {
      z=1
   }

}

"
    );
}

#[test]
fn test_embedded_blocks() {
    let mut alpha = Document::new(lf());
    alpha.get_int("a", "x", 1);
    let mut doc = Document::new(lf());
    doc.insert_child("alpha", alpha).unwrap();

    assert_eq!(
        body(&doc),
        "\
START: \"alpha\"
####################
# a
####################

a {
   x=1
}

END: \"alpha\"

"
    );
}

#[test]
fn test_reading_hand_written_files() {
    let text = "\
# hand written, no banners
server { port=1 }
}
server.limits {
    # max players
    players = 20
}
\"odd name\" {
}
";
    let doc = from_str(text).unwrap();
    assert_eq!(
        doc.property("server", "port").unwrap().unwrap().to_raw(),
        "1 }"
    );
    let players = doc.property("server.limits", "players ").unwrap();
    assert!(players.is_none());
    let players = doc.property("server.limits", "players").unwrap().unwrap();
    assert_eq!(players.to_raw(), " 20");
    assert_eq!(players.comment(), Some("max players"));
    assert_eq!(
        doc.category("server").unwrap().comment(),
        Some("hand written, no banners")
    );
    assert!(doc.has_category("odd name"));
}

#[test]
fn test_reading_rejects_bad_input() {
    assert_eq!(
        from_str("a {\n}\n}\n").unwrap_err(),
        Error::UnbalancedClose { line: 3 }
    );
    assert_eq!(
        from_str("a {\n  b {\n  }\n").unwrap_err(),
        Error::UnclosedCategory {
            line: 1,
            name: "a".into()
        }
    );
    assert_eq!(
        from_str("a {\n  k@=1\n}\n").unwrap_err(),
        Error::UnknownCharacter { line: 2, ch: '@' }
    );
    assert!(matches!(
        from_str("START: \"a\"\nSTART: \"b\"\n").unwrap_err(),
        Error::Document { line: 2, .. }
    ));
    assert!(matches!(
        from_str("END: \"a\"\n").unwrap_err(),
        Error::Document { line: 1, .. }
    ));
}

#[test]
fn test_crlf_output_parses_back() {
    let mut doc = Document::new(DocumentOptions::default());
    doc.get_int("a.b", "k", 1).set_comment("c");
    doc.add_comment("a", "top");
    let text = to_string_at(&doc, at());
    assert!(text.contains("a {\r\n"));
    let back = from_str(&text).unwrap();
    assert!(doc.is_equivalent(&back));
}

#[test]
fn test_line_breaks_in_values_do_not_break_the_file() {
    let mut doc = Document::new(lf());
    doc.get_string("motd", "text", "hello\n}");
    doc.get_string("motd", "two", "line1\r\nline2");
    doc.get_list("motd", "list", &["a\nb"]);

    let text = to_string_at(&doc, at());
    assert!(text.contains("   text=hello }\n"));
    let mut back = from_str(&text).unwrap();
    assert_eq!(back.get_string("motd", "text", "").as_str(), Some("hello }"));
    assert_eq!(back.get_string("motd", "two", "").as_str(), Some("line1  line2"));
    assert_eq!(back.get_list("motd", "list", &[]).as_list(), vec!["a\nb"]);
    assert!(doc.is_equivalent(&back));
}

#[test]
fn test_strings_that_look_like_lists_stay_strings() {
    let mut doc = Document::new(lf());
    doc.get_string("c", "empty", "[]");
    doc.get_string("c", "tight", "[\"a\",\"b\"]");

    let mut back = from_str(&to_string_at(&doc, at())).unwrap();
    let empty = back.get_string("c", "empty", "x");
    assert_eq!(empty.kind(), PropertyKind::String);
    assert_eq!(empty.as_str(), Some("[]"));
    assert_eq!(back.get_string("c", "tight", "x").as_str(), Some("[\"a\",\"b\"]"));
    assert!(doc.is_equivalent(&back));
}

#[test]
fn test_hand_edited_category_case_is_folded() {
    let mut doc = from_str_with_options("General {\n   port=1234\n}\n", lf()).unwrap();
    assert!(doc.has_category("General"));
    assert_eq!(doc.get_int("General", "port", 80).as_int(0), 1234);
    assert_eq!(doc.categories().len(), 1);

    let text = body(&doc);
    assert!(text.contains("general {\n   port=1234\n}\n"));
    assert!(!text.contains("General"));
}

#[test]
fn test_rule_only_property_comment_reads_back() {
    let mut doc = Document::new(lf());
    doc.get_int("a", "k", 1).set_comment("####");
    doc.get_int("a", "j", 2).set_comment("note\n####");
    doc.add_comment("a", "####\n=====");

    let back = from_str(&to_string_at(&doc, at())).unwrap();
    assert_eq!(back.property("a", "k").unwrap().unwrap().comment(), Some("####"));
    assert_eq!(back.property("a", "j").unwrap().unwrap().comment(), Some("note\n####"));
    assert_eq!(back.category("a").unwrap().comment(), Some("####\n====="));
}

#[test]
fn test_quote_after_name_start_is_part_of_the_name() {
    let mut doc = from_str_with_options("c {\n   \"a\" \"b\"=2\n}\n", lf()).unwrap();
    assert_eq!(doc.has_key("c", "a' 'b"), Ok(true));
    assert_eq!(doc.get_int("c", "a\" \"b", 0).as_int(0), 2);
    assert!(body(&doc).contains("   \"a' 'b\"=2\n"));
}
