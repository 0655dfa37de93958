#![allow(missing_docs)]

use cini::{Document, Field};
use std::fmt::Write;

/// Path of a file under `data/`.
#[macro_export]
macro_rules! data_path {
    ($name:ident, $ext:literal) => {
        concat!(env!("CARGO_MANIFEST_DIR"), "/data/", stringify!($name), ".", $ext)
    };
}

/// Parses `data/<name>.ini`, which must parse cleanly, and compares the
/// rendered document against `data/<name>.out`.
#[macro_export]
macro_rules! valid {
    ($name:ident) => {
        #[test]
        fn $name() {
            let doc = cini::from_path($crate::data_path!($name, "ini"))
                .unwrap_or_else(|e| panic!("failed to parse {}.ini: {e}", stringify!($name)));
            let expected = std::fs::read_to_string($crate::data_path!($name, "out"))
                .expect(concat!("failed to load ", stringify!($name), ".out"));
            pretty_assertions::assert_eq!($crate::render(&doc), expected);
        }
    };
}

/// Parses `data/<name>.ini`, which must fail with a first error matching
/// `$kind`, and compares the best-effort document plus its diagnostics
/// against `data/<name>.out`.
#[macro_export]
macro_rules! invalid {
    ($name:ident, $kind:pat) => {
        #[test]
        fn $name() {
            let mut doc = cini::Document::new().unwrap();
            let error = doc
                .parse_file($crate::data_path!($name, "ini"))
                .expect_err(concat!(stringify!($name), ".ini should not parse"));
            assert!(
                matches!(error.kind, $kind),
                "unexpected first error: {error}"
            );
            let expected = std::fs::read_to_string($crate::data_path!($name, "out"))
                .expect(concat!("failed to load ", stringify!($name), ".out"));
            pretty_assertions::assert_eq!($crate::render(&doc), expected);
        }
    };
}

/// Renders root fields, then every section header in creation order with its
/// fields, then one `!` line per diagnostic.
pub fn render(doc: &Document) -> String {
    let mut out = String::new();
    for field in doc.root().fields() {
        write_field(&mut out, field);
    }
    for section in doc.sections() {
        let _ = writeln!(out, "[{}]", section.full_name());
        for field in section.fields() {
            write_field(&mut out, field);
        }
    }
    for error in doc.diagnostics() {
        let (line, col) = error.line_info.unwrap_or_default();
        let _ = writeln!(out, "! {} {}:{}", error.kind, line + 1, col + 1);
    }
    out
}

fn write_field(out: &mut String, field: Field<'_>) {
    let _ = writeln!(out, "{} = {:?} {:?}", field.key(), field.value(), field.types());
}
