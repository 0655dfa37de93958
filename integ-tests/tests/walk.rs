use std::fs;

#[test]
fn parse_all_data_files() {
    let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/data");
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().is_some_and(|e| e == "ini") {
            let mut doc = cini::Document::new().unwrap();
            // Invalid files are expected; only the bookkeeping is checked.
            let result = doc.parse_file(&path);
            assert_eq!(result.is_err(), !doc.diagnostics().is_empty(), "{}", path.display());
        }
    }
}

#[test]
fn queries_over_data_files() {
    let doc = cini::from_path(concat!(env!("CARGO_MANIFEST_DIR"), "/data/basic.ini")).unwrap();
    assert_eq!(doc.get_text("name").unwrap(), "demo app");
    assert_eq!(doc.get_int("version").unwrap(), 3);
    assert_eq!(doc.get_int("server:port").unwrap(), 8080);
    assert_eq!(doc.get_decimal("server:ratio").unwrap(), -0.5);
    assert!(!doc.get_bool("server:debug").unwrap());
    assert_eq!(doc.get_array("server:tags").unwrap().count(), 3);
    assert_eq!(doc.count_sections(None).unwrap(), 1);

    let doc =
        cini::from_path(concat!(env!("CARGO_MANIFEST_DIR"), "/data/nested_paths.ini")).unwrap();
    assert_eq!(doc.count_sections(Some("a.b")).unwrap(), 2);
    assert_eq!(doc.section_name(Some("a b"), 1).unwrap(), "a.b.d");
    assert_eq!(doc.get_int("a.b.c:deep").unwrap(), 1);
}

#[test]
fn missing_file() {
    let err = cini::from_path("/definitely/not/here.ini").unwrap_err();
    assert!(matches!(err.kind, cini::ErrorKind::FileNotFound(_)));
    assert!(err.to_string().contains("not/here.ini"));
}
