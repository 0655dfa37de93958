use super::*;

fn segments(raw: &str) -> Vec<String> {
    match split(raw) {
        Ok(path) => path.segments().map(str::to_owned).collect(),
        Err(e) => panic!("failed to split {raw:?}: {e}"),
    }
}

#[track_caller]
fn split_err(raw: &str) -> Error {
    match split(raw) {
        Ok(path) => panic!("expected {raw:?} to fail, got {path:?}"),
        Err(e) => e,
    }
}

#[test]
fn dotted_and_spaced() {
    assert_eq!(segments("a"), ["a"]);
    assert_eq!(segments("a.b.c"), ["a", "b", "c"]);
    assert_eq!(segments("a b"), ["a", "b"]);
    assert_eq!(segments("a   b"), ["a", "b"]);
    assert_eq!(segments("a.b c"), ["a", "b", "c"]);
    assert_eq!(segments("  a.b  "), ["a", "b"]);
    assert_eq!(segments("sérvice.ünïcode"), ["sérvice", "ünïcode"]);
}

#[test]
fn borrowed_unless_escaped() {
    let path = split("plain.seg").unwrap();
    assert!(path.segments.iter().all(|s| matches!(s, Cow::Borrowed(_))));

    let path = split(r"with\.dot.plain").unwrap();
    assert!(matches!(path.segments[0], Cow::Owned(_)));
    assert!(matches!(path.segments[1], Cow::Borrowed(_)));
}

#[test]
fn bare_escapes() {
    assert_eq!(segments(r"a\.b"), ["a.b"]);
    assert_eq!(segments(r"a\ b.c"), ["a b", "c"]);
    assert_eq!(segments(r#"say\"hi\""#), [r#"say"hi""#]);
    assert_eq!(segments(r"back\\slash"), [r"back\slash"]);
    assert_eq!(segments(r"\[x\]"), ["[x]"]);
    // An escaped space at the end is part of the segment.
    assert_eq!(segments(r"tail\ "), ["tail "]);
}

#[test]
fn quoted_segments() {
    assert_eq!(segments(r#""a.b""#), ["a.b"]);
    assert_eq!(segments(r#""a b".c"#), ["a b", "c"]);
    assert_eq!(segments(r#"x."y z" w"#), ["x", "y z", "w"]);
    assert_eq!(segments(r#""]""#), ["]"]);
    assert_eq!(segments(r#""q\"uote""#), [r#"q"uote"#]);
    assert_eq!(segments(r#""b\\s""#), [r"b\s"]);
}

#[test]
fn empty_headers() {
    assert_eq!(split_err("").kind, ErrorKind::EmptyHeader);
    assert_eq!(split_err("   ").kind, ErrorKind::EmptyHeader);
}

#[test]
fn empty_segments() {
    for raw in ["a..b", ".a", "a.", "a. b", "a .b", r#""""#, r#"a."""#] {
        assert_eq!(split_err(raw).kind, ErrorKind::EmptySegment, "{raw:?}");
    }
}

#[test]
fn malformed_segments() {
    let err = split_err(r#"ab"c"#);
    assert_eq!(err.kind, ErrorKind::Unexpected('"'));
    assert_eq!(err.span, Span::new(2, 3));

    let err = split_err(r#""ab"c"#);
    assert_eq!(err.kind, ErrorKind::Unexpected('c'));
    assert_eq!(err.span, Span::new(4, 5));

    let err = split_err(r#""open"#);
    assert_eq!(err.kind, ErrorKind::UnterminatedQuote);
    assert_eq!(err.span.start, 0);

    let err = split_err(r"a\qb");
    assert_eq!(err.kind, ErrorKind::InvalidEscape('q'));
    assert_eq!(err.span, Span::new(1, 3));

    let err = split_err(r#""a\nb""#);
    assert_eq!(err.kind, ErrorKind::InvalidEscape('n'));

    let err = split_err(r"dangling\");
    assert_eq!(err.kind, ErrorKind::InvalidEscape('\\'));
}

fn escape_bare(segment: &str) -> String {
    let mut out = String::new();
    for c in segment.chars() {
        if matches!(c, '.' | ' ' | '"' | '\\' | '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn escape_quoted(segment: &str) -> String {
    let mut out = String::from("\"");
    for c in segment.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

#[test]
fn random_segments_rejoin() {
    let alphabet: Vec<char> = "abz09_-. \"\\[]é".chars().collect();
    let mut rng = oorandom::Rand32::new(0x1a2b_3c4d);
    for _ in 0..1000 {
        let count = rng.rand_range(1..5) as usize;
        let expected: Vec<String> = (0..count)
            .map(|_| {
                let len = rng.rand_range(1..7) as usize;
                (0..len)
                    .map(|_| alphabet[rng.rand_range(0..alphabet.len() as u32) as usize])
                    .collect()
            })
            .collect();

        let mut raw = String::new();
        for (i, segment) in expected.iter().enumerate() {
            if i > 0 {
                raw.push_str(if rng.rand_range(0..2) == 0 { "." } else { "  " });
            }
            if rng.rand_range(0..2) == 0 {
                raw.push_str(&escape_bare(segment));
            } else {
                raw.push_str(&escape_quoted(segment));
            }
        }
        assert_eq!(segments(&raw), expected, "{raw:?}");
    }
}

#[test]
fn resolve_walks_existing_sections() {
    let mut doc = Document::new().unwrap();
    let a = doc.add_child(SectionId::ROOT, "a", Span::default()).unwrap();
    let b = doc.add_child(a, "b", Span::default()).unwrap();

    assert_eq!(resolve(&doc, &split("a").unwrap()), Some(a));
    assert_eq!(resolve(&doc, &split("a.b").unwrap()), Some(b));
    assert_eq!(resolve(&doc, &split("a b").unwrap()), Some(b));
    assert_eq!(resolve(&doc, &split("a.c").unwrap()), None);
    assert_eq!(resolve(&doc, &split("b").unwrap()), None);
    assert_eq!(resolve(&doc, &SectionPath::default()), Some(SectionId::ROOT));
}

#[test]
fn resolve_or_create_makes_ancestors() {
    let mut doc = Document::new().unwrap();
    let span = Span::new(0, 7);
    let c = resolve_or_create(&mut doc, &split("a.b.c").unwrap(), span).unwrap();
    assert_eq!(doc.section_count(), 3);
    assert_eq!(doc.full_name(c), "a.b.c");

    let names: Vec<String> = doc.sections().map(|s| s.full_name()).collect();
    assert_eq!(names, ["a", "a.b", "a.b.c"]);
    assert!(doc.sections().all(|s| s.span() == span));

    // Same path again creates nothing.
    let again = resolve_or_create(&mut doc, &split("a.b.c").unwrap(), Span::default()).unwrap();
    assert_eq!(again, c);
    assert_eq!(doc.section_count(), 3);

    // Sharing a prefix only creates the new suffix.
    let d = resolve_or_create(&mut doc, &split("a.d").unwrap(), Span::default()).unwrap();
    assert_eq!(doc.section_count(), 4);
    assert_eq!(doc.section(d).parent().map(|p| p.name()), Some("a"));
}

#[test]
fn same_name_under_different_parents() {
    let mut doc = Document::new().unwrap();
    let x = resolve_or_create(&mut doc, &split("x").unwrap(), Span::default()).unwrap();
    let ax = resolve_or_create(&mut doc, &split("a.x").unwrap(), Span::default()).unwrap();
    assert_ne!(x, ax);
    assert_eq!(doc.section_count(), 3);
    assert_eq!(doc.full_name(ax), "a.x");
}
