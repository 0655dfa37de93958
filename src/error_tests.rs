use super::*;

#[test]
fn display_all_error_kinds() {
    let cases: Vec<(ErrorKind, &str)> = vec![
        (ErrorKind::InvalidArgument("x"), "invalid-argument"),
        (ErrorKind::FileNotFound("a.ini".into()), "file-not-found"),
        (ErrorKind::Io(std::io::ErrorKind::PermissionDenied), "io"),
        (ErrorKind::UnterminatedHeader, "unterminated-header"),
        (ErrorKind::EmptyHeader, "empty-header"),
        (ErrorKind::EmptySegment, "empty-segment"),
        (ErrorKind::UnterminatedQuote, "unterminated-quote"),
        (ErrorKind::InvalidEscape('z'), "invalid-escape"),
        (ErrorKind::Unexpected('!'), "unexpected"),
        (ErrorKind::TrailingCharacters, "trailing-characters"),
        (ErrorKind::MissingKey, "missing-key"),
        (ErrorKind::MissingEquals, "missing-equals"),
        (ErrorKind::UnterminatedString, "unterminated-string"),
        (ErrorKind::Unsupported("x"), "unsupported"),
        (
            ErrorKind::AllocationFailure { requested: 8 },
            "allocation-failure",
        ),
        (
            ErrorKind::InvalidUtf8(DecodeError::InvalidLead { offset: 0 }),
            "invalid-utf8",
        ),
        (ErrorKind::SectionNotFound("s".into()), "section-not-found"),
        (ErrorKind::KeyNotFound("k".into()), "key-not-found"),
        (
            ErrorKind::TypeMismatch {
                expected: ValueType::Boolean,
            },
            "type-mismatch",
        ),
        (
            ErrorKind::IndexOutOfRange { index: 3, len: 1 },
            "index-out-of-range",
        ),
        (ErrorKind::Internal("x"), "internal"),
    ];

    for (kind, expected) in &cases {
        assert_eq!(
            format!("{kind}"),
            *expected,
            "Display mismatch for {expected}"
        );
        assert_eq!(format!("{kind:?}"), *expected);
    }
}

#[test]
fn error_display_messages() {
    let span = Span::new(0, 1);
    let cases: Vec<(ErrorKind, &str)> = vec![
        (
            ErrorKind::InvalidArgument("query has an empty key"),
            "invalid argument: query has an empty key",
        ),
        (
            ErrorKind::FileNotFound("conf/app.ini".into()),
            "file not found: `conf/app.ini`",
        ),
        (ErrorKind::UnterminatedHeader, "section header not closed"),
        (ErrorKind::EmptyHeader, "empty section header"),
        (ErrorKind::EmptySegment, "empty segment in section path"),
        (ErrorKind::InvalidEscape('\t'), "invalid escape character: `\\t`"),
        (ErrorKind::InvalidEscape('q'), "invalid escape character: `q`"),
        (ErrorKind::Unexpected('\r'), "unexpected character found: `\\r`"),
        (ErrorKind::MissingEquals, "expected `=` after key"),
        (
            ErrorKind::AllocationFailure { requested: 4096 },
            "failed to allocate 4096 bytes",
        ),
        (
            ErrorKind::InvalidUtf8(DecodeError::Truncated { offset: 7 }),
            "invalid utf-8: truncated sequence at offset 7",
        ),
        (
            ErrorKind::SectionNotFound("a.b".into()),
            "section `a.b` does not exist",
        ),
        (ErrorKind::KeyNotFound("port".into()), "key `port` does not exist"),
        (
            ErrorKind::TypeMismatch {
                expected: ValueType::Decimal,
            },
            "value cannot be read as decimal",
        ),
        (
            ErrorKind::IndexOutOfRange { index: 5, len: 2 },
            "index 5 out of range for 2 entries",
        ),
    ];

    for (kind, expected) in cases {
        let error = Error::from((kind, span));
        assert_eq!(format!("{error}"), expected, "mismatch for {expected}");
    }
}

#[test]
fn line_info_is_one_based_in_display() {
    let error = Error {
        kind: ErrorKind::MissingEquals,
        span: Span::new(12, 15),
        line_info: Some((2, 0)),
    };
    assert_eq!(error.to_string(), "expected `=` after key at line 3, column 1");
}

#[test]
fn syntax_and_fatal_groups() {
    assert!(ErrorKind::UnterminatedHeader.is_syntax());
    assert!(ErrorKind::MissingEquals.is_syntax());
    assert!(!ErrorKind::UnterminatedHeader.is_fatal());

    assert!(ErrorKind::AllocationFailure { requested: 1 }.is_fatal());
    assert!(ErrorKind::Internal("x").is_fatal());
    assert!(ErrorKind::InvalidUtf8(DecodeError::InvalidLead { offset: 0 }).is_fatal());

    let query = ErrorKind::KeyNotFound("k".into());
    assert!(!query.is_syntax());
    assert!(!query.is_fatal());
}

#[test]
fn conversions_leave_line_info_empty() {
    let error: Error = ErrorKind::MissingKey.into();
    assert_eq!(error.span, Span::default());
    assert!(error.line_info.is_none());

    let error = Error::from((ErrorKind::MissingKey, Span::new(3, 4)));
    assert_eq!(error.span, Span::new(3, 4));

    let debug = format!("{error:?}");
    assert!(debug.contains("Error"));
    assert!(debug.contains("kind"));
    assert!(debug.contains("span"));
}
