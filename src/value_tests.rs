use super::*;

fn infer(raw: &str) -> ValueTypes {
    ValueTypes::infer(raw, &Options::default())
}

fn set(types: &[ValueType]) -> ValueTypes {
    types.iter().copied().collect()
}

#[test]
fn integer_literals() {
    assert_eq!(parse_integer("42"), Some(42));
    assert_eq!(parse_integer("-17"), Some(-17));
    assert_eq!(parse_integer("007"), Some(7));
    assert_eq!(parse_integer("9223372036854775807"), Some(i64::MAX));
    assert_eq!(parse_integer("-9223372036854775808"), Some(i64::MIN));

    for bad in ["", "-", "+5", "1_000", "12a", " 1", "1.0", "9223372036854775808", "--1"] {
        assert_eq!(parse_integer(bad), None, "{bad:?}");
    }
}

#[test]
fn decimal_literals() {
    let cases = [
        ("1.5", 1.5),
        ("-2.25", -2.25),
        ("+3", 3.0),
        ("42", 42.0),
        ("1.", 1.0),
        (".5", 0.5),
        ("1e3", 1000.0),
        ("2.5E-1", 0.25),
        ("-1e+2", -100.0),
    ];
    for (raw, expected) in cases {
        let parsed = parse_decimal(raw).unwrap_or_else(|| panic!("{raw:?} rejected"));
        assert!((parsed - expected).abs() < 1e-12, "{raw:?} -> {parsed}");
    }

    for bad in ["", ".", "-", "e5", "1e", "1e+", "inf", "nan", "infinity", "1.2.3", "1e400", "0x10", "1,5"] {
        assert_eq!(parse_decimal(bad), None, "{bad:?}");
    }
}

#[test]
fn boolean_literals() {
    assert_eq!(parse_bool("true", BooleanCase::Exact), Some(true));
    assert_eq!(parse_bool("false", BooleanCase::Exact), Some(false));
    assert_eq!(parse_bool("True", BooleanCase::Exact), None);
    assert_eq!(parse_bool("yes", BooleanCase::Exact), None);
    assert_eq!(parse_bool("1", BooleanCase::Exact), None);

    assert_eq!(parse_bool("TRUE", BooleanCase::Insensitive), Some(true));
    assert_eq!(parse_bool("fAlSe", BooleanCase::Insensitive), Some(false));
    assert_eq!(parse_bool("truee", BooleanCase::Insensitive), None);
}

#[test]
fn inferred_sets() {
    use ValueType::*;

    assert_eq!(infer("42"), set(&[Integer, Decimal, String]));
    assert_eq!(infer("-42"), set(&[Integer, Decimal, String]));
    assert_eq!(infer("4.2"), set(&[Decimal, String]));
    assert_eq!(infer("99999999999999999999"), set(&[Decimal, String]));
    assert_eq!(infer("true"), set(&[Boolean, String]));
    assert_eq!(infer("[1, 2]"), set(&[Array, String]));
    assert_eq!(infer("hello"), ValueTypes::STRING);
    assert_eq!(infer(""), ValueTypes::STRING);

    let insensitive = Options::default().boolean_case(BooleanCase::Insensitive);
    assert_eq!(
        ValueTypes::infer("FALSE", &insensitive),
        set(&[Boolean, String])
    );
    assert_eq!(infer("FALSE"), ValueTypes::STRING);
}

#[test]
fn string_is_always_present() {
    let mut rng = oorandom::Rand32::new(0x5eed);
    let alphabet: Vec<char> = "0123456789-+.eEtrufals[], \tx€".chars().collect();
    for _ in 0..2000 {
        let len = rng.rand_range(0..8) as usize;
        let raw: std::string::String = (0..len)
            .map(|_| alphabet[rng.rand_range(0..alphabet.len() as u32) as usize])
            .collect();
        let types = infer(&raw);
        assert!(types.contains(ValueType::String), "{raw:?}");
        if types.contains(ValueType::Integer) {
            assert!(types.contains(ValueType::Decimal), "{raw:?}");
        }
    }
}

#[test]
fn set_operations() {
    let mut types = ValueTypes::EMPTY;
    assert!(types.is_empty());
    types.insert(ValueType::Boolean);
    types.insert(ValueType::Boolean);
    types.insert(ValueType::Integer);
    assert_eq!(types.len(), 2);
    assert!(types.contains(ValueType::Integer));
    assert!(!types.contains(ValueType::Array));
    assert_eq!(
        types.iter().collect::<Vec<_>>(),
        vec![ValueType::Integer, ValueType::Boolean]
    );
    assert_eq!(format!("{types:?}"), "{Integer, Boolean}");
}

#[test]
fn array_items() {
    let items: Vec<&str> = ArrayItems::new("[a, b ,\tc]").unwrap().collect();
    assert_eq!(items, ["a", "b", "c"]);

    assert_eq!(ArrayItems::new("[]").unwrap().count(), 0);
    assert_eq!(ArrayItems::new("[  ]").unwrap().count(), 0);

    let items: Vec<&str> = ArrayItems::new("[1,,2,]").unwrap().collect();
    assert_eq!(items, ["1", "", "2", ""]);

    let items: Vec<&str> = ArrayItems::new("[single]").unwrap().collect();
    assert_eq!(items, ["single"]);

    assert!(ArrayItems::new("a, b").is_none());
    assert!(ArrayItems::new("[a, b").is_none());
}

#[test]
fn type_names() {
    assert_eq!(ValueType::Integer.name(), "integer");
    assert_eq!(ValueType::Decimal.name(), "decimal");
    assert_eq!(ValueType::String.name(), "string");
    assert_eq!(ValueType::Boolean.name(), "boolean");
    assert_eq!(ValueType::Array.name(), "array");
}
