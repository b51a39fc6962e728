use ecoguard::error::EcoguardError;

#[test]
fn constructors_format_with_variant_prefix() {
    let cases = [
        (EcoguardError::authentication("bad password"), "Authentication error: bad password"),
        (EcoguardError::transport("timed out"), "Transport error: timed out"),
        (EcoguardError::protocol("no token"), "Protocol error: no token"),
        (EcoguardError::data_format("1,2,3"), "Data format error: 1,2,3"),
        (EcoguardError::config("bad level"), "Configuration error: bad level"),
        (EcoguardError::io("denied"), "I/O error: denied"),
        (EcoguardError::serialization("eof"), "Serialization error: eof"),
    ];
    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }

    let err = EcoguardError::validation("timezone", "Unknown IANA time zone");
    assert_eq!(
        err.to_string(),
        "Validation error: timezone - Unknown IANA time zone"
    );
    assert_eq!(err.message(), "Unknown IANA time zone");
}

#[test]
fn failure_classes() {
    assert!(EcoguardError::authentication("x").is_auth_failure());
    assert!(!EcoguardError::authentication("x").is_retryable());
    assert!(EcoguardError::transport("x").is_retryable());
    assert!(!EcoguardError::protocol("x").is_retryable());
    assert!(!EcoguardError::data_format("x").is_auth_failure());
}

#[test]
fn conversions_pick_matching_variant() {
    let io: EcoguardError = std::io::Error::other("boom").into();
    assert!(matches!(io, EcoguardError::Io { .. }));

    let json: EcoguardError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(json, EcoguardError::Serialization { .. }));

    let date: EcoguardError = chrono::NaiveDate::parse_from_str("2026-13-01", "%Y-%m-%d")
        .unwrap_err()
        .into();
    assert!(matches!(date, EcoguardError::DataFormat { .. }));
}
