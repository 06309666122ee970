use ispgate_crypto::{PasswordPolicy, PolicyViolation, MAX_PASSWORD_LEN, MIN_PASSWORD_LEN};

fn policy() -> PasswordPolicy {
    PasswordPolicy::default()
}

#[test]
fn accepts_compliant_password() {
    assert_eq!(policy().validate("short1A!"), Ok(()));
    assert_eq!(policy().validate("Correct-Horse-Battery-9"), Ok(()));
}

#[test]
fn truncated_example_is_too_short() {
    let truncated: String = "short1A!".chars().take(7).collect();
    assert_eq!(
        policy().validate(&truncated),
        Err(PolicyViolation::TooShort {
            min: MIN_PASSWORD_LEN
        })
    );
}

#[test]
fn rejects_overlong_password() {
    let long = format!("Aa1!{}", "x".repeat(MAX_PASSWORD_LEN));
    assert_eq!(
        policy().validate(&long),
        Err(PolicyViolation::TooLong {
            max: MAX_PASSWORD_LEN
        })
    );
}

#[test]
fn boundary_lengths_are_accepted() {
    let min = format!("Aa1!{}", "b".repeat(MIN_PASSWORD_LEN - 4));
    let max = format!("Aa1!{}", "b".repeat(MAX_PASSWORD_LEN - 4));
    assert_eq!(policy().validate(&min), Ok(()));
    assert_eq!(policy().validate(&max), Ok(()));
}

#[test]
fn length_counts_characters_not_bytes() {
    // Seven characters, more than eight bytes.
    assert!(matches!(
        policy().validate("Ää1!ööö"),
        Err(PolicyViolation::TooShort { .. })
    ));
}

#[test]
fn reports_first_violation_in_fixed_order() {
    // Fails every class rule; uppercase comes first.
    assert_eq!(
        policy().validate("        "),
        Err(PolicyViolation::MissingUppercase)
    );
    assert_eq!(
        policy().validate("ABCDEFGH"),
        Err(PolicyViolation::MissingLowercase)
    );
    assert_eq!(
        policy().validate("ABCDefgh"),
        Err(PolicyViolation::MissingDigit)
    );
    assert_eq!(
        policy().validate("ABCDefg1"),
        Err(PolicyViolation::MissingSymbol)
    );
}

#[test]
fn invisible_characters_are_not_symbols() {
    for filler in ['\u{0301}', '\u{200B}', '\u{FEFF}', '\u{FE0F}', '\u{E000}'] {
        let password = format!("Abcdefg1{filler}");
        assert_eq!(
            policy().validate(&password),
            Err(PolicyViolation::MissingSymbol),
            "{filler:?} counted as a symbol"
        );
    }
}

#[test]
fn visible_non_ascii_symbols_count() {
    for symbol in ['€', '§', '«', '→', '¿'] {
        let password = format!("Abcdefg1{symbol}");
        assert_eq!(policy().validate(&password), Ok(()), "{symbol:?} rejected");
    }
}

#[test]
fn short_password_reports_length_before_classes() {
    assert!(matches!(
        policy().validate("abc"),
        Err(PolicyViolation::TooShort { .. })
    ));
}

#[test]
fn violation_messages_are_stable() {
    assert_eq!(
        PolicyViolation::TooShort { min: 8 }.to_string(),
        "password must be at least 8 characters long"
    );
    assert_eq!(
        PolicyViolation::TooLong { max: 128 }.to_string(),
        "password must not exceed 128 characters"
    );
    assert_eq!(
        PolicyViolation::MissingSymbol.to_string(),
        "password must contain at least one special character"
    );
}

#[test]
fn custom_bounds_apply() {
    let strict = PasswordPolicy {
        min_len: 12,
        max_len: 16,
    };
    assert_eq!(
        strict.validate("Short1!aaaa"),
        Err(PolicyViolation::TooShort { min: 12 })
    );
    assert_eq!(strict.validate("Longer1!aaaa"), Ok(()));
}
