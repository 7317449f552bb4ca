use backend_lib::validation::{
    normalize_email, validate_password, PasswordRequirements, ValidationError,
};

#[test]
fn test_email_normalization() {
    assert_eq!(normalize_email("a@x.com").unwrap(), "a@x.com");
    assert_eq!(normalize_email("  Alice@Example.COM ").unwrap(), "alice@example.com");
    assert_eq!(normalize_email("first.last+tag@mail.example.org").unwrap(), "first.last+tag@mail.example.org");
}

#[test]
fn test_invalid_emails() {
    for email in ["", "   ", "plainaddress", "@x.com", "a@", "a@x", "a b@x.com", "a@x.c"] {
        assert!(
            matches!(normalize_email(email), Err(ValidationError::InvalidEmail(_))),
            "email {email:?}"
        );
    }

    let long = format!("{}@x.com", "a".repeat(250));
    assert!(normalize_email(&long).is_err());
}

#[test]
fn test_password_strength_validation() {
    let requirements = PasswordRequirements::default();

    assert!(validate_password("Secret123", &requirements).is_ok());
    assert!(validate_password("Short1a", &requirements).is_err());
    assert!(validate_password("secret123", &requirements).is_err());
    assert!(validate_password("SECRET123", &requirements).is_err());
    assert!(validate_password("SecretPass", &requirements).is_err());
    assert!(validate_password(&"Aa1".repeat(50), &requirements).is_err());
}

#[test]
fn test_password_error_lists_missing_classes() {
    let err = validate_password("alllowercase", &PasswordRequirements::default()).unwrap_err();
    let ValidationError::InvalidPassword(message) = err else {
        panic!("expected InvalidPassword, got {err:?}");
    };
    assert!(message.contains("uppercase"));
    assert!(message.contains("digit"));
    assert!(!message.contains("lowercase"));
}

#[test]
fn test_custom_requirements() {
    let relaxed = PasswordRequirements {
        min_length: 4,
        require_uppercase: false,
        require_lowercase: false,
        require_digit: false,
        require_special: false,
    };
    assert!(validate_password("abcd", &relaxed).is_ok());

    let strict = PasswordRequirements {
        require_special: true,
        ..PasswordRequirements::default()
    };
    assert!(validate_password("Secret123", &strict).is_err());
    assert!(validate_password("Secret123!", &strict).is_ok());
}
