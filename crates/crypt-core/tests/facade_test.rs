//! String boundary used by the web UI: default KDF cost, sentinel errors.

use crypt_core::facade::{
    decrypt, encrypt, get_algorithm, get_num_algorithms, header_prefix, header_suffix,
    is_encrypted, is_error,
};

const VAULT: &str = r#"{"k":"v"}"#;

#[test]
fn correct_horse_scenario() {
    let text = encrypt("crypt-aes-256-gcm", "correct horse", VAULT);
    assert!(!is_error(&text), "{text}");
    assert!(is_encrypted(&text));
    assert!(text.starts_with(&header_prefix("crypt-aes-256-gcm")));
    assert!(text.trim_end().ends_with(&header_suffix("crypt-aes-256-gcm")));

    assert_eq!(decrypt("crypt-aes-256-gcm", "correct horse", &text), VAULT);

    let wrong = decrypt("crypt-aes-256-gcm", "wrong horse", &text);
    assert!(wrong.starts_with("error:decrypt:authentication-failure:"), "{wrong}");
}

#[test]
fn every_listed_algorithm_roundtrips() {
    for i in 0..get_num_algorithms() {
        let algorithm = get_algorithm(i);
        let text = encrypt(&algorithm, "secret", "Lorem ipsum dolor sit amet");
        // hint deliberately points at another suite
        let hint = get_algorithm((i + 1) % get_num_algorithms());
        assert_eq!(decrypt(&hint, "secret", &text), "Lorem ipsum dolor sit amet");
    }
}

#[test]
fn garbage_is_malformed_not_auth_failure() {
    let result = decrypt("crypt-aes-256-gcm", "secret", "not encrypted at all");
    assert!(result.starts_with("error:decrypt:malformed-envelope:"), "{result}");
}

#[test]
fn unknown_algorithm_on_encrypt() {
    let result = encrypt("crypt-aes-128-ecb", "secret", VAULT);
    assert!(result.starts_with("error:encrypt:unknown-algorithm:"), "{result}");
}
