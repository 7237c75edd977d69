//! Unit tests for session configuration parsing.

use std::collections::HashMap;

use mockable::MockEnv;
use rstest::{fixture, rstest};

use super::*;
use crate::test_support::TempKeyFile;

fn mock_env(vars: HashMap<&'static str, String>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).cloned());
    env
}

#[fixture]
fn release_key() -> TempKeyFile {
    TempKeyFile::new(SESSION_KEY_MIN_LEN).expect("key file")
}

fn release_vars(key: &TempKeyFile) -> HashMap<&'static str, String> {
    HashMap::from([
        (KEY_FILE_ENV, key.path_str()),
        (COOKIE_SECURE_ENV, "1".to_owned()),
        (SAMESITE_ENV, "Strict".to_owned()),
        (ALLOW_EPHEMERAL_ENV, "0".to_owned()),
    ])
}

fn expect_error(result: Result<SessionSettings, SessionConfigError>) -> SessionConfigError {
    match result {
        Ok(_) => panic!("expected configuration to be rejected"),
        Err(err) => err,
    }
}

#[rstest]
fn release_accepts_complete_configuration(release_key: TempKeyFile) {
    let env = mock_env(release_vars(&release_key));

    let settings = session_settings_from_env(&env, BuildMode::Release).expect("valid settings");

    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Strict);
    assert_eq!(settings.key_fingerprint().len(), 16);
}

#[rstest]
#[case(COOKIE_SECURE_ENV)]
#[case(SAMESITE_ENV)]
#[case(ALLOW_EPHEMERAL_ENV)]
fn release_requires_every_toggle(release_key: TempKeyFile, #[case] missing: &'static str) {
    let mut vars = release_vars(&release_key);
    vars.remove(missing);

    let err = expect_error(session_settings_from_env(&mock_env(vars), BuildMode::Release));

    assert!(matches!(err, SessionConfigError::MissingEnv { name } if name == missing));
}

#[rstest]
#[case(COOKIE_SECURE_ENV, "maybe")]
#[case(SAMESITE_ENV, "sometimes")]
#[case(ALLOW_EPHEMERAL_ENV, "")]
fn release_rejects_invalid_values(
    release_key: TempKeyFile,
    #[case] name: &'static str,
    #[case] value: &str,
) {
    let mut vars = release_vars(&release_key);
    vars.insert(name, value.to_owned());

    let err = expect_error(session_settings_from_env(&mock_env(vars), BuildMode::Release));

    assert!(matches!(err, SessionConfigError::InvalidEnv { name: rejected, .. } if rejected == name));
}

#[rstest]
fn release_rejects_same_site_none_without_secure(release_key: TempKeyFile) {
    let mut vars = release_vars(&release_key);
    vars.insert(COOKIE_SECURE_ENV, "0".to_owned());
    vars.insert(SAMESITE_ENV, "None".to_owned());

    let err = expect_error(session_settings_from_env(&mock_env(vars), BuildMode::Release));

    assert!(matches!(err, SessionConfigError::InsecureSameSiteNone));
}

#[rstest]
fn release_rejects_ephemeral_keys(release_key: TempKeyFile) {
    let mut vars = release_vars(&release_key);
    vars.insert(ALLOW_EPHEMERAL_ENV, "yes".to_owned());

    let err = expect_error(session_settings_from_env(&mock_env(vars), BuildMode::Release));

    assert!(matches!(err, SessionConfigError::EphemeralNotAllowed));
}

#[rstest]
fn release_rejects_short_keys() {
    let short = TempKeyFile::new(SESSION_KEY_MIN_LEN - 1).expect("key file");
    let err = expect_error(session_settings_from_env(
        &mock_env(release_vars(&short)),
        BuildMode::Release,
    ));

    assert!(matches!(
        err,
        SessionConfigError::KeyTooShort { length, min_len, .. }
            if length == SESSION_KEY_MIN_LEN - 1 && min_len == SESSION_KEY_MIN_LEN
    ));
}

#[rstest]
fn release_requires_a_readable_key() {
    let vars = HashMap::from([
        (KEY_FILE_ENV, "/nonexistent/forum/session_key".to_owned()),
        (COOKIE_SECURE_ENV, "1".to_owned()),
        (SAMESITE_ENV, "Lax".to_owned()),
        (ALLOW_EPHEMERAL_ENV, "0".to_owned()),
    ]);

    let err = expect_error(session_settings_from_env(&mock_env(vars), BuildMode::Release));

    assert!(matches!(err, SessionConfigError::KeyRead { .. }));
}

#[rstest]
fn debug_defaults_are_secure_and_lax() {
    let vars = HashMap::from([(KEY_FILE_ENV, "/nonexistent/forum/session_key".to_owned())]);

    let settings =
        session_settings_from_env(&mock_env(vars), BuildMode::Debug).expect("debug settings");

    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Lax);
}

#[rstest]
fn debug_still_refuses_keys_below_the_floor() {
    let tiny = TempKeyFile::new(8).expect("key file");
    let vars = HashMap::from([(KEY_FILE_ENV, tiny.path_str())]);

    let err = expect_error(session_settings_from_env(&mock_env(vars), BuildMode::Debug));

    assert!(matches!(err, SessionConfigError::KeyTooShort { min_len: 32, .. }));
}

#[rstest]
fn same_key_file_gives_same_fingerprint(release_key: TempKeyFile) {
    let first = session_settings_from_env(&mock_env(release_vars(&release_key)), BuildMode::Release)
        .expect("settings");
    let second =
        session_settings_from_env(&mock_env(release_vars(&release_key)), BuildMode::Release)
            .expect("settings");

    assert_eq!(first.key_fingerprint(), second.key_fingerprint());
    assert_ne!(first.key_fingerprint(), key_fingerprint(&Key::generate()));
}

#[rstest]
#[case(" YES ", Some(true))]
#[case("n", Some(false))]
#[case("2", None)]
fn booleans_parse_leniently(#[case] raw: &str, #[case] expected: Option<bool>) {
    assert_eq!(parse_bool(raw), expected);
}
