use std::time::Duration;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use patric_amr::config::{Config, ConfigLoader};
use patric_amr::error::AmrError;

#[test]
fn parse_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("patric-amr.json");
    std::fs::write(
        &path,
        r#"{
            "base_url": "ftp://ftp.patricbrc.org/patric2/current_release/",
            "data_dir": "/srv/patric",
            "throttle_ms": 500,
            "timeout_secs": 20
        }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.schema_version, 1);
    assert_eq!(
        resolved.release.base_url().as_str(),
        "ftp://ftp.patricbrc.org/patric2/current_release/"
    );
    assert_eq!(resolved.data_dir, Utf8PathBuf::from("/srv/patric"));
    assert_eq!(resolved.throttle, Duration::from_millis(500));
    assert_eq!(resolved.timeout, Duration::from_secs(20));
}

#[test]
fn explicit_missing_config_is_an_error() {
    let err = ConfigLoader::resolve(Some("/nonexistent/patric-amr.json")).unwrap_err();
    assert_matches!(err, AmrError::ConfigRead(_));
}

#[test]
fn malformed_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("patric-amr.json");
    std::fs::write(&path, "{ \"throttle_ms\": \"fast\" }").unwrap();
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, AmrError::ConfigParse(_));
}

#[test]
fn invalid_values_are_rejected() {
    let config = Config {
        base_url: Some("::".to_string()),
        data_dir: Some("/tmp".to_string()),
        ..Config::default()
    };
    assert_matches!(ConfigLoader::resolve_config(config), Err(AmrError::InvalidUrl(_)));

    let config = Config {
        data_dir: Some("/tmp".to_string()),
        timeout_secs: Some(0),
        ..Config::default()
    };
    assert_matches!(ConfigLoader::resolve_config(config), Err(AmrError::ConfigParse(_)));
}
