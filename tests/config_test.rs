use std::{collections::HashMap, path::PathBuf, time::Duration};

use spdl::{config::Config, error::Error, types::Quality};

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_config_defaults() {
    let config = Config::from_lookup(lookup(&[("SPDL_ACCESS_TOKEN", "token")])).unwrap();

    assert_eq!(config.access_token, "token");
    assert_eq!(config.output_root, PathBuf::from("downloads"));
    assert_eq!(config.quality, Quality::Mp4_128);
    assert!(!config.convert_to_mp3);
    assert!(!config.skip_metadata);
    assert_eq!(config.concurrency, 1);
    assert_eq!(config.request_timeout, Duration::from_secs(30));
    assert_eq!(config.endpoints.web_api, "https://api.spotify.com/v1");
}

#[test]
fn test_config_requires_access_token() {
    assert!(matches!(
        Config::from_lookup(lookup(&[])),
        Err(Error::Config(_))
    ));
    assert!(matches!(
        Config::from_lookup(lookup(&[("SPDL_ACCESS_TOKEN", "  ")])),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_config_overrides() {
    let config = Config::from_lookup(lookup(&[
        ("SPDL_ACCESS_TOKEN", "token"),
        ("SPDL_OUTPUT_DIR", "/srv/music"),
        ("SPDL_QUALITY", "ogg_vorbis_320"),
        ("SPDL_CONVERT_TO_MP3", "yes"),
        ("SPDL_SKIP_METADATA", "1"),
        ("SPDL_CONCURRENCY", "4"),
        ("SPDL_REQUEST_TIMEOUT_SECS", "5"),
        ("SPDL_SPCLIENT_URL", "http://localhost:8080/"),
    ]))
    .unwrap();

    assert_eq!(config.output_root, PathBuf::from("/srv/music"));
    assert_eq!(config.quality, Quality::OggVorbis320);
    assert!(config.convert_to_mp3);
    assert!(config.skip_metadata);
    assert_eq!(config.concurrency, 4);
    assert_eq!(config.request_timeout, Duration::from_secs(5));
    assert_eq!(config.endpoints.spclient, "http://localhost:8080");
}

#[test]
fn test_config_rejects_invalid_values() {
    for (key, value) in [
        ("SPDL_QUALITY", "FLAC"),
        ("SPDL_CONVERT_TO_MP3", "maybe"),
        ("SPDL_CONCURRENCY", "0"),
        ("SPDL_CONCURRENCY", "-2"),
        ("SPDL_REQUEST_TIMEOUT_SECS", "soon"),
    ] {
        let result = Config::from_lookup(lookup(&[("SPDL_ACCESS_TOKEN", "token"), (key, value)]));
        assert!(
            matches!(result, Err(Error::Config(_))),
            "{key}={value} should be rejected"
        );
    }
}
