//! Configuration management for the downloader.
//!
//! Configuration is read once at startup from environment variables, optionally
//! seeded from a `.env` file in the local data directory, and then frozen into a
//! [`Config`] value that is handed to the [`Downloader`](crate::management::Downloader).
//! Nothing reads the environment after that point.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)

use std::{env, path::PathBuf, time::Duration};

use crate::{
    error::{Error, Result},
    types::Quality,
};

pub const DEFAULT_METADATA_LANGUAGE: &str =
    "zh-CN,zh;q=0.9,zh-HK;q=0.8,zh-TW;q=0.7,ja-JP;q=0.6,en-US;q=0.5,en;q=0.4";

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the directory structure if it doesn't exist and loads variables
/// from `spdl/.env` under the platform-specific local data directory:
///
/// - Linux: `~/.local/share/spdl/.env`
/// - macOS: `~/Library/Application Support/spdl/.env`
/// - Windows: `%LOCALAPPDATA%/spdl/.env`
///
/// A missing `.env` file is not an error; variables may come from the process
/// environment alone.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the `.env` file
/// exists but cannot be parsed.
pub async fn load_env() -> Result<()> {
    let path = env_path();
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    if path.is_file() {
        dotenv::from_path(&path)
            .map_err(|e| Error::Config(format!("cannot load {}: {}", path.display(), e)))?;
    }
    Ok(())
}

pub fn env_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spdl/.env");
    path
}

/// Base URLs of every remote collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub web_api: String,
    pub spclient: String,
    pub seektable: String,
    pub widevine_license: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            web_api: "https://api.spotify.com/v1".to_string(),
            spclient: "https://spclient.wg.spotify.com".to_string(),
            seektable: "https://seektables.scdn.co".to_string(),
            widevine_license: "https://spclient.wg.spotify.com/widevine-license/v1/audio/license"
                .to_string(),
        }
    }
}

/// Immutable settings for one pipeline run.
#[derive(Debug, Clone)]
pub struct Config {
    pub access_token: String,
    pub metadata_language: String,
    pub output_root: PathBuf,
    pub quality: Quality,
    pub convert_to_mp3: bool,
    pub skip_metadata: bool,
    /// Number of leaves processed at once within a container batch.
    pub concurrency: usize,
    pub request_timeout: Duration,
    pub endpoints: Endpoints,
}

impl Config {
    pub fn new(access_token: impl Into<String>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            access_token: access_token.into(),
            metadata_language: DEFAULT_METADATA_LANGUAGE.to_string(),
            output_root: output_root.into(),
            quality: Quality::default(),
            convert_to_mp3: false,
            skip_metadata: false,
            concurrency: 1,
            request_timeout: Duration::from_secs(30),
            endpoints: Endpoints::default(),
        }
    }

    /// Builds the configuration from the process environment.
    ///
    /// See [`Config::from_lookup`] for the recognized keys.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// | Key | Default |
    /// |---|---|
    /// | `SPDL_ACCESS_TOKEN` | required |
    /// | `SPDL_OUTPUT_DIR` | `./downloads` |
    /// | `SPDL_QUALITY` | `MP4_128` |
    /// | `SPDL_METADATA_LANGUAGE` | [`DEFAULT_METADATA_LANGUAGE`] |
    /// | `SPDL_CONVERT_TO_MP3` | `false` |
    /// | `SPDL_SKIP_METADATA` | `false` |
    /// | `SPDL_CONCURRENCY` | `1` |
    /// | `SPDL_REQUEST_TIMEOUT_SECS` | `30` |
    /// | `SPDL_WEB_API_URL`, `SPDL_SPCLIENT_URL`, `SPDL_SEEKTABLE_URL`, `SPDL_WIDEVINE_LICENSE_URL` | see [`Endpoints`] |
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let access_token =
            get("SPDL_ACCESS_TOKEN").ok_or_else(|| Error::Config("SPDL_ACCESS_TOKEN must be set".into()))?;
        let output_root = get("SPDL_OUTPUT_DIR").unwrap_or_else(|| "downloads".to_string());

        let mut config = Config::new(access_token, output_root);

        if let Some(language) = get("SPDL_METADATA_LANGUAGE") {
            config.metadata_language = language;
        }
        if let Some(quality) = get("SPDL_QUALITY") {
            config.quality = quality.parse().map_err(Error::Config)?;
        }
        if let Some(flag) = get("SPDL_CONVERT_TO_MP3") {
            config.convert_to_mp3 = parse_bool("SPDL_CONVERT_TO_MP3", &flag)?;
        }
        if let Some(flag) = get("SPDL_SKIP_METADATA") {
            config.skip_metadata = parse_bool("SPDL_SKIP_METADATA", &flag)?;
        }
        if let Some(concurrency) = get("SPDL_CONCURRENCY") {
            config.concurrency = match concurrency.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(Error::Config(format!(
                        "SPDL_CONCURRENCY must be a positive integer, got {}",
                        concurrency
                    )));
                }
            };
        }
        if let Some(timeout) = get("SPDL_REQUEST_TIMEOUT_SECS") {
            let secs = timeout.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!(
                    "SPDL_REQUEST_TIMEOUT_SECS must be a number of seconds, got {}",
                    timeout
                ))
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(url) = get("SPDL_WEB_API_URL") {
            config.endpoints.web_api = trim_url(url);
        }
        if let Some(url) = get("SPDL_SPCLIENT_URL") {
            config.endpoints.spclient = trim_url(url);
        }
        if let Some(url) = get("SPDL_SEEKTABLE_URL") {
            config.endpoints.seektable = trim_url(url);
        }
        if let Some(url) = get("SPDL_WIDEVINE_LICENSE_URL") {
            config.endpoints.widevine_license = url.trim().to_string();
        }

        Ok(config)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!(
            "{} must be a boolean, got {}",
            key, value
        ))),
    }
}

fn trim_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}
