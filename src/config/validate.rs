// src/config/validate.rs

use reqwest::Url;
use tracing::warn;

use crate::config::model::{ConfigFile, RawConfigFile, RemoteSection};
use crate::errors::{Result, TreesyncError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::TreesyncError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.remote, raw.ignore, raw.watch))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_endpoint(&cfg.remote.endpoint)?;
    validate_remote(&cfg.remote)?;
    validate_ignore_patterns(&cfg.ignore.patterns)?;
    Ok(())
}

/// Check that `endpoint` is an absolute http(s) URL.
///
/// Also used for the `--endpoint` CLI override.
pub fn validate_endpoint(endpoint: &str) -> Result<()> {
    let url = Url::parse(endpoint).map_err(|e| {
        TreesyncError::ConfigError(format!("invalid endpoint '{endpoint}': {e}"))
    })?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(TreesyncError::ConfigError(format!(
                "endpoint '{endpoint}' must use http or https (got '{other}')"
            )));
        }
    }

    if !endpoint.ends_with('/') {
        warn!(
            endpoint,
            "endpoint has no trailing '/'; remote keys are appended verbatim"
        );
    }

    Ok(())
}

fn validate_remote(remote: &RemoteSection) -> Result<()> {
    if remote.timeout_secs == 0 {
        return Err(TreesyncError::ConfigError(
            "[remote].timeout_secs must be >= 1 (got 0)".to_string(),
        ));
    }

    match (&remote.username, &remote.password) {
        (Some(_), None) | (None, Some(_)) => Err(TreesyncError::ConfigError(
            "[remote].username and [remote].password must be set together".to_string(),
        )),
        _ => Ok(()),
    }
}

fn validate_ignore_patterns(patterns: &[String]) -> Result<()> {
    if let Some(pos) = patterns.iter().position(|p| p.is_empty()) {
        // An empty substring would match every path.
        return Err(TreesyncError::ConfigError(format!(
            "[ignore].patterns[{pos}] is empty"
        )));
    }
    Ok(())
}
