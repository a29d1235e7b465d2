#![allow(dead_code)]

use treesync::config::{ConfigFile, RawConfigFile};
use treesync::errors::Result;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn endpoint(mut self, endpoint: &str) -> Self {
        self.config.remote.endpoint = endpoint.to_string();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.remote.timeout_secs = secs;
        self
    }

    pub fn credentials(mut self, user: &str, pass: &str) -> Self {
        self.config.remote.username = Some(user.to_string());
        self.config.remote.password = Some(pass.to_string());
        self
    }

    /// Replace the default ignore patterns.
    pub fn ignore_patterns(mut self, patterns: &[&str]) -> Self {
        self.config.ignore.patterns = patterns.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn sync_created(mut self, val: bool) -> Self {
        self.config.ignore.sync_created = val;
        self
    }

    pub fn recursive(mut self, val: bool) -> Self {
        self.config.watch.recursive = val;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
