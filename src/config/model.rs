// src/config/model.rs

use serde::Deserialize;

/// Base URL used when neither the config file nor the CLI names one.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:4502/";

/// Substrings that exclude a path from watching and syncing.
///
/// Version-control metadata, content-packaging tool scratch files, XML
/// descriptors and IDE safe-write temporaries.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    ".svn", ".vlt", "/svn-", "/vlt-", ".xml", ".git", "__jb_",
];

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [remote]
/// endpoint = "http://localhost:4502/"
/// timeout_secs = 30
/// username = "admin"
/// password = "admin"
///
/// [ignore]
/// patterns = [".svn", ".git"]
/// sync_created = false
///
/// [watch]
/// recursive = true
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub remote: RemoteSection,

    #[serde(default)]
    pub ignore: IgnoreSection,

    #[serde(default)]
    pub watch: WatchSection,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, so holders can rely on
/// the endpoint being a usable http(s) URL.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    remote: RemoteSection,
    ignore: IgnoreSection,
    watch: WatchSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        remote: RemoteSection,
        ignore: IgnoreSection,
        watch: WatchSection,
    ) -> Self {
        Self {
            remote,
            ignore,
            watch,
        }
    }

    pub fn remote(&self) -> &RemoteSection {
        &self.remote
    }

    pub fn ignore(&self) -> &IgnoreSection {
        &self.ignore
    }

    pub fn watch(&self) -> &WatchSection {
        &self.watch
    }

    /// Built-in defaults, as if an empty file had been loaded.
    pub fn defaults() -> Self {
        let raw = RawConfigFile::default();
        Self::new_unchecked(raw.remote, raw.ignore, raw.watch)
    }
}

/// `[remote]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteSection {
    /// Base URL; remote keys are appended verbatim.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Optional HTTP basic credentials. Both or neither.
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            username: None,
            password: None,
        }
    }
}

/// `[ignore]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IgnoreSection {
    /// Case-sensitive substrings matched anywhere in the absolute path.
    #[serde(default = "default_ignore_patterns")]
    pub patterns: Vec<String>,

    /// Also upload on bare `Created` notifications.
    ///
    /// Off by default: a new file is uploaded on its first modification (or
    /// when it arrives together with a newly created directory).
    #[serde(default)]
    pub sync_created: bool,
}

fn default_ignore_patterns() -> Vec<String> {
    DEFAULT_IGNORE_PATTERNS.iter().map(|s| s.to_string()).collect()
}

impl Default for IgnoreSection {
    fn default() -> Self {
        Self {
            patterns: default_ignore_patterns(),
            sync_created: false,
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Register subdirectories, including ones created while running.
    #[serde(default = "default_recursive")]
    pub recursive: bool,
}

fn default_recursive() -> bool {
    true
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            recursive: default_recursive(),
        }
    }
}
