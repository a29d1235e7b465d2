// src/watch/ignore.rs

use std::path::Path;

use crate::config::IgnoreSection;
use crate::config::model::DEFAULT_IGNORE_PATTERNS;
use crate::types::ChangeKind;

/// Static ignore rules shared by the registration walk and the dispatcher.
///
/// Path matching is a plain, case-sensitive substring test over the whole
/// path string. `.xml` therefore also matches a directory called
/// `notes.xml.d`, and `.git` matches `.github`. That is accepted behaviour.
#[derive(Debug, Clone)]
pub struct IgnoreFilter {
    patterns: Vec<String>,
    sync_created: bool,
}

impl Default for IgnoreFilter {
    fn default() -> Self {
        Self::new(DEFAULT_IGNORE_PATTERNS.iter().map(|s| s.to_string()), false)
    }
}

impl IgnoreFilter {
    pub fn new<I, S>(patterns: I, sync_created: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
            sync_created,
        }
    }

    pub fn from_config(section: &IgnoreSection) -> Self {
        Self::new(section.patterns.iter().cloned(), section.sync_created)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// True if any pattern occurs anywhere in `path`.
    pub fn should_ignore_path(&self, path: &Path) -> bool {
        let s = path.to_string_lossy();
        self.patterns.iter().any(|p| s.contains(p.as_str()))
    }

    /// True unless the kind is `Modified` or `Deleted` (or `Created` with
    /// `sync_created` enabled).
    pub fn should_ignore_kind(&self, kind: ChangeKind) -> bool {
        match kind {
            ChangeKind::Modified | ChangeKind::Deleted => false,
            ChangeKind::Created => !self.sync_created,
            ChangeKind::Overflow => true,
        }
    }
}
