//! Version Registry
//!
//! The version tag that names the active cache generation, and the naming
//! scheme that ties generations to this site.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WorkerError;

/// Prefix shared by every generation this worker owns.
pub const DEFAULT_CACHE_PREFIX: &str = "tingyuun-cache-";

/// Version shipped with the current deployment.
pub const DEFAULT_CACHE_VERSION: &str = "v1.1.0";

// == Version Tag ==
/// A `vMAJOR.MINOR.PATCH` tag. Bumping it is the only way to invalidate
/// caches on the next deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionTag {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl VersionTag {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for VersionTag {
    type Err = WorkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || WorkerError::Config(format!("invalid version tag '{}'", s));

        let rest = s.strip_prefix('v').ok_or_else(invalid)?;
        let mut parts = rest.split('.');
        let mut next = || -> Result<u32, WorkerError> {
            let part = parts.next().ok_or_else(invalid)?;
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse().map_err(|_| invalid())
        };
        let tag = VersionTag::new(next()?, next()?, next()?);

        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(tag)
    }
}

impl TryFrom<String> for VersionTag {
    type Error = WorkerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionTag> for String {
    fn from(tag: VersionTag) -> Self {
        tag.to_string()
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)
    }
}

// == Cache Naming ==
/// Maps a version tag to its generation name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheNaming {
    prefix: String,
    version: VersionTag,
}

impl CacheNaming {
    pub fn new(prefix: impl Into<String>, version: VersionTag) -> Self {
        Self {
            prefix: prefix.into(),
            version,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn version(&self) -> VersionTag {
        self.version
    }

    /// Name of the generation this version writes to.
    pub fn generation_name(&self) -> String {
        format!("{}{}", self.prefix, self.version)
    }

    /// True for generations owned by this site but not the current version.
    /// Caches belonging to anything else are never touched.
    pub fn is_stale(&self, name: &str) -> bool {
        name.starts_with(&self.prefix) && name != self.generation_name()
    }
}

impl Default for CacheNaming {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_PREFIX, VersionTag::new(1, 1, 0))
    }
}
