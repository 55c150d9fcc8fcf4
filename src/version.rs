//! Version identity of a project release.
//!
//! A `VersionId` is the project's declared version joined to the source
//! revision of the build root, so rebuilding the same commit reproduces the
//! same id.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::process::Command;

/// Per-project descriptor read from the source directory.
pub const VERSION_DESCRIPTOR: &str = "version.json";

/// Pins the revision instead of asking git.
pub const ENV_REVISION: &str = "FWPACK_REVISION";

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct VersionDescriptor {
    pub version: String,
}

impl VersionDescriptor {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading version descriptor {}", path.display()))?;
        let descriptor: VersionDescriptor = serde_json::from_str(&data)
            .with_context(|| format!("parsing version descriptor {}", path.display()))?;
        validate_declared_version(&descriptor.version)
            .with_context(|| format!("checking {}", path.display()))?;
        Ok(descriptor)
    }
}

// The id names a directory and is embedded in file names; anything else is
// free-form.
fn validate_declared_version(version: &str) -> Result<()> {
    let trimmed = version.trim();
    if trimmed.is_empty() {
        bail!("version must not be empty");
    }
    if matches!(trimmed, "." | "..") {
        bail!("version must not be '{trimmed}'");
    }
    if trimmed
        .chars()
        .any(|c| matches!(c, '/' | '\\') || c.is_control())
    {
        bail!("version contains a path separator or control character: {trimmed:?}");
    }
    Ok(())
}

/// Short source-control revision of the build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Revision(String);

impl Revision {
    pub fn new(raw: &str) -> Result<Self> {
        let trimmed = raw.trim().trim_matches('\'');
        if trimmed.is_empty() {
            bail!("revision must not be empty");
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            bail!("revision must be alphanumeric, got {trimmed}");
        }
        Ok(Self(trimmed.to_string()))
    }

    /// `FWPACK_REVISION` when set, otherwise the short hash of `HEAD` in `repo`.
    pub fn detect(repo: &Path) -> Result<Self> {
        match env::var(ENV_REVISION) {
            Ok(value) if !value.trim().is_empty() => {
                return Self::new(&value).with_context(|| format!("reading {ENV_REVISION}"));
            }
            _ => {}
        }

        let output = Command::new("git")
            .args(["log", "--pretty=format:%h", "-n", "1"])
            .current_dir(repo)
            .output()
            .with_context(|| format!("running git in {}", repo.display()))?;
        if !output.status.success() {
            bail!(
                "git log failed in {}: {}",
                repo.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Self::new(&String::from_utf8_lossy(&output.stdout))
            .with_context(|| format!("reading git revision of {}", repo.display()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(String);

impl VersionId {
    pub fn new(declared: &str, revision: &Revision) -> Self {
        Self(format!("{}-{}", declared.trim(), revision.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
