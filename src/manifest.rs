//! JSON documents written into the release tree.
//!
//! - `files.json`: one `ProjectManifest` per versioned project directory.
//! - `version.json` + `VERSION`: the project's current `VersionPointer`.
//! - `projects.json`: the `VendorIndex` of a vendor for this run.
//!
//! Every file is written to a temporary sibling and renamed into place.

use crate::version::VersionId;
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const MANIFEST_FILE: &str = "files.json";
pub const POINTER_FILE: &str = "version.json";
pub const POINTER_TEXT_FILE: &str = "VERSION";
pub const VENDOR_INDEX_FILE: &str = "projects.json";

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactEntry {
    pub file_name: String,
    pub size: u64,
    pub digest: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub version: VersionId,
    pub timestamp: String,
    pub files: Vec<ArtifactEntry>,
}

impl ProjectManifest {
    pub fn load(path: &Path) -> Result<Self> {
        read_json(path)
    }

    /// Write `files.json` into the versioned directory.
    pub fn write(&self, version_dir: &Path) -> Result<PathBuf> {
        let path = version_dir.join(MANIFEST_FILE);
        write_json(&path, self)?;
        Ok(path)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionPointer {
    pub version: VersionId,
    pub timestamp: String,
}

impl VersionPointer {
    pub fn load(project_dir: &Path) -> Result<Self> {
        read_json(&project_dir.join(POINTER_FILE))
    }

    /// Overwrite `version.json` and `VERSION` in the project directory.
    pub fn write(&self, project_dir: &Path) -> Result<[PathBuf; 2]> {
        let json_path = project_dir.join(POINTER_FILE);
        let text_path = project_dir.join(POINTER_TEXT_FILE);
        write_json(&json_path, self)?;
        write_atomic(&text_path, self.version.as_str().as_bytes())?;
        Ok([json_path, text_path])
    }
}

/// Projects built for one vendor in the current run, keyed by project id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VendorIndex {
    entries: IndexMap<String, VersionPointer>,
}

impl VendorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, project: &str, pointer: VersionPointer) {
        self.entries.insert(project.to_string(), pointer);
    }

    pub fn get(&self, project: &str) -> Option<&VersionPointer> {
        self.entries.get(project)
    }

    pub fn project_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn load(vendor_dir: &Path) -> Result<Self> {
        read_json(&vendor_dir.join(VENDOR_INDEX_FILE))
    }

    /// Consume the index into `projects.json` of the vendor directory.
    pub fn write(self, vendor_dir: &Path) -> Result<PathBuf> {
        let path = vendor_dir.join(VENDOR_INDEX_FILE);
        write_json(&path, &self)?;
        Ok(path)
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut json = serde_json::to_vec_pretty(value)
        .with_context(|| format!("serializing {}", path.display()))?;
    json.push(b'\n');
    write_atomic(path, &json)
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| anyhow!("{} has no parent directory", path.display()))?;
    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temporary file in {}", dir.display()))?;
    file.write_all(contents)
        .with_context(|| format!("writing {}", path.display()))?;
    file.persist(path)
        .with_context(|| format!("persisting {}", path.display()))?;
    Ok(())
}
