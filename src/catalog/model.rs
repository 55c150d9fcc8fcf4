//! Raw serde shapes of `projects.json`.
//!
//! Maps are `IndexMap`s so vendors and projects keep the order in which the
//! document declares them.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::schema::{self, SchemaKind};

/// Extension of the pre-built display images.
pub const DEFAULT_ARTIFACT_EXTENSION: &str = "tft";

#[derive(Debug, Deserialize, Clone)]
pub struct ProjectCatalog {
    #[serde(rename = "displays-vendors")]
    pub vendors: IndexMap<String, VendorEntry>,
    #[serde(rename = "artifactExtension", default = "default_extension")]
    pub artifact_extension: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct VendorEntry {
    #[serde(default)]
    pub projects: IndexMap<String, ProjectEntry>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProjectEntry {
    #[serde(default)]
    pub displays: Vec<String>,
}

fn default_extension() -> String {
    DEFAULT_ARTIFACT_EXTENSION.to_string()
}

/// Read `projects.json`, validate it against the catalog schema and
/// deserialize it in declaration order.
pub fn load_project_catalog(path: &Path) -> Result<ProjectCatalog> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading project catalog {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&data)
        .with_context(|| format!("parsing project catalog {}", path.display()))?;
    schema::validate(SchemaKind::Catalog, &value)
        .with_context(|| format!("validating project catalog {}", path.display()))?;
    // `Value` objects are sorted; deserialize from the text to keep order.
    serde_json::from_str(&data)
        .with_context(|| format!("decoding project catalog {}", path.display()))
}
