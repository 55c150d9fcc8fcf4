//! Bundled JSON Schemas for the configuration inputs and the manifest output.
//!
//! Schemas are compiled on demand from the copies embedded at build time, so a
//! build root never needs a `schemas/` directory of its own.

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaKind {
    /// `projects.json`
    Catalog,
    /// `local-config.json`
    LocalSettings,
    /// `files.json`
    Manifest,
}

impl SchemaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::Catalog => "project catalog",
            SchemaKind::LocalSettings => "local settings",
            SchemaKind::Manifest => "project manifest",
        }
    }

    fn source(&self) -> &'static str {
        match self {
            SchemaKind::Catalog => include_str!("../schemas/projects.schema.json"),
            SchemaKind::LocalSettings => include_str!("../schemas/local-config.schema.json"),
            SchemaKind::Manifest => include_str!("../schemas/files.schema.json"),
        }
    }
}

/// Validate `instance` against the bundled schema for `kind`.
///
/// Every violation is reported, one per line.
pub fn validate(kind: SchemaKind, instance: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(kind.source())
        .with_context(|| format!("parsing bundled {} schema", kind.as_str()))?;
    let compiled = JSONSchema::compile(&schema)
        .map_err(|err| anyhow!("compiling bundled {} schema: {err}", kind.as_str()))?;
    if let Err(errors) = compiled.validate(instance) {
        let details = errors
            .map(|err| format!("{} (at {})", err, err.instance_path))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("{} failed schema validation:\n{}", kind.as_str(), details);
    }
    Ok(())
}
