//! Build configuration wiring.
//!
//! Two documents drive a run: the project catalog (`projects.json`, vendors →
//! projects → displays) and the local deployment settings
//! (`local-config.json`). Both are checked against the bundled JSON Schemas,
//! then against the semantic rules in `index`, before anything touches the
//! release tree. Callers use `Catalog` for the ordered, validated view.

pub mod index;
pub mod model;
pub mod settings;

pub use index::{Catalog, Project, Vendor};
pub use model::{ProjectCatalog, ProjectEntry, VendorEntry};
pub use settings::LocalSettings;

/// Catalog file name, relative to the build root.
pub const CATALOG_FILE: &str = "projects.json";

/// Local deployment settings file name, relative to the build root.
pub const SETTINGS_FILE: &str = "local-config.json";

/// Identifiers become path segments, so they share one conservative charset.
pub(crate) fn validate_identifier(kind: &str, value: &str) -> anyhow::Result<()> {
    if value.is_empty() {
        anyhow::bail!("{kind} must not be empty");
    }
    if value == "." || value == ".." {
        anyhow::bail!("{kind} '{value}' is not a valid path segment");
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        anyhow::bail!("{kind} must match ^[A-Za-z0-9_.-]+$, got {value}");
    }
    Ok(())
}
