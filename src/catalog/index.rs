//! Validated, ordered view of the project catalog.
//!
//! The index is strict about identifiers and duplicate displays: every id ends
//! up as a path segment or a file-name component, and two identical displays
//! would silently overwrite each other's artifacts.

use crate::catalog::model::{ProjectCatalog, load_project_catalog};
use crate::catalog::validate_identifier;
use anyhow::{Context, Result, bail};
use std::collections::BTreeSet;
use std::path::Path;

/// Every vendor of the run, in declaration order.
#[derive(Debug, Clone)]
pub struct Catalog {
    vendors: Vec<Vendor>,
    artifact_extension: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vendor {
    pub id: String,
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub displays: Vec<String>,
}

impl Catalog {
    /// Load `projects.json` from disk and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = load_project_catalog(path)?;
        Self::from_raw(raw).with_context(|| format!("checking {}", path.display()))
    }

    pub fn from_raw(raw: ProjectCatalog) -> Result<Self> {
        validate_extension(&raw.artifact_extension)?;

        let mut vendors = Vec::with_capacity(raw.vendors.len());
        for (vendor_id, vendor) in raw.vendors {
            validate_identifier("vendor id", &vendor_id)?;
            let mut projects = Vec::with_capacity(vendor.projects.len());
            for (project_id, project) in vendor.projects {
                validate_identifier("project id", &project_id)
                    .with_context(|| format!("vendor {vendor_id}"))?;
                let mut seen = BTreeSet::new();
                for display in &project.displays {
                    validate_identifier("display id", display)
                        .with_context(|| format!("project {vendor_id}/{project_id}"))?;
                    if !seen.insert(display.as_str()) {
                        bail!("project {vendor_id}/{project_id} lists display {display} twice");
                    }
                }
                projects.push(Project {
                    id: project_id,
                    displays: project.displays,
                });
            }
            vendors.push(Vendor {
                id: vendor_id,
                projects,
            });
        }

        Ok(Self {
            vendors,
            artifact_extension: raw.artifact_extension,
        })
    }

    /// Vendors in declaration order.
    pub fn vendors(&self) -> &[Vendor] {
        &self.vendors
    }

    /// Extension of both the source images and the released artifacts.
    pub fn artifact_extension(&self) -> &str {
        &self.artifact_extension
    }
}

fn validate_extension(extension: &str) -> Result<()> {
    if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        bail!("artifactExtension must be a non-empty alphanumeric string, got '{extension}'");
    }
    Ok(())
}
