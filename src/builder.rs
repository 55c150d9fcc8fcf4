//! Whole-catalog build.
//!
//! `build_all` is destructive: the channel release root is removed and
//! recreated, so nothing from an earlier run survives, even for vendors that
//! are no longer in the catalog. At most one build may run against a release
//! root at a time.

use crate::assembler::{ProjectFailure, ProjectRelease, ReleaseAssembler};
use crate::catalog::{Catalog, Vendor};
use crate::layout::ReleaseLayout;
use crate::manifest::VendorIndex;
use crate::version::Revision;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Debug)]
pub struct VendorReport {
    pub vendor: String,
    pub releases: Vec<ProjectRelease>,
    pub failures: Vec<ProjectFailure>,
    /// `projects.json`, when it could be written.
    pub index_path: Option<PathBuf>,
    pub index_error: Option<String>,
}

#[derive(Debug)]
pub struct BuildReport {
    pub release_root: PathBuf,
    pub vendors: Vec<VendorReport>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.vendors
            .iter()
            .all(|vendor| vendor.failures.is_empty() && vendor.index_error.is_none())
    }

    pub fn releases(&self) -> impl Iterator<Item = &ProjectRelease> {
        self.vendors.iter().flat_map(|vendor| vendor.releases.iter())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ProjectFailure> {
        self.vendors.iter().flat_map(|vendor| vendor.failures.iter())
    }

    pub fn vendor(&self, id: &str) -> Option<&VendorReport> {
        self.vendors.iter().find(|vendor| vendor.vendor == id)
    }
}

pub struct CatalogBuilder<'a> {
    catalog: &'a Catalog,
    layout: &'a ReleaseLayout,
    revision: &'a Revision,
}

impl<'a> CatalogBuilder<'a> {
    pub fn new(catalog: &'a Catalog, layout: &'a ReleaseLayout, revision: &'a Revision) -> Self {
        Self {
            catalog,
            layout,
            revision,
        }
    }

    /// Rebuild the whole release root from the catalog.
    ///
    /// Only failures to reset the log directory or the release root abort the
    /// run; project failures are collected into the report.
    pub fn build_all(&self) -> Result<BuildReport> {
        clear_directory(self.layout.log_dir())?;
        reset_directory(self.layout.release_root())?;
        info!(
            "building channel {} into {}",
            self.layout.channel(),
            self.layout.release_root().display()
        );

        let assembler = ReleaseAssembler::new(self.layout, self.revision);
        let vendors = self
            .catalog
            .vendors()
            .iter()
            .map(|vendor| self.build_vendor(&assembler, vendor))
            .collect();

        Ok(BuildReport {
            release_root: self.layout.release_root().to_path_buf(),
            vendors,
        })
    }

    fn build_vendor(&self, assembler: &ReleaseAssembler<'_>, vendor: &Vendor) -> VendorReport {
        info!("# {}", vendor.id);
        let vendor_dir = self.layout.vendor_dir(&vendor.id);
        let mut index = VendorIndex::new();
        let mut releases = Vec::new();
        let mut failures = Vec::new();

        for project in &vendor.projects {
            if let Err(err) = fs::create_dir_all(&vendor_dir) {
                error!("creating {}: {err}", vendor_dir.display());
            }
            match assembler.build_project(&vendor.id, project) {
                Ok(release) => {
                    index.record(&project.id, release.pointer());
                    releases.push(release);
                }
                Err(failure) => {
                    error!("{failure}");
                    failures.push(failure);
                }
            }
        }

        let (index_path, index_error) = match fs::create_dir_all(&vendor_dir)
            .with_context(|| format!("creating {}", vendor_dir.display()))
            .and_then(|_| index.write(&vendor_dir))
        {
            Ok(path) => (Some(path), None),
            Err(err) => {
                warn!("vendor {} index not written: {err:#}", vendor.id);
                (None, Some(format!("{err:#}")))
            }
        };

        VendorReport {
            vendor: vendor.id.clone(),
            releases,
            failures,
            index_path,
            index_error,
        }
    }
}

fn reset_directory(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path).with_context(|| format!("removing {}", path.display()))?;
    }
    fs::create_dir_all(path).with_context(|| format!("creating {}", path.display()))
}

// Empties the directory but keeps it, creating it when absent.
fn clear_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("creating {}", path.display()))?;
    for entry in fs::read_dir(path).with_context(|| format!("listing {}", path.display()))? {
        let entry = entry.with_context(|| format!("listing {}", path.display()))?;
        let entry_path = entry.path();
        let result = if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&entry_path)
        } else {
            fs::remove_file(&entry_path)
        };
        result.with_context(|| format!("removing {}", entry_path.display()))?;
    }
    Ok(())
}
