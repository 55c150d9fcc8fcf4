//! A loaded build root: both configuration documents plus the derived layout.
//!
//! Loading is the fatal precondition of a run. A `Workspace` only exists when
//! `projects.json` and `local-config.json` both parsed and validated, so no
//! build can start on a broken configuration.

use crate::builder::{BuildReport, CatalogBuilder};
use crate::catalog::{CATALOG_FILE, Catalog, LocalSettings, SETTINGS_FILE};
use crate::layout::ReleaseLayout;
use crate::publisher::{
    Publisher, RemoteTarget, ScpTransport, Transport, UPLOAD_LOG_FILE, UploadPlan, UploadReport,
};
use crate::version::Revision;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub catalog: Catalog,
    pub settings: LocalSettings,
    pub layout: ReleaseLayout,
}

impl Workspace {
    pub fn load(root: &Path) -> Result<Self> {
        let catalog = Catalog::load(&root.join(CATALOG_FILE))?;
        let settings = LocalSettings::load(&root.join(SETTINGS_FILE))?;
        let layout = ReleaseLayout::from_settings(root, &settings, &catalog)
            .with_context(|| format!("checking directories of {}", root.display()))?;
        Ok(Self {
            root: root.to_path_buf(),
            catalog,
            settings,
            layout,
        })
    }

    /// Revision of the build root (or `FWPACK_REVISION`).
    pub fn revision(&self) -> Result<Revision> {
        Revision::detect(&self.root)
    }

    pub fn build_all(&self, revision: &Revision) -> Result<BuildReport> {
        CatalogBuilder::new(&self.catalog, &self.layout, revision).build_all()
    }

    pub fn remote_target(&self) -> RemoteTarget {
        RemoteTarget::from_settings(&self.settings)
    }

    /// Publish a finished build through `transport`.
    pub fn publish_with<T: Transport>(
        &self,
        report: &BuildReport,
        transport: T,
    ) -> Result<(UploadReport, T)> {
        let plan = UploadPlan::from_report(report, &self.remote_target());
        let mut publisher = Publisher::new(transport);
        let upload = publisher.upload(&plan);
        Ok((upload, publisher.into_transport()))
    }

    /// Publish a finished build over ssh/scp, logging to `<logDir>/upload.log`.
    pub fn publish(&self, report: &BuildReport) -> Result<UploadReport> {
        let log_path = self.layout.log_dir().join(UPLOAD_LOG_FILE);
        let transport = ScpTransport::new(self.remote_target(), Some(&log_path))?;
        let (upload, _) = self.publish_with(report, transport)?;
        Ok(upload)
    }
}
