//! Per-project release assembly.
//!
//! For one project the assembler resolves the `VersionId`, copies every
//! display × orientation artifact into `<releaseRoot>/<vendor>/<project>/<VersionId>/`
//! and writes `files.json` there plus the pointer files one level up.
//!
//! Every artifact is attempted even after a failure so the report lists all
//! missing images at once. A project with any failed artifact is incomplete:
//! it gets no manifest, no pointer files and no vendor index entry.

use crate::catalog::Project;
use crate::digest::copy_and_digest;
use crate::layout::ReleaseLayout;
use crate::manifest::{ArtifactEntry, ProjectManifest, VersionPointer, format_timestamp};
use crate::orientation::Orientation;
use crate::version::{Revision, VERSION_DESCRIPTOR, VersionDescriptor, VersionId};
use anyhow::Context;
use chrono::Local;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// A finished project release.
#[derive(Clone, Debug)]
pub struct ProjectRelease {
    pub vendor: String,
    pub project: String,
    pub manifest: ProjectManifest,
    pub project_dir: PathBuf,
    pub version_dir: PathBuf,
}

impl ProjectRelease {
    pub fn version(&self) -> &VersionId {
        &self.manifest.version
    }

    /// Entry recorded in the vendor's `projects.json`.
    pub fn pointer(&self) -> VersionPointer {
        VersionPointer {
            version: self.manifest.version.clone(),
            timestamp: self.manifest.timestamp.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ArtifactFailure {
    pub display: String,
    pub orientation: Orientation,
    pub source: PathBuf,
    pub error: String,
}

#[derive(Clone, Debug)]
pub enum FailureReason {
    /// Version descriptor, directory creation or metadata write failed.
    Setup(String),
    /// One or more artifacts could not be copied.
    Artifacts(Vec<ArtifactFailure>),
}

#[derive(Clone, Debug)]
pub struct ProjectFailure {
    pub vendor: String,
    pub project: String,
    pub version: Option<VersionId>,
    pub reason: FailureReason,
}

impl fmt::Display for ProjectFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.vendor, self.project)?;
        if let Some(version) = &self.version {
            write!(f, " {version}")?;
        }
        match &self.reason {
            FailureReason::Setup(error) => write!(f, ": {error}"),
            FailureReason::Artifacts(failures) => {
                write!(f, ": {} artifact(s) failed", failures.len())?;
                for failure in failures {
                    write!(
                        f,
                        "\n    {} @ {}: {}",
                        failure.display, failure.orientation, failure.error
                    )?;
                }
                Ok(())
            }
        }
    }
}

pub struct ReleaseAssembler<'a> {
    layout: &'a ReleaseLayout,
    revision: &'a Revision,
}

impl<'a> ReleaseAssembler<'a> {
    pub fn new(layout: &'a ReleaseLayout, revision: &'a Revision) -> Self {
        Self { layout, revision }
    }

    /// Resolve the version a project would be released under.
    pub fn version_for(&self, vendor: &str, project: &str) -> anyhow::Result<VersionId> {
        let descriptor_path = self
            .layout
            .source_dir(vendor, project)
            .join(VERSION_DESCRIPTOR);
        let descriptor = VersionDescriptor::load(&descriptor_path)?;
        Ok(VersionId::new(&descriptor.version, self.revision))
    }

    pub fn build_project(
        &self,
        vendor: &str,
        project: &Project,
    ) -> Result<ProjectRelease, ProjectFailure> {
        let timestamp = format_timestamp(&Local::now());
        let setup_failure = |version: Option<&VersionId>, err: anyhow::Error| ProjectFailure {
            vendor: vendor.to_string(),
            project: project.id.clone(),
            version: version.cloned(),
            reason: FailureReason::Setup(format!("{err:#}")),
        };

        let version = self
            .version_for(vendor, &project.id)
            .map_err(|err| setup_failure(None, err))?;
        info!("  -> {} {}", project.id, version);

        let project_dir = self.layout.project_dir(vendor, &project.id);
        let version_dir = self.layout.version_dir(vendor, &project.id, &version);
        fs::create_dir_all(&version_dir)
            .with_context(|| format!("creating {}", version_dir.display()))
            .map_err(|err| setup_failure(Some(&version), err))?;

        let mut files = Vec::with_capacity(project.displays.len() * Orientation::ALL.len());
        let mut failures = Vec::new();
        for display_id in &project.displays {
            let mut sizes = Vec::with_capacity(Orientation::ALL.len());
            for orientation in Orientation::ALL {
                let source =
                    self.layout
                        .source_artifact(vendor, &project.id, display_id, orientation);
                let file_name =
                    self.layout
                        .artifact_file_name(&project.id, display_id, orientation, &version);
                match copy_and_digest(&source, &version_dir.join(&file_name)) {
                    Ok(copied) => {
                        debug!(file = %file_name, digest = %copied.digest, "copied artifact");
                        sizes.push(format!("{orientation}: {}B", copied.size));
                        files.push(ArtifactEntry {
                            file_name,
                            size: copied.size,
                            digest: copied.digest,
                        });
                    }
                    Err(err) => {
                        warn!(
                            vendor,
                            project = %project.id,
                            display = %display_id,
                            orientation = %orientation,
                            "artifact failed: {err:#}"
                        );
                        sizes.push(format!("{orientation}: FAILED"));
                        failures.push(ArtifactFailure {
                            display: display_id.clone(),
                            orientation,
                            source,
                            error: format!("{err:#}"),
                        });
                    }
                }
            }
            info!("     - {} {}", display_id, sizes.join("; "));
        }

        if !failures.is_empty() {
            return Err(ProjectFailure {
                vendor: vendor.to_string(),
                project: project.id.clone(),
                version: Some(version),
                reason: FailureReason::Artifacts(failures),
            });
        }

        let manifest = ProjectManifest {
            version: version.clone(),
            timestamp,
            files,
        };
        manifest
            .write(&version_dir)
            .map_err(|err| setup_failure(Some(&version), err))?;

        let release = ProjectRelease {
            vendor: vendor.to_string(),
            project: project.id.clone(),
            manifest,
            project_dir,
            version_dir,
        };
        release
            .pointer()
            .write(&release.project_dir)
            .map_err(|err| setup_failure(Some(&version), err))?;
        Ok(release)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::file_digest;
    use crate::manifest::{MANIFEST_FILE, POINTER_TEXT_FILE};
    use std::path::Path;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        layout: ReleaseLayout,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let layout = ReleaseLayout::new(
                dir.path().join("src"),
                &dir.path().join("fw"),
                "stable",
                dir.path().join("logs"),
                "tft",
            );
            Self { _dir: dir, layout }
        }

        fn source(
            &self,
            project: &str,
            version: &str,
            displays: &[&str],
            skip: Option<(&str, Orientation)>,
        ) {
            let dir = self.layout.source_dir("acme", project);
            fs::create_dir_all(&dir).unwrap();
            fs::write(
                dir.join(VERSION_DESCRIPTOR),
                format!(r#"{{"version": "{version}"}}"#),
            )
            .unwrap();
            for display in displays {
                for orientation in Orientation::ALL {
                    if skip == Some((*display, orientation)) {
                        continue;
                    }
                    let path = self
                        .layout
                        .source_artifact("acme", project, display, orientation);
                    fs::write(path, format!("{display}@{orientation}")).unwrap();
                }
            }
        }
    }

    fn project(id: &str, displays: &[&str]) -> Project {
        Project {
            id: id.to_string(),
            displays: displays.iter().map(|d| d.to_string()).collect(),
        }
    }

    #[test]
    fn builds_four_entries_per_display_in_order() {
        let fixture = Fixture::new();
        fixture.source("p1", "1.2.0", &["d1", "d2"], None);
        let revision = Revision::new("abcd123").unwrap();
        let assembler = ReleaseAssembler::new(&fixture.layout, &revision);

        let release = assembler
            .build_project("acme", &project("p1", &["d1", "d2"]))
            .expect("release");

        assert_eq!(release.version().as_str(), "1.2.0-abcd123");
        let names: Vec<&str> = release
            .manifest
            .files
            .iter()
            .map(|f| f.file_name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "p1-d1-0-1.2.0-abcd123.tft",
                "p1-d1-90-1.2.0-abcd123.tft",
                "p1-d1-180-1.2.0-abcd123.tft",
                "p1-d1-270-1.2.0-abcd123.tft",
                "p1-d2-0-1.2.0-abcd123.tft",
                "p1-d2-90-1.2.0-abcd123.tft",
                "p1-d2-180-1.2.0-abcd123.tft",
                "p1-d2-270-1.2.0-abcd123.tft",
            ]
        );
        for entry in &release.manifest.files {
            let path = release.version_dir.join(&entry.file_name);
            assert_eq!(file_digest(&path).unwrap(), entry.digest);
            assert_eq!(fs::metadata(&path).unwrap().len(), entry.size);
        }
        assert!(release.version_dir.join(MANIFEST_FILE).is_file());
        assert_eq!(
            fs::read_to_string(release.project_dir.join(POINTER_TEXT_FILE)).unwrap(),
            "1.2.0-abcd123"
        );
    }

    #[test]
    fn missing_artifact_marks_project_incomplete() {
        let fixture = Fixture::new();
        fixture.source("p1", "1.0.0", &["d1", "d2"], Some(("d2", Orientation::Deg90)));
        let revision = Revision::new("abcd123").unwrap();
        let assembler = ReleaseAssembler::new(&fixture.layout, &revision);

        let failure = assembler
            .build_project("acme", &project("p1", &["d1", "d2"]))
            .unwrap_err();
        let FailureReason::Artifacts(failures) = &failure.reason else {
            panic!("expected artifact failures, got {failure}");
        };
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].display, "d2");
        assert_eq!(failures[0].orientation, Orientation::Deg90);

        let version_dir = fixture.layout.version_dir(
            "acme",
            "p1",
            failure.version.as_ref().unwrap(),
        );
        assert!(!version_dir.join(MANIFEST_FILE).exists());
        let pointer_text = fixture.layout.project_dir("acme", "p1").join(POINTER_TEXT_FILE);
        assert!(!pointer_text.exists());
        // the other seven orientations were still attempted
        assert!(version_dir.join("p1-d2-270-1.0.0-abcd123.tft").is_file());
    }

    #[test]
    fn missing_version_descriptor_is_a_setup_failure() {
        let fixture = Fixture::new();
        let revision = Revision::new("abcd123").unwrap();
        let assembler = ReleaseAssembler::new(&fixture.layout, &revision);

        let failure = assembler
            .build_project("acme", &project("ghost", &["d1"]))
            .unwrap_err();
        assert!(matches!(failure.reason, FailureReason::Setup(_)));
        assert!(failure.version.is_none());
        assert!(!Path::new(&fixture.layout.project_dir("acme", "ghost")).exists());
    }
}
