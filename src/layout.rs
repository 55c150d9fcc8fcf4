//! Source and release path layout.
//!
//! ```text
//! <sourceRoot>/<vendor>/projects/<project>/<project>-<display>-<orientation>.<ext>
//! <releaseRoot>/<vendor>/<project>/<VersionId>/<project>-<display>-<orientation>-<VersionId>.<ext>
//! ```
//!
//! `releaseRoot` is `<outputRoot>/<channel>` and is owned by a single build
//! process at a time; `CatalogBuilder` destroys it at the start of every run.
//! The log directory is emptied as well, so neither may cover the build root
//! or the source root.

use crate::catalog::{Catalog, LocalSettings};
use crate::orientation::Orientation;
use crate::version::VersionId;
use anyhow::{Result, bail};
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_SOURCE_ROOT: &str = "..";
pub const DEFAULT_OUTPUT_ROOT: &str = "fw";
pub const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReleaseLayout {
    source_root: PathBuf,
    release_root: PathBuf,
    log_dir: PathBuf,
    channel: String,
    extension: String,
}

impl ReleaseLayout {
    pub fn new(
        source_root: PathBuf,
        output_root: &Path,
        channel: &str,
        log_dir: PathBuf,
        extension: &str,
    ) -> Self {
        Self {
            source_root,
            release_root: output_root.join(channel),
            log_dir,
            channel: channel.to_string(),
            extension: extension.to_string(),
        }
    }

    /// Resolve configured directories against the build root.
    ///
    /// Fails when a directory that the build empties would cover the build
    /// root, the source root, or (for the log directory) the release root.
    pub fn from_settings(
        build_root: &Path,
        settings: &LocalSettings,
        catalog: &Catalog,
    ) -> Result<Self> {
        let resolve = |configured: &Option<PathBuf>, default: &str| {
            let path = configured
                .clone()
                .unwrap_or_else(|| PathBuf::from(default));
            if path.is_absolute() {
                normalize(&path)
            } else {
                normalize(&build_root.join(path))
            }
        };
        let layout = Self::new(
            resolve(&settings.source_root, DEFAULT_SOURCE_ROOT),
            &resolve(&settings.output_root, DEFAULT_OUTPUT_ROOT),
            &settings.channel,
            resolve(&settings.log_dir, DEFAULT_LOG_DIR),
            catalog.artifact_extension(),
        );
        layout.check_cleared_dirs(&normalize(build_root))?;
        Ok(layout)
    }

    fn check_cleared_dirs(&self, build_root: &Path) -> Result<()> {
        let cleared = [
            ("log directory", &self.log_dir),
            ("release root", &self.release_root),
        ];
        let protected = [
            ("build root", build_root),
            ("source root", self.source_root.as_path()),
        ];
        for (name, dir) in cleared {
            for (kept, path) in protected {
                if path.starts_with(dir) {
                    bail!(
                        "{name} {} would erase the {kept} {}",
                        dir.display(),
                        path.display()
                    );
                }
            }
        }
        if self.log_dir.starts_with(&self.release_root) {
            bail!(
                "log directory {} must not be inside the release root {}",
                self.log_dir.display(),
                self.release_root.display()
            );
        }
        Ok(())
    }

    /// `<outputRoot>/<channel>`, the tree rebuilt on every run.
    pub fn release_root(&self) -> &Path {
        &self.release_root
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn source_dir(&self, vendor: &str, project: &str) -> PathBuf {
        self.source_root.join(vendor).join("projects").join(project)
    }

    pub fn source_artifact(
        &self,
        vendor: &str,
        project: &str,
        display: &str,
        orientation: Orientation,
    ) -> PathBuf {
        self.source_dir(vendor, project).join(format!(
            "{project}-{display}-{orientation}.{}",
            self.extension
        ))
    }

    pub fn vendor_dir(&self, vendor: &str) -> PathBuf {
        self.release_root.join(vendor)
    }

    /// Holds the pointer files of a project.
    pub fn project_dir(&self, vendor: &str, project: &str) -> PathBuf {
        self.vendor_dir(vendor).join(project)
    }

    pub fn version_dir(&self, vendor: &str, project: &str, version: &VersionId) -> PathBuf {
        self.project_dir(vendor, project).join(version.as_str())
    }

    pub fn artifact_file_name(
        &self,
        project: &str,
        display: &str,
        orientation: Orientation,
        version: &VersionId,
    ) -> String {
        format!(
            "{project}-{display}-{orientation}-{version}.{}",
            self.extension
        )
    }
}

// Lexical cleanup of `.` and `..`; symlinks are not resolved.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Revision;

    fn layout() -> ReleaseLayout {
        ReleaseLayout::new(
            PathBuf::from("/src"),
            Path::new("/build/fw"),
            "stable",
            PathBuf::from("/build/logs"),
            "tft",
        )
    }

    #[test]
    fn source_and_release_paths() {
        let layout = layout();
        let version = VersionId::new("1.2.0", &Revision::new("abcd123").unwrap());

        assert_eq!(
            layout.source_artifact("acme", "p1", "d1", Orientation::Deg90),
            PathBuf::from("/src/acme/projects/p1/p1-d1-90.tft")
        );
        assert_eq!(
            layout.version_dir("acme", "p1", &version),
            PathBuf::from("/build/fw/stable/acme/p1/1.2.0-abcd123")
        );
        assert_eq!(
            layout.artifact_file_name("p1", "d2", Orientation::Deg270, &version),
            "p1-d2-270-1.2.0-abcd123.tft"
        );
    }

    #[test]
    fn normalize_folds_dot_segments() {
        assert_eq!(normalize(Path::new("/b/BUILD/./..")), PathBuf::from("/b"));
        assert_eq!(normalize(Path::new("/b/BUILD/../v/x")), PathBuf::from("/b/v/x"));
        assert_eq!(normalize(Path::new("/..")), PathBuf::from("/"));
    }

    #[test]
    fn cleared_dirs_must_not_cover_kept_trees() {
        let build = Path::new("/b/BUILD");
        let with = |source: &str, output: &str, logs: &str| {
            ReleaseLayout::new(
                PathBuf::from(source),
                Path::new(output),
                "stable",
                PathBuf::from(logs),
                "tft",
            )
            .check_cleared_dirs(build)
        };

        assert!(with("/b", "/b/BUILD/fw", "/b/BUILD/logs").is_ok());
        // log dir is the build root
        assert!(with("/b", "/b/BUILD/fw", "/b/BUILD").is_err());
        // log dir above the source root
        assert!(with("/b/src", "/b/BUILD/fw", "/b").is_err());
        // sources live inside the release root
        assert!(with("/b/BUILD/fw/stable/src", "/b/BUILD/fw", "/b/BUILD/logs").is_err());
        // logs would be wiped with the release root
        assert!(with("/b", "/b/BUILD/fw", "/b/BUILD/fw/stable/logs").is_err());
    }
}
