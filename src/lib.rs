use anyhow::{Result, bail};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub mod assembler;
pub mod builder;
pub mod catalog;
pub mod digest;
pub mod layout;
pub mod manifest;
pub mod orientation;
pub mod publisher;
pub mod schema;
pub mod version;
pub mod workspace;

pub use assembler::{
    ArtifactFailure, FailureReason, ProjectFailure, ProjectRelease, ReleaseAssembler,
};
pub use builder::{BuildReport, CatalogBuilder, VendorReport};
pub use catalog::{Catalog, LocalSettings, Project, Vendor};
pub use digest::{CopiedFile, copy_and_digest, file_digest};
pub use layout::ReleaseLayout;
pub use manifest::{ArtifactEntry, ProjectManifest, VendorIndex, VersionPointer};
pub use orientation::Orientation;
pub use publisher::{
    Publisher, RemoteTarget, ScpTransport, Transport, UploadFailure, UploadPlan, UploadReport,
};
pub use version::{Revision, VersionDescriptor, VersionId};
pub use workspace::Workspace;

/// Environment override for the build root.
pub const ENV_BUILD_ROOT: &str = "FWPACK_ROOT";

const ROOT_SENTINEL: &str = catalog::CATALOG_FILE;
const SETTINGS_FILE: &str = catalog::SETTINGS_FILE;

fn is_build_root(candidate: &Path) -> bool {
    candidate.join(ROOT_SENTINEL).is_file() && candidate.join(SETTINGS_FILE).is_file()
}

fn build_root_from_hint(hint: &Path) -> Option<PathBuf> {
    if hint.as_os_str().is_empty() {
        return None;
    }
    if !hint.exists() || !is_build_root(hint) {
        return None;
    }
    fs::canonicalize(hint).ok()
}

fn search_upwards(start: &Path) -> Option<PathBuf> {
    let mut dir = fs::canonicalize(start).ok()?;
    loop {
        if is_build_root(&dir) {
            return Some(dir);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Locate the directory holding `projects.json` and `local-config.json`.
///
/// An explicit path wins and must be a build root. Otherwise `FWPACK_ROOT` is
/// consulted, then the current directory and its ancestors.
pub fn find_build_root(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if let Some(root) = build_root_from_hint(path) {
            return Ok(root);
        }
        bail!(
            "{} is not a build root (expected {} and {})",
            path.display(),
            ROOT_SENTINEL,
            SETTINGS_FILE
        );
    }

    if let Some(env_root) = env::var_os(ENV_BUILD_ROOT) {
        if let Some(root) = build_root_from_hint(Path::new(&env_root)) {
            return Ok(root);
        }
    }

    if let Ok(cwd) = env::current_dir() {
        if let Some(root) = search_upwards(&cwd) {
            return Ok(root);
        }
    }

    bail!(
        "Unable to locate a build root containing {ROOT_SENTINEL} and {SETTINGS_FILE}. Run from the build directory or set {ENV_BUILD_ROOT}."
    );
}
