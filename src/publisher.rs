//! Mirrors a built release tree onto the distribution server.
//!
//! Publishing is split in two: `UploadPlan` decides which local files land in
//! which remote directory, and a `Transport` moves the bytes. The plan walks
//! vendors and projects in build order:
//!
//! ```text
//! <remoteRoot>/<vendor>/<channel>/<project>/<VersionId>/   <- artifacts + files.json
//! <remoteRoot>/<vendor>/<channel>/<project>/               <- version.json, VERSION
//! <remoteRoot>/<vendor>/<channel>/                         <- projects.json
//! ```
//!
//! Only projects that built completely are published. A failed step is
//! recorded and the remaining steps still run; there are no retries.

use crate::builder::BuildReport;
use crate::catalog::LocalSettings;
use crate::manifest::{POINTER_FILE, POINTER_TEXT_FILE};
use crate::version::VersionId;
use anyhow::{Context, Result, bail};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, error, info};

/// Log file receiving transport command output, inside the log directory.
pub const UPLOAD_LOG_FILE: &str = "upload.log";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteTarget {
    pub user: String,
    pub server: String,
    pub root: String,
    pub channel: String,
}

impl RemoteTarget {
    pub fn from_settings(settings: &LocalSettings) -> Self {
        Self {
            user: settings.remote_user.clone(),
            server: settings.remote_server.clone(),
            root: settings.remote_root.trim_end_matches('/').to_string(),
            channel: settings.channel.clone(),
        }
    }

    /// `<remoteRoot>/<vendor>/<channel>`
    pub fn channel_dir(&self, vendor: &str) -> String {
        format!("{}/{}/{}", self.root, vendor, self.channel)
    }

    pub fn project_dir(&self, vendor: &str, project: &str) -> String {
        format!("{}/{}", self.channel_dir(vendor), project)
    }

    pub fn version_dir(&self, vendor: &str, project: &str, version: &VersionId) -> String {
        format!("{}/{}", self.project_dir(vendor, project), version)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectUpload {
    pub project: String,
    pub remote_version_dir: String,
    pub remote_project_dir: String,
    /// Artifacts and `files.json`, sorted by file name.
    pub version_files: Vec<PathBuf>,
    /// `version.json` and `VERSION`.
    pub pointer_files: Vec<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VendorUpload {
    pub vendor: String,
    pub projects: Vec<ProjectUpload>,
    pub remote_channel_dir: String,
    pub index_file: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UploadPlan {
    pub vendors: Vec<VendorUpload>,
    /// Projects left out because their release could not be listed.
    pub unplanned: Vec<UploadFailure>,
}

impl UploadPlan {
    pub fn from_report(report: &BuildReport, target: &RemoteTarget) -> Self {
        let mut vendors = Vec::with_capacity(report.vendors.len());
        let mut unplanned = Vec::new();
        for vendor in &report.vendors {
            let mut projects = Vec::with_capacity(vendor.releases.len());
            for release in &vendor.releases {
                let version_files = match list_files(&release.version_dir) {
                    Ok(files) => files,
                    Err(err) => {
                        error!("{}/{} not planned: {err:#}", vendor.vendor, release.project);
                        unplanned.push(UploadFailure {
                            step: format!("plan {}/{}", vendor.vendor, release.project),
                            error: format!("{err:#}"),
                        });
                        continue;
                    }
                };
                projects.push(ProjectUpload {
                    project: release.project.clone(),
                    remote_version_dir: target.version_dir(
                        &vendor.vendor,
                        &release.project,
                        release.version(),
                    ),
                    remote_project_dir: target.project_dir(&vendor.vendor, &release.project),
                    version_files,
                    pointer_files: vec![
                        release.project_dir.join(POINTER_FILE),
                        release.project_dir.join(POINTER_TEXT_FILE),
                    ],
                });
            }
            vendors.push(VendorUpload {
                vendor: vendor.vendor.clone(),
                projects,
                remote_channel_dir: target.channel_dir(&vendor.vendor),
                index_file: vendor.index_path.clone(),
            });
        }
        Self { vendors, unplanned }
    }
}

fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let entry = entry.with_context(|| format!("listing {}", dir.display()))?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Remote copy capability.
pub trait Transport {
    fn ensure_dir(&mut self, remote_dir: &str) -> Result<()>;
    fn copy(&mut self, sources: &[PathBuf], remote_dir: &str) -> Result<()>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadFailure {
    pub step: String,
    pub error: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub completed: usize,
    pub failures: Vec<UploadFailure>,
}

impl UploadReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, step: String, result: Result<()>) -> bool {
        match result {
            Ok(()) => {
                self.completed += 1;
                true
            }
            Err(err) => {
                error!("{step} failed: {err:#}");
                self.failures.push(UploadFailure {
                    step,
                    error: format!("{err:#}"),
                });
                false
            }
        }
    }
}

pub struct Publisher<T: Transport> {
    transport: T,
}

impl<T: Transport> Publisher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    pub fn upload(&mut self, plan: &UploadPlan) -> UploadReport {
        info!("--- UPLOAD ---");
        let mut report = UploadReport {
            completed: 0,
            failures: plan.unplanned.clone(),
        };
        for vendor in &plan.vendors {
            info!("# {}", vendor.vendor);
            for project in &vendor.projects {
                let created = report.record(
                    format!("mkdir {}", project.remote_version_dir),
                    self.transport.ensure_dir(&project.remote_version_dir),
                );
                if !created {
                    continue;
                }
                report.record(
                    format!("upload {} files", project.project),
                    self.transport
                        .copy(&project.version_files, &project.remote_version_dir),
                );
                report.record(
                    format!("upload {} pointer", project.project),
                    self.transport
                        .copy(&project.pointer_files, &project.remote_project_dir),
                );
            }
            if let Some(index_file) = &vendor.index_file {
                report.record(
                    format!("upload {} index", vendor.vendor),
                    self.transport
                        .copy(std::slice::from_ref(index_file), &vendor.remote_channel_dir),
                );
            }
        }
        info!("--- DONE ---");
        report
    }
}

/// `ssh`/`scp` transport. Command output is appended to the upload log.
pub struct ScpTransport {
    target: RemoteTarget,
    log: Option<File>,
}

impl ScpTransport {
    pub fn new(target: RemoteTarget, log_path: Option<&Path>) -> Result<Self> {
        let log = match log_path {
            Some(path) => Some(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("opening {}", path.display()))?,
            ),
            None => None,
        };
        Ok(Self { target, log })
    }

    fn destination(&self, remote_dir: &str) -> String {
        format!("{}@{}:{}", self.target.user, self.target.server, remote_dir)
    }

    fn run(&mut self, mut command: Command) -> Result<()> {
        debug!("running {:?}", command);
        let output = command
            .output()
            .with_context(|| format!("spawning {:?}", command.get_program()))?;
        self.append_log(&command, &output);
        if !output.status.success() {
            bail!(
                "{:?} exited with {}: {}",
                command.get_program(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }

    fn append_log(&mut self, command: &Command, output: &Output) {
        let Some(log) = self.log.as_mut() else {
            return;
        };
        let _ = writeln!(log, "$ {command:?} ({})", output.status);
        let _ = log.write_all(&output.stdout);
        let _ = log.write_all(&output.stderr);
    }
}

impl Transport for ScpTransport {
    fn ensure_dir(&mut self, remote_dir: &str) -> Result<()> {
        let mut command = Command::new("ssh");
        command
            .arg("-l")
            .arg(&self.target.user)
            .arg(&self.target.server)
            .arg("mkdir")
            .arg("-p")
            .arg(shell_quote(remote_dir));
        self.run(command)
    }

    fn copy(&mut self, sources: &[PathBuf], remote_dir: &str) -> Result<()> {
        if sources.is_empty() {
            return Ok(());
        }
        let mut command = Command::new("scp");
        command.args(sources).arg(self.destination(remote_dir));
        info!("scp {} file(s) to {}", sources.len(), self.destination(remote_dir));
        self.run(command)
    }
}

// ssh hands its arguments to the remote shell; versions may contain spaces.
fn shell_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', r"'\''"))
}
