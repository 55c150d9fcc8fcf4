#![allow(dead_code)]

use anyhow::{Context, Result};
use fwpack::{Orientation, Revision, Transport, Workspace};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway build root with sibling vendor sources:
///
/// ```text
/// <tmp>/BUILD/projects.json
/// <tmp>/BUILD/local-config.json
/// <tmp>/<vendor>/projects/<project>/version.json + images
/// ```
pub struct TempBuild {
    pub dir: TempDir,
}

impl TempBuild {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp build");
        fs::create_dir_all(dir.path().join("BUILD")).expect("failed to create BUILD dir");
        let build = Self { dir };
        build
            .write_settings(&json!({
                "remoteUser": "deploy",
                "remoteServer": "dl.example.org",
                "remoteRoot": "/srv/fw"
            }))
            .expect("failed to write settings");
        build
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("BUILD")
    }

    pub fn release_root(&self) -> PathBuf {
        self.root().join("fw/stable")
    }

    pub fn write_catalog(&self, catalog: &Value) -> Result<()> {
        let path = self.root().join("projects.json");
        fs::write(&path, serde_json::to_string_pretty(catalog)?)
            .with_context(|| format!("writing {}", path.display()))
    }

    /// Writes the catalog verbatim; `json!` maps sort their keys.
    pub fn write_catalog_text(&self, text: &str) -> Result<()> {
        let path = self.root().join("projects.json");
        fs::write(&path, text).with_context(|| format!("writing {}", path.display()))
    }

    pub fn write_settings(&self, settings: &Value) -> Result<()> {
        let path = self.root().join("local-config.json");
        fs::write(&path, serde_json::to_string_pretty(settings)?)
            .with_context(|| format!("writing {}", path.display()))
    }

    pub fn source_dir(&self, vendor: &str, project: &str) -> PathBuf {
        self.dir.path().join(vendor).join("projects").join(project)
    }

    /// Declared version plus one image per display × orientation.
    pub fn add_sources(
        &self,
        vendor: &str,
        project: &str,
        version: &str,
        displays: &[&str],
    ) -> Result<()> {
        let dir = self.source_dir(vendor, project);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("version.json"), json!({"version": version}).to_string())?;
        for display in displays {
            for orientation in Orientation::ALL {
                let image = dir.join(format!("{project}-{display}-{orientation}.tft"));
                let bytes = format!("{vendor}/{project}/{display}/{orientation}").repeat(17);
                fs::write(&image, bytes)?;
            }
        }
        Ok(())
    }

    pub fn workspace(&self) -> Result<Workspace> {
        Workspace::load(&self.root())
    }
}

pub fn revision(raw: &str) -> Revision {
    Revision::new(raw).expect("valid revision")
}

pub fn read_json(path: &Path) -> Result<Value> {
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))
}

/// Records every transport call instead of touching the network.
#[derive(Default)]
pub struct RecordingTransport {
    pub calls: Vec<TransportCall>,
    pub fail_dirs_containing: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportCall {
    EnsureDir(String),
    Copy { files: Vec<String>, remote_dir: String },
}

impl Transport for RecordingTransport {
    fn ensure_dir(&mut self, remote_dir: &str) -> Result<()> {
        self.calls.push(TransportCall::EnsureDir(remote_dir.to_string()));
        if let Some(needle) = &self.fail_dirs_containing {
            if remote_dir.contains(needle.as_str()) {
                anyhow::bail!("simulated mkdir failure for {remote_dir}");
            }
        }
        Ok(())
    }

    fn copy(&mut self, sources: &[PathBuf], remote_dir: &str) -> Result<()> {
        let files = sources
            .iter()
            .map(|path| {
                path.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default()
            })
            .collect();
        self.calls.push(TransportCall::Copy {
            files,
            remote_dir: remote_dir.to_string(),
        });
        Ok(())
    }
}
