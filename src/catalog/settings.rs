//! Local deployment settings (`local-config.json`).

use crate::catalog::validate_identifier;
use crate::schema::{self, SchemaKind};
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CHANNEL: &str = "stable";
pub const DEFAULT_REMOTE_ROOT: &str = "/var/www/webs/download.shipard.org/shipard-iot/fw";

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LocalSettings {
    pub remote_user: String,
    pub remote_server: String,
    #[serde(default = "default_remote_root")]
    pub remote_root: String,
    #[serde(default = "default_channel")]
    pub channel: String,
    /// Directory holding `<vendor>/projects/<project>/`; relative to the build root.
    #[serde(default)]
    pub source_root: Option<PathBuf>,
    /// Directory under which `<channel>/` is rebuilt; relative to the build root.
    #[serde(default)]
    pub output_root: Option<PathBuf>,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_remote_root() -> String {
    DEFAULT_REMOTE_ROOT.to_string()
}

fn default_channel() -> String {
    DEFAULT_CHANNEL.to_string()
}

impl LocalSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading local settings {}", path.display()))?;
        let value: serde_json::Value = serde_json::from_str(&data)
            .with_context(|| format!("parsing local settings {}", path.display()))?;
        schema::validate(SchemaKind::LocalSettings, &value)
            .with_context(|| format!("validating local settings {}", path.display()))?;
        let settings: LocalSettings = serde_json::from_value(value)
            .with_context(|| format!("decoding local settings {}", path.display()))?;
        settings
            .validate()
            .with_context(|| format!("checking {}", path.display()))?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.remote_user.trim().is_empty() {
            bail!("remoteUser must not be empty");
        }
        if self.remote_server.trim().is_empty() {
            bail!("remoteServer must not be empty");
        }
        if !self.remote_root.starts_with('/') {
            bail!("remoteRoot must be an absolute path, got {}", self.remote_root);
        }
        validate_identifier("channel", &self.channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn load_str(contents: &str) -> Result<LocalSettings> {
        let mut file = NamedTempFile::new()?;
        file.write_all(contents.as_bytes())?;
        LocalSettings::load(file.path())
    }

    #[test]
    fn applies_defaults() {
        let settings =
            load_str(r#"{"remoteUser": "deploy", "remoteServer": "dl.example.org"}"#).unwrap();
        assert_eq!(settings.channel, DEFAULT_CHANNEL);
        assert_eq!(settings.remote_root, DEFAULT_REMOTE_ROOT);
        assert!(settings.source_root.is_none());
    }

    #[test]
    fn rejects_missing_server_and_relative_remote_root() {
        assert!(load_str(r#"{"remoteUser": "deploy"}"#).is_err());
        assert!(
            load_str(
                r#"{"remoteUser": "deploy", "remoteServer": "dl", "remoteRoot": "srv/fw"}"#
            )
            .is_err()
        );
    }

    #[test]
    fn rejects_unparseable_document() {
        let err = load_str("{not json").unwrap_err();
        assert!(format!("{err:#}").contains("parsing local settings"));
    }
}
