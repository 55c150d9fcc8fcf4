//! Copy-then-digest for release artifacts.

use anyhow::{Context, Result, bail};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CopiedFile {
    pub size: u64,
    /// Lowercase hex SHA-256 of the destination bytes.
    pub digest: String,
}

/// Copy `source` to `destination`, then size and digest the bytes that landed.
///
/// A missing source is an error, never an empty artifact. A destination left
/// behind by a failed copy is removed.
pub fn copy_and_digest(source: &Path, destination: &Path) -> Result<CopiedFile> {
    if !source.is_file() {
        bail!("source artifact {} not found", source.display());
    }

    if let Err(err) = fs::copy(source, destination) {
        let _ = fs::remove_file(destination);
        return Err(err).with_context(|| {
            format!(
                "copying {} to {}",
                source.display(),
                destination.display()
            )
        });
    }

    let size = fs::metadata(destination)
        .with_context(|| format!("reading metadata of {}", destination.display()))?
        .len();
    let digest = file_digest(destination)?;
    Ok(CopiedFile { size, digest })
}

/// Stream a file through SHA-256 and return the lowercase hex digest.
pub fn file_digest(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).with_context(|| format!("reading {}", path.display()))?;
    Ok(hex::encode(hasher.finalize()))
}
