// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Audit copies of every submitted document, one `<name>.yaml` per resource.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::error::{ProvisionError, Result};
use crate::types::payload::Document;

#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, document: &Document) -> PathBuf {
        self.dir.join(format!("{}.yaml", document.name()))
    }

    /// Write `document`, replacing any earlier copy. Files are owner-only on
    /// Unix since secret documents carry the encoded values.
    #[instrument(skip(self, document), fields(name = %document.name()))]
    pub fn write(&self, document: &Document) -> Result<PathBuf> {
        let path = self.path_for(document);
        let yaml = document.to_yaml()?;

        write_restricted(&path, yaml.as_bytes()).map_err(|source| {
            ProvisionError::ArtifactError {
                path: path.clone(),
                source,
            }
        })?;

        debug!("Wrote {}", path.display());
        Ok(path)
    }
}

fn write_restricted(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

        options.mode(0o600);
        let mut file = options.open(path)?;
        // mode only applies to new files
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        file.write_all(contents)?;
        file.sync_all()
    }

    #[cfg(not(unix))]
    {
        let mut file = options.open(path)?;
        file.write_all(contents)?;
        file.sync_all()
    }
}
