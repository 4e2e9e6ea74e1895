// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::calls::{MAX_RETRIES, TIMEOUT_SECS};

/// Runtime settings loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Upper bound for a single control-plane call
    pub call_timeout: Duration,
    /// Extra attempts after a transient failure
    pub max_retries: u32,
    /// Directory the audit documents are written to
    pub artifact_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            call_timeout: Duration::from_secs(TIMEOUT_SECS),
            max_retries: MAX_RETRIES,
            artifact_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();

        let call_timeout = match lookup("PGPROVISION_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(
                v.parse()
                    .with_context(|| format!("PGPROVISION_TIMEOUT_SECS is not a number: {}", v))?,
            ),
            None => defaults.call_timeout,
        };
        let max_retries = match lookup("PGPROVISION_MAX_RETRIES") {
            Some(v) => v
                .parse()
                .with_context(|| format!("PGPROVISION_MAX_RETRIES is not a number: {}", v))?,
            None => defaults.max_retries,
        };
        let artifact_dir = lookup("PGPROVISION_ARTIFACT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.artifact_dir);

        Ok(Config {
            call_timeout,
            max_retries,
            artifact_dir,
        })
    }
}
