// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::types::identity::{ResourceIdentity, ResourceKind};

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to load kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("Failed to check whether {identity} exists: {source}")]
    ProbeFailed {
        identity: ResourceIdentity,
        source: Box<ProvisionError>,
    },

    #[error("Failed to create or update {identity}: {source}")]
    ApplyFailed {
        identity: ResourceIdentity,
        source: Box<ProvisionError>,
    },

    #[error("{operation} timed out after {}s", .after.as_secs_f32())]
    Timeout { operation: String, after: Duration },

    #[error("Invalid resource name: {0}")]
    InvalidName(String),

    #[error("Cannot reconcile {identity} from a {payload} payload")]
    PayloadMismatch {
        identity: ResourceIdentity,
        payload: ResourceKind,
    },

    #[error("Failed to read operator input: {0}")]
    PromptError(#[from] std::io::Error),

    #[error("Failed to write artifact {}: {source}", .path.display())]
    ArtifactError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize document: {0}")]
    SerializeError(#[from] serde_yaml::Error),

    #[error("Failed to encode document: {0}")]
    EncodeError(#[from] serde_json::Error),

    #[error("Invalid provision plan: {0}")]
    PlanError(String),
}

impl ProvisionError {
    /// Whether retrying the same call could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::KubeError(kube::Error::Api(response)) => {
                response.code == 429 || response.code >= 500
            }
            Self::KubeError(kube::Error::HyperError(_) | kube::Error::Service(_)) => true,
            Self::ProbeFailed { source, .. } | Self::ApplyFailed { source, .. } => {
                source.is_transient()
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProvisionError>;
