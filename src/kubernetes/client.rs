// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes client creation and kubeconfig utilities

use std::path::Path;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config as KConfig};
use tracing::{debug, info, instrument};

use crate::error::{ProvisionError, Result};

/// Create a Kubernetes client from `kubeconfig` when given, otherwise from
/// the environment (KUBECONFIG, ~/.kube/config or in-cluster)
#[instrument]
pub async fn create_client(kubeconfig: Option<&Path>) -> Result<Client> {
    let config = match kubeconfig {
        Some(path) => {
            info!("Loading kubeconfig from {}", path.display());
            let parsed = Kubeconfig::read_from(path).map_err(|e| {
                ProvisionError::KubeconfigError(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                ))
            })?;
            KConfig::from_custom_kubeconfig(parsed, &KubeConfigOptions::default())
                .await
                .map_err(|e| {
                    ProvisionError::KubeconfigError(format!("Failed to create config: {}", e))
                })?
        }
        None => KConfig::infer()
            .await
            .map_err(|e| ProvisionError::KubeconfigError(format!("Failed to infer config: {}", e)))?,
    };

    debug!("Using cluster {}", config.cluster_url);

    Client::try_from(config)
        .map_err(|e| ProvisionError::KubeconfigError(format!("Failed to create client: {}", e)))
}
