// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Provision plans: which namespace, secrets and config maps to reconcile,
//! and the sequential runner that drives them through the reconciler.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::{ProvisionError, Result};
use crate::kubernetes::control_plane::ControlPlane;
use crate::prompt::Prompter;
use crate::reconcilers::resource::{ConflictPolicy, ReconcileOutcome, Reconciler};
use crate::types::identity::{ResourceIdentity, ResourceKind};
use crate::types::payload::{ConfigEntry, Payload, PayloadTemplate, ValueSource};

/// Built-in plans
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Profile {
    /// Namespace `postgres`: database secrets and the connection config map
    Postgres,
    /// Namespace `esignet`: database secrets only
    Esignet,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ResourceDefinition {
    pub name: String,
    #[serde(flatten)]
    pub payload: PayloadTemplate,
}

impl ResourceDefinition {
    pub fn kind(&self) -> ResourceKind {
        self.payload.kind()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ProvisionPlan {
    pub namespace: String,
    pub resources: Vec<ResourceDefinition>,
}

impl ProvisionPlan {
    pub fn for_profile(profile: Profile) -> Self {
        match profile {
            Profile::Postgres => ProvisionPlan {
                namespace: "postgres".to_string(),
                resources: vec![
                    db_user_secret(),
                    postgres_secret("postgres-postgresql"),
                    postgres_config(),
                ],
            },
            Profile::Esignet => ProvisionPlan {
                namespace: "esignet".to_string(),
                resources: vec![
                    db_user_secret(),
                    postgres_secret("esignet-postgres-postgresql"),
                ],
            },
        }
    }

    /// Load and validate a YAML plan file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ProvisionError::PlanError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let plan: ProvisionPlan = serde_yaml::from_str(contents)
            .map_err(|e| ProvisionError::PlanError(format!("Failed to parse plan: {}", e)))?;
        plan.identities()?;
        Ok(plan)
    }

    /// Validated identities: the namespace first, then each resource in order
    pub fn identities(&self) -> Result<Vec<ResourceIdentity>> {
        if self.resources.is_empty() {
            return Err(ProvisionError::PlanError(format!(
                "no resources to provision in namespace '{}'",
                self.namespace
            )));
        }

        let mut identities = vec![ResourceIdentity::namespace(&self.namespace)?];
        // names are unique across kinds, each one owns `<name>.yaml`
        let mut seen = HashSet::new();
        for resource in &self.resources {
            let identity =
                ResourceIdentity::namespaced(resource.kind(), &resource.name, &self.namespace)?;
            if !seen.insert(resource.name.as_str()) {
                return Err(ProvisionError::PlanError(format!(
                    "'{}' is listed more than once",
                    resource.name
                )));
            }
            identities.push(identity);
        }
        Ok(identities)
    }
}

fn db_user_secret() -> ResourceDefinition {
    ResourceDefinition {
        name: "db-common-secrets".to_string(),
        payload: PayloadTemplate::Secret {
            data_key: "db-dbuser-password".to_string(),
            prompt: "Enter the db-dbuser-password".to_string(),
        },
    }
}

fn postgres_secret(name: &str) -> ResourceDefinition {
    ResourceDefinition {
        name: name.to_string(),
        payload: PayloadTemplate::Secret {
            data_key: "postgres-password".to_string(),
            prompt: "Enter postgres user password".to_string(),
        },
    }
}

fn postgres_config() -> ResourceDefinition {
    let prompt = |key: &str, label: &str, default: Option<&str>| ConfigEntry {
        key: key.to_string(),
        source: ValueSource::Prompt {
            prompt: label.to_string(),
            default: default.map(str::to_string),
        },
    };

    ResourceDefinition {
        name: "postgres-config".to_string(),
        payload: PayloadTemplate::ConfigMap {
            labels: BTreeMap::from([("app".to_string(), "postgres".to_string())]),
            entries: vec![
                prompt("database-host", "Enter PostgreSQL host", None),
                prompt("database-port", "Enter PostgreSQL port", None),
                prompt("database-username", "Enter DB user", Some("esignetuser")),
                prompt("database-name", "Enter DB name", Some("mosip_esignet")),
            ],
        },
    }
}

/// Outcome of every resource reached by [`run_plan`], in order
#[derive(Debug, Default)]
pub struct PlanReport {
    pub entries: Vec<(ResourceIdentity, ReconcileOutcome)>,
}

impl PlanReport {
    /// The failure that stopped the run, if any
    pub fn failure(&self) -> Option<(&ResourceIdentity, &ProvisionError)> {
        self.entries.iter().find_map(|(identity, outcome)| match outcome {
            ReconcileOutcome::Failed(cause) => Some((identity, cause)),
            _ => None,
        })
    }
}

/// Reconcile the plan's namespace, then each resource in order. The first
/// failure stops the run and is the last entry of the report.
#[instrument(skip(reconciler, plan), fields(namespace = %plan.namespace))]
pub async fn run_plan<C, P>(
    reconciler: &mut Reconciler<C, P>,
    plan: &ProvisionPlan,
    on_conflict: ConflictPolicy,
) -> Result<PlanReport>
where
    C: ControlPlane,
    P: Prompter,
{
    let identities = plan.identities()?;
    let mut report = PlanReport::default();

    let (namespace, resources) = identities
        .split_first()
        .ok_or_else(|| ProvisionError::PlanError("empty plan".to_string()))?;

    let outcome = reconciler
        .reconcile(namespace, &Payload::Namespace, on_conflict)
        .await;
    info!("{}: {}", namespace, outcome);
    let failed = outcome.is_failed();
    report.entries.push((namespace.clone(), outcome));
    if failed {
        return Ok(report);
    }

    for (identity, definition) in resources.iter().zip(&plan.resources) {
        let outcome = reconciler
            .reconcile(identity, &definition.payload, on_conflict)
            .await;
        info!("{}: {}", identity, outcome);

        let failed = outcome.is_failed();
        report.entries.push((identity.clone(), outcome));
        if failed {
            break;
        }
    }

    Ok(report)
}
