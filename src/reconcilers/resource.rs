// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resource reconciler - probes a resource, settles conflicts with the
//! operator, then creates or updates it.

use std::fmt;

use clap::ValueEnum;
use tracing::{debug, error, info, warn};

use crate::artifact::ArtifactWriter;
use crate::error::{ProvisionError, Result};
use crate::kubernetes::control_plane::{ControlPlane, Presence};
use crate::kubernetes::retry::RetryPolicy;
use crate::prompt::Prompter;
use crate::types::identity::{ResourceIdentity, ResourceKind};
use crate::types::payload::{Document, PayloadSource};

/// What to do when the resource already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ConflictPolicy {
    #[value(name = "always")]
    AlwaysOverwrite,
    #[value(name = "never")]
    NeverOverwrite,
    /// Ask the operator once per resource
    #[default]
    #[value(name = "prompt")]
    PromptUser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UserDeclined,
    OverwriteDisabled,
    AlreadyExists,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::UserDeclined => "user declined overwrite",
            Self::OverwriteDisabled => "overwrite disabled by policy",
            Self::AlreadyExists => "already exists",
        };
        f.write_str(reason)
    }
}

#[derive(Debug)]
pub enum ReconcileOutcome {
    Created,
    Updated,
    Skipped(SkipReason),
    Failed(ProvisionError),
}

impl ReconcileOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Updated => f.write_str("updated"),
            Self::Skipped(reason) => write!(f, "skipped ({})", reason),
            Self::Failed(cause) => write!(f, "failed: {}", cause),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Submit {
    Create,
    Update,
}

pub struct Reconciler<C, P> {
    control_plane: C,
    prompter: P,
    artifacts: Option<ArtifactWriter>,
    retry: RetryPolicy,
}

impl<C: ControlPlane, P: Prompter> Reconciler<C, P> {
    pub fn new(control_plane: C, prompter: P) -> Self {
        Self {
            control_plane,
            prompter,
            artifacts: None,
            retry: RetryPolicy::none(),
        }
    }

    /// Write every submitted document to `writer` before submission
    pub fn with_artifacts(mut self, writer: ArtifactWriter) -> Self {
        self.artifacts = Some(writer);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn control_plane(&self) -> &C {
        &self.control_plane
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    /// Converge `identity` towards `payload`.
    ///
    /// Secrets and config maps first get their namespace reconciled. An
    /// existing resource is only touched when `on_conflict` allows it, and
    /// payload values are only collected once the resource will be written.
    /// Namespaces are created when absent and never updated; their payload
    /// is not consulted.
    pub async fn reconcile(
        &mut self,
        identity: &ResourceIdentity,
        payload: &impl PayloadSource,
        on_conflict: ConflictPolicy,
    ) -> ReconcileOutcome {
        match self.try_reconcile(identity, payload, on_conflict).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Failed to reconcile {}: {}", identity, e);
                ReconcileOutcome::Failed(e)
            }
        }
    }

    async fn try_reconcile(
        &mut self,
        identity: &ResourceIdentity,
        payload: &impl PayloadSource,
        on_conflict: ConflictPolicy,
    ) -> Result<ReconcileOutcome> {
        if let Some(namespace) = identity.parent_namespace() {
            self.ensure_namespace(&namespace).await?;
        } else {
            return self.ensure_namespace(identity).await;
        }

        let submit = match self.probe(identity).await? {
            Presence::Absent => Submit::Create,
            Presence::Present => match on_conflict {
                ConflictPolicy::AlwaysOverwrite => Submit::Update,
                ConflictPolicy::NeverOverwrite => {
                    info!("{} already exists, leaving it untouched", identity);
                    return Ok(ReconcileOutcome::Skipped(SkipReason::OverwriteDisabled));
                }
                ConflictPolicy::PromptUser => {
                    if !self.prompter.confirm_overwrite(identity)? {
                        info!("Skipping {}, overwrite declined", identity);
                        return Ok(ReconcileOutcome::Skipped(SkipReason::UserDeclined));
                    }
                    Submit::Update
                }
            },
        };

        let payload = payload.materialize(&mut self.prompter)?;
        let document = Document::build(identity, &payload)?;
        self.write_artifact(identity, &document);

        let control_plane = &self.control_plane;
        let result = match submit {
            Submit::Create => {
                info!("Creating {}", identity);
                self.retry
                    .run(&format!("create {}", identity), || {
                        control_plane.create_resource(&document)
                    })
                    .await
            }
            Submit::Update => {
                info!("Updating existing {}", identity);
                self.retry
                    .run(&format!("apply {}", identity), || {
                        control_plane.apply_resource(&document)
                    })
                    .await
            }
        };

        result.map_err(|e| ProvisionError::ApplyFailed {
            identity: identity.clone(),
            source: Box::new(e),
        })?;

        Ok(match submit {
            Submit::Create => ReconcileOutcome::Created,
            Submit::Update => ReconcileOutcome::Updated,
        })
    }

    /// Create the namespace when absent. An existing namespace is left alone.
    async fn ensure_namespace(&self, identity: &ResourceIdentity) -> Result<ReconcileOutcome> {
        if self.probe(identity).await? == Presence::Present {
            debug!("{} already exists", identity);
            return Ok(ReconcileOutcome::Skipped(SkipReason::AlreadyExists));
        }

        let name = identity.name();
        let control_plane = &self.control_plane;
        let result = self
            .retry
            .run(&format!("create {}", identity), || {
                control_plane.create_namespace(name)
            })
            .await;

        match result {
            Ok(()) => {
                info!("{} created", identity);
                Ok(ReconcileOutcome::Created)
            }
            // created by someone else between probe and create
            Err(ProvisionError::KubeError(kube::Error::Api(err))) if err.code == 409 => {
                debug!("{} appeared concurrently", identity);
                Ok(ReconcileOutcome::Skipped(SkipReason::AlreadyExists))
            }
            Err(e) => Err(ProvisionError::ApplyFailed {
                identity: identity.clone(),
                source: Box::new(e),
            }),
        }
    }

    async fn probe(&self, identity: &ResourceIdentity) -> Result<Presence> {
        let control_plane = &self.control_plane;
        let presence = match (identity.kind(), identity.namespace_name()) {
            (ResourceKind::Namespace, _) | (_, None) => {
                self.retry
                    .run(&format!("probe {}", identity), || {
                        control_plane.namespace_exists(identity.name())
                    })
                    .await
            }
            (kind, Some(namespace)) => {
                self.retry
                    .run(&format!("probe {}", identity), || {
                        control_plane.resource_exists(kind, identity.name(), namespace)
                    })
                    .await
            }
        }
        .map_err(|e| ProvisionError::ProbeFailed {
            identity: identity.clone(),
            source: Box::new(e),
        })?;

        debug!("{} is {:?}", identity, presence);
        Ok(presence)
    }

    fn write_artifact(&self, identity: &ResourceIdentity, document: &Document) {
        let Some(artifacts) = &self.artifacts else {
            return;
        };

        match artifacts.write(document) {
            Ok(path) => info!("{} document written to {}", identity, path.display()),
            Err(e) => warn!("Could not keep a copy of {}: {}", identity, e),
        }
    }
}
