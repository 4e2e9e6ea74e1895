// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The operations the reconciler needs from the cluster control plane.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::identity::ResourceKind;
use crate::types::payload::Document;

/// Outcome of a successful existence probe. A probe that could not complete
/// is an error, never `Absent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Present,
    Absent,
}

#[async_trait]
pub trait ControlPlane: Send + Sync {
    async fn namespace_exists(&self, name: &str) -> Result<Presence>;

    async fn create_namespace(&self, name: &str) -> Result<()>;

    async fn resource_exists(
        &self,
        kind: ResourceKind,
        name: &str,
        namespace: &str,
    ) -> Result<Presence>;

    /// Create the resource, recording the submitted document for later diffs
    async fn create_resource(&self, document: &Document) -> Result<()>;

    /// Replace the stored resource with `document`
    async fn apply_resource(&self, document: &Document) -> Result<()>;
}
