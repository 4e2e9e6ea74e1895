// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! [`ControlPlane`] backed by the Kubernetes API

use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Namespace, Secret};
use k8s_openapi::NamespaceResourceScope;
use kube::{api::PostParams, Api, Client, Resource};
use serde::{de::DeserializeOwned, Serialize};
use tokio::time::timeout;
use tracing::{debug, instrument};

use crate::constants::FIELD_MANAGER;
use crate::error::{ProvisionError, Result};
use crate::kubernetes::control_plane::{ControlPlane, Presence};
use crate::kubernetes::namespaces;
use crate::types::identity::ResourceKind;
use crate::types::payload::Document;

/// Every call is bounded by `call_timeout`; expiry surfaces as
/// [`ProvisionError::Timeout`].
#[derive(Clone)]
pub struct KubeControlPlane {
    client: Client,
    call_timeout: Duration,
}

impl KubeControlPlane {
    pub fn new(client: Client, call_timeout: Duration) -> Self {
        Self {
            client,
            call_timeout,
        }
    }

    async fn bounded<T, F>(&self, operation: String, call: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, kube::Error>>,
    {
        match timeout(self.call_timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ProvisionError::Timeout {
                operation,
                after: self.call_timeout,
            }),
        }
    }

    fn namespaced<K>(&self, document: &Document) -> Result<Api<K>>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        <K as Resource>::DynamicType: Default,
    {
        let namespace = document.namespace().ok_or_else(|| {
            ProvisionError::InvalidName(format!(
                "{} '{}' has no namespace",
                document.kind(),
                document.name()
            ))
        })?;
        Ok(Api::namespaced(self.client.clone(), namespace))
    }

    async fn presence<K>(&self, kind: ResourceKind, name: &str, namespace: &str) -> Result<Presence>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        let lookup = async {
            match api.get(name).await {
                Ok(_) => Ok(Presence::Present),
                Err(kube::Error::Api(err)) if err.code == 404 => Ok(Presence::Absent),
                Err(e) => Err(e),
            }
        };

        self.bounded(format!("get {} {}/{}", kind, namespace, name), lookup)
            .await
    }

    /// Replace the stored object with `object` as a whole. Fields missing
    /// from `object` are dropped from the stored one.
    async fn replace<K>(&self, api: Api<K>, operation: String, mut object: K) -> Result<()>
    where
        K: Resource + Clone + DeserializeOwned + Serialize + Debug,
    {
        let name = object.meta().name.clone().unwrap_or_default();
        let current = self
            .bounded(format!("get before {}", operation), api.get(&name))
            .await?;
        object.meta_mut().resource_version = current.meta().resource_version.clone();

        let pp = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };
        self.bounded(operation, api.replace(&name, &pp, &object))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ControlPlane for KubeControlPlane {
    async fn namespace_exists(&self, name: &str) -> Result<Presence> {
        self.bounded(
            format!("get Namespace {}", name),
            namespaces::namespace_presence(&self.client, name),
        )
        .await
    }

    async fn create_namespace(&self, name: &str) -> Result<()> {
        self.bounded(
            format!("create Namespace {}", name),
            namespaces::create_namespace(&self.client, name),
        )
        .await
    }

    async fn resource_exists(
        &self,
        kind: ResourceKind,
        name: &str,
        namespace: &str,
    ) -> Result<Presence> {
        match kind {
            ResourceKind::Namespace => self.namespace_exists(name).await,
            ResourceKind::Secret => self.presence::<Secret>(kind, name, namespace).await,
            ResourceKind::ConfigMap => self.presence::<ConfigMap>(kind, name, namespace).await,
        }
    }

    #[instrument(skip(self, document), fields(kind = %document.kind(), name = %document.name()))]
    async fn create_resource(&self, document: &Document) -> Result<()> {
        let operation = format!("create {} {}", document.kind(), document.name());
        let document = document.with_last_applied()?;
        let pp = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };

        debug!("Submitting {}", operation);
        match &document {
            Document::Namespace(ns) => {
                let api: Api<Namespace> = Api::all(self.client.clone());
                self.bounded(operation, api.create(&pp, ns)).await?;
            }
            Document::Secret(secret) => {
                let api: Api<Secret> = self.namespaced(&document)?;
                self.bounded(operation, api.create(&pp, secret)).await?;
            }
            Document::ConfigMap(cm) => {
                let api: Api<ConfigMap> = self.namespaced(&document)?;
                self.bounded(operation, api.create(&pp, cm)).await?;
            }
        }
        Ok(())
    }

    #[instrument(skip(self, document), fields(kind = %document.kind(), name = %document.name()))]
    async fn apply_resource(&self, document: &Document) -> Result<()> {
        let operation = format!("replace {} {}", document.kind(), document.name());
        let document = document.with_last_applied()?;

        debug!("Submitting {}", operation);
        match &document {
            Document::Namespace(ns) => {
                let api: Api<Namespace> = Api::all(self.client.clone());
                self.replace(api, operation, ns.clone()).await
            }
            Document::Secret(secret) => {
                let api: Api<Secret> = self.namespaced(&document)?;
                self.replace(api, operation, secret.clone()).await
            }
            Document::ConfigMap(cm) => {
                let api: Api<ConfigMap> = self.namespaced(&document)?;
                self.replace(api, operation, cm.clone()).await
            }
        }
    }
}
