// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Desired-state payloads and the declarative documents built from them.

use std::collections::BTreeMap;
use std::fmt;

use k8s_openapi::api::core::v1::{ConfigMap, Namespace, Secret};
use k8s_openapi::ByteString;
use kube::api::ObjectMeta;
use serde::{Deserialize, Serialize};

use crate::constants::annotations;
use crate::error::{ProvisionError, Result};
use crate::prompt::Prompter;
use crate::types::identity::{ResourceIdentity, ResourceKind};

/// A single secret entry. The value stays raw here; base64 is applied by
/// [`ByteString`] when the document is serialized.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretPayload {
    pub data_key: String,
    pub raw_value: Vec<u8>,
}

impl SecretPayload {
    pub fn new(data_key: impl Into<String>, raw_value: impl Into<Vec<u8>>) -> Self {
        Self {
            data_key: data_key.into(),
            raw_value: raw_value.into(),
        }
    }
}

impl fmt::Debug for SecretPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretPayload")
            .field("data_key", &self.data_key)
            .field("raw_value", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigMapPayload {
    pub labels: BTreeMap<String, String>,
    pub data: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    Namespace,
    Secret(SecretPayload),
    ConfigMap(ConfigMapPayload),
}

impl Payload {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Namespace => ResourceKind::Namespace,
            Self::Secret(_) => ResourceKind::Secret,
            Self::ConfigMap(_) => ResourceKind::ConfigMap,
        }
    }
}

/// Where a config map value comes from
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum ValueSource {
    /// Ask the operator; an empty answer falls back to `default` when set
    Prompt {
        prompt: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
    Fixed { value: String },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ConfigEntry {
    pub key: String,
    #[serde(flatten)]
    pub source: ValueSource,
}

/// A payload whose values are collected only once the reconciler has decided
/// to write the resource.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind")]
pub enum PayloadTemplate {
    #[serde(rename_all = "camelCase")]
    Secret { data_key: String, prompt: String },
    #[serde(rename_all = "camelCase")]
    ConfigMap {
        #[serde(default)]
        labels: BTreeMap<String, String>,
        entries: Vec<ConfigEntry>,
    },
}

impl PayloadTemplate {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Secret { .. } => ResourceKind::Secret,
            Self::ConfigMap { .. } => ResourceKind::ConfigMap,
        }
    }
}

/// Anything the reconciler can turn into a concrete [`Payload`]
pub trait PayloadSource {
    fn materialize(&self, prompter: &mut dyn Prompter) -> Result<Payload>;
}

impl PayloadSource for Payload {
    fn materialize(&self, _prompter: &mut dyn Prompter) -> Result<Payload> {
        Ok(self.clone())
    }
}

impl PayloadSource for PayloadTemplate {
    fn materialize(&self, prompter: &mut dyn Prompter) -> Result<Payload> {
        match self {
            Self::Secret { data_key, prompt } => {
                let value = prompter.prompt_value(prompt)?;
                Ok(Payload::Secret(SecretPayload::new(
                    data_key.clone(),
                    value.into_bytes(),
                )))
            }
            Self::ConfigMap { labels, entries } => {
                let mut data = BTreeMap::new();
                for entry in entries {
                    let value = match &entry.source {
                        ValueSource::Fixed { value } => value.clone(),
                        ValueSource::Prompt {
                            prompt,
                            default: None,
                        } => prompter.prompt_value(prompt)?,
                        ValueSource::Prompt {
                            prompt,
                            default: Some(default),
                        } => {
                            let answer =
                                prompter.prompt_value(&format!("{} [{}]", prompt, default))?;
                            if answer.trim().is_empty() {
                                default.clone()
                            } else {
                                answer
                            }
                        }
                    };
                    data.insert(entry.key.clone(), value);
                }
                Ok(Payload::ConfigMap(ConfigMapPayload {
                    labels: labels.clone(),
                    data,
                }))
            }
        }
    }
}

/// Declarative document submitted to the control plane
#[derive(Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Document {
    Namespace(Namespace),
    Secret(Secret),
    ConfigMap(ConfigMap),
}

impl Document {
    /// Build the desired-state document for `identity` from `payload`
    pub fn build(identity: &ResourceIdentity, payload: &Payload) -> Result<Self> {
        let metadata = ObjectMeta {
            name: Some(identity.name().to_string()),
            namespace: identity.namespace_name().map(str::to_string),
            ..Default::default()
        };

        match (identity.kind(), payload) {
            (ResourceKind::Namespace, Payload::Namespace) => Ok(Self::Namespace(Namespace {
                metadata,
                ..Default::default()
            })),
            (ResourceKind::Secret, Payload::Secret(secret)) => Ok(Self::Secret(Secret {
                metadata,
                type_: Some("Opaque".to_string()),
                data: Some(BTreeMap::from([(
                    secret.data_key.clone(),
                    ByteString(secret.raw_value.clone()),
                )])),
                ..Default::default()
            })),
            (ResourceKind::ConfigMap, Payload::ConfigMap(config)) => {
                Ok(Self::ConfigMap(ConfigMap {
                    metadata: ObjectMeta {
                        labels: (!config.labels.is_empty()).then(|| config.labels.clone()),
                        ..metadata
                    },
                    data: Some(config.data.clone()),
                    ..Default::default()
                }))
            }
            _ => Err(ProvisionError::PayloadMismatch {
                identity: identity.clone(),
                payload: payload.kind(),
            }),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Namespace(_) => ResourceKind::Namespace,
            Self::Secret(_) => ResourceKind::Secret,
            Self::ConfigMap(_) => ResourceKind::ConfigMap,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Self::Namespace(ns) => &ns.metadata,
            Self::Secret(secret) => &secret.metadata,
            Self::ConfigMap(cm) => &cm.metadata,
        }
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        match self {
            Self::Namespace(ns) => &mut ns.metadata,
            Self::Secret(secret) => &mut secret.metadata,
            Self::ConfigMap(cm) => &mut cm.metadata,
        }
    }

    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.metadata().namespace.as_deref()
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Copy of this document carrying itself in the last-applied annotation,
    /// so later applies can compute a three-way diff against it.
    pub fn with_last_applied(&self) -> Result<Self> {
        let applied = serde_json::to_string(self)?;

        let mut document = self.clone();
        document
            .metadata_mut()
            .annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(annotations::LAST_APPLIED.to_string(), applied);
        Ok(document)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .field("namespace", &self.namespace())
            .finish()
    }
}
