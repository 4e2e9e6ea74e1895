// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Identity of a resource stored by the control plane.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ProvisionError, Result};

const DNS_LABEL_MAX_LEN: usize = 63;
const DNS_SUBDOMAIN_MAX_LEN: usize = 253;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    Namespace,
    Secret,
    ConfigMap,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Namespace => "Namespace",
            Self::Secret => "Secret",
            Self::ConfigMap => "ConfigMap",
        };
        f.write_str(kind)
    }
}

/// Kind, name and (for namespaced kinds) namespace of a resource.
///
/// Only constructible through [`ResourceIdentity::namespace`] and
/// [`ResourceIdentity::namespaced`], which validate the names.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceIdentity {
    kind: ResourceKind,
    name: String,
    namespace: Option<String>,
}

impl ResourceIdentity {
    /// Identity of a namespace
    pub fn namespace(name: &str) -> Result<Self> {
        validate_dns_label(name)?;
        Ok(Self {
            kind: ResourceKind::Namespace,
            name: name.to_string(),
            namespace: None,
        })
    }

    /// Identity of a secret or config map living in `namespace`
    pub fn namespaced(kind: ResourceKind, name: &str, namespace: &str) -> Result<Self> {
        if kind == ResourceKind::Namespace {
            return Err(ProvisionError::InvalidName(format!(
                "namespace '{}' cannot live inside namespace '{}'",
                name, namespace
            )));
        }
        validate_dns_subdomain(name)?;
        validate_dns_label(namespace)?;
        Ok(Self {
            kind,
            name: name.to_string(),
            namespace: Some(namespace.to_string()),
        })
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace the resource lives in, `None` for namespaces themselves
    pub fn namespace_name(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Identity of the namespace that must exist before this resource
    pub fn parent_namespace(&self) -> Option<ResourceIdentity> {
        self.namespace.as_ref().map(|ns| ResourceIdentity {
            kind: ResourceKind::Namespace,
            name: ns.clone(),
            namespace: None,
        })
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{} {}/{}", self.kind, ns, self.name),
            None => write!(f, "{} {}", self.kind, self.name),
        }
    }
}

/// RFC 1123 label: lowercase alphanumerics and '-', alphanumeric at both ends
fn validate_dns_label(value: &str) -> Result<()> {
    if value.is_empty() || value.len() > DNS_LABEL_MAX_LEN {
        return Err(ProvisionError::InvalidName(format!(
            "'{}' must be between 1 and {} characters",
            value, DNS_LABEL_MAX_LEN
        )));
    }

    let valid_chars = value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    let valid_ends = !value.starts_with('-') && !value.ends_with('-');

    if valid_chars && valid_ends {
        Ok(())
    } else {
        Err(ProvisionError::InvalidName(format!(
            "'{}' is not a valid DNS label",
            value
        )))
    }
}

/// RFC 1123 subdomain: dot separated labels
fn validate_dns_subdomain(value: &str) -> Result<()> {
    if value.len() > DNS_SUBDOMAIN_MAX_LEN {
        return Err(ProvisionError::InvalidName(format!(
            "'{}' is longer than {} characters",
            value, DNS_SUBDOMAIN_MAX_LEN
        )));
    }

    value
        .split('.')
        .try_for_each(validate_dns_label)
        .map_err(|_| {
            ProvisionError::InvalidName(format!("'{}' is not a valid resource name", value))
        })
}
