// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace lookups and creation

use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{ObjectMeta, PostParams},
    Api, Client,
};
use tracing::{debug, info, instrument};

use crate::constants::FIELD_MANAGER;
use crate::kubernetes::control_plane::Presence;

/// Look a namespace up; only a 404 counts as absent
#[instrument(skip(client))]
pub async fn namespace_presence(client: &Client, name: &str) -> Result<Presence, kube::Error> {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    match namespaces.get(name).await {
        Ok(_) => {
            debug!("Namespace {} already exists", name);
            Ok(Presence::Present)
        }
        Err(kube::Error::Api(err)) if err.code == 404 => {
            debug!("Namespace {} does not exist", name);
            Ok(Presence::Absent)
        }
        Err(e) => Err(e),
    }
}

/// Create a namespace with no labels or annotations
#[instrument(skip(client))]
pub async fn create_namespace(client: &Client, name: &str) -> Result<(), kube::Error> {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    info!("Creating namespace {}", name);
    let ns = Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    let pp = PostParams {
        field_manager: Some(FIELD_MANAGER.to_string()),
        ..Default::default()
    };
    namespaces.create(&pp, &ns).await?;
    info!("Namespace {} created successfully", name);
    Ok(())
}
