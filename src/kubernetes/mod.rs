// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes access: the control-plane seam, its API-backed implementation,
//! client creation and retries.

pub mod client;
pub mod cluster;
pub mod control_plane;
pub mod namespaces;
pub mod retry;

pub use client::create_client;
pub use cluster::KubeControlPlane;
pub use control_plane::{ControlPlane, Presence};
pub use retry::RetryPolicy;
