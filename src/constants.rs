// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Kubernetes annotation keys written by pgprovision
pub mod annotations {
    /// Same key `kubectl create --save-config` writes, so later applies diff against it
    pub const LAST_APPLIED: &str = "kubectl.kubernetes.io/last-applied-configuration";
}

/// Field manager recorded on every create and replace
pub const FIELD_MANAGER: &str = "pgprovision";

/// Control-plane call limits
pub mod calls {
    /// Default timeout for a single control-plane call
    pub const TIMEOUT_SECS: u64 = 30;
    /// Default number of extra attempts after a transient failure
    pub const MAX_RETRIES: u32 = 2;
    /// First backoff delay in milliseconds
    pub const BACKOFF_INITIAL_MILLIS: u64 = 500;
    /// Backoff cap in milliseconds (exponential backoff cap)
    pub const BACKOFF_MAX_MILLIS: u64 = 5_000;
}
