// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Reconcilers that converge single resources towards a desired payload.

pub mod resource;

pub use resource::{ConflictPolicy, ReconcileOutcome, Reconciler, SkipReason};
