// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource vectors and quota math

use serde::{Deserialize, Serialize};
use std::fmt;

/// A `{cpu, ram, disk}` resource vector. RAM and disk are MiB.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    pub cpu: f64,
    pub ram_mb: u64,
    pub disk_mb: u64,
}

impl Resources {
    /// Launch-time defaults, applied where a profile leaves a field blank.
    pub const DEFAULT: Resources = Resources { cpu: 1.0, ram_mb: 512, disk_mb: 1024 };

    pub fn new(cpu: f64, ram_mb: u64, disk_mb: u64) -> Self {
        Self { cpu, ram_mb, disk_mb }
    }

    /// Whether this (offered) vector covers `required` on every axis.
    pub fn satisfies(&self, required: &Resources) -> bool {
        self.cpu >= required.cpu
            && self.ram_mb >= required.ram_mb
            && self.disk_mb >= required.disk_mb
    }
}

impl Default for Resources {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Resources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cpu={} ram={}MiB disk={}MiB", self.cpu, self.ram_mb, self.disk_mb)
    }
}

/// A per-role resource envelope reported by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quota {
    pub available: Resources,
    pub usage: Resources,
}

impl Quota {
    /// Whether the quota admits an additional request.
    ///
    /// A zero `available` axis means "unmetered": that axis is skipped.
    pub fn admits(&self, request: &Resources) -> bool {
        let cpu_ok =
            self.available.cpu == 0.0 || self.usage.cpu + request.cpu <= self.available.cpu;
        let ram_ok = self.available.ram_mb == 0
            || self.usage.ram_mb + request.ram_mb <= self.available.ram_mb;
        let disk_ok = self.available.disk_mb == 0
            || self.usage.disk_mb + request.disk_mb <= self.available.disk_mb;
        cpu_ok && ram_ok && disk_ok
    }
}

#[cfg(test)]
#[path = "resources_tests.rs"]
mod tests;
