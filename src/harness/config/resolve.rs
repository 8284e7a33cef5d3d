/*
 * Licensed to the Apache Software Foundation (ASF) under one
 * or more contributor license agreements.  See the NOTICE file
 * distributed with this work for additional information
 * regarding copyright ownership.  The ASF licenses this file
 * to you under the Apache License, Version 2.0 (the
 * "License"); you may not use this file except in compliance
 * with the License.  You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing,
 * software distributed under the License is distributed on an
 * "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
 * KIND, either express or implied.  See the License for the
 * specific language governing permissions and limitations
 * under the License.
 */

//! Environment overrides applied on top of [`TestRegistryConfig`].
//!
//! [`TestRegistryConfig`]: super::TestRegistryConfig

use super::common::RegistryVariant;
use super::probe::ProbePolicy;
use crate::harness::error::RegistryError;
use std::time::Duration;

pub const REGISTRY_BINARY_ENV_VAR: &str = "REGISTRY_BINARY";
pub const REGISTRY_SCHEMA1_BINARY_ENV_VAR: &str = "REGISTRY_SCHEMA1_BINARY";
pub const PROBE_ATTEMPTS_ENV_VAR: &str = "REGISTRY_TEST_PROBE_ATTEMPTS";
pub const PROBE_INTERVAL_ENV_VAR: &str = "REGISTRY_TEST_PROBE_INTERVAL_MS";
/// When truthy, registry stdout/stderr go straight to the test's terminal.
/// That output is not prefixed per instance and no log files are written;
/// the launcher only logs the label and pid of each inheriting process.
pub const TEST_VERBOSITY_ENV_VAR: &str = "REGISTRY_TEST_VERBOSE";
pub const TEST_CLEANUP_DISABLED_ENV_VAR: &str = "REGISTRY_TEST_CLEANUP_DISABLED";

/// Picks the executable to launch: an explicit path wins, then the
/// per-variant environment override, then the well-known binary name.
pub fn resolve_executable(variant: RegistryVariant, explicit: Option<&str>) -> String {
    if let Some(path) = explicit {
        return path.to_string();
    }
    let var = match variant {
        RegistryVariant::Current => REGISTRY_BINARY_ENV_VAR,
        RegistryVariant::Schema1 => REGISTRY_SCHEMA1_BINARY_ENV_VAR,
    };
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| variant.default_binary().to_string())
}

pub fn resolve_probe_policy(base: ProbePolicy) -> Result<ProbePolicy, RegistryError> {
    let mut policy = base;
    if let Ok(raw) = std::env::var(PROBE_ATTEMPTS_ENV_VAR) {
        policy.attempts = parse_positive(PROBE_ATTEMPTS_ENV_VAR, &raw)? as u32;
    }
    if let Ok(raw) = std::env::var(PROBE_INTERVAL_ENV_VAR) {
        policy.interval = Duration::from_millis(parse_positive(PROBE_INTERVAL_ENV_VAR, &raw)?);
    }
    Ok(policy)
}

pub fn is_verbose() -> bool {
    std::env::var(TEST_VERBOSITY_ENV_VAR).is_ok()
}

pub fn is_cleanup_disabled_by_env() -> bool {
    std::env::var(TEST_CLEANUP_DISABLED_ENV_VAR)
        .map(|v| is_truthy(&v))
        .unwrap_or(false)
}

fn is_truthy(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "true" | "1")
}

fn parse_positive(var: &str, raw: &str) -> Result<u64, RegistryError> {
    let invalid = |message: &str| RegistryError::InvalidEnvOverride {
        var: var.to_string(),
        message: message.to_string(),
    };
    let value: u64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid("must be a positive integer"))?;
    if value == 0 {
        return Err(invalid("must be greater than zero"));
    }
    if value > u64::from(u32::MAX) {
        return Err(invalid("is too large"));
    }
    Ok(value)
}
