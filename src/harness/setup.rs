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

use crate::harness::config::TestRegistryConfig;
use crate::harness::error::RegistryError;
use crate::harness::handle::RegistryHandle;
use tracing::warn;

/// Result of trying to bring up a registry for a test.
#[derive(Debug)]
pub enum SetupOutcome {
    Ready(RegistryHandle),
    /// The registry binary is not installed; the test is inconclusive.
    Skipped(RegistryError),
}

impl SetupOutcome {
    pub fn into_handle(self) -> Option<RegistryHandle> {
        match self {
            SetupOutcome::Ready(handle) => Some(handle),
            SetupOutcome::Skipped(_) => None,
        }
    }
}

/// Starts a registry, turning a missing binary into a skip.
///
/// Every other failure is returned as an error.
pub async fn try_setup_registry(config: TestRegistryConfig) -> Result<SetupOutcome, RegistryError> {
    match RegistryHandle::start(config).await {
        Ok(handle) => Ok(SetupOutcome::Ready(handle)),
        Err(err) if err.is_environment_missing() => {
            warn!("Skipping test: {err}");
            eprintln!("SKIPPED: {err}");
            Ok(SetupOutcome::Skipped(err))
        }
        Err(err) => Err(err),
    }
}

/// Starts a registry for the calling test. Returns `None` when the test
/// should be skipped.
///
/// # Panics
///
/// Panics on any failure other than a missing binary, failing the calling
/// test: it cannot proceed without a ready registry.
pub async fn setup_registry(config: TestRegistryConfig) -> Option<RegistryHandle> {
    match try_setup_registry(config).await {
        Ok(outcome) => outcome.into_handle(),
        Err(err) => panic!("Failed to start test registry: {err}"),
    }
}

/// Starts a registry on `address`, optionally with htpasswd auth and/or the
/// legacy schema1 build.
///
/// # Panics
///
/// See [`setup_registry`].
pub async fn setup_registry_at(
    address: impl Into<String>,
    auth: bool,
    schema1: bool,
) -> Option<RegistryHandle> {
    setup_registry(TestRegistryConfig::at(address, auth, schema1)).await
}

/// Evaluates a setup future and returns from the enclosing test when the
/// registry binary is unavailable.
///
/// ```ignore
/// let registry = require_registry!(setup_registry_at("127.0.0.1:5000", false, false));
/// ```
#[macro_export]
macro_rules! require_registry {
    ($setup:expr) => {
        match $setup.await {
            Some(registry) => registry,
            None => return,
        }
    };
}
