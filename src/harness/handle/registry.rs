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

use super::common;
use super::launcher::{self, LaunchSpec};
use crate::harness::config::resolve::{is_verbose, resolve_executable, resolve_probe_policy};
use crate::harness::config::{Credentials, TestRegistryConfig};
use crate::harness::context::ScratchDir;
use crate::harness::error::RegistryError;
use crate::harness::materializer::{self, MaterializedConfig};
use crate::harness::port_reserver::PortReservation;
use crate::harness::readiness::{PingStatus, ReadinessProber};
use std::path::{Path, PathBuf};
use std::process::Child;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    /// Launched, no successful probe yet.
    Pending,
    /// At least one probe succeeded.
    Ready,
    /// Termination requested; only `tear_down` remains valid.
    TornDown,
}

/// A running registry process owned by one test.
///
/// Dropping the handle tears the process down.
pub struct RegistryHandle {
    binary: String,
    label: String,
    address: String,
    credentials: Option<Credentials>,
    materialized: MaterializedConfig,
    child: Child,
    state: InstanceState,
    prober: ReadinessProber,
    stdout_path: Option<PathBuf>,
    stderr_path: Option<PathBuf>,
    // Declared last so it is removed only after the process has been killed.
    scratch: ScratchDir,
}

impl std::fmt::Debug for RegistryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryHandle")
            .field("address", &self.address)
            .field("pid", &self.child.id())
            .field("state", &self.state)
            .field("auth", &self.credentials.is_some())
            .finish_non_exhaustive()
    }
}

impl RegistryHandle {
    /// Launches a registry and waits until it answers the liveness probe.
    pub async fn start(config: TestRegistryConfig) -> Result<Self, RegistryError> {
        let mut handle = Self::launch(config)?;
        handle.wait_ready().await?;
        Ok(handle)
    }

    /// Materializes the config and starts the process without waiting for
    /// readiness. Nothing is left running if this fails.
    pub fn launch(config: TestRegistryConfig) -> Result<Self, RegistryError> {
        let policy = resolve_probe_policy(config.probe)?;
        let binary = resolve_executable(config.variant, config.executable_path.as_deref());
        let scratch = ScratchDir::new(config.scratch_parent.as_deref(), config.cleanup)?;

        let (address, reservation) = match config.address {
            Some(address) => (address, None),
            None => {
                let reservation = PortReservation::loopback()?;
                (reservation.address().to_string(), Some(reservation))
            }
        };
        let credentials = config.auth.then_some(config.credentials);

        let materialized = materializer::materialize(
            scratch.path(),
            &address,
            &config.log_level,
            credentials.as_ref(),
        )?;
        let prober = ReadinessProber::new(&address, policy)?;
        let label = format!("registry-{address}");

        if let Some(reservation) = reservation {
            reservation.release();
        }

        let launched = launcher::launch(LaunchSpec {
            binary: &binary,
            args: config.variant.args(&materialized.config_path),
            label: &label,
            envs: &config.extra_envs,
            bind_to_parent: config.bind_to_parent,
            verbose: is_verbose(),
            stdout_path: scratch.stdout_log_path(),
            stderr_path: scratch.stderr_log_path(),
        })?;

        Ok(Self {
            binary,
            label,
            address,
            credentials,
            materialized,
            child: launched.child,
            state: InstanceState::Pending,
            prober,
            stdout_path: launched.stdout_path,
            stderr_path: launched.stderr_path,
            scratch,
        })
    }

    /// Polls the liveness endpoint with the configured budget. Fails early if
    /// the process exits before it ever answers.
    pub async fn wait_ready(&mut self) -> Result<PingStatus, RegistryError> {
        self.ensure_alive_handle()?;

        let child = &mut self.child;
        let binary = &self.binary;
        let stdout_path = self.stdout_path.as_deref();
        let stderr_path = self.stderr_path.as_deref();
        let status = self
            .prober
            .wait_ready(|| match child.try_wait() {
                Ok(Some(exit)) => {
                    let (stdout, stderr) = common::collect_logs(stdout_path, stderr_path);
                    Err(RegistryError::ProcessExited {
                        binary: binary.clone(),
                        exit_code: exit.code(),
                        stdout,
                        stderr,
                    })
                }
                _ => Ok(()),
            })
            .await?;

        info!("Test registry {} is ready ({status:?})", self.label);
        self.state = InstanceState::Ready;
        Ok(status)
    }

    /// One liveness probe, no retries.
    pub async fn ping(&mut self) -> Result<PingStatus, RegistryError> {
        self.ensure_alive_handle()?;
        let status = self.prober.ping().await?;
        self.state = InstanceState::Ready;
        Ok(status)
    }

    /// Requests termination. Safe to call any number of times; failures of
    /// the kill request are logged and otherwise ignored.
    pub fn tear_down(&mut self) {
        if self.state == InstanceState::TornDown {
            return;
        }
        common::kill_best_effort(&mut self.child, &self.label);
        self.state = InstanceState::TornDown;
        info!("Test registry {} torn down", self.label);
    }

    pub fn state(&self) -> InstanceState {
        self.state
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.address)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    pub fn assert_running(&mut self) {
        if !self.is_running() {
            let (stdout, stderr) = self.collect_logs();
            panic!(
                "Registry process (pid {}) has exited\n\n\
                 === STDOUT ===\n{}\n\n\
                 === STDERR ===\n{}",
                self.pid(),
                stdout,
                stderr
            );
        }
    }

    pub fn auth_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn username(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.username.as_str())
    }

    pub fn password(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.password.as_str())
    }

    pub fn email(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.email.as_str())
    }

    pub fn config_path(&self) -> &Path {
        &self.materialized.config_path
    }

    pub fn htpasswd_path(&self) -> Option<&Path> {
        self.materialized.htpasswd_path.as_deref()
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    pub fn collect_logs(&self) -> (String, String) {
        common::collect_logs(self.stdout_path.as_deref(), self.stderr_path.as_deref())
    }

    /// Keep the scratch directory after drop, e.g. to inspect a failure.
    pub fn keep_scratch_dir(&mut self) {
        self.scratch.set_cleanup(false);
    }

    fn ensure_alive_handle(&self) -> Result<(), RegistryError> {
        if self.state == InstanceState::TornDown {
            return Err(RegistryError::TornDown);
        }
        Ok(())
    }
}

impl Drop for RegistryHandle {
    fn drop(&mut self) {
        self.tear_down();
        common::reap_briefly(&mut self.child, &self.label);
        common::dump_logs_on_panic(
            &self.label,
            self.stdout_path.as_deref(),
            self.stderr_path.as_deref(),
        );
    }
}
