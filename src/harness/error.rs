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

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Registry binary '{binary}' was not found on the executable search path")]
    BinaryNotFound { binary: String },
    #[error("Failed to spawn {binary}: {source}")]
    ProcessSpawn {
        binary: String,
        #[source]
        source: io::Error,
    },
    #[error(
        "{binary} exited before becoming ready (exit code {exit_code:?})\n=== STDOUT ===\n{stdout}\n=== STDERR ===\n{stderr}"
    )]
    ProcessExited {
        binary: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    #[error("Filesystem error for {path:?}: {source}")]
    FileSystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to render registry config {path:?}: {source}")]
    ConfigRender {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Failed to hash password for user '{username}': {message}")]
    CredentialHash { username: String, message: String },
    #[error("Failed to build HTTP client for readiness probes: {source}")]
    HttpClient {
        #[source]
        source: reqwest::Error,
    },
    #[error("Registry ping to {url} failed: {source}")]
    PingTransport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Registry ping to {url} replied with an unexpected status code {status}")]
    UnexpectedStatus { url: String, status: u16 },
    #[error(
        "Timeout waiting for test registry at {address} to become available after {attempts} attempts{}",
        .last_error.as_ref().map(|e| format!(": {e}")).unwrap_or_default()
    )]
    ReadinessTimeout {
        address: String,
        attempts: u32,
        last_error: Option<String>,
    },
    #[error("Invalid value for {var}: {message}")]
    InvalidEnvOverride { var: String, message: String },
    #[error("Failed to reserve a loopback port: {message}")]
    PortReservation { message: String },
    #[error("Registry instance has already been torn down")]
    TornDown,
}

impl RegistryError {
    /// True when the failure means a prerequisite tool is absent from the host,
    /// so the dependent test should be skipped rather than failed.
    pub fn is_environment_missing(&self) -> bool {
        matches!(self, RegistryError::BinaryNotFound { .. })
    }

    /// Classifies a spawn failure, separating a missing executable from a broken one.
    pub(crate) fn from_spawn(binary: &str, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            RegistryError::BinaryNotFound {
                binary: binary.to_string(),
            }
        } else {
            RegistryError::ProcessSpawn {
                binary: binary.to_string(),
                source,
            }
        }
    }
}
