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

use crate::harness::config::ProbePolicy;
use crate::harness::error::RegistryError;
use reqwest::StatusCode;
use std::time::Duration;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, trace};

pub const LIVENESS_PATH: &str = "/v2/";

/// Outcome of a successful liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingStatus {
    /// `200 OK`, anonymous access.
    Serving,
    /// `401 Unauthorized`: the listener is up, access is gated behind auth.
    AuthRequired,
}

impl PingStatus {
    fn from_status(status: StatusCode) -> Option<Self> {
        match status {
            StatusCode::OK => Some(PingStatus::Serving),
            StatusCode::UNAUTHORIZED => Some(PingStatus::AuthRequired),
            _ => None,
        }
    }
}

pub fn liveness_url(address: &str) -> String {
    format!("http://{address}{LIVENESS_PATH}")
}

#[derive(Debug, Clone)]
pub struct ReadinessProber {
    client: reqwest::Client,
    address: String,
    url: String,
    policy: ProbePolicy,
}

impl ReadinessProber {
    pub fn new(address: &str, policy: ProbePolicy) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder()
            .timeout(policy.request_timeout)
            .no_proxy()
            .build()
            .map_err(|source| RegistryError::HttpClient { source })?;

        Ok(Self {
            client,
            address: address.to_string(),
            url: liveness_url(address),
            policy,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn policy(&self) -> ProbePolicy {
        self.policy
    }

    /// A single probe attempt. The response body is drained before returning
    /// so no connection is left half-read between attempts.
    pub async fn ping(&self) -> Result<PingStatus, RegistryError> {
        self.ping_within(self.policy.request_timeout).await
    }

    async fn ping_within(&self, timeout: Duration) -> Result<PingStatus, RegistryError> {
        let response = self
            .client
            .get(&self.url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|source| RegistryError::PingTransport {
                url: self.url.clone(),
                source,
            })?;
        let status = response.status();
        let _ = response.bytes().await;

        PingStatus::from_status(status).ok_or_else(|| RegistryError::UnexpectedStatus {
            url: self.url.clone(),
            status: status.as_u16(),
        })
    }

    /// Probes at a fixed interval until the registry answers, the attempt
    /// budget runs out, or [`ProbePolicy::window`] has elapsed. Connection
    /// errors and unexpected statuses both just count as "not ready yet".
    ///
    /// `still_running` is consulted before every attempt and once more before
    /// giving up; an error from it (the child exited) ends the wait.
    pub async fn wait_ready<F>(&self, mut still_running: F) -> Result<PingStatus, RegistryError>
    where
        F: FnMut() -> Result<(), RegistryError>,
    {
        let deadline = Instant::now() + self.policy.window();
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.policy.attempts {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            still_running()?;
            attempts += 1;

            match self
                .ping_within(remaining.min(self.policy.request_timeout))
                .await
            {
                Ok(status) => {
                    debug!(
                        "Registry at {} ready after {attempts} attempt(s): {status:?}",
                        self.address
                    );
                    return Ok(status);
                }
                Err(e) => {
                    trace!("Registry at {} not ready (attempt {attempts}): {e}", self.address);
                    last_error = Some(e.to_string());
                }
            }

            if attempts < self.policy.attempts {
                sleep_until(deadline.min(Instant::now() + self.policy.interval)).await;
            }
        }

        still_running()?;
        Err(RegistryError::ReadinessTimeout {
            address: self.address.clone(),
            attempts,
            last_error,
        })
    }
}
