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

use bon::Builder;
use std::time::Duration;

pub const DEFAULT_PROBE_ATTEMPTS: u32 = 50;
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_PROBE_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Fixed-interval readiness polling. There is no backoff: the delay between
/// attempts never grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder)]
pub struct ProbePolicy {
    #[builder(default = DEFAULT_PROBE_ATTEMPTS)]
    pub attempts: u32,
    #[builder(default = DEFAULT_PROBE_INTERVAL)]
    pub interval: Duration,
    /// Upper bound for a single probe request, so a listener that accepts
    /// connections but never answers still counts as a failed attempt.
    #[builder(default = DEFAULT_PROBE_REQUEST_TIMEOUT)]
    pub request_timeout: Duration,
}

impl ProbePolicy {
    /// Sum of inter-attempt delays, excluding request time.
    pub fn budget(&self) -> Duration {
        self.interval * self.attempts.saturating_sub(1)
    }

    /// Hard upper bound for a whole readiness wait: the inter-attempt delays
    /// plus one interval shared by all request time. Requests are cut short
    /// to fit inside it.
    pub fn window(&self) -> Duration {
        self.interval * self.attempts
    }
}

impl Default for ProbePolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}
