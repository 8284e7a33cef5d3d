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

use super::common::{Credentials, RegistryVariant};
use super::probe::ProbePolicy;
use bon::Builder;
use std::collections::HashMap;
use std::path::PathBuf;

pub const DEFAULT_LOG_LEVEL: &str = "debug";

#[derive(Debug, Clone, Builder)]
pub struct TestRegistryConfig {
    /// `host:port` to serve on. Not checked for collisions; when unset a free
    /// loopback port is reserved.
    #[builder(into)]
    pub address: Option<String>,
    #[builder(default)]
    pub auth: bool,
    #[builder(default)]
    pub credentials: Credentials,
    #[builder(default)]
    pub variant: RegistryVariant,
    #[builder(into)]
    pub executable_path: Option<String>,
    #[builder(default)]
    pub probe: ProbePolicy,
    #[builder(default = DEFAULT_LOG_LEVEL.to_string(), into)]
    pub log_level: String,
    #[builder(into)]
    pub scratch_parent: Option<PathBuf>,
    #[builder(default = true)]
    pub cleanup: bool,
    #[builder(default = true)]
    pub bind_to_parent: bool,
    #[builder(default)]
    pub extra_envs: HashMap<String, String>,
}

impl TestRegistryConfig {
    pub fn at(address: impl Into<String>, auth: bool, schema1: bool) -> Self {
        let variant = if schema1 {
            RegistryVariant::Schema1
        } else {
            RegistryVariant::Current
        };
        Self::builder()
            .address(address)
            .auth(auth)
            .variant(variant)
            .build()
    }
}

impl Default for TestRegistryConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
