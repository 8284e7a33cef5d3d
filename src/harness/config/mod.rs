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

mod common;
mod probe;
mod registry;
pub mod resolve;

pub use common::{
    Credentials, REGISTRY_BINARY, REGISTRY_SCHEMA1_BINARY, RegistryVariant, TEST_EMAIL,
    TEST_PASSWORD, TEST_PASSWORD_HASH, TEST_USERNAME,
};
pub use probe::{
    DEFAULT_PROBE_ATTEMPTS, DEFAULT_PROBE_INTERVAL, DEFAULT_PROBE_REQUEST_TIMEOUT, ProbePolicy,
};
pub use registry::{DEFAULT_LOG_LEVEL, TestRegistryConfig};
