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

//! Ephemeral container registry fixture for integration tests.
//!
//! # Example
//!
//! ```ignore
//! use registry_harness::harness::setup_registry_at;
//! use registry_harness::require_registry;
//!
//! #[tokio::test]
//! async fn pushes_an_image() {
//!     // Skips (returns early) when the `registry` binary is not installed.
//!     let mut registry = require_registry!(setup_registry_at("127.0.0.1:5000", true, false));
//!
//!     registry.ping().await.unwrap();
//!     let user = registry.username().unwrap();
//!     // ... run the code under test against registry.address() ...
//!
//!     registry.tear_down();
//! }
//! ```

pub mod config;
mod context;
mod error;
pub mod handle;
pub mod materializer;
mod port_reserver;
pub mod readiness;
mod setup;

pub use config::{Credentials, ProbePolicy, RegistryVariant, TestRegistryConfig};
pub use context::ScratchDir;
pub use error::RegistryError;
pub use handle::{InstanceState, RegistryHandle};
pub use materializer::{MaterializedConfig, RegistryDocument, materialize};
pub use port_reserver::PortReservation;
pub use readiness::{PingStatus, ReadinessProber};
pub use setup::{SetupOutcome, setup_registry, setup_registry_at, try_setup_registry};
