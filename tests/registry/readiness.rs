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

use super::{fake_registry_config, quick_probe};
use registry_harness::harness::{InstanceState, PingStatus, RegistryError, RegistryHandle};
use std::time::{Duration, Instant};

#[tokio::test]
async fn should_give_up_within_budget_when_never_listening() {
    let mut config = fake_registry_config(false, &[("FAKE_REGISTRY_MODE", "silent")]);
    config.probe = quick_probe(10);

    let started = Instant::now();
    let err = RegistryHandle::start(config).await.unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(5));
    match err {
        RegistryError::ReadinessTimeout {
            attempts,
            last_error,
            ..
        } => {
            assert!((1..=10).contains(&attempts), "attempts: {attempts}");
            assert!(last_error.is_some());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn should_keep_retrying_on_error_status() {
    let mut config = fake_registry_config(false, &[("FAKE_REGISTRY_MODE", "unavailable")]);
    config.probe = quick_probe(6);

    let mut registry = RegistryHandle::launch(config).unwrap();
    let err = registry.wait_ready().await.unwrap_err();

    match err {
        RegistryError::ReadinessTimeout {
            attempts,
            last_error: Some(last_error),
            ..
        } => {
            assert!((1..=6).contains(&attempts), "attempts: {attempts}");
            assert!(last_error.contains("503"), "last error: {last_error}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(registry.state(), InstanceState::Pending);
    assert!(matches!(
        registry.ping().await,
        Err(RegistryError::UnexpectedStatus { status: 503, .. })
    ));
}

#[tokio::test]
async fn should_wait_for_delayed_listener() {
    let config = fake_registry_config(false, &[("FAKE_REGISTRY_STARTUP_DELAY_MS", "500")]);

    let mut registry = RegistryHandle::launch(config).unwrap();
    let status = registry.wait_ready().await.unwrap();

    assert_eq!(status, PingStatus::Serving);
    assert_eq!(registry.state(), InstanceState::Ready);
}

#[tokio::test]
async fn should_fail_fast_when_process_exits() {
    let config = fake_registry_config(false, &[("FAKE_REGISTRY_MODE", "exit")]);

    let started = Instant::now();
    let err = RegistryHandle::start(config).await.unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(5));
    match err {
        RegistryError::ProcessExited { exit_code, .. } => assert_eq!(exit_code, Some(3)),
        other => panic!("unexpected error: {other}"),
    }
}
