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

use registry_harness::harness::config::resolve::is_cleanup_disabled_by_env;
use registry_harness::harness::{
    RegistryError, RegistryHandle, SetupOutcome, TestRegistryConfig, setup_registry,
    try_setup_registry,
};
use registry_harness::require_registry;
use std::path::Path;
use tempfile::TempDir;

const MISSING_BINARY: &str = "registry-harness-definitely-missing-binary";

fn missing_binary_config(scratch_parent: &Path) -> TestRegistryConfig {
    TestRegistryConfig::builder()
        .executable_path(MISSING_BINARY)
        .scratch_parent(scratch_parent.to_path_buf())
        .build()
}

fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path).unwrap().next().is_none()
}

#[tokio::test]
async fn should_report_environment_missing_without_leaking_scratch() {
    let parent = TempDir::new().unwrap();

    let err = RegistryHandle::launch(missing_binary_config(parent.path())).unwrap_err();

    assert!(err.is_environment_missing(), "unexpected error: {err}");
    assert!(matches!(err, RegistryError::BinaryNotFound { ref binary } if binary == MISSING_BINARY));
    if !is_cleanup_disabled_by_env() {
        assert!(is_empty_dir(parent.path()));
    }
}

#[tokio::test]
async fn should_skip_instead_of_failing() {
    let parent = TempDir::new().unwrap();

    let outcome = try_setup_registry(missing_binary_config(parent.path()))
        .await
        .unwrap();
    assert!(matches!(outcome, SetupOutcome::Skipped(_)));

    assert!(setup_registry(missing_binary_config(parent.path())).await.is_none());
}

#[tokio::test]
async fn should_return_early_from_require_registry() {
    let parent = TempDir::new().unwrap();
    let mut reached = false;

    async fn body(parent: &Path, reached: &mut bool) {
        let _registry = require_registry!(setup_registry(missing_binary_config(parent)));
        *reached = true;
    }
    body(parent.path(), &mut reached).await;

    assert!(!reached);
}

#[cfg(unix)]
#[tokio::test]
async fn should_fail_hard_when_binary_is_not_executable() {
    use std::os::unix::fs::PermissionsExt;

    let parent = TempDir::new().unwrap();
    let binary = parent.path().join("registry");
    std::fs::write(&binary, "not a program").unwrap();
    std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o644)).unwrap();

    let config = TestRegistryConfig::builder()
        .executable_path(binary.display().to_string())
        .build();
    let err = try_setup_registry(config).await.unwrap_err();

    assert!(!err.is_environment_missing());
    assert!(matches!(err, RegistryError::ProcessSpawn { .. }), "unexpected error: {err}");
}
