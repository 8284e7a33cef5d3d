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

use super::{fake_registry_config, start_fake_registry};
use registry_harness::harness::{Credentials, PingStatus, RegistryDocument, RegistryHandle};
use reqwest::StatusCode;

async fn v2_status(registry: &RegistryHandle, user: Option<(&str, &str)>) -> StatusCode {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let mut request = client.get(format!("{}/v2/", registry.url()));
    if let Some((username, password)) = user {
        request = request.basic_auth(username, Some(password));
    }
    request.send().await.unwrap().status()
}

#[tokio::test]
async fn should_report_auth_required_when_enabled() {
    let mut registry = start_fake_registry(true).await;

    assert!(registry.auth_enabled());
    assert_eq!(registry.ping().await.unwrap(), PingStatus::AuthRequired);
    assert_eq!(registry.username(), Some("testuser"));
    assert_eq!(registry.password(), Some("testpassword"));
    assert_eq!(registry.email(), Some("test@test.org"));
}

#[tokio::test]
async fn should_reference_written_htpasswd_from_config() {
    let registry = start_fake_registry(true).await;

    let htpasswd_path = registry.htpasswd_path().unwrap();
    let document = RegistryDocument::load(registry.config_path()).unwrap();
    let auth = document.auth.unwrap();
    assert_eq!(auth.htpasswd.realm, "basic-realm");
    assert_eq!(auth.htpasswd.path, htpasswd_path);

    let htpasswd = std::fs::read_to_string(htpasswd_path).unwrap();
    let first_line = htpasswd.lines().next().unwrap();
    assert!(first_line.starts_with("testuser:"));
    assert!(!first_line.contains(registry.password().unwrap()));
}

#[tokio::test]
async fn should_authorize_written_credentials() {
    let registry = start_fake_registry(true).await;
    let username = registry.username().unwrap();
    let password = registry.password().unwrap();

    assert_eq!(v2_status(&registry, None).await, StatusCode::UNAUTHORIZED);
    assert_eq!(
        v2_status(&registry, Some((username, password))).await,
        StatusCode::OK
    );
    assert_eq!(
        v2_status(&registry, Some((username, "wrong-password"))).await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn should_authorize_custom_credentials() {
    let credentials = Credentials::new("alice", "wonderland", "alice@example.org").unwrap();
    let mut config = fake_registry_config(true, &[]);
    config.credentials = credentials.clone();

    let registry = RegistryHandle::start(config).await.unwrap();

    assert_eq!(registry.credentials(), Some(&credentials));
    assert_eq!(
        v2_status(&registry, Some(("alice", "wonderland"))).await,
        StatusCode::OK
    );
    assert_eq!(
        v2_status(&registry, Some(("testuser", "testpassword"))).await,
        StatusCode::UNAUTHORIZED
    );
}
