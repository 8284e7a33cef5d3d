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

use crate::harness::error::RegistryError;
use std::ffi::OsString;
use std::path::Path;

pub const REGISTRY_BINARY: &str = "registry";
pub const REGISTRY_SCHEMA1_BINARY: &str = "registry-v2-schema1";

pub const TEST_USERNAME: &str = "testuser";
pub const TEST_PASSWORD: &str = "testpassword";
pub const TEST_EMAIL: &str = "test@test.org";
/// bcrypt hash of [`TEST_PASSWORD`], cost 5.
pub const TEST_PASSWORD_HASH: &str =
    "$2y$05$sBsSqk0OpSD1uTZkHXc4FeJ0Z70wLQdAX/82UiHuQOKbNbBrzs63m";

const CUSTOM_HASH_COST: u32 = 5;

/// Which registry build to run. The legacy build speaks schema1 manifests
/// and takes the config path as its only argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistryVariant {
    #[default]
    Current,
    Schema1,
}

impl RegistryVariant {
    pub fn default_binary(self) -> &'static str {
        match self {
            RegistryVariant::Current => REGISTRY_BINARY,
            RegistryVariant::Schema1 => REGISTRY_SCHEMA1_BINARY,
        }
    }

    pub fn args(self, config_path: &Path) -> Vec<OsString> {
        match self {
            RegistryVariant::Current => vec!["serve".into(), config_path.as_os_str().to_owned()],
            RegistryVariant::Schema1 => vec![config_path.as_os_str().to_owned()],
        }
    }
}

/// Basic-auth identity for a registry with htpasswd auth enabled.
///
/// The plaintext fields are kept for test assertions; only `password_hash`
/// is ever written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub email: String,
    pub password_hash: String,
}

impl Credentials {
    /// The fixed identity used by the registry test suites.
    pub fn test_user() -> Self {
        Self {
            username: TEST_USERNAME.to_string(),
            password: TEST_PASSWORD.to_string(),
            email: TEST_EMAIL.to_string(),
            password_hash: TEST_PASSWORD_HASH.to_string(),
        }
    }

    /// Creates credentials for a custom user, bcrypt-hashing the password.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        let username = username.into();
        let password = password.into();
        let password_hash = bcrypt::hash(&password, CUSTOM_HASH_COST).map_err(|e| {
            RegistryError::CredentialHash {
                username: username.clone(),
                message: e.to_string(),
            }
        })?;

        Ok(Self {
            username,
            password,
            email: email.into(),
            password_hash,
        })
    }

    pub fn htpasswd_line(&self) -> String {
        format!("{}:{}", self.username, self.password_hash)
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::test_user()
    }
}
