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

//! Renders the registry configuration document and its htpasswd file.
//!
//! The document is a typed structure serialized as YAML, so values such as
//! paths and addresses never need escaping. Validation of the semantics is
//! left to the registry itself at startup.

use crate::harness::config::Credentials;
use crate::harness::error::RegistryError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.yaml";
pub const HTPASSWD_FILE_NAME: &str = "htpasswd";
pub const CONFIG_VERSION: &str = "0.1";
pub const HTPASSWD_REALM: &str = "basic-realm";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDocument {
    pub version: String,
    pub loglevel: String,
    pub storage: StorageSection,
    pub http: HttpSection,
    pub compatibility: CompatibilitySection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSection {
    pub filesystem: FilesystemStorage,
    pub delete: Toggle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesystemStorage {
    pub rootdirectory: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toggle {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSection {
    pub addr: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilitySection {
    pub schema1: Toggle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSection {
    pub htpasswd: HtpasswdAuth,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtpasswdAuth {
    pub realm: String,
    pub path: PathBuf,
}

impl RegistryDocument {
    /// Builds the document the test suites rely on: filesystem storage with
    /// deletes enabled and schema1 compatibility switched on.
    pub fn new(root: &Path, address: &str, log_level: &str, htpasswd: Option<&Path>) -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            loglevel: log_level.to_string(),
            storage: StorageSection {
                filesystem: FilesystemStorage {
                    rootdirectory: root.to_path_buf(),
                },
                delete: Toggle { enabled: true },
            },
            http: HttpSection {
                addr: address.to_string(),
            },
            compatibility: CompatibilitySection {
                schema1: Toggle { enabled: true },
            },
            auth: htpasswd.map(|path| AuthSection {
                htpasswd: HtpasswdAuth {
                    realm: HTPASSWD_REALM.to_string(),
                    path: path.to_path_buf(),
                },
            }),
        }
    }

    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let raw = fs::read_to_string(path).map_err(|source| RegistryError::FileSystem {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| RegistryError::ConfigRender {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Files written for one registry instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedConfig {
    pub config_path: PathBuf,
    pub htpasswd_path: Option<PathBuf>,
}

/// Writes the htpasswd file (when `credentials` is given) and the config
/// document into `root`. Any write failure aborts with no partial result.
pub fn materialize(
    root: &Path,
    address: &str,
    log_level: &str,
    credentials: Option<&Credentials>,
) -> Result<MaterializedConfig, RegistryError> {
    let htpasswd_path = credentials
        .map(|credentials| write_htpasswd(root, credentials))
        .transpose()?;

    let document = RegistryDocument::new(root, address, log_level, htpasswd_path.as_deref());
    let config_path = root.join(CONFIG_FILE_NAME);
    let rendered =
        serde_yaml::to_string(&document).map_err(|source| RegistryError::ConfigRender {
            path: config_path.clone(),
            source,
        })?;
    write_file(&config_path, &rendered)?;

    Ok(MaterializedConfig {
        config_path,
        htpasswd_path,
    })
}

fn write_htpasswd(root: &Path, credentials: &Credentials) -> Result<PathBuf, RegistryError> {
    let path = root.join(HTPASSWD_FILE_NAME);
    write_file(&path, &format!("{}\n", credentials.htpasswd_line()))?;
    Ok(path)
}

fn write_file(path: &Path, contents: &str) -> Result<(), RegistryError> {
    fs::write(path, contents).map_err(|source| RegistryError::FileSystem {
        path: path.to_path_buf(),
        source,
    })
}
