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

use crate::harness::config::resolve::is_cleanup_disabled_by_env;
use crate::harness::error::RegistryError;
use std::path::{Path, PathBuf};
use std::thread;
use tempfile::{Builder, TempDir};
use tracing::info;

const SCRATCH_PREFIX: &str = "registry-";

/// Private per-instance directory holding the rendered config, the htpasswd
/// file, captured output and the registry's own storage.
///
/// Removal is delegated to [`TempDir`]; the directory is kept instead when
/// cleanup is disabled or the owner is dropped while panicking.
#[derive(Debug)]
pub struct ScratchDir {
    dir: Option<TempDir>,
    path: PathBuf,
    cleanup: bool,
}

impl ScratchDir {
    pub fn new(parent: Option<&Path>, cleanup: bool) -> Result<Self, RegistryError> {
        let mut builder = Builder::new();
        builder.prefix(SCRATCH_PREFIX);
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .map_err(|source| RegistryError::FileSystem {
            path: parent.map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir),
            source,
        })?;
        let path = dir.path().to_path_buf();

        Ok(Self {
            dir: Some(dir),
            path,
            cleanup,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stdout_log_path(&self) -> PathBuf {
        self.path.join("registry_stdout.log")
    }

    pub fn stderr_log_path(&self) -> PathBuf {
        self.path.join("registry_stderr.log")
    }

    pub fn set_cleanup(&mut self, cleanup: bool) {
        self.cleanup = cleanup;
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        if !self.cleanup || is_cleanup_disabled_by_env() || thread::panicking() {
            let kept = dir.keep();
            info!("Keeping registry scratch directory {}", kept.display());
        }
    }
}
