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

use super::common;
use crate::harness::error::RegistryError;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use tracing::{debug, info};

pub const OUTPUT_TARGET: &str = "registry_harness::output";

pub struct LaunchSpec<'a> {
    pub binary: &'a str,
    pub args: Vec<OsString>,
    /// Diagnostic label, `registry-<address>`.
    pub label: &'a str,
    pub envs: &'a HashMap<String, String>,
    pub bind_to_parent: bool,
    /// Inherit stdio instead of relaying it into the log files.
    pub verbose: bool,
    pub stdout_path: PathBuf,
    pub stderr_path: PathBuf,
}

pub struct LaunchedProcess {
    pub child: Child,
    pub stdout_path: Option<PathBuf>,
    pub stderr_path: Option<PathBuf>,
}

/// Starts the registry. Returns once the OS has created the child, not once
/// it is serving.
pub fn launch(spec: LaunchSpec<'_>) -> Result<LaunchedProcess, RegistryError> {
    let mut command = Command::new(spec.binary);
    command.args(&spec.args).envs(spec.envs).stdin(Stdio::null());

    if spec.bind_to_parent {
        bind_lifecycle_to_parent(&mut command);
    }

    if spec.verbose {
        command.stdout(Stdio::inherit());
        command.stderr(Stdio::inherit());
        let child = command
            .spawn()
            .map_err(|e| RegistryError::from_spawn(spec.binary, e))?;
        info!(
            target: OUTPUT_TARGET,
            instance = %spec.label,
            pid = child.id(),
            "Launched {} with inherited stdio; its output below is unlabelled",
            spec.binary
        );
        return Ok(LaunchedProcess {
            child,
            stdout_path: None,
            stderr_path: None,
        });
    }

    let stdout_file = create_log(&spec.stdout_path)?;
    let stderr_file = create_log(&spec.stderr_path)?;
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    let mut child = command
        .spawn()
        .map_err(|e| RegistryError::from_spawn(spec.binary, e))?;
    info!("Launched {} (pid {}) as {}", spec.binary, child.id(), spec.label);

    let relays = [
        child
            .stdout
            .take()
            .map(|pipe| spawn_relay(pipe, stdout_file, spec.label, "stdout")),
        child
            .stderr
            .take()
            .map(|pipe| spawn_relay(pipe, stderr_file, spec.label, "stderr")),
    ];
    for relay in relays.into_iter().flatten() {
        if let Err(source) = relay {
            common::kill_best_effort(&mut child, spec.label);
            return Err(RegistryError::ProcessSpawn {
                binary: spec.binary.to_string(),
                source,
            });
        }
    }

    Ok(LaunchedProcess {
        child,
        stdout_path: Some(spec.stdout_path),
        stderr_path: Some(spec.stderr_path),
    })
}

fn create_log(path: &Path) -> Result<File, RegistryError> {
    File::create(path).map_err(|source| RegistryError::FileSystem {
        path: path.to_path_buf(),
        source,
    })
}

/// Copies child output line by line into `sink` and the tracing output
/// target. The thread ends when the child closes the pipe.
fn spawn_relay<R>(
    pipe: R,
    mut sink: File,
    label: &str,
    stream: &'static str,
) -> std::io::Result<thread::JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    let label = label.to_string();
    thread::Builder::new()
        .name(format!("{label}-{stream}"))
        .spawn(move || {
            let mut reader = BufReader::new(pipe);
            let mut line = Vec::new();
            loop {
                line.clear();
                match reader.read_until(b'\n', &mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        let _ = sink.write_all(&line);
                        let text = String::from_utf8_lossy(&line);
                        debug!(
                            target: OUTPUT_TARGET,
                            instance = %label,
                            stream,
                            "{}",
                            text.trim_end()
                        );
                    }
                }
            }
            let _ = sink.flush();
        })
}

/// Asks the kernel to SIGTERM the child when the spawning thread dies, so a
/// crashed or killed test run cannot leave registries behind.
#[cfg(target_os = "linux")]
fn bind_lifecycle_to_parent(command: &mut Command) {
    use std::os::unix::process::CommandExt;

    let parent = std::process::id() as libc::pid_t;
    // SAFETY: the closure runs between fork and exec and only calls
    // async-signal-safe libc functions without allocating.
    unsafe {
        command.pre_exec(move || {
            libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM as libc::c_ulong);
            // The parent may have exited before prctl took effect.
            if libc::getppid() != parent {
                libc::raise(libc::SIGTERM);
            }
            Ok(())
        });
    }
}

#[cfg(not(target_os = "linux"))]
fn bind_lifecycle_to_parent(_command: &mut Command) {
    debug!("Parent-death signal unavailable on this platform; relying on explicit teardown");
}
