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

use std::fs;
use std::path::Path;
use std::process::{Child, ExitStatus};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

const REAP_ATTEMPTS: u32 = 20;
const REAP_INTERVAL: Duration = Duration::from_millis(10);

fn read_log(path: Option<&Path>, stream: &str) -> String {
    match path {
        Some(path) => fs::read_to_string(path)
            .unwrap_or_else(|e| format!("[{stream} log {} unreadable: {e}]", path.display())),
        None => format!("[{stream} not captured]"),
    }
}

/// Reads back what the relay threads wrote so far. Streams that were
/// inherited (verbose mode) have no log file.
pub fn collect_logs(stdout_path: Option<&Path>, stderr_path: Option<&Path>) -> (String, String) {
    (read_log(stdout_path, "stdout"), read_log(stderr_path, "stderr"))
}

/// Prints the captured output of `label` when called from a panicking
/// thread, so a failed test shows what the registry said.
pub fn dump_logs_on_panic(label: &str, stdout_path: Option<&Path>, stderr_path: Option<&Path>) {
    if !thread::panicking() {
        return;
    }
    let (stdout, stderr) = collect_logs(stdout_path, stderr_path);
    eprintln!("=== {label} STDOUT ===\n{stdout}\n=== {label} STDERR ===\n{stderr}");
}

/// Fire-and-forget SIGKILL (or the platform equivalent).
///
/// What `kill` reports for a child that already exited differs between
/// platforms, so the result is only logged. No wait happens here.
pub fn kill_best_effort(child: &mut Child, label: &str) {
    let pid = child.id();
    if let Err(e) = child.kill() {
        warn!("Kill request for {label} (pid {pid}) failed: {e}");
    }
}

/// Polls `try_wait` for a short while so a killed child does not linger as a
/// zombie once its `Child` is dropped. Gives up silently if it is still
/// running after the last poll.
pub fn reap_briefly(child: &mut Child, label: &str) -> Option<ExitStatus> {
    let pid = child.id();
    for _ in 0..REAP_ATTEMPTS {
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!("{label} (pid {pid}) exited with {status}");
                return Some(status);
            }
            Ok(None) => thread::sleep(REAP_INTERVAL),
            Err(e) => {
                debug!("Could not query exit status of {label} (pid {pid}): {e}");
                return None;
            }
        }
    }
    debug!("{label} (pid {pid}) still running, leaving it unreaped");
    None
}
