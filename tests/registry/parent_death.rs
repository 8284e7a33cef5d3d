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

use super::{fake_registry_config, process_state, wait_until_dead};
use registry_harness::harness::RegistryHandle;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

/// Launches a fake registry from a thread that exits right away, leaking the
/// handle so neither `tear_down` nor `Drop` ever runs.
fn launch_from_short_lived_thread(bind_to_parent: bool, scratch_parent: PathBuf) -> u32 {
    thread::spawn(move || {
        let mut config = fake_registry_config(false, &[]);
        config.bind_to_parent = bind_to_parent;
        config.scratch_parent = Some(scratch_parent);

        let handle = RegistryHandle::launch(config).unwrap();
        let pid = handle.pid();
        std::mem::forget(handle);
        pid
    })
    .join()
    .unwrap()
}

fn reap(pid: u32) {
    let mut status = 0;
    unsafe {
        libc::waitpid(pid as libc::pid_t, &mut status, 0);
    }
}

#[tokio::test]
async fn should_signal_child_when_launching_thread_exits() {
    let parent = TempDir::new().unwrap();

    let pid = launch_from_short_lived_thread(true, parent.path().to_path_buf());

    assert!(
        wait_until_dead(pid, false).await,
        "pid {pid} survived its launching thread (state {:?})",
        process_state(pid)
    );
    reap(pid);
}

#[tokio::test]
async fn should_leave_unbound_child_running_after_thread_exits() {
    let parent = TempDir::new().unwrap();

    let pid = launch_from_short_lived_thread(false, parent.path().to_path_buf());
    tokio::time::sleep(Duration::from_millis(300)).await;

    let state = process_state(pid);
    unsafe {
        libc::kill(pid as libc::pid_t, libc::SIGKILL);
    }
    reap(pid);

    assert!(
        matches!(state, Some(s) if s != 'Z'),
        "unbound pid {pid} did not outlive its launching thread (state {state:?})"
    );
}
