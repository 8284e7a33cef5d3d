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

//! Minimal stand-in for the registry binary, used by this crate's tests.
//!
//! Accepts the same command lines (`serve <config>` or `<config>`), reads the
//! rendered YAML document and answers `GET /v2/`, enforcing htpasswd basic
//! auth when the document has an auth block.
//!
//! `FAKE_REGISTRY_MODE` selects misbehaviour:
//! - `serve` (default): behave.
//! - `unavailable`: answer `503` on `/v2/`.
//! - `silent`: never bind the listener.
//! - `exit`: exit with status 3 right after startup.
//!
//! `FAKE_REGISTRY_STARTUP_DELAY_MS` delays binding.

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use registry_harness::harness::RegistryDocument;
use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const MODE_ENV_VAR: &str = "FAKE_REGISTRY_MODE";
const STARTUP_DELAY_ENV_VAR: &str = "FAKE_REGISTRY_STARTUP_DELAY_MS";
const EXIT_CODE_ON_REQUEST: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Serve,
    Unavailable,
    Silent,
    Exit,
}

impl Mode {
    fn from_env() -> Result<Self, String> {
        match std::env::var(MODE_ENV_VAR).as_deref() {
            Err(_) | Ok("serve") => Ok(Mode::Serve),
            Ok("unavailable") => Ok(Mode::Unavailable),
            Ok("silent") => Ok(Mode::Silent),
            Ok("exit") => Ok(Mode::Exit),
            Ok(other) => Err(format!("unknown {MODE_ENV_VAR} '{other}'")),
        }
    }
}

#[derive(Clone)]
struct AppState {
    mode: Mode,
    realm: Option<String>,
    users: Arc<HashMap<String, String>>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(code) => code,
        Err(e) => {
            error!("fake-registry failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode, Box<dyn Error>> {
    let (legacy, config_path) = parse_args(std::env::args().skip(1).collect())?;
    let mode = Mode::from_env()?;
    let document = RegistryDocument::load(&config_path)?;

    println!(
        "fake-registry starting: variant={} config={}",
        if legacy { "schema1" } else { "current" },
        config_path.display()
    );

    match mode {
        Mode::Exit => {
            eprintln!("fake-registry exiting on request");
            return Ok(ExitCode::from(EXIT_CODE_ON_REQUEST));
        }
        Mode::Silent => {
            info!("Silent mode, never binding {}", document.http.addr);
            std::future::pending::<()>().await;
        }
        Mode::Serve | Mode::Unavailable => {}
    }

    if let Ok(raw) = std::env::var(STARTUP_DELAY_ENV_VAR) {
        let delay: u64 = raw.trim().parse()?;
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    let (realm, users) = match &document.auth {
        Some(auth) => (
            Some(auth.htpasswd.realm.clone()),
            load_htpasswd(&auth.htpasswd.path)?,
        ),
        None => (None, HashMap::new()),
    };

    let state = AppState {
        mode,
        realm,
        users: Arc::new(users),
    };
    let app = Router::new()
        .route("/v2/", get(v2_root))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&document.http.addr).await?;
    println!("fake-registry listening on {}", document.http.addr);
    axum::serve(listener, app).await?;
    Ok(ExitCode::SUCCESS)
}

fn parse_args(args: Vec<String>) -> Result<(bool, PathBuf), String> {
    match args.as_slice() {
        [command, path] if command == "serve" => Ok((false, PathBuf::from(path))),
        [path] => Ok((true, PathBuf::from(path))),
        _ => Err(format!("usage: fake-registry [serve] <config>, got {args:?}")),
    }
}

fn load_htpasswd(path: &Path) -> Result<HashMap<String, String>, Box<dyn Error>> {
    let contents = fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(user, hash)| (user.to_string(), hash.to_string()))
        .collect())
}

async fn v2_root(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if state.mode == Mode::Unavailable {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    if let Some(realm) = &state.realm
        && !is_authorized(&state.users, &headers)
    {
        let challenge = format!("Basic realm=\"{realm}\"");
        let mut response = StatusCode::UNAUTHORIZED.into_response();
        if let Ok(value) = HeaderValue::from_str(&challenge) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, value);
        }
        return response;
    }

    (
        StatusCode::OK,
        [("Docker-Distribution-API-Version", "registry/2.0")],
        "{}",
    )
        .into_response()
}

fn is_authorized(users: &HashMap<String, String>, headers: &HeaderMap) -> bool {
    let Some(encoded) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Basic "))
    else {
        return false;
    };
    let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
        return false;
    };
    let Ok(pair) = String::from_utf8(decoded) else {
        return false;
    };
    let Some((user, password)) = pair.split_once(':') else {
        return false;
    };
    users
        .get(user)
        .is_some_and(|hash| bcrypt::verify(password, hash).unwrap_or(false))
}
