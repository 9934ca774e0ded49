//! JSON-over-HTTP front-end. `POST /execute` runs one command line against a
//! single long-lived [`Terminal`].

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tiny_http::{Header, Method, Request, Response, Server};

use crate::core::parser;
use crate::core::Terminal;
use crate::error::ShellError;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExecuteRequest {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Directory to run in. Ignored unless it names an existing directory.
    #[serde(default, rename = "currentDir")]
    pub current_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecuteResponse {
    pub success: bool,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "currentDir")]
    pub current_dir: String,
}

impl ExecuteResponse {
    fn failure(terminal: &Terminal, error: String) -> Self {
        ExecuteResponse {
            success: false,
            output: String::new(),
            error: Some(error),
            current_dir: terminal.state().current_directory().display().to_string(),
        }
    }
}

/// Run one request. Every failure the terminal can report comes back as
/// `success: false` with the message in `error`.
pub fn handle(terminal: &mut Terminal, request: &ExecuteRequest) -> ExecuteResponse {
    if let Some(dir) = request.current_dir.as_deref() {
        if !terminal.state_mut().set_current_directory(dir) {
            debug!("ignoring currentDir {}", dir);
        }
    }

    if request.command.trim().is_empty() {
        return ExecuteResponse::failure(terminal, "Missing command".to_string());
    }

    let line = match parser::join(&request.command, &request.args) {
        Ok(line) => line,
        Err(e) => return ExecuteResponse::failure(terminal, format!("Parse error: {}", e)),
    };

    match terminal.dispatch(&line) {
        Ok(output) => ExecuteResponse {
            success: true,
            output: output.text().to_string(),
            error: None,
            current_dir: terminal.state().current_directory().display().to_string(),
        },
        Err(e) => ExecuteResponse::failure(terminal, e.to_string()),
    }
}

/// Status code and optional JSON body for one HTTP exchange.
pub fn route(terminal: &mut Terminal, method: &Method, url: &str, body: &str) -> (u16, Option<String>) {
    let path = url.split('?').next().unwrap_or(url);
    match (method, path) {
        (Method::Options, _) => (200, None),
        (Method::Post, "/execute") => {
            let response = match serde_json::from_str::<ExecuteRequest>(body) {
                Ok(request) => handle(terminal, &request),
                Err(e) => {
                    return (
                        400,
                        to_json(&ExecuteResponse::failure(terminal, format!("Invalid request: {}", e))),
                    )
                }
            };
            (200, to_json(&response))
        }
        _ => (404, None),
    }
}

fn to_json(response: &ExecuteResponse) -> Option<String> {
    match serde_json::to_string(response) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!("cannot encode response: {}", e);
            None
        }
    }
}

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}

fn respond(terminal: &mut Terminal, mut request: Request) {
    let mut body = String::new();
    if let Err(e) = request.as_reader().read_to_string(&mut body) {
        warn!("unreadable request body: {}", e);
    }

    let (status, json) = route(terminal, request.method(), request.url(), &body);
    debug!("{} {} -> {}", request.method(), request.url(), status);

    let cors = [
        header("Access-Control-Allow-Origin", "*"),
        header("Access-Control-Allow-Methods", "POST, OPTIONS"),
        header("Access-Control-Allow-Headers", "Content-Type"),
    ];

    let result = match json {
        Some(json) => {
            let mut response = Response::from_string(json).with_status_code(status);
            for h in cors.into_iter().flatten() {
                response.add_header(h);
            }
            if let Some(h) = header("Content-Type", "application/json") {
                response.add_header(h);
            }
            request.respond(response)
        }
        None => {
            let mut response = Response::empty(status);
            for h in cors.into_iter().flatten() {
                response.add_header(h);
            }
            request.respond(response)
        }
    };

    if let Err(e) = result {
        warn!("failed to send response: {}", e);
    }
}

/// Serve until Ctrl-C. Requests are handled one at a time on this thread,
/// so the terminal needs no locking.
pub fn serve(addr: &str, mut terminal: Terminal) -> Result<(), ShellError> {
    let server = Server::http(addr).map_err(|e| ShellError::Server(e.to_string()))?;

    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;

    info!("listening on {}", addr);
    while !stop.load(Ordering::SeqCst) {
        match server.recv_timeout(POLL_INTERVAL)? {
            Some(request) => respond(&mut terminal, request),
            None => continue,
        }
    }
    info!("server stopped");
    Ok(())
}
