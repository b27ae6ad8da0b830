// location-bingo/src/server.rs
// Routing shim that serves the bingo page. Every request carries the whole game
// in its query string; the server keeps no state between requests.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::header::{CONTENT_TYPE, HOST, LOCATION};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode, Uri, body::{Body, Bytes}};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use tokio::net::TcpListener;
use url::{Url, form_urlencoded};

use crate::board::{BoardState, Line};
use crate::config::{ServerConfig, default_base_url};
use crate::controller::{BoardController, Host};
use crate::defs::{CELLCOUNT, SPOTS};
use crate::error::{BingoError, Result};
use crate::logging::{log_debug, log_error, log_error_stderr, log_info};
use crate::page::{REWARD_FRAGMENT, render_board_page, render_reset_confirmation};

// The largest legitimate body is the reset form, `confirm=yes`.
pub const MAX_BODY_BYTES: usize = 1024;

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// JSON view of a card, served by `/api/board`.
#[derive(Serialize)]
pub struct BoardSnapshot<'a> {
    pub cells: &'a [bool; CELLCOUNT],
    pub labels: &'static [&'static str; CELLCOUNT],
    pub visited_count: usize,
    pub progress: u8,
    pub completed_lines: Vec<Line>,
    pub coupon: Option<&'a str>,
    pub share_url: String,
}

impl<'a> BoardSnapshot<'a> {
    pub fn new(controller: &'a BoardController, base: &Url) -> Self {
        let state: &'a BoardState = controller.state();
        BoardSnapshot {
            cells: state.cells(),
            labels: &SPOTS,
            visited_count: controller.visited_count(),
            progress: controller.progress_percent(),
            completed_lines: controller.completed_lines().iter().copied().collect(),
            coupon: controller.reward_code().map(|code| code.as_str()),
            share_url: controller.share_url(base).to_string(),
        }
    }
}

pub struct AppState {
    pub config: ServerConfig,
}

// The answer to the reset question arrives with the form post, so the
// confirmation has already happened by the time the controller asks.
struct FormHost {
    answer: bool,
}

impl Host for FormHost {
    fn confirm(&mut self, _prompt: &str) -> bool {
        self.answer
    }

    fn copy_text(&mut self, _text: &str) -> Result<()> {
        Err(BingoError::Clipboard("copying happens in the browser".to_string()))
    }

    fn notify(&mut self, message: &str) {
        log_debug(message);
    }
}

// Start the HTTP server with Tokio
pub fn start_server(config: ServerConfig) -> (tokio::task::JoinHandle<()>, Arc<AtomicBool>) {
    let shutdown_signal = Arc::new(AtomicBool::new(false));
    let shutdown_clone = Arc::clone(&shutdown_signal);

    let handle = tokio::spawn(async move {
        let ip = config.host.parse::<std::net::IpAddr>().unwrap_or([127, 0, 0, 1].into());
        let addr = SocketAddr::from((ip, config.port));
        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(e) => {
                log_error_stderr(&format!("Failed to start bingo server on {addr}: {e}"));
                return;
            }
        };

        log_info(&format!("Bingo server listening on http://{addr}/"));
        serve(listener, Arc::new(AppState { config }), shutdown_clone).await;
    });

    (handle, shutdown_signal)
}

/// Accept loop on an already bound listener, until `shutdown` is raised.
pub async fn serve(listener: TcpListener, state: Arc<AppState>, shutdown: Arc<AtomicBool>) {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        // Accept connections with a timeout so the shutdown flag is polled
        let accept_result = tokio::time::timeout(
            std::time::Duration::from_millis(100),
            listener.accept()
        ).await;

        match accept_result {
            Ok(Ok((stream, _))) => {
                let state = Arc::clone(&state);
                let io = TokioIo::new(stream);

                tokio::spawn(async move {
                    let service = service_fn(move |req| handle_request(req, Arc::clone(&state)));

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        log_error_stderr(&format!("Error serving connection: {err:?}"));
                    }
                });
            }
            Ok(Err(e)) => {
                log_error(&format!("Error accepting connection: {e}"));
                break;
            }
            Err(_) => {
                // Timeout occurred, check the shutdown signal again
            }
        }
    }
    log_info("Bingo server shutting down...");
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = match read_body(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(status) => {
            log_debug(&format!("{} {} -> {status}", parts.method, parts.uri.path()));
            return Ok(json_error(status, "Failed to read request body"));
        }
    };
    let host = parts.headers.get(HOST).and_then(|v| v.to_str().ok());

    let response = route(&parts.method, &parts.uri, host, &body, &state).await;
    log_debug(&format!("{} {} -> {}", parts.method, parts.uri.path(), response.status()));
    Ok(response)
}

/// Collects at most `limit` bytes; larger bodies give `413`, broken ones `400`.
async fn read_body<B>(body: B, limit: usize) -> std::result::Result<Bytes, StatusCode>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => Err(StatusCode::PAYLOAD_TOO_LARGE),
        Err(_) => Err(StatusCode::BAD_REQUEST),
    }
}

pub async fn route(
    method: &Method,
    uri: &Uri,
    host: Option<&str>,
    body: &[u8],
    state: &AppState,
) -> Response<Full<Bytes>> {
    let query = uri.query().unwrap_or("");

    match (method, uri.path()) {
        (&Method::GET, "/") | (&Method::GET, "/index.html") => {
            handle_page(query, host, state).await
        }
        (&Method::POST, path) if path.starts_with("/visit/") => {
            let index = &path[7..]; // Remove "/visit/" prefix
            handle_visit(index, query).await
        }
        (&Method::GET, "/reset") => {
            handle_reset_prompt(query).await
        }
        (&Method::POST, "/reset") => {
            handle_reset(query, body).await
        }
        (&Method::GET, "/qr") => {
            handle_qr(query, host, state).await
        }
        (&Method::GET, "/api/board") => {
            handle_board(query, host, state).await
        }
        _ => {
            json_error(StatusCode::NOT_FOUND, "Not found")
        }
    }
}

// Share links use the configured public URL, or whatever host the browser used.
fn base_url(host: Option<&str>, state: &AppState) -> Result<Url> {
    if let Some(url) = &state.config.public_url {
        return Ok(url.clone());
    }
    let authority = match host {
        Some(h) if !h.is_empty() => h.to_string(),
        _ => format!("{}:{}", state.config.host, state.config.port),
    };
    Url::parse(&format!("http://{authority}/"))
        .or_else(|_| Url::parse(&format!("http://{}:{}/", state.config.host, state.config.port)))
        .or_else(|_| default_base_url())
}

async fn handle_page(query: &str, host: Option<&str>, state: &AppState) -> Response<Full<Bytes>> {
    let base = match base_url(host, state) {
        Ok(base) => base,
        Err(e) => return json_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    };
    let controller = BoardController::from_location("/", query);
    let share = controller.share_url(&base);
    html_response(StatusCode::OK, render_board_page(&controller, &share))
}

async fn handle_visit(index: &str, query: &str) -> Response<Full<Bytes>> {
    let index = match index.parse::<usize>() {
        Ok(i) => i,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, &format!("Invalid cell index '{index}'")),
    };

    let mut controller = BoardController::from_location("/", query);
    match controller.toggle_cell(index) {
        Ok(outcome) => {
            let mut target = controller.location().relative();
            if outcome.reward.is_some() {
                target.push('#');
                target.push_str(REWARD_FRAGMENT);
            }
            redirect(StatusCode::SEE_OTHER, &target)
        }
        Err(e) => json_error(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

async fn handle_reset_prompt(query: &str) -> Response<Full<Bytes>> {
    let controller = BoardController::from_location("/", query);
    html_response(StatusCode::OK, render_reset_confirmation(&controller))
}

async fn handle_reset(query: &str, body: &[u8]) -> Response<Full<Bytes>> {
    let answer = form_urlencoded::parse(body)
        .any(|(key, value)| key == "confirm" && value == "yes");

    let mut controller = BoardController::from_location("/", query);
    controller.reset(&mut FormHost { answer });
    redirect(StatusCode::SEE_OTHER, &controller.location().relative())
}

async fn handle_qr(query: &str, host: Option<&str>, state: &AppState) -> Response<Full<Bytes>> {
    let base = match base_url(host, state) {
        Ok(base) => base,
        Err(e) => return json_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    };
    let controller = BoardController::from_location("/", query);
    let qr = controller.qr_code_url(&base);
    redirect(StatusCode::FOUND, qr.as_str())
}

async fn handle_board(query: &str, host: Option<&str>, state: &AppState) -> Response<Full<Bytes>> {
    let base = match base_url(host, state) {
        Ok(base) => base,
        Err(e) => return json_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    };
    let controller = BoardController::from_location("/", query);
    let snapshot = BoardSnapshot::new(&controller, &base);
    let body = serde_json::to_string(&snapshot).unwrap_or_else(|_| "{}".to_string());
    finish(
        Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(Full::new(Bytes::from(body))),
    )
}

fn finish<E: std::fmt::Display>(built: std::result::Result<Response<Full<Bytes>>, E>) -> Response<Full<Bytes>> {
    built.unwrap_or_else(|e| {
        log_error(&format!("Failed to build response: {e}"));
        let mut response = Response::new(Full::new(Bytes::from_static(b"{\"error\":\"internal error\"}")));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
    })
}

fn html_response(status: StatusCode, html: String) -> Response<Full<Bytes>> {
    finish(
        Response::builder()
            .status(status)
            .header(CONTENT_TYPE, "text/html; charset=utf-8")
            .header("Cache-Control", "no-store")
            .body(Full::new(Bytes::from(html))),
    )
}

fn redirect(status: StatusCode, location: &str) -> Response<Full<Bytes>> {
    finish(
        Response::builder()
            .status(status)
            .header(LOCATION, location)
            .body(Full::new(Bytes::new())),
    )
}

fn json_error(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let error_response = ErrorResponse {
        error: message.to_string(),
    };
    let body = serde_json::to_string(&error_response).unwrap_or_else(|_| "{}".to_string());
    finish(
        Response::builder()
            .status(status)
            .header(CONTENT_TYPE, "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(Full::new(Bytes::from(body))),
    )
}
