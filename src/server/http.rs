//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Every response, errors
//! included, passes back through [`handle_request`] so CORS headers and the
//! request id are applied in one place.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Incoming};
use hyper::header::HeaderValue;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use super::cors::CorsPolicy;
use crate::config::Args;
use crate::routes;
use crate::services::Gateway;
use crate::types::TextframeError;

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Routed paths; any other method on these is a 405 rather than a 404
const KNOWN_PATHS: &[&str] = &[
    "/register_public_key",
    "/get_nonce",
    "/search",
    "/health",
    "/healthz",
    "/version",
];

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub gateway: Arc<Gateway>,
    pub cors: CorsPolicy,
    /// True when identities and usage are backed by MongoDB
    pub persistent: bool,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(args: Args, gateway: Arc<Gateway>, persistent: bool) -> Self {
        let cors = CorsPolicy::new(args.cors_origins());
        Self {
            args,
            gateway,
            cors,
            persistent,
            started_at: Instant::now(),
        }
    }
}

/// Run the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), TextframeError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("Textframe listening on {}", state.args.listen);
    info!("CORS origins: {}", state.cors.origins().join(", "));

    if !state.persistent {
        warn!("Using in-memory stores - registrations and usage are lost on restart");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req: Request<Incoming>| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .title_case_headers(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
pub async fn handle_request<B>(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<B>,
) -> Result<Response<BoxBody>, hyper::Error>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let request_id = uuid::Uuid::new_v4().to_string();
    let origin = state.cors.allowed_origin(req.headers());

    info!("[{}] {} {} ({})", addr, method, path, request_id);

    let mut response = match (method.clone(), path.as_str()) {
        (Method::OPTIONS, _) => state.cors.preflight(req.headers()),

        (Method::POST, "/register_public_key") => {
            routes::handle_register_public_key(req, Arc::clone(&state)).await
        }
        (Method::POST, "/get_nonce") => routes::handle_get_nonce(req, Arc::clone(&state)).await,
        (Method::POST, "/search") => routes::handle_search(req, Arc::clone(&state)).await,

        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            routes::health_check(Arc::clone(&state))
        }
        (Method::GET, "/version") => routes::version_info(),

        (_, p) if KNOWN_PATHS.contains(&p) => method_not_allowed_response(&method),

        _ => not_found_response(&path),
    };

    if method != Method::OPTIONS {
        state.cors.apply(origin, &mut response);
    }
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    if response.status().is_server_error() {
        warn!("[{}] {} {} -> {}", request_id, method, path, response.status());
    }

    Ok(to_boxed(response))
}

/// Convert Full<Bytes> response to BoxBody response
fn to_boxed(response: Response<Full<Bytes>>) -> Response<BoxBody> {
    response.map(|body| body.map_err(|never| match never {}).boxed())
}

fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Not Found",
        "path": path,
    });

    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap_or_default()
}

fn method_not_allowed_response(method: &Method) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Method Not Allowed",
        "message": format!("{} is not supported on this path", method),
    });

    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap_or_default()
}
