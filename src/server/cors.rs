//! CORS policy
//!
//! Only the browser extension and the video site may call the API from a
//! page. Allowed origins are echoed back with credentials enabled; anything
//! else gets no CORS headers at all.

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderMap, HeaderValue};
use hyper::{Response, StatusCode};

pub const ALLOWED_METHODS: &str = "GET, POST, OPTIONS, DELETE, PATCH, PUT";
pub const MAX_AGE_SECS: u32 = 600;

#[derive(Debug, Clone)]
pub struct CorsPolicy {
    origins: Vec<String>,
}

impl CorsPolicy {
    pub fn new(origins: Vec<String>) -> Self {
        Self { origins }
    }

    pub fn origins(&self) -> &[String] {
        &self.origins
    }

    /// The request origin, if it is one we allow
    pub fn allowed_origin(&self, headers: &HeaderMap) -> Option<HeaderValue> {
        let origin = headers.get(hyper::header::ORIGIN)?;
        let origin_str = origin.to_str().ok()?;
        self.origins
            .iter()
            .any(|o| o == origin_str)
            .then(|| origin.clone())
    }

    /// Add CORS headers to an actual (non-preflight) response
    pub fn apply<B>(&self, origin: Option<HeaderValue>, response: &mut Response<B>) {
        let Some(origin) = origin else {
            return;
        };
        let headers = response.headers_mut();
        headers.insert("Access-Control-Allow-Origin", origin);
        headers.insert("Access-Control-Allow-Credentials", HeaderValue::from_static("true"));
        headers.insert("Access-Control-Expose-Headers", HeaderValue::from_static("*"));
        headers.append(hyper::header::VARY, HeaderValue::from_static("Origin"));
    }

    /// Answer an OPTIONS preflight
    pub fn preflight(&self, request_headers: &HeaderMap) -> Response<Full<Bytes>> {
        let Some(origin) = self.allowed_origin(request_headers) else {
            return Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .header("Content-Type", "text/plain")
                .body(Full::new(Bytes::from_static(b"Disallowed CORS origin")))
                .unwrap_or_default();
        };

        // "*" is not a wildcard for credentialed requests, so echo what was asked for
        let allow_headers = request_headers
            .get("Access-Control-Request-Headers")
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("*"));

        let mut response = Response::builder()
            .status(StatusCode::OK)
            .header("Access-Control-Allow-Methods", ALLOWED_METHODS)
            .header("Access-Control-Allow-Headers", allow_headers)
            .header("Access-Control-Max-Age", MAX_AGE_SECS.to_string())
            .body(Full::new(Bytes::new()))
            .unwrap_or_default();
        self.apply(Some(origin), &mut response);
        response
    }
}
