//! Mock response handling.
//!
//! # Responsibilities
//! - Apply the configured latency
//! - Resolve the mock file (switch field) for each request
//! - Read the file and answer with the route's status and content type
//! - Map missing files and unmatched requests to 404
//!
//! # Design Decisions
//! - The compiled route is shared; switch resolution works on a per-request copy
//! - Mock files are read on the blocking pool, off the async workers
//! - Content type falls back to a guess from the file extension

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Path, Query, Request},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json, RequestPartsExt,
};
use serde_json::{json, Value};

use crate::files::FileReader;
use crate::routing::compiler::RouteDescriptor;
use crate::routing::resolver::{set_mock_file, BodyFields, ParamFields, RequestFields};

/// Largest request body read when looking for a switch field.
const MAX_SWITCH_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Shared by every mock handler of one route table.
#[derive(Debug)]
pub struct ServeContext {
    pub mock_directory: PathBuf,
    pub reader: Arc<dyn FileReader>,
}

impl ServeContext {
    pub fn new(mock_directory: impl Into<PathBuf>, reader: Arc<dyn FileReader>) -> Self {
        Self {
            mock_directory: mock_directory.into(),
            reader,
        }
    }

    /// Read a mock file on the blocking pool.
    pub async fn read_mock(&self, path: PathBuf) -> io::Result<Vec<u8>> {
        tokio::task::spawn_blocking({
            let reader = self.reader.clone();
            move || reader.read(&path)
        })
        .await
        .map_err(io::Error::other)?
    }
}

/// A compiled route as bound to its axum pattern.
#[derive(Debug, Clone)]
pub struct MockRoute {
    pub descriptor: RouteDescriptor,
    /// Pattern parameter name -> name the service path declared.
    pub param_names: HashMap<String, String>,
}

impl From<RouteDescriptor> for MockRoute {
    fn from(descriptor: RouteDescriptor) -> Self {
        Self {
            descriptor,
            param_names: HashMap::new(),
        }
    }
}

/// Serve one request from a compiled route.
pub async fn serve_mock(route: Arc<MockRoute>, ctx: Arc<ServeContext>, request: Request) -> Response {
    if route.descriptor.latency > 0 {
        tokio::time::sleep(Duration::from_millis(route.descriptor.latency)).await;
    }

    let mut descriptor = route.descriptor.clone();
    if descriptor.switch.is_some() {
        let fields = request_fields(request, &route.param_names).await;
        set_mock_file(&mut descriptor, &fields);
    }
    let route = descriptor;

    let Some(mock_file) = route.mock_file.as_deref() else {
        tracing::warn!(verb = %route.verb, url = %route.service_url, "No mock file configured");
        return missing_file(&route.service_url, None);
    };

    let path = ctx.mock_directory.join(mock_file);
    let contents = match ctx.read_mock(path.clone()).await {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Mock file not readable");
            return missing_file(&route.service_url, Some(mock_file));
        }
    };

    let status = StatusCode::from_u16(route.status()).unwrap_or_else(|_| {
        tracing::warn!(status = route.status(), "Invalid status code, using 200");
        StatusCode::OK
    });

    let content_type = route
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .or_else(|| {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            HeaderValue::from_str(mime.as_ref()).ok()
        })
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));

    tracing::debug!(
        url = %route.service_url,
        mock_file = %path.display(),
        status = %status,
        "Serving mock"
    );

    let mut response = (status, Body::from(contents)).into_response();
    response.headers_mut().insert(header::CONTENT_TYPE, content_type);
    response
}

/// Collect path, query and JSON body fields for switch lookup.
///
/// Path parameters are keyed by the names the route declared.
async fn request_fields(request: Request, param_names: &HashMap<String, String>) -> RequestFields {
    let (mut parts, body) = request.into_parts();

    let path = parts
        .extract::<Path<HashMap<String, String>>>()
        .await
        .map(|Path(p)| p)
        .unwrap_or_default()
        .into_iter()
        .map(|(name, value)| match param_names.get(&name) {
            Some(declared) => (declared.clone(), value),
            None => (name, value),
        })
        .collect();
    let query = parts
        .extract::<Query<HashMap<String, String>>>()
        .await
        .map(|Query(q)| q)
        .unwrap_or_default();
    let body = axum::body::to_bytes(body, MAX_SWITCH_BODY_BYTES)
        .await
        .ok()
        .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok());

    RequestFields {
        params: ParamFields { path, query },
        body: BodyFields(body),
    }
}

fn missing_file(url: &str, mock_file: Option<&str>) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Mock file not found",
            "serviceUrl": url,
            "mockFile": mock_file,
        })),
    )
        .into_response()
}

/// Fallback for requests no route matches.
pub async fn not_found(request: Request) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    tracing::warn!(method = %method, path = %path, "No route matched");

    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "No matching route found",
            "request": {
                "method": method.as_str(),
                "path": path,
            }
        })),
    )
        .into_response()
}
