//! Route compilation.
//!
//! # Responsibilities
//! - Expand each service definition into one route per verb
//! - Merge per-verb overrides over definition values and global defaults
//! - Hand every resolved route to a [`RouteRegistrar`]
//!
//! # Design Decisions
//! - A missing mock file is not a compile-time error; it surfaces as a 404
//!   when the route is served
//! - Registration order follows map order, then verb order

use serde::Serialize;

use crate::config::schema::{ServiceMap, Verb};

/// Status used when a route sets none.
pub const DEFAULT_HTTP_STATUS: u16 = 200;

/// Fully resolved route for one (path, verb) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDescriptor {
    pub service_url: String,
    pub verb: Verb,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mock_file: Option<String>,
    pub latency: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch: Option<String>,
}

impl RouteDescriptor {
    pub fn new(service_url: impl Into<String>, verb: Verb) -> Self {
        Self {
            service_url: service_url.into(),
            verb,
            mock_file: None,
            latency: 0,
            http_status: None,
            content_type: None,
            switch: None,
        }
    }

    pub fn status(&self) -> u16 {
        self.http_status.unwrap_or(DEFAULT_HTTP_STATUS)
    }
}

/// Receives compiled routes.
pub trait RouteRegistrar {
    fn register(&mut self, route: RouteDescriptor);
}

impl RouteRegistrar for Vec<RouteDescriptor> {
    fn register(&mut self, route: RouteDescriptor) {
        self.push(route);
    }
}

/// Apply the status default and register the route.
pub fn set_route(mut route: RouteDescriptor, registrar: &mut dyn RouteRegistrar) {
    route.http_status.get_or_insert(DEFAULT_HTTP_STATUS);

    tracing::debug!(
        verb = %route.verb,
        url = %route.service_url,
        mock_file = ?route.mock_file,
        status = route.status(),
        latency_ms = route.latency,
        "Registering route"
    );

    registrar.register(route);
}

/// Compile a service map into routes, one per (path, verb).
pub fn set_routes(services: &ServiceMap, default_latency: u64, registrar: &mut dyn RouteRegistrar) {
    for (path, service) in services {
        for verb in &service.verbs {
            let response = service.responses.get(verb);

            let route = RouteDescriptor {
                service_url: path.clone(),
                verb: *verb,
                mock_file: response
                    .and_then(|r| r.mock_file.clone())
                    .or_else(|| service.mock_file.clone()),
                latency: response
                    .and_then(|r| r.latency)
                    .or(service.latency)
                    .unwrap_or(default_latency),
                http_status: response.and_then(|r| r.http_status),
                content_type: response.and_then(|r| r.content_type.clone()),
                switch: response
                    .and_then(|r| r.switch.clone())
                    .or_else(|| service.switch.clone()),
            };

            if route.mock_file.is_none() {
                tracing::warn!(
                    verb = %verb,
                    url = %path,
                    "Route has no mock file; requests will get 404"
                );
            }

            set_route(route, registrar);
        }
    }
}
