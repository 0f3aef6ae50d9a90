//! Route table and its translation into an axum router.
//!
//! # Responsibilities
//! - Collect compiled routes (the [`RouteRegistrar`] behind the compiler)
//! - Translate `:param` service paths into axum `{param}` patterns
//! - Bind each (pattern, verb) to a mock response handler
//!
//! # Design Decisions
//! - Routes sharing a pattern share one `MethodRouter`
//! - `all` becomes the method fallback, so explicit verbs on the same path win
//! - Duplicate (pattern, verb) pairs keep the first registration
//! - Parameters at the same position under the same prefix share the
//!   first-seen name; each route still sees its own names at request time
//! - Paths the matcher cannot hold are skipped with a warning, never a panic

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::extract::Request;
use axum::routing::{MethodFilter, MethodRouter};
use axum::Router;
use indexmap::IndexMap;

use crate::config::schema::Verb;
use crate::http::response::{not_found, serve_mock, MockRoute, ServeContext};
use crate::routing::compiler::{RouteDescriptor, RouteRegistrar};

/// Compiled routes, in registration order.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
}

impl RouteRegistrar for RouteTable {
    fn register(&mut self, route: RouteDescriptor) {
        self.routes.push(route);
    }
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Build the axum router serving every route from `ctx`.
    pub fn into_router(self, ctx: Arc<ServeContext>) -> Router {
        let mut by_pattern: IndexMap<String, MethodRouter> = IndexMap::new();
        let mut names = PatternNames::default();
        let mut seen = HashSet::new();

        for route in self.routes {
            let bound = match names.bind(&route.service_url) {
                Ok(bound) => bound,
                Err(reason) => {
                    tracing::warn!(
                        verb = %route.verb,
                        url = %route.service_url,
                        reason = %reason,
                        "Route skipped"
                    );
                    continue;
                }
            };

            if !seen.insert((bound.pattern.clone(), route.verb)) {
                tracing::warn!(
                    verb = %route.verb,
                    url = %route.service_url,
                    "Duplicate route ignored"
                );
                continue;
            }

            let verb = route.verb;
            let route = Arc::new(MockRoute {
                descriptor: route,
                param_names: bound.param_names,
            });
            let ctx = ctx.clone();
            let handler = move |req: Request| serve_mock(route.clone(), ctx.clone(), req);

            let slot = by_pattern
                .entry(bound.pattern)
                .or_insert_with(MethodRouter::new);
            let current = std::mem::replace(slot, MethodRouter::new());
            *slot = match method_filter(verb) {
                Some(filter) => current.on(filter, handler),
                None => current.fallback(handler),
            };
        }

        by_pattern
            .into_iter()
            .fold(Router::new(), |router, (pattern, methods)| {
                router.route(&pattern, methods)
            })
            .fallback(not_found)
    }
}

/// Method filter for a verb; `None` for `all`.
pub fn method_filter(verb: Verb) -> Option<MethodFilter> {
    match verb {
        Verb::Get => Some(MethodFilter::GET),
        Verb::Post => Some(MethodFilter::POST),
        Verb::Put => Some(MethodFilter::PUT),
        Verb::Delete => Some(MethodFilter::DELETE),
        Verb::Patch => Some(MethodFilter::PATCH),
        Verb::Head => Some(MethodFilter::HEAD),
        Verb::Options => Some(MethodFilter::OPTIONS),
        Verb::Trace => Some(MethodFilter::TRACE),
        Verb::All => None,
    }
}

/// Translate a service path into an axum route pattern.
///
/// `var/:id` becomes `/var/{id}` and `files/*rest` becomes `/files/{*rest}`.
pub fn route_pattern(service_url: &str) -> String {
    render(&segments(service_url))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
    CatchAll(String),
}

impl Segment {
    fn parse(segment: &str) -> Self {
        if let Some(name) = segment.strip_prefix(':').filter(|n| !n.is_empty()) {
            Segment::Param(name.to_string())
        } else if let Some(name) = segment.strip_prefix('*') {
            let name = if name.is_empty() { "rest" } else { name };
            Segment::CatchAll(name.to_string())
        } else {
            Segment::Static(segment.to_string())
        }
    }
}

fn segments(service_url: &str) -> Vec<Segment> {
    service_url
        .trim_start_matches('/')
        .split('/')
        .map(Segment::parse)
        .collect()
}

fn render(segments: &[Segment]) -> String {
    let rendered: Vec<String> = segments
        .iter()
        .map(|segment| match segment {
            Segment::Static(text) => text.replace('{', "{{").replace('}', "}}"),
            Segment::Param(name) => format!("{{{name}}}"),
            Segment::CatchAll(name) => format!("{{*{name}}}"),
        })
        .collect();

    format!("/{}", rendered.join("/"))
}

/// Pattern prefix with parameter names erased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Shape {
    Static(String),
    Param,
    CatchAll,
}

#[derive(Debug, Clone)]
struct Dynamic {
    name: String,
    catch_all: bool,
}

/// Axum pattern for one route.
#[derive(Debug)]
struct BoundPattern {
    pattern: String,
    /// Pattern parameter name -> name the service path declared.
    param_names: HashMap<String, String>,
}

/// Dynamic segments already bound under each pattern prefix.
///
/// The matcher rejects two patterns that put differently named (or
/// differently kinded) captures after the same prefix, so later routes are
/// bound onto the first-seen name.
#[derive(Debug, Default)]
struct PatternNames {
    bound: HashMap<Vec<Shape>, Dynamic>,
}

impl PatternNames {
    fn bind(&mut self, service_url: &str) -> Result<BoundPattern, String> {
        let segments = segments(service_url);
        let last = segments.len().saturating_sub(1);

        let mut prefix = Vec::with_capacity(segments.len());
        let mut rendered = Vec::with_capacity(segments.len());
        let mut param_names = HashMap::new();
        let mut pending = Vec::new();

        for (position, segment) in segments.into_iter().enumerate() {
            let (name, catch_all) = match segment {
                Segment::Static(text) => {
                    if text.starts_with(':') {
                        return Err(format!("segment `{text}` has an empty parameter name"));
                    }
                    prefix.push(Shape::Static(text.clone()));
                    rendered.push(Segment::Static(text));
                    continue;
                }
                Segment::Param(name) => (name, false),
                Segment::CatchAll(name) if position == last => (name, true),
                Segment::CatchAll(name) => {
                    return Err(format!("wildcard `*{name}` must be the last segment"));
                }
            };

            let canonical = match self.bound.get(&prefix) {
                Some(bound) if bound.catch_all != catch_all => {
                    return Err(format!(
                        "`{name}` conflicts with `{}` registered at the same position",
                        bound.name
                    ));
                }
                Some(bound) => bound.name.clone(),
                None => {
                    pending.push((prefix.clone(), Dynamic { name: name.clone(), catch_all }));
                    name.clone()
                }
            };

            if param_names.contains_key(&canonical) {
                return Err(format!("parameter `{canonical}` appears twice"));
            }
            param_names.insert(canonical.clone(), name);

            if catch_all {
                prefix.push(Shape::CatchAll);
                rendered.push(Segment::CatchAll(canonical));
            } else {
                prefix.push(Shape::Param);
                rendered.push(Segment::Param(canonical));
            }
        }

        self.bound.extend(pending);
        Ok(BoundPattern {
            pattern: render(&rendered),
            param_names,
        })
    }
}
