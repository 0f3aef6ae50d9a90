//! Mock file resolution from request fields.
//!
//! A route with a `switch` field picks its response file from the request:
//! with `switch = "productId"` and `mockFile = "path/to/base"`, a request
//! carrying `productId=678` is answered from `path/to/productId678.base`.

use std::collections::HashMap;

use serde_json::Value;

use crate::routing::compiler::RouteDescriptor;

/// Named field lookup on a request.
pub trait FieldLookup {
    fn lookup(&self, name: &str) -> Option<String>;
}

/// Path parameters, then query string parameters.
#[derive(Debug, Clone, Default)]
pub struct ParamFields {
    pub path: HashMap<String, String>,
    pub query: HashMap<String, String>,
}

impl FieldLookup for ParamFields {
    fn lookup(&self, name: &str) -> Option<String> {
        self.path
            .get(name)
            .or_else(|| self.query.get(name))
            .cloned()
    }
}

/// Top-level fields of a JSON request body.
#[derive(Debug, Clone, Default)]
pub struct BodyFields(pub Option<Value>);

impl FieldLookup for BodyFields {
    fn lookup(&self, name: &str) -> Option<String> {
        match self.0.as_ref()?.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Request fields queried params first, then body.
#[derive(Debug, Clone, Default)]
pub struct RequestFields {
    pub params: ParamFields,
    pub body: BodyFields,
}

impl FieldLookup for RequestFields {
    fn lookup(&self, name: &str) -> Option<String> {
        self.params.lookup(name).or_else(|| self.body.lookup(name))
    }
}

/// Rewrite the route's mock file from its switch field, if the request has one.
pub fn set_mock_file(route: &mut RouteDescriptor, request: &dyn FieldLookup) {
    let Some(switch) = route.switch.as_deref() else {
        return;
    };
    let Some(value) = request.lookup(switch) else {
        return;
    };
    let Some(mock_file) = route.mock_file.as_deref() else {
        return;
    };

    let (dir, name) = match mock_file.rfind('/') {
        Some(idx) => mock_file.split_at(idx + 1),
        None => ("", mock_file),
    };
    let resolved = format!("{dir}{switch}{value}.{name}");

    tracing::debug!(switch, value = %value, mock_file = %resolved, "Switched mock file");
    route.mock_file = Some(resolved);
}
