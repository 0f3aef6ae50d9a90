//! Configuration schema definitions.
//!
//! This module defines the options record owned by a mock server instance and
//! the normalized service map the route compiler consumes. All types derive
//! Serde traits for deserialization from JSON config files.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::config::legacy::WebServicesFormat;
use crate::config::loader::ConfigError;

/// Root options for a mock server instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    /// Listening port, as a number or a string.
    pub port: Port,

    /// Directory mock files are resolved against.
    pub mock_directory: String,

    /// Origins allowed by the CORS headers (`*` allows all).
    pub allowed_domains: Vec<String>,

    /// Suppress informational logging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiet: Option<bool>,

    /// Global response latency in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<u64>,

    /// Normalized service map.
    pub web_services: ServiceMap,

    /// Top-level keys this crate does not interpret, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            port: Port::Name("8888".to_string()),
            mock_directory: "./mocks/".to_string(),
            allowed_domains: vec!["*".to_string()],
            quiet: None,
            latency: None,
            web_services: ServiceMap::default(),
            extra: Map::new(),
        }
    }
}

impl Options {
    /// Shallow merge: every key present in `overrides` replaces the current
    /// value wholesale. Nested maps such as `webServices` are not merged.
    pub fn merge(&mut self, overrides: OptionsOverrides) {
        let OptionsOverrides {
            port,
            mock_directory,
            allowed_domains,
            quiet,
            latency,
            web_services,
            extra,
        } = overrides;

        if let Some(port) = port {
            self.port = port;
        }
        if let Some(mock_directory) = mock_directory {
            self.mock_directory = mock_directory;
        }
        if let Some(allowed_domains) = allowed_domains {
            self.allowed_domains = allowed_domains;
        }
        if quiet.is_some() {
            self.quiet = quiet;
        }
        if latency.is_some() {
            self.latency = latency;
        }
        if let Some(web_services) = web_services {
            self.web_services = web_services;
        }
        self.extra.extend(extra);
    }

    /// Latency applied to routes that configure none.
    pub fn default_latency(&self) -> u64 {
        self.latency.unwrap_or(0)
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet.unwrap_or(false)
    }
}

/// Partial options, as supplied by a caller or parsed from a config file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsOverrides {
    pub port: Option<Port>,
    pub mock_directory: Option<String>,
    pub allowed_domains: Option<Vec<String>>,
    pub quiet: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_millis")]
    pub latency: Option<u64>,
    pub web_services: Option<ServiceMap>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Milliseconds from any JSON number. Fractions round to the nearest
/// millisecond; negative values mean no delay.
fn deserialize_millis<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = Option::<f64>::deserialize(deserializer)?;
    Ok(millis.map(|ms| if ms.is_finite() && ms > 0.0 { ms.round() as u64 } else { 0 }))
}

/// A listening port given either as a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Port {
    Number(u16),
    Name(String),
}

impl Port {
    /// Numeric port to bind.
    pub fn as_u16(&self) -> Result<u16, ConfigError> {
        match self {
            Port::Number(n) => Ok(*n),
            Port::Name(s) => s
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(s.clone())),
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Port::Number(n) => write!(f, "{}", n),
            Port::Name(s) => f.write_str(s),
        }
    }
}

/// HTTP verb used as a routing discriminator. `All` binds every method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    Trace,
    All,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::Post => "post",
            Verb::Put => "put",
            Verb::Delete => "delete",
            Verb::Patch => "patch",
            Verb::Head => "head",
            Verb::Options => "options",
            Verb::Trace => "trace",
            Verb::All => "all",
        }
    }
}

impl FromStr for Verb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "get" => Verb::Get,
            "post" => Verb::Post,
            "put" => Verb::Put,
            "delete" => Verb::Delete,
            "patch" => Verb::Patch,
            "head" => Verb::Head,
            "options" => Verb::Options,
            "trace" => Verb::Trace,
            "all" => Verb::All,
            other => return Err(format!("unknown verb `{other}`")),
        })
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized service definition for one URL path.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDefinition {
    /// Default response file for every verb.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mock_file: Option<String>,

    /// Verbs this path answers, in registration order.
    pub verbs: Vec<Verb>,

    #[serde(
        default,
        deserialize_with = "deserialize_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub latency: Option<u64>,

    /// Request field whose value selects a variant mock file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub switch: Option<String>,

    /// Per-verb response overrides.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<Verb, ResponseOverride>,
}

impl ServiceDefinition {
    pub fn new(mock_file: impl Into<String>, verbs: Vec<Verb>) -> Self {
        Self {
            mock_file: Some(mock_file.into()),
            verbs,
            ..Default::default()
        }
    }
}

/// Per-verb override of a service definition. Unset fields fall back to the
/// definition or to global defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(
        default,
        deserialize_with = "deserialize_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub latency: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mock_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub switch: Option<String>,
}

/// URL path to service definition, in config file order.
///
/// Deserializes from either the current or the legacy `webServices` shape;
/// the legacy shape is upconverted while parsing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(from = "WebServicesFormat")]
pub struct ServiceMap(IndexMap<String, ServiceDefinition>);

impl ServiceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, service: ServiceDefinition) {
        self.0.insert(path.into(), service);
    }

    pub fn get(&self, path: &str) -> Option<&ServiceDefinition> {
        self.0.get(path)
    }

    pub fn entry(&mut self, path: String) -> indexmap::map::Entry<'_, String, ServiceDefinition> {
        self.0.entry(path)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, ServiceDefinition> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<IndexMap<String, ServiceDefinition>> for ServiceMap {
    fn from(map: IndexMap<String, ServiceDefinition>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, ServiceDefinition)> for ServiceMap {
    fn from_iter<I: IntoIterator<Item = (String, ServiceDefinition)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ServiceMap {
    type Item = (&'a String, &'a ServiceDefinition);
    type IntoIter = indexmap::map::Iter<'a, String, ServiceDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
