//! Legacy `webServices` upconversion.
//!
//! Older config files key services by verb first:
//!
//! ```json
//! { "get": { "first": "king.json" }, "post": { "first": "king.json" } }
//! ```
//!
//! The current shape keys them by path:
//!
//! ```json
//! { "first": { "mockFile": "king.json", "verbs": ["get", "post"] } }
//! ```
//!
//! Both shapes parse into [`WebServicesFormat`] and collapse into one
//! [`ServiceMap`] at load time. Nothing downstream sees the legacy shape.

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer};
use serde_json::Value;

use crate::config::schema::{ServiceDefinition, ServiceMap, Verb};

/// Verb -> (path -> mock file).
pub type LegacyServiceMap = IndexMap<Verb, IndexMap<String, String>>;

/// The two accepted `webServices` shapes.
///
/// The current shape is chosen when every value carries a `verbs` list. The
/// legacy shape requires every key to be a recognized verb and every value
/// to be a path -> file map. Errors name the entry that failed.
#[derive(Debug, Clone)]
pub enum WebServicesFormat {
    Current(IndexMap<String, ServiceDefinition>),
    Legacy(LegacyServiceMap),
}

impl WebServicesFormat {
    /// Classify and parse raw `webServices` entries.
    pub fn from_entries(entries: IndexMap<String, Value>) -> Result<Self, String> {
        if entries
            .values()
            .all(|value| value.get("verbs").is_some_and(Value::is_array))
        {
            let mut services = IndexMap::with_capacity(entries.len());
            for (path, value) in entries {
                let service: ServiceDefinition = serde_json::from_value(value)
                    .map_err(|e| format!("webServices `{path}`: {e}"))?;
                services.insert(path, service);
            }
            return Ok(Self::Current(services));
        }

        let mut legacy = LegacyServiceMap::with_capacity(entries.len());
        for (key, value) in entries {
            let verb: Verb = key.parse().map_err(|_| {
                format!(
                    "webServices `{key}`: expected a service with a `verbs` list, \
                     or a legacy verb key (get, post, put, delete, patch, head, options, trace, all)"
                )
            })?;
            let paths = serde_json::from_value(value)
                .map_err(|e| format!("webServices `{key}`: expected path -> mock file map: {e}"))?;
            legacy.insert(verb, paths);
        }
        Ok(Self::Legacy(legacy))
    }
}

impl<'de> Deserialize<'de> for WebServicesFormat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = IndexMap::<String, Value>::deserialize(deserializer)?;
        Self::from_entries(entries).map_err(de::Error::custom)
    }
}

impl From<WebServicesFormat> for ServiceMap {
    fn from(format: WebServicesFormat) -> Self {
        match format {
            WebServicesFormat::Current(map) => ServiceMap::from(map),
            WebServicesFormat::Legacy(legacy) => upconvert(legacy),
        }
    }
}

/// Convert a legacy service map into the normalized shape.
///
/// Verbs are visited in key order, then paths within each verb. A path seen
/// under several verbs collapses into one definition; its first-seen mock
/// file is kept.
pub fn upconvert(legacy: LegacyServiceMap) -> ServiceMap {
    let mut services = ServiceMap::new();

    for (verb, paths) in legacy {
        for (path, mock_file) in paths {
            match services.entry(path) {
                Entry::Occupied(mut entry) => {
                    let path = entry.key().clone();
                    let service = entry.get_mut();
                    if service.mock_file.as_deref() != Some(mock_file.as_str()) {
                        tracing::warn!(
                            path = %path,
                            verb = %verb,
                            kept = ?service.mock_file,
                            ignored = %mock_file,
                            "Legacy service path maps to different mock files; keeping the first"
                        );
                    }
                    if !service.verbs.contains(&verb) {
                        service.verbs.push(verb);
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert(ServiceDefinition::new(mock_file, vec![verb]));
                }
            }
        }
    }

    services
}
