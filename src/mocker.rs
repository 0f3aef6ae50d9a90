//! Mock server instance: owned options, config file handling and route
//! compilation.
//!
//! Setup runs in a fixed order: [`MockServer::new`], then
//! [`MockServer::set_config_file`], [`MockServer::load_config_file`] and
//! finally [`MockServer::set_routes`] (or [`MockServer::route_table`]).
//! Instances share nothing, so several can be configured side by side.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::loader::{load_config, resolve_config_path, ConfigError};
use crate::config::schema::{Options, OptionsOverrides};
use crate::files::{FileReader, FsReader};
use crate::http::response::ServeContext;
use crate::routing::compiler::{self, RouteDescriptor, RouteRegistrar};
use crate::routing::resolver::{self, FieldLookup};
use crate::routing::router::RouteTable;

#[derive(Debug, Clone)]
pub struct MockServer {
    options: Options,
    config_file_path: Option<PathBuf>,
    reader: Arc<dyn FileReader>,
}

impl Default for MockServer {
    fn default() -> Self {
        Self::new(OptionsOverrides::default())
    }
}

impl MockServer {
    /// Create a server with defaults shallow-merged with `overrides`.
    pub fn new(overrides: OptionsOverrides) -> Self {
        let mut options = Options::default();
        options.merge(overrides);

        Self {
            options,
            config_file_path: None,
            reader: Arc::new(FsReader),
        }
    }

    /// Replace the file reader used for config and mock files.
    pub fn with_reader(mut self, reader: Arc<dyn FileReader>) -> Self {
        self.reader = reader;
        self
    }

    /// Built-in defaults every instance starts from.
    pub fn defaults() -> Options {
        Options::default()
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn config_file_path(&self) -> Option<&Path> {
        self.config_file_path.as_deref()
    }

    /// Store the config file path, resolving relative paths against the
    /// current working directory.
    pub fn set_config_file(&mut self, path: impl AsRef<Path>) -> &mut Self {
        let path = path.as_ref();
        let resolved = match std::env::current_dir() {
            Ok(cwd) => resolve_config_path(path, &cwd),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Cannot read working directory, keeping config path as given"
                );
                path.to_path_buf()
            }
        };

        tracing::debug!(path = %resolved.display(), "Config file set");
        self.config_file_path = Some(resolved);
        self
    }

    /// Forget any stored config file path.
    pub fn clear_config_file(&mut self) -> &mut Self {
        self.config_file_path = None;
        self
    }

    /// Load the stored config file and merge it over the current options.
    ///
    /// Without a stored path this is a no-op. On error the options are left
    /// unchanged.
    pub fn load_config_file(&mut self) -> Result<&mut Self, ConfigError> {
        let Some(path) = self.config_file_path.clone() else {
            return Ok(self);
        };

        let overrides = load_config(self.reader.as_ref(), &path)?;
        tracing::info!(
            path = %path.display(),
            services = overrides.web_services.as_ref().map(|s| s.len()),
            "Config file loaded"
        );

        self.options.merge(overrides);
        Ok(self)
    }

    /// Rewrite a route's mock file from the request's switch value.
    pub fn set_mock_file(&self, route: &mut RouteDescriptor, request: &dyn FieldLookup) {
        resolver::set_mock_file(route, request);
    }

    /// Default the status and register one route.
    pub fn set_route(&self, route: RouteDescriptor, registrar: &mut dyn RouteRegistrar) {
        compiler::set_route(route, registrar);
    }

    /// Compile this instance's service map into `registrar`.
    pub fn set_routes(&self, registrar: &mut dyn RouteRegistrar) {
        compiler::set_routes(
            &self.options.web_services,
            self.options.default_latency(),
            registrar,
        );
    }

    /// Compile the service map into a fresh route table.
    pub fn route_table(&self) -> RouteTable {
        let mut table = RouteTable::new();
        self.set_routes(&mut table);
        table
    }

    /// Handler context for routes compiled from the current options.
    pub fn serve_context(&self) -> Arc<ServeContext> {
        Arc::new(ServeContext::new(
            &self.options.mock_directory,
            self.reader.clone(),
        ))
    }
}
