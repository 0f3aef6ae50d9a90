//! Configuration loading from disk.

use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::config::schema::OptionsOverrides;
use crate::files::FileReader;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid port: {0:?}")]
    InvalidPort(String),
}

/// Read and parse a JSON config file into overrides.
///
/// Legacy `webServices` maps are upconverted while parsing, so the returned
/// overrides always carry the normalized shape.
pub fn load_config(reader: &dyn FileReader, path: &Path) -> Result<OptionsOverrides, ConfigError> {
    let content = reader
        .read_to_string(path)
        .map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    parse_config(&content)
}

/// Parse config file contents.
pub fn parse_config(content: &str) -> Result<OptionsOverrides, ConfigError> {
    Ok(serde_json::from_str(content)?)
}

/// Resolve a config path against `base` the way a shell would: absolute
/// paths are kept, relative ones are joined and lexically normalized.
pub fn resolve_config_path(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    normalize(&base.join(path))
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
