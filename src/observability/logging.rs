//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Honor `RUST_LOG` when set
//! - Apply the `quiet` option once the config file has been loaded
//!
//! # Design Decisions
//! - The filter sits behind a reload layer so `quiet` can change after startup
//! - `RUST_LOG` always wins over `quiet`

use tracing_subscriber::{
    fmt, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

const DEFAULT_DIRECTIVES: &str = "api_mocker=info,tower_http=info";
const QUIET_DIRECTIVES: &str = "warn";

/// Handle for adjusting the log filter after initialization.
pub struct LogHandle {
    filter: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogHandle {
    /// Switch between normal and quiet output. No-op when `RUST_LOG` is set.
    pub fn set_quiet(&self, quiet: bool) {
        if self.from_env {
            return;
        }
        if let Err(e) = self.filter.reload(default_filter(quiet)) {
            tracing::warn!(error = %e, "Failed to update log filter");
        }
    }
}

/// Initialize the global subscriber.
pub fn init(quiet: bool) -> LogHandle {
    let from_env = std::env::var_os(EnvFilter::DEFAULT_ENV).is_some();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(quiet));
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    LogHandle {
        filter: handle,
        from_env,
    }
}

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(quiet: bool) -> EnvFilter {
    EnvFilter::new(if quiet {
        QUIET_DIRECTIVES
    } else {
        DEFAULT_DIRECTIVES
    })
}
