//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use api_mocker::{HttpServer, MockServer, OptionsOverrides, Shutdown};
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A temporary mock directory with a config file next to it.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn mocks(&self) -> PathBuf {
        self.dir.path().join("mocks")
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.json")
    }

    /// Write a mock file relative to the mock directory.
    pub fn mock(self, name: &str, contents: &str) -> Self {
        let path = self.mocks().join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
        self
    }

    /// Write the config file, pointing `mockDirectory` at this fixture.
    pub fn write_config(&self, mut config: Value) {
        config["mockDirectory"] = Value::String(self.mocks().to_string_lossy().into_owned());
        std::fs::write(self.config_path(), config.to_string()).unwrap();
    }

    /// Mock server configured from the fixture's config file.
    pub fn mocker(&self) -> MockServer {
        let mut mocker = MockServer::new(OptionsOverrides::default());
        mocker.set_config_file(self.config_path()).load_config_file().unwrap();
        mocker
    }
}

/// A server running on an ephemeral port.
pub struct RunningServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
    pub reload_tx: mpsc::UnboundedSender<api_mocker::config::watcher::ReloadRequest>,
}

impl RunningServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub async fn start_server(mocker: MockServer) -> RunningServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (reload_tx, reloads) = mpsc::unbounded_channel();
    let server = HttpServer::new(mocker);

    let handle = tokio::spawn(async move { server.run(listener, reloads, server_shutdown).await });

    RunningServer {
        addr,
        shutdown,
        handle,
        reload_tx,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}
