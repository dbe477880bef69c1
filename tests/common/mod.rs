//! Shared utilities for integration and load testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use command_gate::clock::Clock;
use command_gate::config::GateConfig;
use command_gate::executor::{CommandExecutor, ExecutionError};
use command_gate::http::HttpServer;
use command_gate::lifecycle::Shutdown;
use command_gate::observability::{AuditSink, TracingAuditSink};

/// Executor that remembers every command it was handed.
#[derive(Default)]
pub struct RecordingExecutor {
    commands: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

impl CommandExecutor for RecordingExecutor {
    fn execute(&self, command: &str) -> Result<(), ExecutionError> {
        self.commands.lock().unwrap().push(command.to_string());
        Ok(())
    }
}

/// A gate running on an ephemeral loopback port.
pub struct TestGate {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub executor: Arc<RecordingExecutor>,
}

impl TestGate {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestGate {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a gate with `config` and `clock`, recording executed commands.
pub async fn start_gate(mut config: GateConfig, clock: Arc<dyn Clock>) -> TestGate {
    config.listener.bind_address = "127.0.0.1:0".into();
    let listener = tokio::net::TcpListener::bind(&config.listener.bind_address)
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let executor = Arc::new(RecordingExecutor::default());
    let audit: Arc<dyn AuditSink> = Arc::new(TracingAuditSink);
    let server = HttpServer::with_components(
        config,
        clock,
        executor.clone() as Arc<dyn CommandExecutor>,
        audit,
    );

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestGate {
        addr,
        shutdown,
        executor,
    }
}

/// Client that never reuses connections between requests.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
