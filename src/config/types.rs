//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::delivery::DeliveryProtocol;
use crate::report::ReportFormat;

/// Service configuration, fixed at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Human-readable name of the verification tool, used in reports and
    /// synthesized timeout messages.
    pub tool_name: String,
    /// Command template with an optional `<APP_FILE>` placeholder.
    pub command: String,
    /// Per-invocation deadline in milliseconds.
    pub timeout_ms: u64,
    /// Delivery protocol for reports.
    pub protocol: DeliveryProtocol,
    /// Format reports are rendered in.
    pub report_format: ReportFormat,
    /// Directory holding per-app artifact and report directories.
    pub apps_dir: PathBuf,
    /// Directory holding the active log and monthly archives, if any.
    pub logs_dir: Option<PathBuf>,
    /// Reporting endpoint for asynchronous delivery callbacks.
    pub report_url: Option<String>,
    /// Keep uploaded artifacts after processing.
    pub keep_apps: bool,
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            tool_name: default_tool_name(),
            command: default_command(),
            timeout_ms: default_timeout_ms(),
            protocol: DeliveryProtocol::default(),
            report_format: ReportFormat::Html,
            apps_dir: default_apps_dir(),
            logs_dir: None,
            report_url: None,
            keep_apps: false,
            host: default_host(),
            port: default_port(),
        }
    }
}

impl BridgeConfig {
    /// The per-invocation deadline as a `Duration`.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_tool_name() -> String {
    "Signature Verifier".to_string()
}

fn default_command() -> String {
    "apksigner verify --verbose <APP_FILE>".to_string()
}

fn default_timeout_ms() -> u64 {
    120_000
}

fn default_apps_dir() -> PathBuf {
    std::env::temp_dir().join("sigbridge")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}
