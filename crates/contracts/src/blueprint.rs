//! MonitorBlueprint - Config Loader output
//!
//! Describes one measurement run: which listeners to start, which
//! interface to probe, engine tuning, watchdog and run control.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

use crate::{EngineConfig, Protocol, WatchdogConfig};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete run configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MonitorBlueprint {
    #[serde(default)]
    pub version: ConfigVersion,

    /// Link probe settings
    #[validate(nested)]
    pub link: LinkConfig,

    /// Per-protocol report listeners
    #[validate(length(min = 1), nested)]
    pub listeners: Vec<ListenerConfig>,

    /// Reconciliation tuning
    #[serde(default)]
    #[validate(nested)]
    pub engine: EngineConfig,

    /// Liveness check
    #[serde(default)]
    #[validate(nested)]
    pub watchdog: WatchdogConfig,

    /// Run control
    #[serde(default)]
    #[validate(nested)]
    pub run: RunConfig,
}

/// Link probe (whole-interface rate)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LinkConfig {
    /// Interface receiving the measured traffic
    #[validate(length(min = 1))]
    pub interface: String,

    /// Probe executable
    #[serde(default = "default_probe_command")]
    pub probe_command: String,

    /// Start the probe at all
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_probe_command() -> String {
    "bwm-ng".to_string()
}

fn default_true() -> bool {
    true
}

/// One iperf server listener
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
pub struct ListenerConfig {
    pub protocol: Protocol,

    #[validate(range(min = 1))]
    pub port: u16,
}

impl ListenerConfig {
    pub fn new(protocol: Protocol, port: u16) -> Self {
        Self { protocol, port }
    }

    /// Stable identifier used in logs and metrics.
    pub fn source_id(&self) -> String {
        format!("iperf_{}_{}", self.protocol, self.port)
    }
}

/// Run control
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RunConfig {
    /// Run length in seconds (0 = until stopped)
    #[validate(range(min = 0.0))]
    pub duration_s: f64,

    /// iperf executable
    #[validate(length(min = 1))]
    pub iperf_command: String,

    /// Where the final snapshot is written (None = timestamped default)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            duration_s: 0.0,
            iperf_command: "iperf".to_string(),
            output_path: None,
        }
    }
}

impl MonitorBlueprint {
    /// Minimal blueprint for an interface and port lists.
    pub fn new(interface: impl Into<String>, tcp_ports: &[u16], udp_ports: &[u16]) -> Self {
        let listeners = tcp_ports
            .iter()
            .map(|&port| ListenerConfig::new(Protocol::Tcp, port))
            .chain(
                udp_ports
                    .iter()
                    .map(|&port| ListenerConfig::new(Protocol::Udp, port)),
            )
            .collect();

        Self {
            version: ConfigVersion::V1,
            link: LinkConfig {
                interface: interface.into(),
                probe_command: default_probe_command(),
                enabled: true,
            },
            listeners,
            engine: EngineConfig::default(),
            watchdog: WatchdogConfig::default(),
            run: RunConfig::default(),
        }
    }

    /// Listeners for one protocol.
    pub fn listeners_for(&self, protocol: Protocol) -> impl Iterator<Item = &ListenerConfig> {
        self.listeners
            .iter()
            .filter(move |listener| listener.protocol == protocol)
    }

    /// Ports of one protocol, in configuration order.
    pub fn ports(&self, protocol: Protocol) -> Vec<u16> {
        self.listeners_for(protocol).map(|l| l.port).collect()
    }
}
