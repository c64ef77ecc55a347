//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::MonitorBlueprint;
use ingestion::{bwm_ng_args, iperf_server_args};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    link: LinkInfo,
    listeners: Vec<ListenerInfo>,
    engine: EngineInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    watchdog: Option<WatchdogInfo>,
    duration_s: f64,
}

#[derive(Serialize)]
struct LinkInfo {
    interface: String,
    enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    command: Option<String>,
}

#[derive(Serialize)]
struct ListenerInfo {
    source_id: String,
    protocol: String,
    port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    command: Option<String>,
}

#[derive(Serialize)]
struct EngineInfo {
    report_interval_s: f64,
    burn_half_width_s: f64,
    death_tolerance_s: f64,
    liveness_window_s: f64,
    max_time_window_s: f64,
}

#[derive(Serialize)]
struct WatchdogInfo {
    expected_flows: usize,
    check_after_s: f64,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&blueprint, args.commands);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

fn build_config_info(blueprint: &MonitorBlueprint, with_commands: bool) -> ConfigInfo {
    let engine = &blueprint.engine;
    let link = &blueprint.link;

    let listeners = blueprint
        .listeners
        .iter()
        .map(|listener| ListenerInfo {
            source_id: listener.source_id(),
            protocol: listener.protocol.to_string(),
            port: listener.port,
            command: with_commands.then(|| {
                command_line(
                    &blueprint.run.iperf_command,
                    &iperf_server_args(listener.protocol, listener.port, engine.report_interval_s),
                )
            }),
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        link: LinkInfo {
            interface: link.interface.clone(),
            enabled: link.enabled,
            command: (with_commands && link.enabled)
                .then(|| command_line(&link.probe_command, &bwm_ng_args(&link.interface))),
        },
        listeners,
        engine: EngineInfo {
            report_interval_s: engine.report_interval_s,
            burn_half_width_s: engine.burn_half_width(),
            death_tolerance_s: engine.death_tolerance(),
            liveness_window_s: engine.liveness_window(),
            max_time_window_s: engine.max_time_window_s,
        },
        watchdog: blueprint.watchdog.is_enabled().then(|| WatchdogInfo {
            expected_flows: blueprint.watchdog.expected_flows,
            check_after_s: blueprint.watchdog.check_after_s,
        }),
        duration_s: blueprint.run.duration_s,
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("=== flowmeter configuration ({}) ===\n", info.version);

    println!("Link");
    println!("   ├─ Interface: {}", info.link.interface);
    println!(
        "   └─ Probe: {}",
        match (&info.link.command, info.link.enabled) {
            (Some(command), _) => command.as_str(),
            (None, true) => "enabled",
            (None, false) => "disabled",
        }
    );

    println!("\nListeners ({})", info.listeners.len());
    for (i, listener) in info.listeners.iter().enumerate() {
        let prefix = if i + 1 == info.listeners.len() { "└─" } else { "├─" };
        println!(
            "   {} {} ({} port {})",
            prefix, listener.source_id, listener.protocol, listener.port
        );
        if let Some(ref command) = listener.command {
            println!("   {}     $ {}", if i + 1 == info.listeners.len() { " " } else { "│" }, command);
        }
    }

    let engine = &info.engine;
    println!("\nEngine");
    println!("   ├─ Report interval: {}s", engine.report_interval_s);
    println!("   ├─ Burn half-width: {}s", engine.burn_half_width_s);
    println!("   ├─ Death tolerance: {}s", engine.death_tolerance_s);
    println!("   ├─ Liveness window: {}s", engine.liveness_window_s);
    println!("   └─ Pending window: {}s", engine.max_time_window_s);

    println!("\nRun");
    if info.duration_s > 0.0 {
        println!("   ├─ Duration: {}s", info.duration_s);
    } else {
        println!("   ├─ Duration: until stopped");
    }
    match &info.watchdog {
        Some(watchdog) => println!(
            "   └─ Watchdog: {} flows at t={}s",
            watchdog.expected_flows, watchdog.check_after_s
        ),
        None => println!("   └─ Watchdog: off"),
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_info_with_commands() {
        let mut blueprint = MonitorBlueprint::new("eth0", &[5001], &[5201]);
        blueprint.watchdog.expected_flows = 2;
        blueprint.watchdog.check_after_s = 10.0;

        let info = build_config_info(&blueprint, true);
        assert_eq!(info.listeners.len(), 2);
        assert_eq!(
            info.listeners[1].command.as_deref(),
            Some("iperf -s -i1 -fk -yC -u -p5201")
        );
        assert_eq!(info.engine.death_tolerance_s, 2.0);
        assert!(info.watchdog.is_some());
        assert!(info
            .link
            .command
            .as_deref()
            .is_some_and(|c| c.starts_with("bwm-ng -u bits")));
    }

    #[test]
    fn test_build_info_json_omits_commands() {
        let blueprint = MonitorBlueprint::new("eth0", &[5001], &[]);
        let info = build_config_info(&blueprint, false);
        let json = serde_json::to_value(&info).unwrap();

        assert!(json["listeners"][0].get("command").is_none());
        assert!(json.get("watchdog").is_none());
        assert_eq!(json["listeners"][0]["source_id"], "iperf_tcp_5001");
    }
}
