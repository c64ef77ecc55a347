//! `run` command implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{MonitorBlueprint, Protocol};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{default_output_path, write_snapshot, Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    let blueprint = resolve_blueprint(args)?;

    info!(
        interface = %blueprint.link.interface,
        tcp_ports = ?blueprint.ports(Protocol::Tcp),
        udp_ports = ?blueprint.ports(Protocol::Udp),
        duration_s = blueprint.run.duration_s,
        expected_flows = blueprint.watchdog.expected_flows,
        "Configuration resolved"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let output_path = blueprint
        .run
        .output_path
        .clone()
        .unwrap_or_else(default_output_path);

    let pipeline = Pipeline::new(PipelineConfig {
        duration: Duration::try_from_secs_f64(blueprint.run.duration_s)
            .ok()
            .filter(|d| !d.is_zero()),
        tick_period: Duration::from_millis(args.tick_ms.max(1)),
        noise_floor_bps: args.noise_floor as f64,
        metrics_port: (args.metrics_port != 0).then_some(args.metrics_port),
        blueprint,
    });

    info!("Starting measurement run...");
    let stats = pipeline.run().await.context("Measurement run failed")?;

    write_snapshot(&output_path, &stats.snapshot)?;
    info!(path = %output_path.display(), "Final snapshot written");
    stats.print_summary();

    if stats.run.watchdog_tripped {
        warn!("Run ended by the liveness watchdog");
        anyhow::bail!("Too few active flows at the liveness check");
    }

    info!("flowmeter finished");
    Ok(())
}

/// Merge the optional config file with the command-line overrides, then
/// validate the result.
pub fn resolve_blueprint(args: &RunArgs) -> Result<MonitorBlueprint, CliError> {
    let mut blueprint = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path));
            }
            info!(config = %path.display(), "Loading configuration");
            let mut blueprint = ConfigLoader::load_from_path(path)?;
            if let Some(ref interface) = args.interface {
                blueprint.link.interface = interface.clone();
            }
            blueprint
        }
        None => {
            let interface = args.interface.as_ref().ok_or(CliError::MissingInterface)?;
            MonitorBlueprint::new(interface.as_str(), &[], &[])
        }
    };

    override_ports(&mut blueprint, Protocol::Tcp, &args.tcp_ports);
    override_ports(&mut blueprint, Protocol::Udp, &args.udp_ports);

    if let Some(duration) = args.duration {
        blueprint.run.duration_s = duration;
    }
    if let Some(expect) = args.expect {
        blueprint.watchdog.expected_flows = expect;
    }
    if let Some(check_after) = args.check_after {
        blueprint.watchdog.check_after_s = check_after;
    }
    if let Some(ref output) = args.output {
        blueprint.run.output_path = Some(output.clone());
    }

    ConfigLoader::validate(&blueprint)?;
    Ok(blueprint)
}

/// Ports given on the command line replace the configured listeners of
/// that protocol.
fn override_ports(blueprint: &mut MonitorBlueprint, protocol: Protocol, ports: &[u16]) {
    if ports.is_empty() {
        return;
    }
    blueprint.listeners.retain(|l| l.protocol != protocol);
    blueprint.listeners.extend(
        ports
            .iter()
            .map(|&port| contracts::ListenerConfig::new(protocol, port)),
    );
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &MonitorBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Link:");
    println!("  Interface: {}", blueprint.link.interface);
    println!(
        "  Probe: {}",
        if blueprint.link.enabled {
            blueprint.link.probe_command.as_str()
        } else {
            "(disabled)"
        }
    );

    println!("\nListeners ({}):", blueprint.listeners.len());
    for listener in &blueprint.listeners {
        println!("  - {} port {}", listener.protocol, listener.port);
    }

    println!("\nRun:");
    if blueprint.run.duration_s > 0.0 {
        println!("  Duration: {}s", blueprint.run.duration_s);
    } else {
        println!("  Duration: until stopped");
    }
    if blueprint.watchdog.is_enabled() {
        println!(
            "  Watchdog: {} flows at t={}s",
            blueprint.watchdog.expected_flows, blueprint.watchdog.check_after_s
        );
    }

    println!();
}
