//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{MonitorBlueprint, Protocol};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    interface: String,
    tcp_listeners: usize,
    udp_listeners: usize,
    watchdog_enabled: bool,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    interface: blueprint.link.interface.clone(),
                    tcp_listeners: blueprint.listeners_for(Protocol::Tcp).count(),
                    udp_listeners: blueprint.listeners_for(Protocol::Udp).count(),
                    watchdog_enabled: blueprint.watchdog.is_enabled(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &MonitorBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if !blueprint.link.enabled {
        warnings.push("Link probe disabled - link rate will not be recorded".to_string());
    }

    for protocol in [Protocol::Tcp, Protocol::Udp] {
        if blueprint.listeners_for(protocol).next().is_none() {
            warnings.push(format!(
                "No {protocol} listener - totals will only ever hold one protocol"
            ));
        }
    }

    let run = &blueprint.run;
    let watchdog = &blueprint.watchdog;
    if watchdog.is_enabled() && run.duration_s > 0.0 && watchdog.check_after_s >= run.duration_s {
        warnings.push(format!(
            "watchdog.check_after_s ({}) is not before the end of the run ({}s) - the check never fires",
            watchdog.check_after_s, run.duration_s
        ));
    }
    if watchdog.expected_flows > 0 && watchdog.check_after_s == 0.0 {
        warnings.push("watchdog.expected_flows set without check_after_s - watchdog disabled".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Interface: {}", summary.interface);
            println!("  TCP listeners: {}", summary.tcp_listeners);
            println!("  UDP listeners: {}", summary.udp_listeners);
            println!("  Watchdog: {}", if summary.watchdog_enabled { "on" } else { "off" });
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
