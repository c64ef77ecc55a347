//! Config validation
//!
//! Field ranges come from the `validator` derives on the blueprint types;
//! the rules below cover what a single field cannot express:
//! - (protocol, port) unique across listeners
//! - pending retention longer than the death tolerance
//! - watchdog deadline set whenever a flow count is expected

use std::collections::HashSet;

use contracts::{ContractError, MonitorBlueprint};
use ::validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Validate a MonitorBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &MonitorBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_listeners(blueprint)?;
    validate_engine(blueprint)?;
    validate_watchdog(blueprint)?;
    Ok(())
}

fn validate_fields(blueprint: &MonitorBlueprint) -> Result<(), ContractError> {
    match blueprint.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let (field, message) = first_error(&errors, "")
                .unwrap_or_else(|| ("blueprint".to_string(), errors.to_string()));
            Err(ContractError::config_validation(field, message))
        }
    }
}

/// Dotted path and message of the first field error, in field-name order.
fn first_error(errors: &ValidationErrors, prefix: &str) -> Option<(String, String)> {
    let mut entries: Vec<_> = errors.errors().iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in entries {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        let found = match kind {
            ValidationErrorsKind::Field(list) => list.first().map(|e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("failed '{}' check", e.code));
                (path, message)
            }),
            ValidationErrorsKind::Struct(inner) => first_error(inner, &path),
            ValidationErrorsKind::List(items) => items
                .iter()
                .find_map(|(idx, inner)| first_error(inner, &format!("{path}[{idx}]"))),
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

fn validate_listeners(blueprint: &MonitorBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, listener) in blueprint.listeners.iter().enumerate() {
        if !seen.insert((listener.protocol, listener.port)) {
            return Err(ContractError::config_validation(
                format!("listeners[{idx}]"),
                format!("duplicate {} listener on port {}", listener.protocol, listener.port),
            ));
        }
    }
    Ok(())
}

fn validate_engine(blueprint: &MonitorBlueprint) -> Result<(), ContractError> {
    let engine = &blueprint.engine;
    if engine.max_time_window_s <= engine.death_tolerance() {
        return Err(ContractError::config_validation(
            "engine.max_time_window_s",
            format!(
                "max_time_window_s ({}) must exceed the death tolerance ({})",
                engine.max_time_window_s,
                engine.death_tolerance()
            ),
        ));
    }
    Ok(())
}

fn validate_watchdog(blueprint: &MonitorBlueprint) -> Result<(), ContractError> {
    let watchdog = &blueprint.watchdog;
    if watchdog.expected_flows > 0 && watchdog.check_after_s <= 0.0 {
        return Err(ContractError::config_validation(
            "watchdog.check_after_s",
            "check_after_s must be > 0 when expected_flows is set",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ListenerConfig, Protocol};

    fn minimal_blueprint() -> MonitorBlueprint {
        MonitorBlueprint::new("eth0", &[5001], &[5201])
    }

    fn error_of(bp: &MonitorBlueprint) -> String {
        validate(bp).unwrap_err().to_string()
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&minimal_blueprint()).is_ok());
    }

    #[test]
    fn test_same_port_different_protocols_allowed() {
        let bp = MonitorBlueprint::new("eth0", &[5001], &[5001]);
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_duplicate_listener() {
        let mut bp = minimal_blueprint();
        bp.listeners.push(ListenerConfig::new(Protocol::Tcp, 5001));
        let err = error_of(&bp);
        assert!(err.contains("duplicate tcp listener"), "got: {err}");
    }

    #[test]
    fn test_no_listeners() {
        let mut bp = minimal_blueprint();
        bp.listeners.clear();
        let err = error_of(&bp);
        assert!(err.contains("listeners"), "got: {err}");
    }

    #[test]
    fn test_zero_port() {
        let mut bp = minimal_blueprint();
        bp.listeners[1].port = 0;
        let err = error_of(&bp);
        assert!(err.contains("listeners[1].port"), "got: {err}");
    }

    #[test]
    fn test_empty_interface() {
        let mut bp = minimal_blueprint();
        bp.link.interface.clear();
        let err = error_of(&bp);
        assert!(err.contains("link.interface"), "got: {err}");
    }

    #[test]
    fn test_burn_fraction_range() {
        let mut bp = minimal_blueprint();
        bp.engine.burn_fraction = 1.0;
        let err = error_of(&bp);
        assert!(err.contains("engine.burn_fraction"), "got: {err}");
    }

    #[test]
    fn test_death_factor_below_one() {
        let mut bp = minimal_blueprint();
        bp.engine.death_tolerance_factor = 0.5;
        let err = error_of(&bp);
        assert!(err.contains("engine.death_tolerance_factor"), "got: {err}");
    }

    #[test]
    fn test_window_shorter_than_tolerance() {
        let mut bp = minimal_blueprint();
        bp.engine.max_time_window_s = 2.0;
        let err = error_of(&bp);
        assert!(err.contains("must exceed the death tolerance"), "got: {err}");
    }

    #[test]
    fn test_watchdog_without_deadline() {
        let mut bp = minimal_blueprint();
        bp.watchdog.expected_flows = 3;
        let err = error_of(&bp);
        assert!(err.contains("watchdog.check_after_s"), "got: {err}");
    }
}
