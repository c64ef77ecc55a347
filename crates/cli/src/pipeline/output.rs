//! Final snapshot dump.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use contracts::StoreSnapshot;

use crate::error::{CliError, Result};

/// `flowmeter_<date>_<time>.json` in the working directory.
pub fn default_output_path() -> PathBuf {
    PathBuf::from(Local::now().format("flowmeter_%Y%m%d_%H%M%S.json").to_string())
}

/// Write the snapshot as pretty JSON, creating parent directories.
pub fn write_snapshot(path: &Path, snapshot: &StoreSnapshot) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CliError::output(parent, e))?;
    }

    let file = File::create(path).map_err(|e| CliError::output(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, snapshot)?;
    writer
        .write_all(b"\n")
        .and_then(|()| writer.flush())
        .map_err(|e| CliError::output(path, e))
}

#[cfg(test)]
mod tests {
    use contracts::{FlowId, FlowSnapshot, Sample};
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_write_snapshot_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("runs").join("result.json");

        let mut snapshot = StoreSnapshot {
            taken_at: 6.0,
            ..Default::default()
        };
        snapshot.flows.insert(
            FlowId::new("10.0.0.2"),
            FlowSnapshot {
                tcp: vec![Sample::new(5.0, 100.0)],
                udp: vec![Sample::new(5.0, 50.0)],
                total: vec![Sample::new(5.0, 150.0)],
                ..Default::default()
            },
        );

        write_snapshot(&path, &snapshot).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let back: StoreSnapshot = serde_json::from_str(&content).unwrap();
        assert_eq!(back.flows["10.0.0.2"].total_at(5.0), Some(150.0));
        assert_eq!(back.taken_at, 6.0);
    }

    #[test]
    fn test_default_output_name() {
        let name = default_output_path().to_string_lossy().into_owned();
        assert!(name.starts_with("flowmeter_"));
        assert!(name.ends_with(".json"));
    }
}
