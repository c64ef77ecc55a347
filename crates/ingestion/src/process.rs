//! Line source backed by a spawned measurement process.
//!
//! The child's stdout is read line by line on a dedicated thread. Stopping
//! the source kills the child, which closes stdout and lets the reader
//! thread finish.

use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use contracts::{
    ContractError, LineCallback, LineSource, ListenerConfig, Protocol, SourceEvent, StreamKind,
};
use tracing::{debug, warn};

/// Arguments for an iperf server in CSV report mode.
pub fn iperf_server_args(protocol: Protocol, port: u16, report_interval: f64) -> Vec<String> {
    let mut args = vec![
        "-s".to_string(),
        format!("-i{report_interval}"),
        "-fk".to_string(),
        "-yC".to_string(),
    ];
    if protocol == Protocol::Udp {
        args.push("-u".to_string());
    }
    args.push(format!("-p{port}"));
    args
}

/// Arguments for bwm-ng printing one CSV rate line per second.
pub fn bwm_ng_args(interface: &str) -> Vec<String> {
    [
        "-u", "bits", "-T", "rate", "-t", "1000", "-I", interface, "-d", "0", "-c", "0", "-o",
        "csv",
    ]
    .iter()
    .map(|arg| arg.to_string())
    .collect()
}

pub struct ProcessLineSource {
    source_id: String,
    kind: StreamKind,
    program: String,
    args: Vec<String>,
    listening: Arc<AtomicBool>,
    child: Mutex<Option<Child>>,
}

impl ProcessLineSource {
    pub fn new(
        source_id: impl Into<String>,
        kind: StreamKind,
        program: impl Into<String>,
        args: Vec<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            kind,
            program: program.into(),
            args,
            listening: Arc::new(AtomicBool::new(false)),
            child: Mutex::new(None),
        }
    }

    /// iperf server for one listener.
    pub fn iperf_server(program: &str, listener: &ListenerConfig, report_interval: f64) -> Self {
        Self::new(
            listener.source_id(),
            StreamKind::Listener(listener.protocol),
            program,
            iperf_server_args(listener.protocol, listener.port, report_interval),
        )
    }

    /// bwm-ng probe on one interface.
    pub fn bwm_ng(program: &str, interface: &str) -> Self {
        Self::new(
            format!("bwm_ng_{interface}"),
            StreamKind::LinkProbe,
            program,
            bwm_ng_args(interface),
        )
    }

    /// Command line, for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Kill (if needed) and wait on the child of a previous `listen`.
    fn reap_previous(&self) {
        let previous = self
            .child
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut child) = previous else {
            return;
        };
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(source_id = %self.source_id, %status, "reaped previous process");
            }
            _ => {
                let _ = child.kill();
                let _ = child.wait();
            }
        }
    }

    #[cfg(test)]
    fn child_id(&self) -> Option<u32> {
        self.child
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Child::id)
    }

    fn spawn_child(&self) -> Result<Child, ContractError> {
        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ContractError::source_spawn(&self.source_id, e.to_string()))
    }
}

impl LineSource for ProcessLineSource {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn kind(&self) -> StreamKind {
        self.kind
    }

    fn listen(&self, callback: LineCallback) -> Result<(), ContractError> {
        if self.listening.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.reap_previous();

        let mut child = match self.spawn_child() {
            Ok(child) => child,
            Err(e) => {
                self.listening.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };
        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            self.listening.store(false, Ordering::SeqCst);
            return Err(ContractError::source_spawn(&self.source_id, "stdout not captured"));
        };
        debug!(source_id = %self.source_id, pid = child.id(), command = %self.command_line(), "process started");

        let listening = Arc::clone(&self.listening);
        let source_id = self.source_id.clone();
        let worker = thread::Builder::new()
            .name(format!("src-{}", self.source_id))
            .spawn(move || {
                let mut read_error = None;
                for line in BufReader::new(stdout).lines() {
                    if !listening.load(Ordering::Relaxed) {
                        break;
                    }
                    match line {
                        Ok(line) => callback(SourceEvent::Line(line)),
                        Err(e) => {
                            read_error = Some(e);
                            break;
                        }
                    }
                }

                let reason = match read_error {
                    Some(e) => format!("read error: {e}"),
                    None if !listening.load(Ordering::Relaxed) => "stopped".to_string(),
                    None => "process closed its output".to_string(),
                };
                listening.store(false, Ordering::SeqCst);
                debug!(source_id = %source_id, %reason, "reader finished");
                callback(SourceEvent::Ended { reason });
            });

        if let Err(e) = worker {
            let _ = child.kill();
            let _ = child.wait();
            self.listening.store(false, Ordering::SeqCst);
            return Err(e.into());
        }

        *self.child.lock().unwrap_or_else(PoisonError::into_inner) = Some(child);
        Ok(())
    }

    fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
        let child = self
            .child
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut child) = child {
            if let Err(e) = child.kill() {
                warn!(source_id = %self.source_id, error = %e, "failed to kill process");
            }
            let _ = child.wait();
            debug!(source_id = %self.source_id, "process stopped");
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}

impl Drop for ProcessLineSource {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_iperf_args() {
        assert_eq!(
            iperf_server_args(Protocol::Tcp, 5001, 1.0),
            vec!["-s", "-i1", "-fk", "-yC", "-p5001"]
        );
        assert_eq!(
            iperf_server_args(Protocol::Udp, 5201, 0.5),
            vec!["-s", "-i0.5", "-fk", "-yC", "-u", "-p5201"]
        );
    }

    #[test]
    fn test_bwm_ng_command_line() {
        let source = ProcessLineSource::bwm_ng("bwm-ng", "eth0");
        assert_eq!(source.source_id(), "bwm_ng_eth0");
        assert_eq!(source.kind(), StreamKind::LinkProbe);
        assert_eq!(
            source.command_line(),
            "bwm-ng -u bits -T rate -t 1000 -I eth0 -d 0 -c 0 -o csv"
        );
    }

    #[test]
    fn test_missing_program_fails_to_listen() {
        let source = ProcessLineSource::new(
            "ghost",
            StreamKind::LinkProbe,
            "/nonexistent/flowmeter-probe",
            Vec::new(),
        );
        let result = source.listen(Arc::new(|_| {}));
        assert!(matches!(result, Err(ContractError::SourceSpawn { .. })));
        assert!(!source.is_listening());
    }

    #[cfg(unix)]
    #[test]
    fn test_reads_lines_until_exit() {
        let source = ProcessLineSource::new(
            "echo",
            StreamKind::LinkProbe,
            "sh",
            vec!["-c".to_string(), "printf 'a\\nb\\n'".to_string()],
        );
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        source
            .listen(Arc::new(move |event| {
                let _ = tx.lock().unwrap().send(event);
            }))
            .unwrap();

        let timeout = Duration::from_secs(5);
        assert_eq!(rx.recv_timeout(timeout).unwrap(), SourceEvent::Line("a".into()));
        assert_eq!(rx.recv_timeout(timeout).unwrap(), SourceEvent::Line("b".into()));
        assert!(matches!(
            rx.recv_timeout(timeout).unwrap(),
            SourceEvent::Ended { .. }
        ));
        source.stop();
        assert!(!source.is_listening());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_relisten_reaps_exited_child() {
        let source = ProcessLineSource::new(
            "short",
            StreamKind::LinkProbe,
            "sh",
            vec!["-c".to_string(), "printf 'x\\n'".to_string()],
        );
        let wait_ended = |source: &ProcessLineSource| {
            let (tx, rx) = mpsc::channel();
            let tx = Mutex::new(tx);
            source
                .listen(Arc::new(move |event| {
                    if matches!(event, SourceEvent::Ended { .. }) {
                        let _ = tx.lock().unwrap().send(());
                    }
                }))
                .unwrap();
            rx.recv_timeout(Duration::from_secs(5)).unwrap();
        };

        wait_ended(&source);
        let first = source.child_id().unwrap();

        wait_ended(&source);
        let second = source.child_id().unwrap();
        assert_ne!(first, second);
        // waited on, so no zombie entry is left behind
        assert!(!std::path::Path::new(&format!("/proc/{first}")).exists());

        source.stop();
        assert!(source.child_id().is_none());
    }
}
