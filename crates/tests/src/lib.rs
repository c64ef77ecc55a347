//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Reconciliation properties of the store under arbitrary arrival orders
//! - Scripted line sources -> ingestion -> store -> monitor (no processes)
//! - Blueprint -> pipeline wiring

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
        assert_eq!(contracts::Protocol::Tcp.other(), contracts::Protocol::Udp);
    }
}

#[cfg(test)]
mod reconciliation_tests {
    use contracts::{EngineConfig, FlowId, Protocol};
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use rate_engine::Store;

    fn flow() -> FlowId {
        FlowId::new("10.0.0.2")
    }

    fn tcp_value(t: u32) -> f64 {
        f64::from(t) * 100.0
    }

    fn udp_value(t: u32) -> f64 {
        f64::from(t) * 10.0 + 1.0
    }

    /// Both protocols report on the same one-second grid, delivered in a
    /// shuffled order: every total converges to the sum.
    #[test]
    fn test_totals_converge_for_any_arrival_order() {
        const STEPS: u32 = 40;

        for seed in 0..16 {
            let mut arrivals: Vec<(Protocol, u32)> = (1..=STEPS)
                .flat_map(|t| [(Protocol::Tcp, t), (Protocol::Udp, t)])
                .collect();
            arrivals.shuffle(&mut StdRng::seed_from_u64(seed));

            let store = Store::new(EngineConfig::default());
            for (protocol, t) in arrivals {
                let value = match protocol {
                    Protocol::Tcp => tcp_value(t),
                    Protocol::Udp => udp_value(t),
                };
                store.ingest(&flow(), protocol, f64::from(t), value);
            }

            let snapshot = store.snapshot(f64::from(STEPS));
            let totals = &snapshot.flows["10.0.0.2"];
            for t in 1..=STEPS {
                assert_eq!(
                    totals.total_at(f64::from(t)),
                    Some(tcp_value(t) + udp_value(t)),
                    "seed {seed}, t={t}"
                );
            }
        }
    }

    #[test]
    fn test_one_sided_flow_keeps_own_values() {
        let store = Store::new(EngineConfig::default());
        for t in 1..=100u32 {
            store.ingest(&flow(), Protocol::Tcp, f64::from(t), tcp_value(t));
        }

        let snapshot = store.snapshot(100.0);
        let totals = &snapshot.flows["10.0.0.2"];
        for t in 1..=100u32 {
            assert_eq!(totals.total_at(f64::from(t)), Some(tcp_value(t)));
        }
        assert!(totals.udp.is_empty());
    }

    #[test]
    fn test_pending_never_older_than_window() {
        let config = EngineConfig::default();
        let window = config.max_time_window_s;
        let store = Store::new(config);

        for t in 1..=200u32 {
            store.ingest(&flow(), Protocol::Udp, f64::from(t), udp_value(t));

            let snapshot = store.snapshot(f64::from(t));
            let pending = &snapshot.flows["10.0.0.2"].pending;
            let newest = pending.iter().copied().fold(f64::MIN, f64::max);
            assert!(pending.iter().all(|&ts| ts >= newest - window));
        }
    }

    #[test]
    fn test_silence_marked_exactly_once() {
        let store = Store::new(EngineConfig::default());
        store.ingest(&flow(), Protocol::Tcp, 10.0, 500.0);

        // Marks tcp and total
        assert_eq!(store.sweep_dead(12.0), 2);
        assert_eq!(store.sweep_dead(13.0), 0);
        assert_eq!(store.sweep_dead(50.0), 0);

        let snapshot = store.snapshot(50.0);
        let tcp = &snapshot.flows["10.0.0.2"].tcp;
        assert_eq!(tcp.len(), 2);
        assert_eq!((tcp[1].time, tcp[1].value), (11.0, 0.0));

        // A fresh sample re-arms the detector
        store.ingest(&flow(), Protocol::Tcp, 60.0, 500.0);
        assert_eq!(store.sweep_dead(62.0), 2);
    }

    #[test]
    fn test_burn_keeps_later_insert() {
        let store = Store::new(EngineConfig::default());
        store.ingest(&flow(), Protocol::Udp, 5.0, 50.0);
        let outcome = store.ingest(&flow(), Protocol::Udp, 5.5, 70.0);
        assert_eq!(outcome.burned, 1);

        let snapshot = store.snapshot(6.0);
        let udp = &snapshot.flows["10.0.0.2"].udp;
        assert_eq!(udp.len(), 1);
        assert_eq!((udp[0].time, udp[0].value), (5.5, 70.0));
    }

    #[test]
    fn test_tcp_then_udp_scenario() {
        let store = Store::new(EngineConfig::default());
        store.ingest(&flow(), Protocol::Tcp, 5.0, 100.0);
        assert_eq!(
            store.snapshot(5.0).flows["10.0.0.2"].total_at(5.0),
            Some(100.0)
        );

        store.ingest(&flow(), Protocol::Udp, 5.0, 50.0);
        let snapshot = store.snapshot(5.0);
        assert_eq!(snapshot.flows["10.0.0.2"].total_at(5.0), Some(150.0));
        assert!(snapshot.flows["10.0.0.2"].pending.is_empty());
    }

    #[test]
    fn test_missing_sibling_ages_out() {
        let store = Store::new(EngineConfig::default());
        store.ingest(&flow(), Protocol::Tcp, 5.0, 100.0);
        assert!(store.snapshot(5.0).flows["10.0.0.2"].pending.contains(&5.0));

        for t in 6..=70u32 {
            store.ingest(&flow(), Protocol::Tcp, f64::from(t), tcp_value(t));
        }

        let snapshot = store.snapshot(70.0);
        let totals = &snapshot.flows["10.0.0.2"];
        assert_eq!(totals.total_at(5.0), Some(100.0));
        assert!(!totals.pending.contains(&5.0));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{EngineConfig, LineSource, Protocol, StopFlag, StreamKind, WatchdogConfig};
    use ingestion::{IngestionPipeline, ScriptedLineSource};
    use observability::RunStatsAggregator;
    use rate_engine::{ManualClock, Monitor, Store};

    const TCP_LINES: &[&str] = &[
        "Server listening on TCP port 5001",
        "20150721213000,10.0.0.1,0,10.0.0.2,0,-1,0.0-1.0,12500,100000",
        "20150721213000,10.0.0.1,0,10.0.0.3,0,-1,0.0-1.0,25000,200000",
        "20150721213001,10.0.0.1,0,10.0.0.2,0,-1,1.0-2.0,13750,110000",
        "20150721213001,10.0.0.1,0,10.0.0.3,0,-1,1.0-2.0,26250,210000",
        "20150721213001,10.0.0.1,5001,10.0.0.2,41234,4,0.0-2.0,26250,105000",
    ];

    const UDP_LINES: &[&str] = &[
        "20150721213000,10.0.0.1,5201,10.0.0.2,40000,3,0.0-1.0,6250,50000,0.010,0,5,0.000,0",
        "20150721213001,10.0.0.1,5201,10.0.0.2,40000,3,1.0-2.0,7500,60000,0.012,0,6,0.000,0",
        "20150721213001,10.0.0.1,5201,10.0.0.2,40000,3,1.0-2.0,7500,60000,0.012,0,6,-nan,0",
    ];

    const LINK_LINES: &[&str] = &[
        "1437515225;eth0;0.00;45000.00;45000.00;0;0;0;0;0;0;0;0;0;0;0",
        "1437515225;total;0.00;45000.00;45000.00;0;0;0;0;0;0;0;0;0;0;0",
        "1437515226;eth0;0.00;46250.00;46250.00;0;0;0;0;0;0;0;0;0;0;0",
    ];

    const UNIX_ORIGIN: f64 = 1_437_515_220.0;

    fn script(id: &str, kind: StreamKind, lines: &[&str]) -> Box<dyn LineSource> {
        Box::new(ScriptedLineSource::new(id, kind, lines.iter().copied()))
    }

    /// Runs the three scripted streams to completion with the clock
    /// frozen at t=5.
    fn ingest_scripts(stop: StopFlag) -> (Arc<Store>, IngestionPipeline) {
        let clock = Arc::new(ManualClock::new(UNIX_ORIGIN));
        clock.set(5.0);
        let store = Arc::new(Store::new(EngineConfig::default()));

        let mut pipeline = IngestionPipeline::new(Arc::clone(&store), clock, stop);
        pipeline
            .register_listener(
                Protocol::Tcp,
                script("tcp", StreamKind::Listener(Protocol::Tcp), TCP_LINES),
            )
            .unwrap();
        pipeline
            .register_listener(
                Protocol::Udp,
                script("udp", StreamKind::Listener(Protocol::Udp), UDP_LINES),
            )
            .unwrap();
        pipeline
            .register_link_probe(script("link", StreamKind::LinkProbe, LINK_LINES))
            .unwrap();

        assert_eq!(pipeline.start_all(), 3);
        assert!(pipeline.wait_idle(Duration::from_secs(5)));
        (store, pipeline)
    }

    #[test]
    fn test_scripted_streams_reconcile() {
        let (store, pipeline) = ingest_scripts(StopFlag::new());

        let counters = pipeline.metrics().snapshot();
        assert_eq!(counters.lines_received, 12);
        assert_eq!(counters.reports_ingested, 8);
        assert_eq!(counters.lines_dropped, 4);
        assert_eq!(counters.sources_ended, 3);

        let snapshot = store.snapshot(6.0);
        assert_eq!(snapshot.flows.len(), 2);

        let both = &snapshot.flows["10.0.0.2"];
        assert_eq!(both.total_at(5.0), Some(150_000.0));
        assert_eq!(both.total_at(6.0), Some(170_000.0));
        assert!(both.pending.is_empty());

        let tcp_only = &snapshot.flows["10.0.0.3"];
        assert_eq!(tcp_only.total_at(5.0), Some(200_000.0));
        assert_eq!(tcp_only.total_at(6.0), Some(210_000.0));
        assert!(tcp_only.udp.is_empty());

        assert_eq!(snapshot.link.len(), 2);
        assert_eq!(snapshot.link[0].time, 5.0);
        assert_eq!(snapshot.link_rate(), Some(370_000.0));
    }

    #[test]
    fn test_monitor_over_ingested_store() {
        let stop = StopFlag::new();
        let (store, _pipeline) = ingest_scripts(stop.clone());
        let watchdog = WatchdogConfig {
            expected_flows: 2,
            check_after_s: 6.0,
        };
        let mut monitor = Monitor::new(store, watchdog, stop.clone());
        let mut run_stats = RunStatsAggregator::new();

        let report = monitor.tick(6.5);
        run_stats.update(&report);
        assert_eq!(report.active_flows, 2);
        assert_eq!(report.deaths_marked, 0);
        assert_eq!(report.flow_rates.get("10.0.0.2"), Some(&170_000.0));
        assert!(!report.watchdog_tripped);
        assert!(!stop.is_set());

        // Every stream went quiet after t=6
        let report = monitor.tick(9.0);
        run_stats.update(&report);
        assert_eq!(report.deaths_marked, 5);
        assert_eq!(report.active_flows, 0);
        assert_eq!(report.flow_rates.get("10.0.0.3"), Some(&0.0));

        let summary = run_stats.summary();
        assert_eq!(summary.total_ticks, 2);
        assert_eq!(summary.total_deaths, 5);
        assert_eq!(summary.flow_rates["10.0.0.2"].max, 170_000.0);
    }

    #[test]
    fn test_watchdog_stops_short_run() {
        let stop = StopFlag::new();
        let (store, _pipeline) = ingest_scripts(stop.clone());
        let watchdog = WatchdogConfig {
            expected_flows: 3,
            check_after_s: 6.0,
        };
        let mut monitor = Monitor::new(store, watchdog, stop.clone());

        assert!(monitor.tick(6.5).watchdog_tripped);
        assert!(stop.is_set());
    }

    #[tokio::test]
    async fn test_monitor_run_ends_on_watchdog() {
        let stop = StopFlag::new();
        let clock = Arc::new(ManualClock::new(UNIX_ORIGIN));
        clock.set(10.0);
        let watchdog = WatchdogConfig {
            expected_flows: 1,
            check_after_s: 5.0,
        };
        let monitor = Monitor::new(Arc::new(Store::default()), watchdog, stop.clone());

        let mut tripped = false;
        let ticks = tokio::time::timeout(
            Duration::from_secs(5),
            monitor.run(clock, Duration::from_millis(5), |report| {
                tripped |= report.watchdog_tripped;
            }),
        )
        .await
        .expect("monitor did not stop");

        assert_eq!(ticks, 1);
        assert!(tripped);
        assert!(stop.is_set());
    }

    #[test]
    fn test_stopped_pipeline_ignores_lines() {
        let stop = StopFlag::new();
        stop.trigger();
        let (store, pipeline) = ingest_scripts(stop);

        assert_eq!(store.flow_count(), 0);
        assert_eq!(pipeline.metrics().snapshot().reports_ingested, 0);
    }
}

#[cfg(test)]
mod config_tests {
    use std::sync::Arc;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{Protocol, StopFlag};
    use ingestion::IngestionPipeline;
    use rate_engine::{ManualClock, Store};

    const CONFIG: &str = r#"
[link]
interface = "eth0"

[[listeners]]
protocol = "tcp"
port = 5001

[[listeners]]
protocol = "udp"
port = 5201

[engine]
report_interval_s = 0.5

[watchdog]
expected_flows = 2
check_after_s = 10.0
"#;

    #[test]
    fn test_blueprint_builds_pipeline() {
        let blueprint = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        assert_eq!(blueprint.ports(Protocol::Udp), vec![5201]);

        let store = Arc::new(Store::new(blueprint.engine.clone()));
        assert_eq!(store.config().burn_half_width(), 0.4);

        let pipeline = IngestionPipeline::from_blueprint(
            &blueprint,
            store,
            Arc::new(ManualClock::new(0.0)),
            StopFlag::new(),
        )
        .unwrap();

        let ids: Vec<&str> = pipeline.source_ids().collect();
        assert_eq!(ids, vec!["bwm_ng_eth0", "iperf_tcp_5001", "iperf_udp_5201"]);
        assert_eq!(pipeline.listening_count(), 0);
    }

    #[test]
    fn test_blueprint_roundtrip_through_json() {
        let blueprint = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&blueprint).unwrap();
        let back = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();

        assert_eq!(back.listeners, blueprint.listeners);
        assert_eq!(back.watchdog.expected_flows, 2);
    }
}
