//! iperf server CSV reports (`-yC`).
//!
//! TCP, 9 fields:
//! `stamp,server_ip,server_port,client_ip,client_port,conn_id,start-end,bytes,rate`
//!
//! UDP, 14 fields: the TCP layout followed by
//! `jitter,lost,total,lost_percent,out_of_order`.

use contracts::{FlowId, Protocol, RateReport};

use super::{field, rate_field, LineRejected};

const TCP_FIELDS: usize = 9;
const UDP_FIELDS: usize = 14;

const SERVER_PORT: usize = 2;
const CLIENT_ADDR: usize = 3;
const CLIENT_PORT: usize = 4;
const CONN_ID: usize = 5;
const INTERVAL: usize = 6;
const RATE: usize = 8;
const LOST_PERCENT: usize = 12;
const OUT_OF_ORDER: usize = 13;

const WIDTH_TOLERANCE: f64 = 1e-6;

/// Parse a line from either listener.
pub fn parse_iperf(
    protocol: Protocol,
    line: &str,
    report_interval: f64,
) -> Result<RateReport, LineRejected> {
    match protocol {
        Protocol::Tcp => parse_iperf_tcp(line, report_interval),
        Protocol::Udp => parse_iperf_udp(line, report_interval),
    }
}

/// Parse a TCP listener line. Only per-client rows (ports `0`, negative
/// connection id) covering exactly one report interval are accepted.
pub fn parse_iperf_tcp(line: &str, report_interval: f64) -> Result<RateReport, LineRejected> {
    let cols = split(line, TCP_FIELDS)?;

    let per_client = cols[SERVER_PORT].trim() == "0"
        && cols[CLIENT_PORT].trim() == "0"
        && cols[CONN_ID].trim().starts_with('-');
    if !per_client {
        return Err(LineRejected::ConnectionRow);
    }

    let (interval_start, interval_end) = interval(&cols, report_interval)?;
    Ok(RateReport {
        flow_id: FlowId::new(cols[CLIENT_ADDR]),
        protocol: Protocol::Tcp,
        interval_start,
        interval_end,
        rate_bps: rate_field(&cols, RATE)?,
    })
}

/// Parse a UDP listener line.
pub fn parse_iperf_udp(line: &str, report_interval: f64) -> Result<RateReport, LineRejected> {
    let cols = split(line, UDP_FIELDS)?;

    if field::<i64>(&cols, OUT_OF_ORDER)? != 0 {
        return Err(LineRejected::OutOfOrder);
    }
    if cols[LOST_PERCENT].trim().trim_start_matches('-').eq_ignore_ascii_case("nan") {
        return Err(LineRejected::NotANumber);
    }

    let (interval_start, interval_end) = interval(&cols, report_interval)?;
    Ok(RateReport {
        flow_id: FlowId::new(cols[CLIENT_ADDR]),
        protocol: Protocol::Udp,
        interval_start,
        interval_end,
        rate_bps: rate_field(&cols, RATE)?,
    })
}

fn split(line: &str, expected: usize) -> Result<Vec<&str>, LineRejected> {
    let cols: Vec<&str> = line.trim().split(',').collect();
    if cols.len() != expected {
        return Err(LineRejected::FieldCount {
            expected,
            found: cols.len(),
        });
    }
    Ok(cols)
}

/// `start-end` interval, checked against the nominal report width.
fn interval(cols: &[&str], report_interval: f64) -> Result<(f64, f64), LineRejected> {
    let (start, end) = cols[INTERVAL]
        .trim()
        .split_once('-')
        .ok_or(LineRejected::Malformed { index: INTERVAL })?;
    let parse = |raw: &str| {
        raw.trim()
            .parse::<f64>()
            .map_err(|_| LineRejected::Malformed { index: INTERVAL })
    };
    let (start, end) = (parse(start)?, parse(end)?);

    if ((end - start) - report_interval).abs() > WIDTH_TOLERANCE {
        return Err(LineRejected::IntervalMismatch);
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TCP_LINE: &str = "20160525170508,192.168.1.77,0,192.168.1.52,0,-1,9.0-10.0,1455352,11642816";
    const UDP_LINE: &str =
        "20160525171330,192.168.1.77,5001,192.168.1.52,57997,5,20.0-21.0,130830,1046640,1.945,0,89,0.000,0";

    #[test]
    fn test_tcp_per_client_row() {
        let report = parse_iperf_tcp(TCP_LINE, 1.0).unwrap();
        assert_eq!(report.flow_id, "192.168.1.52");
        assert_eq!(report.protocol, Protocol::Tcp);
        assert_eq!(report.interval_start, 9.0);
        assert_eq!(report.interval_end, 10.0);
        assert_eq!(report.rate_bps, 11_642_816.0);
    }

    #[test]
    fn test_tcp_trailing_newline() {
        let line = format!("{TCP_LINE}\r\n");
        assert!(parse_iperf_tcp(&line, 1.0).is_ok());
    }

    #[test]
    fn test_tcp_rejects_connection_row() {
        let line = "20150803124132,10.100.13.214,5001,10.100.13.162,56695,4,0.0-1.0,1005453,463275664";
        assert_eq!(parse_iperf_tcp(line, 1.0), Err(LineRejected::ConnectionRow));
    }

    #[test]
    fn test_tcp_rejects_end_of_run_report() {
        let line = "20160525170508,192.168.1.77,0,192.168.1.52,0,-1,0.0-10.0,14553520,11642816";
        assert_eq!(parse_iperf_tcp(line, 1.0), Err(LineRejected::IntervalMismatch));
    }

    #[test]
    fn test_tcp_rejects_field_count() {
        assert_eq!(
            parse_iperf_tcp("Server listening on TCP port 5001", 1.0),
            Err(LineRejected::FieldCount { expected: 9, found: 1 })
        );
        assert!(matches!(
            parse_iperf_tcp(UDP_LINE, 1.0),
            Err(LineRejected::FieldCount { .. })
        ));
    }

    #[test]
    fn test_tcp_rejects_bad_rate() {
        let line = "20160525170508,192.168.1.77,0,192.168.1.52,0,-1,9.0-10.0,1455352,fast";
        assert_eq!(
            parse_iperf_tcp(line, 1.0),
            Err(LineRejected::Malformed { index: RATE })
        );
    }

    #[test]
    fn test_tcp_rejects_non_finite_rate() {
        for rate in ["nan", "-nan", "inf"] {
            let line = format!("1,10.0.0.1,0,10.0.0.2,0,-1,9.0-10.0,0,{rate}");
            assert_eq!(parse_iperf_tcp(&line, 1.0), Err(LineRejected::NotANumber), "{rate}");
        }
    }

    #[test]
    fn test_udp_row() {
        let report = parse_iperf_udp(UDP_LINE, 1.0).unwrap();
        assert_eq!(report.flow_id, "192.168.1.52");
        assert_eq!(report.protocol, Protocol::Udp);
        assert_eq!(report.interval_start, 20.0);
        assert_eq!(report.rate_bps, 1_046_640.0);
    }

    #[test]
    fn test_udp_rejects_nan() {
        let line = "20160525183306,192.168.1.77,5001,192.168.1.52,54274,5,21.0-22.0,0,0,0.000,0,0,-nan,0";
        assert_eq!(parse_iperf_udp(line, 1.0), Err(LineRejected::NotANumber));
    }

    #[test]
    fn test_udp_rejects_out_of_order() {
        let line = "20150803222713,192.168.100.4,5002,192.168.100.2,36823,3,5.0-6.0,24990,199920,0.011,0,17,0.000,2";
        assert_eq!(parse_iperf_udp(line, 1.0), Err(LineRejected::OutOfOrder));
    }

    #[test]
    fn test_udp_interval_width_follows_config() {
        let line = "20150803222713,192.168.100.4,5002,192.168.100.2,36823,3,4.0-6.0,24990,199920,0.011,0,17,0.000,0";
        assert_eq!(parse_iperf_udp(line, 1.0), Err(LineRejected::IntervalMismatch));
        assert!(parse_iperf_udp(line, 2.0).is_ok());
    }

    #[test]
    fn test_dispatch_by_protocol() {
        assert!(parse_iperf(Protocol::Tcp, TCP_LINE, 1.0).is_ok());
        assert!(parse_iperf(Protocol::Udp, UDP_LINE, 1.0).is_ok());
        assert!(parse_iperf(Protocol::Udp, TCP_LINE, 1.0).is_err());
    }
}
