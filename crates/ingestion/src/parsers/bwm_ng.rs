//! bwm-ng CSV output (`-o csv`, `;`-separated).
//!
//! `unix_stamp;iface;bytes_out/s;bytes_in/s;bytes_total/s;...`
//!
//! Rates are printed in bytes/s even with `-u bits`.

use contracts::LinkReport;

use super::{field, rate_field, LineRejected};

const STAMP: usize = 0;
const BYTES_IN_PER_S: usize = 3;

/// Parse one probe line into the incoming link rate in bit/s.
pub fn parse_bwm_ng(line: &str) -> Result<LinkReport, LineRejected> {
    if line.contains("total") {
        return Err(LineRejected::Summary);
    }

    let cols: Vec<&str> = line.trim().split(';').collect();
    if cols.len() <= BYTES_IN_PER_S {
        return Err(LineRejected::FieldCount {
            expected: BYTES_IN_PER_S + 1,
            found: cols.len(),
        });
    }

    Ok(LinkReport {
        unix_time: field::<i64>(&cols, STAMP)? as f64,
        rate_bps: rate_field(&cols, BYTES_IN_PER_S)? * 8.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interface_row() {
        let line = "1437515226;eth0;1620.00;123595.00;125215.00;24719;324;25.00;110.00;135.00;22;5;0.00;0.00;0;0";
        let report = parse_bwm_ng(line).unwrap();
        assert_eq!(report.unix_time, 1_437_515_226.0);
        assert_eq!(report.rate_bps, 988_760.0);
    }

    #[test]
    fn test_total_row_skipped() {
        let line = "1437515226;total;1620.00;123595.00;125215.00;24719;324;25.00;110.00;135.00;22;5;0.00;0.00;0;0";
        assert_eq!(parse_bwm_ng(line), Err(LineRejected::Summary));
    }

    #[test]
    fn test_non_finite_rate_rejected() {
        for rate in ["nan", "-nan", "inf"] {
            let line = format!("1437515226;eth0;0.00;{rate};0;0");
            assert_eq!(parse_bwm_ng(&line), Err(LineRejected::NotANumber), "{rate}");
        }
    }

    #[test]
    fn test_garbage() {
        assert!(matches!(
            parse_bwm_ng("bwm-ng v0.6.1"),
            Err(LineRejected::FieldCount { .. })
        ));
        assert_eq!(
            parse_bwm_ng("now;eth0;1.0;2.0"),
            Err(LineRejected::Malformed { index: STAMP })
        );
    }
}
