//! Line parsers for the external measurement tools.
//!
//! Parsers are pure: a line either yields a report or a [`LineRejected`]
//! reason. Rejected lines are never an error for the stream; the adapter
//! counts them and moves on.

mod bwm_ng;
mod iperf;

pub use bwm_ng::parse_bwm_ng;
pub use iperf::{parse_iperf, parse_iperf_tcp, parse_iperf_udp};

use thiserror::Error;

/// Why a line did not produce a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LineRejected {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    /// Aggregate row such as the probe's `total` line
    #[error("summary row")]
    Summary,

    /// Single-connection row; only per-client rows are used
    #[error("per-connection row")]
    ConnectionRow,

    #[error("datagrams received out of order")]
    OutOfOrder,

    #[error("not-a-number marker")]
    NotANumber,

    #[error("interval width does not match the report interval")]
    IntervalMismatch,

    #[error("unparsable field {index}")]
    Malformed { index: usize },
}

impl LineRejected {
    /// Short label for metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            LineRejected::FieldCount { .. } => "field_count",
            LineRejected::Summary => "summary",
            LineRejected::ConnectionRow => "connection_row",
            LineRejected::OutOfOrder => "out_of_order",
            LineRejected::NotANumber => "nan",
            LineRejected::IntervalMismatch => "interval",
            LineRejected::Malformed { .. } => "malformed",
        }
    }
}

/// Parse field `index` of an already split line.
pub(crate) fn field<T: std::str::FromStr>(cols: &[&str], index: usize) -> Result<T, LineRejected> {
    cols.get(index)
        .and_then(|raw| raw.trim().parse().ok())
        .ok_or(LineRejected::Malformed { index })
}

/// Parse a rate column; `nan` and infinities are rejected, negative values
/// are malformed.
pub(crate) fn rate_field(cols: &[&str], index: usize) -> Result<f64, LineRejected> {
    let raw = cols
        .get(index)
        .map(|raw| raw.trim())
        .ok_or(LineRejected::Malformed { index })?;
    if raw.trim_start_matches(['-', '+']).eq_ignore_ascii_case("nan") {
        return Err(LineRejected::NotANumber);
    }
    let value: f64 = raw.parse().map_err(|_| LineRejected::Malformed { index })?;
    if !value.is_finite() {
        return Err(LineRejected::NotANumber);
    }
    if value < 0.0 {
        return Err(LineRejected::Malformed { index });
    }
    Ok(value)
}
