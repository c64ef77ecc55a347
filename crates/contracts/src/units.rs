//! Human-readable bit-rate helpers ("45.5m" <-> 45_500_000).

/// Parse a rate with an optional `k`/`m`/`g` suffix into bit/s.
///
/// Plain numbers are accepted as-is and truncated to an integer.
///
/// ```
/// use contracts::parse_rate;
///
/// assert_eq!(parse_rate("45.5m"), Some(45_500_000));
/// assert_eq!(parse_rate("1000"), Some(1000));
/// assert_eq!(parse_rate("fast"), None);
/// ```
pub fn parse_rate(input: &str) -> Option<u64> {
    let input = input.trim();
    if let Ok(plain) = input.parse::<f64>() {
        return (plain >= 0.0).then_some(plain as u64);
    }

    let (number, multiplier) = match input.char_indices().last()? {
        (idx, 'k' | 'K') => (&input[..idx], 1e3),
        (idx, 'm' | 'M') => (&input[..idx], 1e6),
        (idx, 'g' | 'G') => (&input[..idx], 1e9),
        _ => return None,
    };

    let value: f64 = number.parse().ok()?;
    (value >= 0.0).then(|| (value * multiplier).round() as u64)
}

/// Format a bit/s value with a `k`/`m`/`g` suffix.
pub fn format_rate(bps: f64) -> String {
    let bps = bps.max(0.0);
    if bps < 1e3 {
        format!("{}", bps as u64)
    } else if bps < 1e6 {
        format!("{}k", round_to(bps / 1e3, 3))
    } else if bps < 1e9 {
        format!("{}m", round_to(bps / 1e6, 3))
    } else {
        format!("{}g", round_to(bps / 1e9, 3))
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
