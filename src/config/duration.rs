// src/config/duration.rs

use std::time::Duration;

/// Wait applied to declared outputs when `wait_for_outputs` is absent.
pub const DEFAULT_OUTPUT_WAIT: Duration = Duration::from_secs(2 * 60);

/// Parse `"<n>ms"`, `"<n>s"`, `"<n>m"` or `"<n>h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => secs(value, 60),
        "h" => secs(value, 60 * 60),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}

fn secs(value: u64, unit: u64) -> Result<Duration, String> {
    value
        .checked_mul(unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration too large: {} units of {}s", value, unit))
}

/// Parse an optional duration, falling back to [`DEFAULT_OUTPUT_WAIT`].
pub fn output_wait(s: Option<&str>) -> Result<Duration, String> {
    s.map_or(Ok(DEFAULT_OUTPUT_WAIT), parse_duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_unit() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("3s"), Ok(Duration::from_secs(3)));
        assert_eq!(parse_duration(" 2m "), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("5d").is_err());
        assert!(parse_duration("99999999999999999999s").is_err());
        let err = parse_duration("6000000000000000h").unwrap_err();
        assert!(err.contains("too large"));
        assert!(parse_duration("400000000000000000m").is_err());
    }

    #[test]
    fn missing_wait_uses_default() {
        assert_eq!(output_wait(None), Ok(DEFAULT_OUTPUT_WAIT));
        assert_eq!(output_wait(Some("1s")), Ok(Duration::from_secs(1)));
    }
}
