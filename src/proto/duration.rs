/// Serde adapter for protobuf-JSON durations
///
/// Durations travel as decimal seconds with an `s` suffix: `"60s"`, `"1.5s"`.

use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(duration) => serializer.serialize_str(&format_duration(*duration)),
        None => serializer.serialize_none(),
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|s| parse_duration(&s).map_err(serde::de::Error::custom))
        .transpose()
}

/// Render a duration as `"<seconds>[.<fraction>]s"`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let nanos = duration.subsec_nanos();
    if nanos == 0 {
        return format!("{}s", secs);
    }
    let fraction = format!("{:09}", nanos);
    format!("{}.{}s", secs, fraction.trim_end_matches('0'))
}

/// Parse a protobuf-JSON duration string.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let digits = s
        .strip_suffix('s')
        .ok_or_else(|| format!("invalid duration {:?}: missing 's' suffix", s))?;

    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (digits, ""),
    };

    let secs = whole
        .parse::<u64>()
        .map_err(|e| format!("invalid duration {:?}: {}", s, e))?;

    if fraction.len() > 9 || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("invalid duration {:?}: bad fractional seconds", s));
    }
    let nanos = if fraction.is_empty() {
        0
    } else {
        format!("{:0<9}", fraction)
            .parse::<u32>()
            .map_err(|e| format!("invalid duration {:?}: {}", s, e))?
    };

    Ok(Duration::new(secs, nanos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_whole_seconds() {
        assert_eq!(format_duration(Duration::from_secs(60)), "60s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
    }

    #[test]
    fn test_parse() {
        assert_eq!(parse_duration("60s"), Ok(Duration::from_secs(60)));
        assert_eq!(parse_duration("0.25s"), Ok(Duration::from_millis(250)));
        assert!(parse_duration("60").is_err());
        assert!(parse_duration("-1s").is_err());
        assert!(parse_duration("1.0000000001s").is_err());
    }
}
