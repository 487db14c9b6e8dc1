use std::time::Duration;
use thiserror::Error;

const NANOS_PER_SECOND: u128 = 1_000_000_000;
const NANOS_PER_MILLI: u128 = 1_000_000;

/// Longest accepted duration in milliseconds. Clients encode an infinite
/// duration as a huge hour count (`PT9999999999999H`), which lands above this.
pub const MAX_MILLIS: u128 = i64::MAX as u128;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationParseError {
    #[error("duration is empty")]
    Empty,

    #[error("duration is negative")]
    Negative,

    #[error("duration is infinite or too large")]
    Infinite,

    #[error("malformed ISO-8601 duration: {0}")]
    Malformed(String),
}

fn malformed(reason: impl Into<String>) -> DurationParseError {
    DurationParseError::Malformed(reason.into())
}

/// Parses an ISO-8601 duration such as `PT10S`, `PT0.200S`, `PT1H30M` or `P1DT2H`.
///
/// Only days and the time components are accepted; years and months have no
/// fixed length. A fraction is allowed on seconds, down to nanoseconds.
pub fn parse_iso8601(input: &str) -> Result<Duration, DurationParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(DurationParseError::Empty);
    }

    let upper = input.to_ascii_uppercase();
    if upper.starts_with('-') {
        return Err(DurationParseError::Negative);
    }
    let unsigned = upper.strip_prefix('+').unwrap_or(&upper);

    let body = unsigned
        .strip_prefix('P')
        .ok_or_else(|| malformed("must start with 'P'"))?;

    let (date, time) = match body.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (body, None),
    };

    if date.is_empty() && time.is_none() {
        return Err(malformed("no components"));
    }

    let mut total = parse_components(date, &[('D', 86_400 * NANOS_PER_SECOND)])?;

    if let Some(time) = time {
        if time.is_empty() {
            return Err(malformed("'T' without time components"));
        }
        let time_nanos = parse_components(
            time,
            &[
                ('H', 3_600 * NANOS_PER_SECOND),
                ('M', 60 * NANOS_PER_SECOND),
                ('S', NANOS_PER_SECOND),
            ],
        )?;
        total = total
            .checked_add(time_nanos)
            .ok_or(DurationParseError::Infinite)?;
    }

    if total / NANOS_PER_MILLI > MAX_MILLIS {
        return Err(DurationParseError::Infinite);
    }

    let secs = u64::try_from(total / NANOS_PER_SECOND).map_err(|_| DurationParseError::Infinite)?;
    Ok(Duration::new(secs, (total % NANOS_PER_SECOND) as u32))
}

/// Sums `<number><designator>` pairs. Designators must follow the order of
/// `units` and appear at most once.
fn parse_components(part: &str, units: &[(char, u128)]) -> Result<u128, DurationParseError> {
    let mut total: u128 = 0;
    let mut rest = part;
    let mut next_unit = 0;

    while !rest.is_empty() {
        let end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| malformed(format!("number without unit in '{}'", part)))?;
        let (number, tail) = rest.split_at(end);

        let designator = tail
            .chars()
            .next()
            .ok_or_else(|| malformed(format!("number without unit in '{}'", part)))?;

        let index = units[next_unit..]
            .iter()
            .position(|(unit, _)| *unit == designator)
            .map(|offset| offset + next_unit)
            .ok_or_else(|| malformed(format!("unexpected '{}'", designator)))?;

        let (_, nanos_per_unit) = units[index];
        let is_seconds = nanos_per_unit == NANOS_PER_SECOND;
        let nanos = component_nanos(number, nanos_per_unit, is_seconds)?;
        total = total.checked_add(nanos).ok_or(DurationParseError::Infinite)?;

        next_unit = index + 1;
        rest = &tail[designator.len_utf8()..];
    }

    Ok(total)
}

fn component_nanos(
    number: &str,
    nanos_per_unit: u128,
    allow_fraction: bool,
) -> Result<u128, DurationParseError> {
    let (whole, fraction) = match number.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (number, None),
    };

    if whole.is_empty() {
        return Err(malformed("missing digits"));
    }

    // Only digits remain, so a failed parse means the value overflowed
    let whole: u128 = whole.parse().map_err(|_| DurationParseError::Infinite)?;
    let mut nanos = whole
        .checked_mul(nanos_per_unit)
        .ok_or(DurationParseError::Infinite)?;

    if let Some(fraction) = fraction {
        if !allow_fraction {
            return Err(malformed("fractions are only allowed on seconds"));
        }
        if fraction.is_empty() || fraction.len() > 9 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed("seconds fraction must have 1 to 9 digits"));
        }

        let padded = format!("{:0<9}", fraction);
        let fraction_nanos: u128 = padded
            .parse()
            .map_err(|_| malformed("seconds fraction must have 1 to 9 digits"))?;
        nanos = nanos
            .checked_add(fraction_nanos)
            .ok_or(DurationParseError::Infinite)?;
    }

    Ok(nanos)
}
