//! Разбор числовых значений полей
//! `--7.19` означает -7.19, суффиксы `%` и `σ` отбрасываются

use crate::error::ParseError;

pub fn parse_value(raw: &str) -> Result<f64, ParseError> {
    let trimmed = raw.trim().trim_end_matches(['%', 'σ']);

    let value = match trimmed.strip_prefix("--") {
        Some(rest) => rest.parse::<f64>().map(|v| -v),
        None => trimmed.parse::<f64>(),
    }
    .map_err(|_| ParseError::InvalidValue(raw.to_string()))?;

    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParseError::InvalidValue(raw.to_string()))
    }
}

/// Объём в тысячах: `11.5K` -> 11.5, `1.2M` -> 1200
pub fn parse_volume(raw: &str) -> Result<f64, ParseError> {
    let trimmed = raw.trim();
    if let Some(num) = trimmed.strip_suffix('K') {
        parse_value(num)
    } else if let Some(num) = trimmed.strip_suffix('M') {
        parse_value(num).map(|v| v * 1000.0)
    } else {
        parse_value(trimmed).map(|v| v / 1000.0)
    }
}
