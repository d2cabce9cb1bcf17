//! Парсер одной строки лога
//! Извлекает метаданные свечи, поля индикаторов LTF/HTF, специальные и progress поля

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::parser::fields::{FieldTag, SIGNAL_PREFIX, SPECIAL_HTF_FIELDS, Timeframe};
use crate::parser::value::{parse_value, parse_volume};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Number(f64),
    /// `nw2-!!` -> level = 2, raw = "!!"
    Signal { level: u32, raw: String },
    /// Специальное поле без значения
    Flag,
    Text(String),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(v) => Some(*v),
            FieldValue::Signal { level, .. } => Some(f64::from(*level)),
            FieldValue::Flag => Some(1.0),
            FieldValue::Text(_) => None,
        }
    }

    pub fn signal(&self) -> Option<&str> {
        match self {
            FieldValue::Signal { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedField {
    pub value: FieldValue,
    pub tag: FieldTag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandleColor {
    Red,
    Green,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandleType {
    #[default]
    Normal,
    BigBody,
    Doji,
    Hammer,
    PinTop,
    Flat,
}

impl CandleType {
    fn from_tag(tag: &str) -> Self {
        match tag {
            "BIG_BODY" => CandleType::BigBody,
            "DOJI" => CandleType::Doji,
            "HAMMER" => CandleType::Hammer,
            "PIN_TOP" => CandleType::PinTop,
            "FLAT" => CandleType::Flat,
            _ => CandleType::Normal,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandleMeta {
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    /// В тысячах
    pub volume: Option<f64>,
    pub range: Option<f64>,
    pub color: Option<CandleColor>,
    pub candle_type: CandleType,
    pub change_pct: Option<f64>,
    pub body_pct: Option<f64>,
    pub change_24h: Option<f64>,
}

impl CandleMeta {
    pub fn has_ohlc(&self) -> bool {
        self.open.is_some() && self.high.is_some() && self.low.is_some() && self.close.is_some()
    }

    /// Значение метаданных по имени: open, high, low, close, volume, range
    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "open" => self.open,
            "high" => self.high,
            "low" => self.low,
            "close" => self.close,
            "volume" => self.volume,
            "range" => self.range,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub line_number: usize,
    pub raw: String,
    pub timestamp: Option<String>,
    pub section: Option<Timeframe>,
    pub event_tag: Option<String>,
    pub candle: CandleMeta,
    pub fields: BTreeMap<String, ParsedField>,
    pub progress: BTreeMap<String, ParsedField>,
}

impl LogRecord {
    pub fn field_number(&self, name: &str) -> Option<f64> {
        self.fields.get(name).and_then(|f| f.value.as_number())
    }
}

pub struct LineParser {
    timestamp: Regex,
    section: Regex,
    event_tag: Regex,
    indicator: Regex,
    special: Regex,
    progress: Regex,
    ohlc: Regex,
    volume: Regex,
    range: Regex,
    color_change: Regex,
    candle_body: Regex,
    change_24h: Regex,
}

impl LineParser {
    pub fn new() -> Result<Self, ParseError> {
        Ok(LineParser {
            timestamp: Regex::new(r"^\[([^\]]+)\]")?,
            section: Regex::new(r"\]:\s*(LTF|HTF)\|")?,
            event_tag: Regex::new(r"\|(event_[^|]+)\|")?,
            indicator: Regex::new(
                r"\b([a-zA-Z]+)(\d+|1h|4h|1d|1w)-(!+|-{1,2}\d+(?:\.\d+)?[%σ]?|\d+(?:\.\d+)?[%σ]?)",
            )?,
            special: Regex::new(r"\b(bs|wa|pd)\b(?:\s+([^\s,|]+))?")?,
            progress: Regex::new(r"\bp(\d+|1h|4h|1d|1w)-(-?\d+(?:\.\d+)?)")?,
            ohlc: Regex::new(r"o:([0-9.]+)\|h:([0-9.]+)\|l:([0-9.]+)\|c:([0-9.]+)")?,
            volume: Regex::new(r"\|([0-9.]+[KM])\|")?,
            range: Regex::new(r"rng:([0-9.]+)")?,
            color_change: Regex::new(r"\|(RED|GREEN)\|(?:(-?\d+(?:\.\d+)?)%\|)?")?,
            candle_body: Regex::new(r"\|(BIG_BODY|DOJI|HAMMER|PIN_TOP|FLAT)\|(?:(\d+(?:\.\d+)?)%\|)?")?,
            change_24h: Regex::new(r"(-?\d+(?:\.\d+)?)%_24h")?,
        })
    }

    /// Разобрать строку. Пустые строки, комментарии и строки без данных дают `None`.
    pub fn parse_line(&self, line: &str, line_number: usize) -> Option<LogRecord> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let mut record = LogRecord {
            line_number,
            raw: line.to_string(),
            timestamp: self.timestamp.captures(line).map(|c| c[1].to_string()),
            section: self.section.captures(line).map(|c| match &c[1] {
                "HTF" => Timeframe::Htf,
                _ => Timeframe::Ltf,
            }),
            event_tag: self.event_tag.captures(line).map(|c| c[1].to_string()),
            candle: self.parse_candle(line),
            fields: BTreeMap::new(),
            progress: BTreeMap::new(),
        };

        self.parse_indicators(line, &mut record.fields);
        self.parse_special(line, &mut record.fields);
        self.parse_progress(line, &mut record.progress);

        if record.fields.is_empty() && !record.candle.has_ohlc() {
            log::debug!("Line {} has no indicator or OHLC data", line_number);
            return None;
        }

        Some(record)
    }

    fn parse_candle(&self, line: &str) -> CandleMeta {
        let mut candle = CandleMeta::default();

        if let Some(caps) = self.ohlc.captures(line) {
            candle.open = parse_value(&caps[1]).ok();
            candle.high = parse_value(&caps[2]).ok();
            candle.low = parse_value(&caps[3]).ok();
            candle.close = parse_value(&caps[4]).ok();
        }
        candle.volume = self
            .volume
            .captures(line)
            .and_then(|c| parse_volume(&c[1]).ok());
        candle.range = self.range.captures(line).and_then(|c| parse_value(&c[1]).ok());

        if let Some(caps) = self.color_change.captures(line) {
            candle.color = Some(match &caps[1] {
                "RED" => CandleColor::Red,
                _ => CandleColor::Green,
            });
            candle.change_pct = caps.get(2).and_then(|m| parse_value(m.as_str()).ok());
        }
        if let Some(caps) = self.candle_body.captures(line) {
            candle.candle_type = CandleType::from_tag(&caps[1]);
            candle.body_pct = caps.get(2).and_then(|m| parse_value(m.as_str()).ok());
        }
        candle.change_24h = self
            .change_24h
            .captures(line)
            .and_then(|c| parse_value(&c[1]).ok());

        candle
    }

    fn parse_indicators(&self, line: &str, fields: &mut BTreeMap<String, ParsedField>) {
        for caps in self.indicator.captures_iter(line) {
            let prefix = &caps[1];
            let suffix = &caps[2];
            let raw = &caps[3];

            let Some(timeframe) = Timeframe::from_suffix(suffix) else {
                continue;
            };
            if !timeframe.accepts(prefix) {
                continue;
            }

            let value = if prefix == SIGNAL_PREFIX && raw.starts_with('!') {
                FieldValue::Signal {
                    level: raw.len() as u32,
                    raw: raw.to_string(),
                }
            } else {
                match parse_value(raw) {
                    Ok(v) => FieldValue::Number(v),
                    Err(_) => FieldValue::Text(raw.to_string()),
                }
            };

            let tag = match timeframe {
                Timeframe::Ltf => FieldTag::Ltf,
                Timeframe::Htf => FieldTag::Htf,
            };
            fields.insert(format!("{prefix}{suffix}"), ParsedField { value, tag });
        }
    }

    fn parse_special(&self, line: &str, fields: &mut BTreeMap<String, ParsedField>) {
        for caps in self.special.captures_iter(line) {
            let name = &caps[1];
            if !SPECIAL_HTF_FIELDS.contains(&name) {
                continue;
            }
            let value = match caps.get(2).map(|m| m.as_str()) {
                None => FieldValue::Flag,
                Some(raw) => match parse_value(raw) {
                    Ok(v) => FieldValue::Number(v),
                    Err(_) => FieldValue::Text(raw.to_string()),
                },
            };
            fields.insert(
                name.to_string(),
                ParsedField {
                    value,
                    tag: FieldTag::HtfSpecial,
                },
            );
        }
    }

    fn parse_progress(&self, line: &str, progress: &mut BTreeMap<String, ParsedField>) {
        for caps in self.progress.captures_iter(line) {
            let suffix = &caps[1];
            let Ok(value) = parse_value(&caps[2]) else {
                continue;
            };
            let tag = match Timeframe::from_suffix(suffix) {
                Some(Timeframe::Htf) => FieldTag::HtfProgress,
                _ => FieldTag::LtfProgress,
            };
            progress.insert(
                format!("p{suffix}"),
                ParsedField {
                    value: FieldValue::Number(value),
                    tag,
                },
            );
        }
    }
}
