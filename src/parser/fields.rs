//! Справочник полей индикаторов: суффиксы таймфреймов, префиксы, группы

use serde::{Deserialize, Serialize};

pub const LTF_SUFFIXES: [&str; 4] = ["2", "5", "15", "30"];
pub const HTF_SUFFIXES: [&str; 4] = ["1h", "4h", "1d", "1w"];

pub const LTF_PREFIXES: &[&str] = &[
    "rd", "md", "cd", "cmd", "macd", "cvd", "dd", "ed", "sd", "ro", "mo", "co", "cz", "do", "so",
    "rz", "mz", "ciz", "sz", "dz", "cvz", "maz", "ef", "vc", "ze", "nw", "as", "vw",
];

pub const HTF_PREFIXES: &[&str] = &[
    "rd", "md", "cd", "cmd", "macd", "od", "dd", "cvd", "drd", "ad", "ed", "hd", "sd", "ro", "mo",
    "co", "cz", "do", "ae", "so", "rz", "mz", "ciz", "sz", "dz", "ef", "wv", "vc", "ze", "nw",
    "cvz", "maz", "oz",
];

/// Только этот префикс несёт сигналы вида `!` / `!!`
pub const SIGNAL_PREFIX: &str = "nw";

/// HTF поля без суффикса таймфрейма
pub const SPECIAL_HTF_FIELDS: [&str; 3] = ["bs", "wa", "pd"];

/// Поля, по которым оценивается качество парсинга
pub const CRITICAL_FIELDS: [&str; 5] = ["nw2", "ef2", "as2", "vc2", "ze2"];

pub const INDICATOR_GROUPS: [(&str, &[&str]); 5] = [
    (
        "group_1",
        &["rd", "md", "cd", "cmd", "macd", "od", "dd", "cvd", "drd", "ad", "ed", "hd", "sd"],
    ),
    ("group_2", &["ro", "mo", "co", "cz", "do", "ae", "so"]),
    ("group_3", &["rz", "mz", "ciz", "sz", "dz", "cvz", "maz", "oz"]),
    ("group_4", &["ef", "wv", "vc", "ze", "nw", "as", "vw"]),
    ("group_5", &["bs", "wa", "pd"]),
];

pub const METADATA_FIELDS: [&str; 6] = ["open", "high", "low", "close", "volume", "range"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    Ltf,
    Htf,
}

impl Timeframe {
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        if LTF_SUFFIXES.contains(&suffix) {
            Some(Timeframe::Ltf)
        } else if HTF_SUFFIXES.contains(&suffix) {
            Some(Timeframe::Htf)
        } else {
            None
        }
    }

    pub fn prefixes(self) -> &'static [&'static str] {
        match self {
            Timeframe::Ltf => LTF_PREFIXES,
            Timeframe::Htf => HTF_PREFIXES,
        }
    }

    pub fn accepts(self, prefix: &str) -> bool {
        self.prefixes().contains(&prefix)
    }

    fn suffix_rank(suffix: &str) -> usize {
        LTF_SUFFIXES
            .iter()
            .chain(HTF_SUFFIXES.iter())
            .position(|s| *s == suffix)
            .unwrap_or(usize::MAX)
    }
}

/// Класс поля в строке лога
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldTag {
    Ltf,
    Htf,
    HtfSpecial,
    LtfProgress,
    HtfProgress,
}

impl FieldTag {
    pub fn timeframe(self) -> Timeframe {
        match self {
            FieldTag::Ltf | FieldTag::LtfProgress => Timeframe::Ltf,
            FieldTag::Htf | FieldTag::HtfSpecial | FieldTag::HtfProgress => Timeframe::Htf,
        }
    }
}

/// Разделить имя поля на префикс и суффикс: `cvz15` -> (`cvz`, `15`)
pub fn split_field_name(name: &str) -> (&str, &str) {
    let idx = name
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(name.len());
    name.split_at(idx)
}

/// Группа индикаторов по префиксу
pub fn group_of(prefix: &str) -> Option<(usize, &'static str)> {
    INDICATOR_GROUPS
        .iter()
        .enumerate()
        .find(|(_, (_, prefixes))| prefixes.contains(&prefix))
        .map(|(idx, (name, _))| (idx, *name))
}

/// Ключ сортировки: группа, позиция префикса в группе, таймфрейм
pub fn field_order_key(name: &str) -> (usize, usize, usize, String) {
    let (prefix, suffix) = split_field_name(name);
    match group_of(prefix) {
        Some((group_idx, _)) => {
            let prefix_idx = INDICATOR_GROUPS[group_idx]
                .1
                .iter()
                .position(|p| *p == prefix)
                .unwrap_or(0);
            (group_idx, prefix_idx, Timeframe::suffix_rank(suffix), name.to_string())
        }
        None => (usize::MAX, 0, 0, name.to_string()),
    }
}
