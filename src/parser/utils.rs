//! Утилиты подготовки логов: очистка, разбиение по событиям, объединение файлов

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Serialize;

use crate::error::ParseError;
use crate::parser::quality::parse_timestamp;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleaningStats {
    pub total_lines: usize,
    pub valid_lines: usize,
    pub cleaned_lines: usize,
    pub removed_duplicates: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeStats {
    pub total_lines: usize,
    pub unique_lines: usize,
    pub removed_duplicates: usize,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ParseError + '_ {
    move |source| ParseError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn read(path: &Path) -> Result<String, ParseError> {
    fs::read_to_string(path).map_err(io_error(path))
}

fn write_lines(path: &Path, lines: &[String]) -> Result<(), ParseError> {
    fs::write(path, lines.join("\n")).map_err(io_error(path))
}

/// Схлопывает пробелы и убирает их вокруг `|`; числа и знаки не трогает
pub fn clean_line(line: &str) -> String {
    let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .split('|')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("|")
}

fn is_log_line(line: &str) -> bool {
    line.starts_with('[') && (line.contains("LTF|") || line.contains("HTF|"))
}

/// Дубликаты отбрасываются до проверки формата
pub fn clean_lines(content: &str) -> (Vec<String>, CleaningStats) {
    let mut stats = CleaningStats::default();
    let mut seen = HashSet::new();
    let mut cleaned = Vec::new();

    for line in content.lines() {
        stats.total_lines += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !seen.insert(line) {
            stats.removed_duplicates += 1;
            continue;
        }
        if !is_log_line(line) {
            continue;
        }
        stats.valid_lines += 1;
        cleaned.push(clean_line(line));
        stats.cleaned_lines += 1;
    }
    (cleaned, stats)
}

/// Очистка файла; по умолчанию результат пишется рядом как `<name>.cleaned.txt`
pub fn clean_log_file(input: &Path, output: Option<&Path>) -> Result<(PathBuf, CleaningStats), ParseError> {
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.with_extension("cleaned.txt"));
    let (lines, stats) = clean_lines(&read(input)?);
    write_lines(&output, &lines)?;
    log::info!(
        "🧹 Cleaned {}: {} of {} lines kept, {} duplicates removed",
        input.display(),
        stats.cleaned_lines,
        stats.total_lines,
        stats.removed_duplicates
    );
    Ok((output, stats))
}

/// Группы подряд идущих строк с одинаковым тегом `LTF|name|`.
/// Строки без тега присоединяются к текущей группе, до первого тега они отбрасываются.
pub fn split_by_events(content: &str) -> Result<Vec<(String, Vec<String>)>, ParseError> {
    let tag_re = Regex::new(r"LTF\|([^|]+)\|")?;
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();

    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(caps) = tag_re.captures(line) {
            let name = caps[1].trim();
            if groups.last().is_none_or(|(current, _)| current != name) {
                groups.push((name.to_string(), Vec::new()));
            }
        }
        if let Some((_, lines)) = groups.last_mut() {
            lines.push(line.to_string());
        }
    }
    Ok(groups)
}

fn file_stem_for(event: &str) -> String {
    event
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect()
}

/// Каждое событие в свой файл `<event>.txt`; повторное событие перезаписывает файл
pub fn split_log_file(input: &Path, output_dir: Option<&Path>) -> Result<Vec<PathBuf>, ParseError> {
    let output_dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => input
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("split_events"),
    };
    fs::create_dir_all(&output_dir).map_err(io_error(&output_dir))?;

    let mut files = Vec::new();
    for (event, lines) in split_by_events(&read(input)?)? {
        let path = output_dir.join(format!("{}.txt", file_stem_for(&event)));
        write_lines(&path, &lines)?;
        files.push(path);
    }
    log::info!("✂️ Split {} into {} event files", input.display(), files.len());
    Ok(files)
}

/// Сортировка по времени (строки без метки первыми) и удаление повторов
pub fn merge_lines(sources: &[String]) -> Result<(Vec<String>, MergeStats), ParseError> {
    let ts_re = Regex::new(r"^\[([^\]]+)\]:")?;
    let mut lines: Vec<&str> = sources
        .iter()
        .flat_map(|content| content.lines())
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let total_lines = lines.len();

    lines.sort_by_key(|line| ts_re.captures(line).and_then(|c| parse_timestamp(&c[1])));

    let mut seen = HashSet::new();
    let unique: Vec<String> = lines
        .into_iter()
        .filter(|line| seen.insert(*line))
        .map(str::to_string)
        .collect();

    let stats = MergeStats {
        total_lines,
        unique_lines: unique.len(),
        removed_duplicates: total_lines - unique.len(),
    };
    Ok((unique, stats))
}

pub fn merge_log_files(inputs: &[PathBuf], output: &Path) -> Result<MergeStats, ParseError> {
    let sources = inputs
        .iter()
        .map(|path| read(path))
        .collect::<Result<Vec<_>, _>>()?;
    let (lines, stats) = merge_lines(&sources)?;
    write_lines(output, &lines)?;
    log::info!(
        "🔗 Merged {} files into {}: {} unique of {} lines",
        inputs.len(),
        output.display(),
        stats.unique_lines,
        stats.total_lines
    );
    Ok(stats)
}
