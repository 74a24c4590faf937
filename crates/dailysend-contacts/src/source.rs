//! Contact sources: CSV files in a directory, plus an in-memory source.
//!
//! Files are two-column CSV without a header: `phone,name`.
//! Which files belong to a run is decided by [`select_sources`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use dailysend_core::error::{DailySendError, Result};
use dailysend_core::traits::ContactSource;
use dailysend_core::types::RawRecord;
use regex::Regex;

/// Compile a glob-style name pattern (`*`, `?`) into an anchored regex.
pub fn glob_to_regex(pattern: &str) -> Regex {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            c => re.push_str(&regex::escape(&c.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).unwrap_or_else(|_| Regex::new("$^").expect("static regex"))
}

/// Pick the first pattern family with any match and return its sorted sources.
///
/// Families are never mixed: if `SDB (*.csv` matches anything, `contacts*.csv`
/// files are ignored even when present.
pub fn select_sources(candidates: &[String], patterns: &[String]) -> Option<(String, Vec<String>)> {
    for pattern in patterns {
        let re = glob_to_regex(pattern);
        let mut matched: Vec<String> = candidates
            .iter()
            .filter(|name| re.is_match(name))
            .cloned()
            .collect();
        if !matched.is_empty() {
            matched.sort();
            return Some((pattern.clone(), matched));
        }
    }
    None
}

/// Parse headerless two-column CSV text into raw rows.
///
/// Quoted fields (with `""` escapes and embedded newlines) are supported.
/// Blank lines are skipped; a row with a single column gets an empty name.
pub fn parse_csv(content: &str) -> std::result::Result<Vec<RawRecord>, String> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut records = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1usize;
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(ch);
                }
                c => field.push(c),
            }
            continue;
        }
        match ch {
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            ',' => row.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                push_row(&mut records, std::mem::take(&mut row));
                line += 1;
            }
            c => field.push(c),
        }
    }

    if in_quotes {
        return Err(format!("unterminated quoted field at line {line}"));
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        push_row(&mut records, row);
    }
    Ok(records)
}

fn push_row(records: &mut Vec<RawRecord>, row: Vec<String>) {
    if row.iter().all(|f| f.trim().is_empty()) {
        return;
    }
    let mut fields = row.into_iter();
    let phone = fields.next().unwrap_or_default();
    let name = fields.next().unwrap_or_default();
    records.push(RawRecord::new(phone.trim(), name.trim()));
}

/// CSV files in one directory.
pub struct CsvDirSource {
    dir: PathBuf,
}

impl CsvDirSource {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }
}

impl ContactSource for CsvDirSource {
    fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file()
                && let Some(name) = entry.file_name().to_str()
            {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn read(&self, name: &str) -> Result<Vec<RawRecord>> {
        let path = self.dir.join(name);
        let content = std::fs::read_to_string(&path).map_err(|e| DailySendError::SourceParse {
            source_name: name.to_string(),
            reason: e.to_string(),
        })?;
        parse_csv(&content).map_err(|reason| DailySendError::SourceParse {
            source_name: name.to_string(),
            reason,
        })
    }
}

/// In-memory source, for rehearsals and tests.
#[derive(Default)]
pub struct MemorySource {
    sources: BTreeMap<String, std::result::Result<Vec<RawRecord>, String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a readable source.
    pub fn with(mut self, name: &str, records: Vec<RawRecord>) -> Self {
        self.sources.insert(name.to_string(), Ok(records));
        self
    }

    /// Register a source whose read always fails.
    pub fn with_broken(mut self, name: &str, reason: &str) -> Self {
        self.sources.insert(name.to_string(), Err(reason.to_string()));
        self
    }
}

impl ContactSource for MemorySource {
    fn list(&self) -> Result<Vec<String>> {
        Ok(self.sources.keys().cloned().collect())
    }

    fn read(&self, name: &str) -> Result<Vec<RawRecord>> {
        match self.sources.get(name) {
            Some(Ok(records)) => Ok(records.clone()),
            Some(Err(reason)) => Err(DailySendError::SourceParse {
                source_name: name.to_string(),
                reason: reason.clone(),
            }),
            None => Err(DailySendError::SourceParse {
                source_name: name.to_string(),
                reason: "no such source".into(),
            }),
        }
    }
}
