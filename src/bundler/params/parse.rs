//! String parsers shared by parameter entries and the command line.

use super::RelativeFileSet;
use crate::bundler::error::{Error, Result};
use std::{collections::BTreeMap, path::PathBuf};

#[cfg(windows)]
const RESOURCE_SEPARATORS: &[char] = &[';'];
#[cfg(not(windows))]
const RESOURCE_SEPARATORS: &[char] = &[':', ';'];

/// Splits on whitespace, keeping double-quoted runs together.
///
/// Quotes are removed; an unterminated quote runs to the end of the input.
/// Consecutive separators yield empty entries, matching how launchers
/// receive literal empty arguments.
pub fn split_with_quotes(s: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in s.chars() {
        if c == '"' {
            quoted = !quoted;
        } else if !quoted && c.is_whitespace() {
            out.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    out.push(current);
    out
}

/// Splits on runs of whitespace.
pub fn split_whitespace(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

/// Splits on commas and/or whitespace, dropping empty entries.
pub fn split_list(s: &str) -> Vec<String> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses a boolean the lenient way: only `true` (any case) is true.
pub fn parse_bool(s: &str) -> bool {
    s.trim().eq_ignore_ascii_case("true")
}

/// Parses a nullable boolean: `null` (any case) is no value.
pub fn parse_optional_bool(s: &str) -> Option<bool> {
    if s.trim().eq_ignore_ascii_case("null") {
        None
    } else {
        Some(parse_bool(s))
    }
}

/// Parses properties text (`key=value`, `key: value` or `key value` lines).
///
/// Supports `#`/`!` comments, trailing-backslash line continuation and the
/// `\=`, `\:`, `\ `, `\\`, `\n`, `\t`, `\r` escapes.
pub fn parse_properties(text: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    let mut logical = String::new();

    for line in text.lines() {
        let trimmed = line.trim_start();
        if logical.is_empty() && (trimmed.is_empty() || trimmed.starts_with(['#', '!'])) {
            continue;
        }
        if ends_with_continuation(trimmed) {
            logical.push_str(&trimmed[..trimmed.len() - 1]);
            continue;
        }
        logical.push_str(trimmed);
        let (key, value) = split_property(&logical);
        out.insert(key, value);
        logical.clear();
    }
    if !logical.is_empty() {
        let (key, value) = split_property(&logical);
        out.insert(key, value);
    }
    out
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_property(line: &str) -> (String, String) {
    let mut key = String::new();
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    key.push(unescape(next));
                }
            }
            '=' | ':' => break,
            c if c.is_whitespace() => {
                while chars.peek().is_some_and(|c| c.is_whitespace()) {
                    chars.next();
                }
                if chars.peek().is_some_and(|c| *c == '=' || *c == ':') {
                    chars.next();
                }
                break;
            }
            c => key.push(c),
        }
    }

    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }

    let mut value = String::new();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                value.push(unescape(next));
            }
        } else {
            value.push(c);
        }
    }
    (key, value)
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        other => other,
    }
}

/// Parses an application resource list such as `lib/:app.jar;extra/*`.
///
/// Entries are separated by `;` (and `:` outside Windows). An entry ending in a separator or
/// `*` contributes every file below that directory; an entry containing glob
/// characters contributes the matching files relative to the pattern's
/// directory; any other entry is a single file relative to its parent.
pub fn parse_resource_list(s: &str) -> Result<Vec<RelativeFileSet>> {
    let mut out = Vec::new();
    for entry in s.split(RESOURCE_SEPARATORS).filter(|e| !e.is_empty()) {
        if entry.ends_with('/') || entry.ends_with('\\') || entry.ends_with("/*") || entry == "*" {
            let dir = entry.trim_end_matches('*').trim_end_matches(['/', '\\']);
            let dir = if dir.is_empty() { "." } else { dir };
            out.push(RelativeFileSet::from_dir(dir)?);
        } else if entry.contains(['*', '?', '[']) {
            let path = PathBuf::from(entry);
            let base = glob_base(&path);
            let mut files = Vec::new();
            for hit in glob::glob(entry)? {
                let hit = hit.map_err(|e| Error::GenericError(e.to_string()))?;
                if hit.is_file() {
                    files.push(hit);
                }
            }
            out.push(RelativeFileSet::new(base, files)?);
        } else {
            let path = PathBuf::from(entry);
            let base = path
                .parent()
                .map(PathBuf::from)
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| PathBuf::from("."));
            let name = path
                .file_name()
                .ok_or_else(|| Error::GenericError(format!("invalid resource entry '{entry}'")))?;
            out.push(RelativeFileSet::new(base, [PathBuf::from(name)])?);
        }
    }
    Ok(out)
}

fn glob_base(pattern: &std::path::Path) -> PathBuf {
    let mut base = PathBuf::new();
    for component in pattern.components() {
        let text = component.as_os_str().to_string_lossy();
        if text.contains(['*', '?', '[']) {
            break;
        }
        base.push(component);
    }
    if base.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        base
    }
}
