// Copyright 2025 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! Minimal INI reader for configuration files: `[section]` headers,
//! `key=value` pairs, multi-value `key[]=value` pairs, and `#`/`;` comments.
//! Duplicate scalar keys within a section are detected here; duplicate
//! *options* (two aliases of one option) are the merger's concern.

use crate::error::ParseError;

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum IniValue {
    Scalar(String),
    List(Vec<String>),
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct IniSection {
    /// Pairs in file order. Order matters for diagnostics (the first alias of
    /// a duplicated option is named first).
    pub pairs: Vec<(String, IniValue)>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Ini {
    sections: Vec<(String, IniSection)>,
}

impl Ini {
    pub fn parse(content: &str) -> Result<Ini, ParseError> {
        let mut ini = Ini::default();
        let mut current: Option<usize> = None;

        for raw_line in content.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                let Some(name) = header.strip_suffix(']') else {
                    return Err(ParseError::Format(format!(
                        "section header '{line}' is not terminated"
                    )));
                };
                let name = name.trim();
                if name.is_empty() {
                    return Err(ParseError::Format(format!("invalid section '{line}'")));
                }
                // Reopen an existing section so duplicate detection spans
                // repeated headers.
                current = Some(match ini.sections.iter().position(|(n, _)| n == name) {
                    Some(index) => index,
                    None => {
                        ini.sections.push((name.to_string(), IniSection::default()));
                        ini.sections.len() - 1
                    }
                });
                continue;
            }

            let Some((raw_key, raw_value)) = line.split_once('=') else {
                return Err(ParseError::Format(format!("invalid line '{line}'")));
            };
            let Some(section_index) = current else {
                return Err(ParseError::Format(format!(
                    "key/value '{line}' found outside of section"
                )));
            };

            let mut key = raw_key.trim_end();
            let list = key.ends_with("[]");
            if list {
                key = key[..key.len() - 2].trim_end();
            }
            if key.is_empty() {
                return Err(ParseError::Format(format!("key is missing in line '{line}'")));
            }
            let value = raw_value.trim().to_string();

            let (section_name, section) = &mut ini.sections[section_index];
            match section.pairs.iter().position(|(k, _)| k == key) {
                None if list => section
                    .pairs
                    .push((key.to_string(), IniValue::List(vec![value]))),
                None => section
                    .pairs
                    .push((key.to_string(), IniValue::Scalar(value))),
                Some(index) => {
                    let duplicated = !list
                        || !matches!(section.pairs[index].1, IniValue::List(_));
                    if duplicated {
                        return Err(ParseError::Format(format!(
                            "key '{key}' is duplicated in section '[{section_name}]'"
                        )));
                    }
                    if let IniValue::List(values) = &mut section.pairs[index].1 {
                        values.push(value);
                    }
                }
            }
        }

        Ok(ini)
    }

    pub fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections
            .iter()
            .find_map(|(n, s)| if n == name { Some(s) } else { None })
    }
}
