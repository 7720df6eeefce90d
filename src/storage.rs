// Copyright 2025 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! The storage abstraction the file loader reads through. "Not found" is an
//! ordinary outcome (the precedence matrix decides whether it is fatal), so
//! both operations return `Option`.

use std::fs;
use std::io::ErrorKind;

use regex::Regex;

use crate::error::ParseError;

pub trait Storage {
    /// Read a file's content, or `None` when it does not exist.
    fn read(&self, path: &str) -> Result<Option<String>, ParseError>;

    /// List the names (not paths) of directory entries matching `filter`, or
    /// `None` when the directory does not exist. Order is unspecified.
    fn list(&self, path: &str, filter: &Regex) -> Result<Option<Vec<String>>, ParseError>;
}

/// Storage backed by the local filesystem.
pub struct LocalStorage;

impl Storage for LocalStorage {
    fn read(&self, path: &str) -> Result<Option<String>, ParseError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ParseError::Format(format!(
                "unable to read file '{path}': {e}"
            ))),
        }
    }

    fn list(&self, path: &str, filter: &Regex) -> Result<Option<Vec<String>>, ParseError> {
        let entries = match fs::read_dir(path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ParseError::Format(format!(
                    "unable to list path '{path}': {e}"
                )));
            }
        };

        let mut names = vec![];
        for entry in entries {
            let entry = entry.map_err(|e| {
                ParseError::Format(format!("unable to list path '{path}': {e}"))
            })?;
            let file_type = entry.file_type().map_err(|e| {
                ParseError::Format(format!("unable to list path '{path}': {e}"))
            })?;
            if file_type.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if filter.is_match(&name) {
                names.push(name);
            }
        }
        Ok(Some(names))
    }
}
