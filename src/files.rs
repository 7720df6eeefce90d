// Copyright 2025 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! Configuration file loading and merging. Loading follows the precedence
//! matrix: `--config-path` rewrites both baked-in defaults, `--no-config`
//! suppresses the main file, and an explicit `--config` without
//! `--config-path`/`--config-include-path` suppresses the include directory.
//! Merging walks the loaded document in section-search order and fills any
//! `(option, key index)` slots the command line and environment left open.

use std::collections::HashMap;
use std::sync::LazyLock;

use itertools::Itertools;
use log::warn;
use regex::Regex;

use crate::error::ParseError;
use crate::id;
use crate::ini::{Ini, IniValue};
use crate::rules::{
    self, CONFIG_FILE_DEFAULT, CONFIG_INCLUDE_PATH_DEFAULT, CommandId, CommandRole, OptionId,
    OptionType, Section,
};
use crate::state::{ParseOptionValue, ParseSource, ParseState};
use crate::storage::Storage;

static INCLUDE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".+\.conf$").expect("include filter regex is valid"));

fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Load the main configuration file and the include directory into a single
/// document, or `None` when no sources exist.
pub(crate) fn load(storage: &dyn Storage, state: &ParseState) -> Result<Option<Ini>, ParseError> {
    let config_negated = state
        .get(OptionId::Config, 0)
        .is_some_and(|value| value.negate);
    let config_explicit = state.scalar(OptionId::Config);
    let config_path = state.scalar(OptionId::ConfigPath);
    let include_explicit = state.scalar(OptionId::ConfigIncludePath);

    let mut file_default = CONFIG_FILE_DEFAULT.to_string();
    let mut include_default = CONFIG_INCLUDE_PATH_DEFAULT.to_string();
    if let Some(base) = config_path {
        let base = base.trim_end_matches('/');
        file_default = format!("{base}/{}", base_name(CONFIG_FILE_DEFAULT));
        include_default = format!("{base}/{}", base_name(CONFIG_INCLUDE_PATH_DEFAULT));
    }

    let mut parts: Vec<(String, String)> = vec![];

    if !config_negated {
        let (path, required) = match config_explicit {
            Some(path) => (path.to_string(), true),
            None => (file_default, false),
        };
        match storage.read(&path)? {
            Some(content) => parts.push((path, content)),
            None if required => {
                return Err(ParseError::FileMissing(format!(
                    "unable to open missing configuration file '{path}'"
                )));
            }
            None => {
                // Only the compiled-in default falls back to the legacy
                // single-file location.
                if path == CONFIG_FILE_DEFAULT {
                    let legacy = format!("/etc/{}.conf", crate::bin_name());
                    if let Some(content) = storage.read(&legacy)? {
                        parts.push((legacy, content));
                    }
                }
            }
        }
    }

    let skip_include =
        config_explicit.is_some() && config_path.is_none() && include_explicit.is_none();
    if !skip_include {
        let (dir, required) = match include_explicit {
            Some(path) => (path.to_string(), true),
            None => (include_default, false),
        };
        match storage.list(&dir, &INCLUDE_RE)? {
            None if required => {
                return Err(ParseError::FileMissing(format!(
                    "unable to list missing configuration include path '{dir}'"
                )));
            }
            None => {}
            Some(names) => {
                for name in names.into_iter().sorted() {
                    let path = format!("{dir}/{name}");
                    let content = storage.read(&path)?.ok_or_else(|| {
                        ParseError::FileMissing(format!(
                            "unable to open missing configuration file '{path}'"
                        ))
                    })?;
                    parts.push((path, content));
                }
            }
        }
    }

    if parts.is_empty() {
        return Ok(None);
    }

    let mut combined = String::new();
    for (path, content) in &parts {
        // Validate each part on its own so errors cite the offending file.
        if let Err(error) = Ini::parse(content) {
            let message = match error {
                ParseError::Format(message) => message,
                other => return Err(other),
            };
            return Err(ParseError::Format(format!(
                "invalid configuration file '{path}': {message}"
            )));
        }
        if !combined.is_empty() {
            combined.push('\n');
        }
        combined.push_str(content);
    }
    Ini::parse(&combined).map(Some)
}

/// Merge a loaded document into the parse state for the active command.
pub(crate) fn merge(
    ini: &Ini,
    state: &mut ParseState,
    command: CommandId,
    role: CommandRole,
) -> Result<(), ParseError> {
    let stanza = state.scalar(OptionId::Stanza).map(str::to_string);
    let command_name = rules::command(command).name;

    let mut sections: Vec<(String, bool)> = vec![];
    if let Some(stanza) = &stanza {
        sections.push((format!("{stanza}:{command_name}"), true));
        sections.push((stanza.clone(), false));
    }
    sections.push((format!("global:{command_name}"), true));
    sections.push(("global".to_string(), false));

    for (section_name, command_scoped) in sections {
        let Some(section) = ini.section(&section_name) else {
            continue;
        };

        // The first alias seen for each (option, key index) in this section;
        // a second alias is a duplicate option.
        let mut resolved: HashMap<(OptionId, u32), &str> = HashMap::new();

        for (key, value) in &section.pairs {
            let Some(found) = id::lookup_name(key) else {
                warn!("configuration file contains invalid option '{key}'");
                continue;
            };
            if found.deprecated {
                warn!(
                    "configuration file option '{key}' is deprecated, use '{}' instead",
                    id::key_idx_name(found.option, found.key_index)
                );
            }
            if found.negate {
                warn!("configuration file contains negate option '{key}'");
                continue;
            }
            if found.reset {
                warn!("configuration file contains reset option '{key}'");
                continue;
            }
            let rule = rules::option(found.option);
            if rule.section == Section::CommandLineOnly {
                warn!("configuration file contains command-line only option '{key}'");
                continue;
            }

            if let Some(first) = resolved.get(&(found.option, found.key_index)) {
                return Err(ParseError::OptionInvalid(format!(
                    "configuration file contains duplicate options ('{first}', '{key}') \
                     in section '[{section_name}]'"
                )));
            }
            resolved.insert((found.option, found.key_index), key);

            if !rules::option_valid(command, role, found.option) {
                if command_scoped {
                    warn!("option '{key}' not valid for command '{command_name}'");
                }
                continue;
            }
            if rule.section == Section::Stanza && section_name.starts_with("global") {
                warn!("stanza-only option '{key}' cannot be set in a global section");
                continue;
            }
            if state.found(found.option, found.key_index) {
                continue;
            }

            let parsed = match value {
                IniValue::List(values) => {
                    if !rule.multi {
                        return Err(ParseError::OptionInvalid(format!(
                            "option '{key}' cannot be set multiple times"
                        )));
                    }
                    ParseOptionValue {
                        source: ParseSource::Config,
                        negate: false,
                        reset: false,
                        values: values.clone(),
                    }
                }
                IniValue::Scalar(value) => {
                    if rule.option_type == OptionType::Boolean {
                        let negate = match value.as_str() {
                            "y" => false,
                            "n" => true,
                            _ => {
                                return Err(ParseError::OptionInvalidValue(format!(
                                    "boolean option '{key}' must be 'y' or 'n'"
                                )));
                            }
                        };
                        ParseOptionValue {
                            source: ParseSource::Config,
                            negate,
                            reset: false,
                            values: vec![],
                        }
                    } else if value.is_empty() {
                        return Err(ParseError::OptionInvalidValue(format!(
                            "option '{key}' must have a value"
                        )));
                    } else {
                        ParseOptionValue {
                            source: ParseSource::Config,
                            negate: false,
                            reset: false,
                            values: vec![value.clone()],
                        }
                    }
                }
            };
            state.insert(found.option, found.key_index, parsed);
        }
    }

    Ok(())
}
