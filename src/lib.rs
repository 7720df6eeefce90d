// Copyright 2025 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! Configuration resolution for the pgbackrest backup/restore tool: merges
//! the command line, the environment, and configuration files through a
//! static rule table into one validated, typed, immutable [`Config`].
//!
//! Precedence is command line over environment over files. Options resolve
//! in a dependency-respecting order, grouped options (`pg*`, `repo*`) are
//! addressed through per-group index maps, and every diagnostic names the
//! option the way the user would type it.

mod args;

mod env;

mod error;

mod files;
#[cfg(test)]
mod files_tests;

mod id;

mod ini;

mod parse;

mod resolve;
#[cfg(test)]
mod resolve_tests;

mod rules;

mod state;

mod storage;


use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use parking_lot::Mutex;
use serde::Serialize;

pub use crate::args::Args;
pub use crate::env::Env;
pub use crate::error::ParseError;
pub use crate::rules::{
    CommandId, CommandRole, GroupId, KEY_MAX, OptionId, OptionType, Section,
};
pub use crate::storage::{LocalStorage, Storage};

use crate::state::{ParseSource, ParseState};

static BIN_NAME: LazyLock<Mutex<String>> = LazyLock::new(|| Mutex::new("pgbackrest".to_string()));

/// The binary name, taken from argv[0] at parse time. Feeds the legacy
/// `/etc/<bin>.conf` configuration fallback and defaults to the project name
/// before the first parse.
pub fn bin_name() -> String {
    BIN_NAME.lock().clone()
}

/// A materialised option value. Size and time options store their canonical
/// integer form (bytes and milliseconds).
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Integer(i64),
    String(String),
    List(Vec<String>),
    Hash(BTreeMap<String, String>),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_hash(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Value::Hash(values) => Some(values),
            _ => None,
        }
    }
}

/// Provenance of a materialised value. Environment values merge at config
/// precedence and report as `Config`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Param,
    Config,
    Default,
}

impl Source {
    pub(crate) fn from_parse(source: ParseSource) -> Source {
        match source {
            ParseSource::Param => Source::Param,
            ParseSource::Env | ParseSource::Config => Source::Config,
        }
    }
}

/// One `(option, list index)` slot of the final configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigOptionValue {
    pub value: Option<Value>,
    pub source: Source,
    pub negate: bool,
    pub reset: bool,
}

impl ConfigOptionValue {
    pub(crate) fn null() -> Self {
        Self {
            value: None,
            source: Source::Default,
            negate: false,
            reset: false,
        }
    }
}

/// Per-option slice of the final configuration. `index` has one entry per
/// group index for grouped options and exactly one entry otherwise; it is
/// empty when the option is not valid for the command.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigOption {
    pub valid: bool,
    pub index: Vec<ConfigOptionValue>,
}

/// Resolved state of an option group: which user keys are in use (as stored
/// key indexes, ascending) and which dense index is the default.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigOptionGroup {
    pub valid: bool,
    pub name: &'static str,
    pub index_total: usize,
    pub index_map: Vec<u32>,
    pub index_default: usize,
    pub index_default_exists: bool,
}

/// The fully resolved configuration, owned by the caller.
#[derive(Debug, PartialEq)]
pub struct Config {
    command: CommandId,
    command_role: CommandRole,
    help: bool,
    exe: String,
    param_list: Option<Vec<String>>,
    options: Vec<ConfigOption>,
    groups: Vec<ConfigOptionGroup>,
}

impl Config {
    pub fn command(&self) -> CommandId {
        self.command
    }

    pub fn command_role(&self) -> CommandRole {
        self.command_role
    }

    pub fn help(&self) -> bool {
        self.help
    }

    pub fn exe(&self) -> &str {
        &self.exe
    }

    pub fn param_list(&self) -> Option<&[String]> {
        self.param_list.as_deref()
    }

    pub fn option(&self, option: OptionId) -> &ConfigOption {
        &self.options[option as usize]
    }

    pub fn group(&self, group: GroupId) -> &ConfigOptionGroup {
        &self.groups[group as usize]
    }

    /// The slot at a dense list index, or `None` when the option is invalid
    /// for the command or the index is out of range.
    pub fn option_index(&self, option: OptionId, list_index: usize) -> Option<&ConfigOptionValue> {
        self.option(option).index.get(list_index)
    }

    /// The value at a dense list index, if one was materialised.
    pub fn option_value(&self, option: OptionId, list_index: usize) -> Option<&Value> {
        self.option_index(option, list_index)
            .and_then(|slot| slot.value.as_ref())
    }

    /// The value at the owning group's default index (list index 0 for
    /// ungrouped options).
    pub fn option_default_value(&self, option: OptionId) -> Option<&Value> {
        let list_index = match rules::option(option).group {
            Some(group) => self.group(group).index_default,
            None => 0,
        };
        self.option_value(option, list_index)
    }
}

fn level_filter(level: &str) -> log::LevelFilter {
    match level {
        "off" => log::LevelFilter::Off,
        "error" => log::LevelFilter::Error,
        "info" => log::LevelFilter::Info,
        "detail" | "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        _ => log::LevelFilter::Warn,
    }
}

/// Parse the given argument vector and environment into a [`Config`],
/// loading configuration files through `storage`. With `reset_log_level` the
/// materialised `log-level-console` option is applied to the global log
/// filter before returning.
pub fn parse(
    storage: &dyn Storage,
    args: Args,
    env: Env,
    reset_log_level: bool,
) -> Result<Config, ParseError> {
    let mut state = ParseState::new();
    let command_line = args::parse_args(&args, &mut state)?;

    if let Some(name) = Path::new(&command_line.exe)
        .file_name()
        .and_then(|name| name.to_str())
        && !name.is_empty()
    {
        *BIN_NAME.lock() = name.to_string();
    }

    env::import(&env, &mut state, command_line.command, command_line.role)?;

    if let Some(document) = files::load(storage, &state)? {
        files::merge(&document, &mut state, command_line.command, command_line.role)?;
    }

    let (options, groups) = resolve::resolve(
        &mut state,
        command_line.command,
        command_line.role,
        command_line.help,
    )?;

    let config = Config {
        command: command_line.command,
        command_role: command_line.role,
        help: command_line.help,
        exe: command_line.exe,
        param_list: if command_line.params.is_empty() {
            None
        } else {
            Some(command_line.params)
        },
        options,
        groups,
    };

    if reset_log_level
        && let Some(Value::String(level)) = config.option_value(OptionId::LogLevelConsole, 0)
    {
        log::set_max_level(level_filter(level));
    }

    Ok(config)
}
