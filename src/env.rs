// Copyright 2025 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! Environment import: `PGBACKREST_*` variables become option values with
//! config-level precedence. The environment never overrides the command
//! line, and recognised-but-misused entries are warned about and dropped.

use std::env;

use log::warn;

use crate::error::ParseError;
use crate::id;
use crate::rules::{self, CommandId, CommandRole, ENV_PREFIX, OptionType, Section};
use crate::state::{ParseOptionValue, ParseSource, ParseState};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Env {
    pub(crate) pairs: Vec<(String, String)>,
}

impl Env {
    /// Create an Env instance from the given pairs, preserving their order.
    pub fn new<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        Self {
            pairs: pairs.into_iter().collect(),
        }
    }

    pub fn capture() -> Self {
        Self::new(env::vars())
    }
}

pub(crate) fn import(
    env: &Env,
    state: &mut ParseState,
    command: CommandId,
    role: CommandRole,
) -> Result<(), ParseError> {
    for (key, value) in &env.pairs {
        let Some(suffix) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let name = suffix.to_ascii_lowercase().replace('_', "-");

        let Some(found) = id::lookup_name(&name) else {
            warn!("environment contains invalid option '{name}'");
            continue;
        };
        if found.deprecated {
            warn!(
                "environment option '{name}' is deprecated, use '{}' instead",
                id::key_idx_name(found.option, found.key_index)
            );
        }
        if found.negate {
            warn!("environment contains invalid negate option '{name}'");
            continue;
        }
        if found.reset {
            warn!("environment contains invalid reset option '{name}'");
            continue;
        }
        let rule = rules::option(found.option);
        if rule.section == Section::CommandLineOnly {
            warn!("environment contains command-line only option '{name}'");
            continue;
        }
        if !rules::option_valid(command, role, found.option) {
            warn!(
                "environment contains option '{name}' not valid for command '{}'",
                command.name()
            );
            continue;
        }
        if value.is_empty() {
            return Err(ParseError::OptionInvalidValue(format!(
                "environment variable '{key}' must have a value"
            )));
        }
        if state.found(found.option, found.key_index) {
            continue;
        }

        let parsed = if rule.option_type == OptionType::Boolean {
            let negate = match value.as_str() {
                "y" => false,
                "n" => true,
                _ => {
                    return Err(ParseError::OptionInvalidValue(format!(
                        "environment boolean option '{key}' must be 'y' or 'n'"
                    )));
                }
            };
            ParseOptionValue {
                source: ParseSource::Env,
                negate,
                reset: false,
                values: vec![],
            }
        } else {
            let values = if rule.multi {
                value.split(':').map(str::to_string).collect()
            } else {
                vec![value.clone()]
            };
            ParseOptionValue {
                source: ParseSource::Env,
                negate: false,
                reset: false,
                values,
            }
        };
        state.insert(found.option, found.key_index, parsed);
    }
    Ok(())
}
