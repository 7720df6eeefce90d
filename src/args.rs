// Copyright 2025 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! Command-line tokenisation: long options (`--name`, `--name=value`,
//! `--name value`, `--no-name`, `--reset-name`), the command positional with
//! its optional `:role` suffix, and trailing command parameters.

use std::env;

use log::warn;

use crate::error::ParseError;
use crate::id::{self, OptionMatch};
use crate::rules::{self, CommandId, CommandRole, OptionType};
use crate::state::{ParseOptionValue, ParseSource, ParseState};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Args {
    pub(crate) arg_strings: Vec<String>,
}

impl Args {
    /// Create an Args instance with the provided args, which *must* include
    /// the argv[0] executable path.
    pub fn new<I: IntoIterator<Item = String>>(arg_strings: I) -> Self {
        Self {
            arg_strings: arg_strings.into_iter().collect(),
        }
    }

    pub fn argv() -> Self {
        Self::new(env::args())
    }
}

/// The shape of an invocation, not including option values.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct CommandLine {
    pub command: CommandId,
    pub role: CommandRole,
    pub exe: String,
    pub params: Vec<String>,
    pub help: bool,
}

pub(crate) fn parse_args(args: &Args, state: &mut ParseState) -> Result<CommandLine, ParseError> {
    let mut arg_iter = args.arg_strings.iter();
    let Some(exe) = arg_iter.next() else {
        return Err(ParseError::Assert(
            "argument list must contain the executable path".to_string(),
        ));
    };

    let mut command: Option<(CommandId, CommandRole)> = None;
    let mut params = vec![];

    while let Some(arg) = arg_iter.next() {
        if let Some(name_and_value) = arg.strip_prefix("--") {
            let (name, inline_value) = match name_and_value.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (name_and_value, None),
            };

            let Some(found) = id::lookup_name(name) else {
                return Err(ParseError::OptionInvalid(format!(
                    "invalid option '--{name}'"
                )));
            };
            let rule = rules::option(found.option);

            if found.deprecated {
                warn!(
                    "option '{name}' is deprecated, use '{}' instead",
                    id::key_idx_name(found.option, found.key_index)
                );
            }
            if rule.secure {
                return Err(ParseError::OptionInvalid(format!(
                    "option '{name}' is not allowed on the command-line\n\
                     HINT: this option could expose secrets in the process list.\n\
                     HINT: use a configuration file or an environment variable instead."
                )));
            }
            if found.negate && found.reset {
                return Err(ParseError::OptionInvalid(format!(
                    "option '{name}' cannot be negated and reset"
                )));
            }
            if found.negate && !rule.negate {
                return Err(ParseError::OptionInvalid(format!(
                    "option '{name}' cannot be negated"
                )));
            }
            if found.reset && !rules::has_default(found.option) {
                return Err(ParseError::OptionInvalid(format!(
                    "option '{name}' cannot be reset"
                )));
            }

            let value = if found.negate || found.reset || rule.option_type == OptionType::Boolean
            {
                if inline_value.is_some() {
                    return Err(ParseError::OptionInvalid(format!(
                        "option '{name}' does not allow an argument"
                    )));
                }
                None
            } else {
                match inline_value {
                    Some(value) => Some(value.to_string()),
                    None => Some(
                        arg_iter
                            .next()
                            .ok_or_else(|| {
                                ParseError::OptionInvalid(format!(
                                    "option '{name}' requires an argument"
                                ))
                            })?
                            .clone(),
                    ),
                }
            };

            store(state, &found, name, value)?;
        } else if arg.starts_with('-') && arg.len() > 1 {
            return Err(ParseError::OptionInvalid(format!("invalid option '{arg}'")));
        } else if command.is_none() {
            command = Some(parse_command(arg)?);
        } else {
            params.push(arg.clone());
        }
    }

    let Some((command, role)) = command else {
        // A bare invocation renders help; options with no command do not.
        if args.arg_strings.len() <= 1 {
            return Ok(CommandLine {
                command: CommandId::Help,
                role: CommandRole::Default,
                exe: exe.clone(),
                params: vec![],
                help: true,
            });
        }
        return Err(ParseError::CommandRequired("no command found".to_string()));
    };

    if !params.is_empty() && !rules::command(command).parameters_allowed {
        return Err(ParseError::ParamInvalid(
            "command does not allow parameters".to_string(),
        ));
    }

    Ok(CommandLine {
        command,
        role,
        exe: exe.clone(),
        params,
        help: command == CommandId::Help,
    })
}

fn parse_command(arg: &str) -> Result<(CommandId, CommandRole), ParseError> {
    let (name, role_name) = match arg.split_once(':') {
        Some((name, role_name)) => (name, Some(role_name)),
        None => (arg, None),
    };

    let Some(command) = rules::command_find(name) else {
        return Err(ParseError::CommandInvalid(format!(
            "invalid command '{name}'"
        )));
    };
    let role = match role_name {
        None => CommandRole::Default,
        Some(role_name) => rules::role_find(role_name).ok_or_else(|| {
            ParseError::CommandInvalid(format!("invalid command role '{role_name}'"))
        })?,
    };
    if !rules::command_role_valid(command, role) {
        return Err(ParseError::CommandInvalid(format!(
            "role '{}' is not valid for command '{name}'",
            role.name()
        )));
    }
    Ok((command, role))
}

fn store(
    state: &mut ParseState,
    found: &OptionMatch,
    name: &str,
    value: Option<String>,
) -> Result<(), ParseError> {
    let rule = rules::option(found.option);
    if let Some(existing) = state.get_mut(found.option, found.key_index) {
        // Only multi options may repeat, and only to append values.
        if rule.multi && !found.negate && !found.reset && !existing.negate && !existing.reset {
            if let Some(value) = value {
                existing.values.push(value);
            }
            return Ok(());
        }
        return Err(ParseError::OptionInvalid(format!(
            "option '{name}' cannot be set multiple times"
        )));
    }
    state.insert(
        found.option,
        found.key_index,
        ParseOptionValue {
            source: ParseSource::Param,
            negate: found.negate,
            reset: found.reset,
            values: value.into_iter().collect(),
        },
    );
    Ok(())
}
