// Copyright 2025 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! Group resolution and option materialisation. Runs after all three sources
//! are merged: drops or rejects options invalid for the command, discovers
//! which key indexes each group uses, then walks the static resolve order
//! turning raw strings into typed values with depend, range, allow-list,
//! default, and required enforcement.

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;

use crate::error::ParseError;
use crate::id;
use crate::parse::{self, PathCheck};
use crate::rules::{
    self, CommandId, CommandRole, KEY_MAX, OPTION_TOTAL, OptionId, OptionType, RESOLVE_ORDER,
    Section,
};
use crate::state::{ParseOptionValue, ParseSource, ParseState};
use crate::{ConfigOption, ConfigOptionGroup, ConfigOptionValue, Source, Value};

pub(crate) fn resolve(
    state: &mut ParseState,
    command: CommandId,
    role: CommandRole,
    help: bool,
) -> Result<(Vec<ConfigOption>, Vec<ConfigOptionGroup>), ParseError> {
    drop_invalid(state, command, role)?;
    let groups = resolve_groups(state, command, role)?;

    let mut options: Vec<ConfigOption> = (0..OPTION_TOTAL)
        .map(|_| ConfigOption {
            valid: false,
            index: vec![],
        })
        .collect();

    for option in RESOLVE_ORDER {
        if !rules::option_valid(command, role, option) {
            continue;
        }
        let rule = rules::option(option);
        let group_state = rule.group.map(|g| &groups[g as usize]);
        let list_total = group_state.map_or(1, |g| g.index_total);

        let mut index = Vec::with_capacity(list_total);
        for list_index in 0..list_total {
            let key_index = group_state.map_or(0, |g| g.index_map[list_index]);
            index.push(materialise(
                state, &options, command, option, key_index, list_index, help,
            )?);
        }
        options[option as usize] = ConfigOption { valid: true, index };
    }

    Ok((options, groups))
}

/// An option set for a command it is not valid for is fatal when it came from
/// the command line and silently dropped otherwise.
fn drop_invalid(
    state: &mut ParseState,
    command: CommandId,
    role: CommandRole,
) -> Result<(), ParseError> {
    for option in OptionId::iter() {
        if rules::option_valid(command, role, option) {
            continue;
        }
        let claimed: Vec<(u32, ParseSource)> = state
            .entries(option)
            .map(|(key_index, value)| (key_index, value.source))
            .collect();
        for (key_index, source) in claimed {
            if source == ParseSource::Param {
                return Err(ParseError::OptionInvalid(format!(
                    "option '{}' not valid for command '{}'",
                    id::key_idx_name(option, key_index),
                    command.name()
                )));
            }
            state.remove(option, key_index);
        }
    }
    Ok(())
}

fn resolve_groups(
    state: &ParseState,
    command: CommandId,
    role: CommandRole,
) -> Result<Vec<ConfigOptionGroup>, ParseError> {
    let mut groups = vec![];
    for group in rules::GROUP_IDS {
        let group_rule = rules::group(group);

        let mut valid = false;
        let mut keys = BTreeSet::new();
        for option in OptionId::iter() {
            if rules::option(option).group != Some(group)
                || !rules::option_valid(command, role, option)
            {
                continue;
            }
            valid = true;
            for (key_index, value) in state.entries(option) {
                if !value.reset {
                    keys.insert(key_index);
                }
            }
        }

        // With no keys in use a single default index remains so options with
        // defaults still materialise.
        let index_map: Vec<u32> = if keys.is_empty() {
            vec![rules::default_key_index(group)]
        } else {
            keys.into_iter().collect()
        };

        let mut index_default = 0;
        let mut index_default_exists = group_rule.reserve_key_one
            || rules::option_valid(command, role, group_rule.select);

        if let Some(raw) = state.scalar(group_rule.select) {
            let selector = group_rule.select.name();
            let user_key: u32 = raw.parse().map_err(|_| {
                ParseError::OptionInvalidValue(format!(
                    "'{raw}' is not valid for '{selector}' option"
                ))
            })?;
            if user_key < 1 || user_key > KEY_MAX {
                return Err(ParseError::OptionInvalidValue(format!(
                    "key '{raw}' is not valid for '{selector}' option"
                )));
            }
            let key_index = rules::key_index(group, user_key);
            match index_map.iter().position(|k| *k == key_index) {
                Some(position) => {
                    index_default = position;
                    index_default_exists = true;
                }
                None => {
                    return Err(ParseError::OptionInvalidValue(format!(
                        "key '{raw}' is not valid for '{selector}' option"
                    )));
                }
            }
        }

        groups.push(ConfigOptionGroup {
            valid,
            name: group_rule.name,
            index_total: index_map.len(),
            index_map,
            index_default,
            index_default_exists,
        });
    }
    Ok(groups)
}

fn materialise(
    state: &ParseState,
    options: &[ConfigOption],
    command: CommandId,
    option: OptionId,
    key_index: u32,
    list_index: usize,
    help: bool,
) -> Result<ConfigOptionValue, ParseError> {
    let rule = rules::option(option);
    let parsed = state.get(option, key_index);
    let option_set = parsed.is_some_and(|p| {
        (rule.option_type == OptionType::Boolean || !p.negate) && !p.reset
    });

    // Depend options materialise earlier in the resolve order, so the check
    // reads an already-typed value at the same list index.
    if let Some((dep_option, dep_values)) = rules::depend(command, option) {
        let dep_list_index = if rules::option(dep_option).group.is_some() {
            list_index
        } else {
            0
        };
        let dep_value = options[dep_option as usize]
            .index
            .get(dep_list_index)
            .and_then(|slot| slot.value.as_ref());
        let resolved = match dep_value {
            None => false,
            Some(_) if dep_values.is_empty() => true,
            Some(value) => {
                let text = match value {
                    Value::Bool(true) => "1".to_string(),
                    Value::Bool(false) => "0".to_string(),
                    Value::Integer(number) => number.to_string(),
                    Value::String(text) => text.clone(),
                    _ => String::new(),
                };
                dep_values.contains(&text.as_str())
            }
        };
        if !resolved {
            if option_set && parsed.is_some_and(|p| p.source == ParseSource::Param) {
                return Err(ParseError::OptionInvalid(depend_message(
                    option, key_index, dep_option, dep_values,
                )));
            }
            return Ok(ConfigOptionValue::null());
        }
    }

    if option_set {
        if let Some(parsed) = parsed {
            return Ok(ConfigOptionValue {
                value: Some(parse_typed(command, option, key_index, parsed)?),
                source: Source::from_parse(parsed.source),
                negate: parsed.negate,
                reset: parsed.reset,
            });
        }
    }

    // Explicitly negated non-boolean: a null value that keeps its provenance
    // so consumers can distinguish "off" from "never mentioned".
    if let Some(parsed) = parsed
        && parsed.negate
        && rule.option_type != OptionType::Boolean
    {
        return Ok(ConfigOptionValue {
            value: None,
            source: Source::from_parse(parsed.source),
            negate: true,
            reset: parsed.reset,
        });
    }

    if let Some(default) = rules::default_value(command, option) {
        return Ok(ConfigOptionValue {
            value: Some(parse_default(option, default)?),
            source: parsed.map_or(Source::Default, |p| Source::from_parse(p.source)),
            negate: false,
            reset: parsed.is_some_and(|p| p.reset),
        });
    }

    if rules::required(command, option) && !help {
        let mut message = format!(
            "{} command requires option: {}",
            command.name(),
            id::key_idx_name(option, key_index)
        );
        if rule.section == Section::Stanza {
            message.push_str("\nHINT: does this stanza exist?");
        }
        return Err(ParseError::OptionRequired(message));
    }

    Ok(ConfigOptionValue::null())
}

fn parse_typed(
    command: CommandId,
    option: OptionId,
    key_index: u32,
    parsed: &ParseOptionValue,
) -> Result<Value, ParseError> {
    let rule = rules::option(option);
    let name = id::key_idx_name(option, key_index);
    let raw = parsed.values.first().map(String::as_str).unwrap_or("");

    let value = match rule.option_type {
        OptionType::Boolean => Value::Bool(!parsed.negate),
        OptionType::List => Value::List(parsed.values.clone()),
        OptionType::Hash => {
            let mut map = BTreeMap::new();
            for entry in &parsed.values {
                let Some((key, value)) = entry.split_once('=') else {
                    return Err(ParseError::OptionInvalidValue(format!(
                        "key/value '{entry}' not valid for '{name}' option"
                    )));
                };
                // Last assignment of a key wins.
                map.insert(key.to_string(), value.to_string());
            }
            Value::Hash(map)
        }
        OptionType::Integer | OptionType::Size | OptionType::Time => {
            let number = match rule.option_type {
                OptionType::Integer => raw.parse::<i64>().ok(),
                OptionType::Size => parse::size_to_bytes(raw),
                _ => parse::time_to_ms(raw),
            }
            .ok_or_else(|| {
                ParseError::OptionInvalidValue(format!(
                    "'{raw}' is not valid for '{name}' option"
                ))
            })?;
            if let Some((min, max)) = rules::allow_range(command, option)
                && (number < min || number > max)
            {
                return Err(ParseError::OptionInvalidValue(format!(
                    "'{raw}' is out of range for '{name}' option"
                )));
            }
            Value::Integer(number)
        }
        OptionType::String => {
            if raw.is_empty() {
                return Err(ParseError::OptionInvalidValue(format!(
                    "'{raw}' is not valid for '{name}' option"
                )));
            }
            check_allow_list(command, option, &name, raw)?;
            Value::String(raw.to_string())
        }
        OptionType::Path => {
            let normalised = parse::check_path(raw).map_err(|check| {
                ParseError::OptionInvalidValue(match check {
                    PathCheck::NotAbsolute => {
                        format!("'{raw}' must begin with '/' for '{name}' option")
                    }
                    PathCheck::DoubleSlash => {
                        format!("'{raw}' cannot contain '//' for '{name}' option")
                    }
                })
            })?;
            check_allow_list(command, option, &name, &normalised)?;
            Value::String(normalised)
        }
    };
    Ok(value)
}

fn check_allow_list(
    command: CommandId,
    option: OptionId,
    name: &str,
    value: &str,
) -> Result<(), ParseError> {
    if let Some(allowed) = rules::allow_list(command, option)
        && !allowed.contains(&value)
    {
        return Err(ParseError::OptionInvalidValue(format!(
            "'{value}' is not allowed for '{name}' option"
        )));
    }
    Ok(())
}

/// Defaults come from the static table and are trusted; a default that does
/// not parse is a table defect, not user error.
fn parse_default(option: OptionId, default: &str) -> Result<Value, ParseError> {
    let table_defect = || {
        ParseError::Assert(format!(
            "default '{default}' is not valid for option '{}'",
            option.name()
        ))
    };
    Ok(match rules::option(option).option_type {
        OptionType::Boolean => Value::Bool(default == "1"),
        OptionType::Integer => Value::Integer(default.parse().map_err(|_| table_defect())?),
        OptionType::Size => Value::Integer(parse::size_to_bytes(default).ok_or_else(table_defect)?),
        OptionType::Time => Value::Integer(parse::time_to_ms(default).ok_or_else(table_defect)?),
        OptionType::Path | OptionType::String => Value::String(default.to_string()),
        OptionType::List | OptionType::Hash => return Err(table_defect()),
    })
}

fn depend_message(
    option: OptionId,
    key_index: u32,
    dep_option: OptionId,
    dep_values: &[&str],
) -> String {
    let option_name = id::key_idx_name(option, key_index);
    let dep_rule = rules::option(dep_option);
    let dep_key_index = if dep_rule.group.is_some() { key_index } else { 0 };
    let dep_name = id::key_idx_name(dep_option, dep_key_index);

    if dep_values.is_empty() {
        format!("option '{option_name}' not valid without option '{dep_name}'")
    } else if dep_rule.option_type == OptionType::Boolean {
        let rendered = if dep_values.contains(&"0") {
            format!("no-{dep_name}")
        } else {
            dep_name
        };
        format!("option '{option_name}' not valid without option '{rendered}'")
    } else if let [single] = dep_values {
        format!("option '{option_name}' not valid without option '{dep_name}' = '{single}'")
    } else {
        let joined = dep_values.iter().map(|v| format!("'{v}'")).join(", ");
        format!("option '{option_name}' not valid without option '{dep_name}' in ({joined})")
    }
}
