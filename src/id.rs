// Copyright 2025 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! Option identity: resolving the names users type (including key-indexed,
//! negated, reset, and deprecated forms) to a canonical `(option, key index)`
//! pair, and rendering that pair back into a display name for diagnostics.

use crate::rules::{self, KEY_MAX, OptionId};

/// The result of resolving a user-visible option name.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct OptionMatch {
    pub option: OptionId,
    pub key_index: u32,
    pub negate: bool,
    pub reset: bool,
    pub deprecated: bool,
}

/// Resolve a name as the user typed it: `pg7-path`, `no-delta`,
/// `reset-compress-type`, `db-path`, ... Returns `None` for unknown names and
/// for key indexes outside `[1, KEY_MAX]`.
pub(crate) fn lookup_name(name: &str) -> Option<OptionMatch> {
    let mut rest = name;
    let mut reset = false;
    let mut negate = false;
    if let Some(stripped) = rest.strip_prefix("reset-") {
        reset = true;
        rest = stripped;
    }
    if let Some(stripped) = rest.strip_prefix("no-") {
        negate = true;
        rest = stripped;
    }
    lookup_base(rest).map(|mut found| {
        found.negate = negate;
        found.reset = reset;
        found
    })
}

fn lookup_base(name: &str) -> Option<OptionMatch> {
    for dep in &rules::DEPRECATIONS {
        if dep.alias == name {
            let group = rules::option(dep.option)
                .group
                .expect("deprecated aliases target grouped options");
            return Some(OptionMatch {
                option: dep.option,
                key_index: rules::key_index(group, dep.user_key),
                negate: false,
                reset: false,
                deprecated: true,
            });
        }
    }

    if let Some(option) = rules::option_find(name) {
        let key_index = match rules::option(option).group {
            Some(group) => rules::default_key_index(group),
            None => 0,
        };
        return Some(OptionMatch {
            option,
            key_index,
            negate: false,
            reset: false,
            deprecated: false,
        });
    }

    // Key-indexed form: group prefix, decimal user key, then the remainder of
    // the canonical name, e.g. pg7-path -> (pg-path, key 7).
    for group in rules::GROUP_IDS {
        let group_rule = rules::group(group);
        let Some(after_prefix) = name.strip_prefix(group_rule.name) else {
            continue;
        };
        let digits: String = after_prefix
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if digits.is_empty() {
            continue;
        }
        let suffix = &after_prefix[digits.len()..];
        if !suffix.starts_with('-') {
            continue;
        }
        let user_key: u32 = digits.parse().ok()?;
        if user_key < 1 || user_key > KEY_MAX {
            return None;
        }
        let canonical = format!("{}{}", group_rule.name, suffix);
        if let Some(option) = rules::option_find(&canonical)
            && rules::option(option).group == Some(group)
        {
            return Some(OptionMatch {
                option,
                key_index: rules::key_index(group, user_key),
                negate: false,
                reset: false,
                deprecated: false,
            });
        }
        return None;
    }

    None
}

/// Render the user-visible name for `(option, key index)`. Grouped options
/// substitute the user key after the group prefix; ungrouped options are the
/// plain name.
pub(crate) fn key_idx_name(option: OptionId, key_index: u32) -> String {
    let rule = rules::option(option);
    match rule.group {
        None => rule.name.to_string(),
        Some(group) => {
            let prefix = rules::group(group).name;
            format!(
                "{}{}{}",
                prefix,
                rules::user_key(group, key_index),
                &rule.name[prefix.len()..]
            )
        }
    }
}
