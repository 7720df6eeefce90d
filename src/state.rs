// Copyright 2025 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! Mutable state accumulated while the three sources are read. Each option
//! owns a sparse map from key index to the winning raw value; the first
//! source to claim a `(option, key index)` slot keeps it, and sources run in
//! precedence order (command line, then environment, then config files).

use std::collections::BTreeMap;

use crate::rules::{OPTION_TOTAL, OptionId};

/// Where a raw value came from. Ordering is the precedence: `Param` always
/// wins because it is merged first and later sources skip claimed slots.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ParseSource {
    Param,
    Env,
    Config,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ParseOptionValue {
    pub source: ParseSource,
    pub negate: bool,
    pub reset: bool,
    /// Raw value strings. Empty for booleans (the value is the negate flag)
    /// and for reset; multiple entries only for `multi` options.
    pub values: Vec<String>,
}

/// Sparse per-option storage, grown on demand. Ungrouped options only ever
/// use key index 0.
#[derive(Debug, PartialEq)]
pub(crate) struct ParseState {
    options: Vec<BTreeMap<u32, ParseOptionValue>>,
}

impl ParseState {
    pub fn new() -> Self {
        Self {
            options: (0..OPTION_TOTAL).map(|_| BTreeMap::new()).collect(),
        }
    }

    pub fn get(&self, option: OptionId, key_index: u32) -> Option<&ParseOptionValue> {
        self.options[option as usize].get(&key_index)
    }

    pub fn get_mut(&mut self, option: OptionId, key_index: u32) -> Option<&mut ParseOptionValue> {
        self.options[option as usize].get_mut(&key_index)
    }

    pub fn found(&self, option: OptionId, key_index: u32) -> bool {
        self.get(option, key_index).is_some()
    }

    pub fn insert(&mut self, option: OptionId, key_index: u32, value: ParseOptionValue) {
        self.options[option as usize].insert(key_index, value);
    }

    pub fn remove(&mut self, option: OptionId, key_index: u32) {
        self.options[option as usize].remove(&key_index);
    }

    /// Key indexes claimed for an option, ascending.
    pub fn entries(
        &self,
        option: OptionId,
    ) -> impl Iterator<Item = (u32, &ParseOptionValue)> + '_ {
        self.options[option as usize].iter().map(|(k, v)| (*k, v))
    }

    /// The single raw value of an unindexed option, if one was supplied (and
    /// not negated or reset).
    pub fn scalar(&self, option: OptionId) -> Option<&str> {
        self.get(option, 0).and_then(|value| {
            if value.negate || value.reset {
                None
            } else {
                value.values.first().map(String::as_str)
            }
        })
    }
}
