// Copyright 2025 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use thiserror::Error;

/// Everything that can abort a parse. Each variant carries the fully rendered,
/// user-visible message; option names in messages are always the key-indexed
/// form the user would type (e.g. `pg3-path`, never an internal id).
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ParseError {
    /// Unknown command, unknown role, or a role the command does not support.
    #[error("{0}")]
    CommandInvalid(String),

    /// Options were given but no command.
    #[error("{0}")]
    CommandRequired(String),

    /// Positional parameters given to a command that takes none.
    #[error("{0}")]
    ParamInvalid(String),

    /// Structural option problems: unknown flag, missing argument, illegal
    /// negate/reset combination, secure option on the command line, repeated
    /// non-multi option, unsatisfied depend, not valid for the command.
    #[error("{0}")]
    OptionInvalid(String),

    /// A value failed its type parse, range, allow list, or path shape check.
    #[error("{0}")]
    OptionInvalidValue(String),

    /// No value and no default for an option the command requires.
    #[error("{0}")]
    OptionRequired(String),

    /// A configuration file or include path the user named does not exist.
    #[error("{0}")]
    FileMissing(String),

    /// Malformed input to a parsing helper, e.g. an unparseable config file.
    #[error("{0}")]
    Format(String),

    /// Caller misuse, e.g. an empty argument vector.
    #[error("{0}")]
    Assert(String),
}

impl ParseError {
    /// Stable process exit code for each error kind. The taxonomy is part of
    /// the public contract; the numeric values are merely distinct.
    pub fn exit_code(&self) -> i32 {
        match self {
            ParseError::CommandInvalid(_) => 31,
            ParseError::CommandRequired(_) => 32,
            ParseError::ParamInvalid(_) => 33,
            ParseError::OptionInvalid(_) => 34,
            ParseError::OptionInvalidValue(_) => 35,
            ParseError::OptionRequired(_) => 36,
            ParseError::FileMissing(_) => 37,
            ParseError::Format(_) => 38,
            ParseError::Assert(_) => 39,
        }
    }
}
