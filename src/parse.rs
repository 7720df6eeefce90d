// Copyright 2025 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! Scalar value parsers shared by the validator: size literals, time
//! literals, and path shape checks. These return `None`/error enums and the
//! caller renders the user-facing message with the key-indexed option name.

use std::sync::LazyLock;

use regex::Regex;

static SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([0-9]+)(kb|k|mb|m|gb|g|tb|t|pb|p|b)?$").expect("size regex is valid")
});

/// Parse a size literal like `7kb` or `2M` into bytes. The unit suffix is
/// case-insensitive; no suffix means bytes.
pub(crate) fn size_to_bytes(value: &str) -> Option<i64> {
    let captures = SIZE_RE.captures(value)?;
    let magnitude: i64 = captures.get(1)?.as_str().parse().ok()?;
    let multiplier: i64 = match captures
        .get(2)
        .map(|unit| unit.as_str().to_ascii_lowercase())
        .as_deref()
    {
        None | Some("b") => 1,
        Some("k") | Some("kb") => 1024,
        Some("m") | Some("mb") => 1024 * 1024,
        Some("g") | Some("gb") => 1024 * 1024 * 1024,
        Some("t") | Some("tb") => 1024i64.pow(4),
        Some("p") | Some("pb") => 1024i64.pow(5),
        Some(_) => return None,
    };
    magnitude.checked_mul(multiplier)
}

/// Parse a time literal in seconds (fractions allowed) into milliseconds.
pub(crate) fn time_to_ms(value: &str) -> Option<i64> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let seconds: f64 = value.parse().ok()?;
    let ms = seconds * 1000.0;
    if ms > i64::MAX as f64 {
        return None;
    }
    Some(ms.round() as i64)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum PathCheck {
    NotAbsolute,
    DoubleSlash,
}

/// Validate and normalise a path value: must begin with `/`, must not contain
/// `//`, and a trailing `/` is stripped unless the value is exactly `/`.
pub(crate) fn check_path(value: &str) -> Result<String, PathCheck> {
    if !value.starts_with('/') {
        return Err(PathCheck::NotAbsolute);
    }
    if value.contains("//") {
        return Err(PathCheck::DoubleSlash);
    }
    if value.len() > 1 && value.ends_with('/') {
        Ok(value[..value.len() - 1].to_string())
    } else {
        Ok(value.to_string())
    }
}
