// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use lazy_static::lazy_static;
use regex::Regex;

/// Object control keys. `$rest` declares the catch-all entry for unmatched
/// keys; `$definitions` is carried by some schemas as documentation and is
/// skipped during lowering.
pub const REST_KEY: &str = "$rest";
pub const DEFINITIONS_KEY: &str = "$definitions";

lazy_static! {
    static ref CONTROL_KEY_RE: Regex = Regex::new(r"^\$[^$]").expect("static regex");
    static ref PATTERN_KEY_RE: Regex = Regex::new(r"^/([^/][\s\S]*)/([imsx]*)$").expect("static regex");
}

/// `$rest`-style keys. A leading `$$` escapes a literal `$`.
pub fn is_control_key(key: &str) -> bool {
    CONTROL_KEY_RE.is_match(key)
}

/// `/pattern/flags`-style keys. A leading `//` escapes a literal `/`.
pub fn is_pattern_key(key: &str) -> bool {
    key.len() > 1 && key.starts_with('/') && !key.starts_with("//")
}

/// Splits a pattern key into (pattern, flags).
pub fn match_key_pattern(key: &str) -> Option<(&str, &str)> {
    let caps = PATTERN_KEY_RE.captures(key)?;
    Some((
        caps.get(1).map_or("", |m| m.as_str()),
        caps.get(2).map_or("", |m| m.as_str()),
    ))
}

/// Strips the escape prefix from `$$key` / `//key` literal keys.
pub fn unescape_key(key: &str) -> &str {
    let bytes = key.as_bytes();
    if bytes.len() > 1 && (bytes[0] == b'$' && bytes[1] == b'$' || bytes[0] == b'/' && bytes[1] == b'/')
    {
        &key[1..]
    } else {
        key
    }
}
