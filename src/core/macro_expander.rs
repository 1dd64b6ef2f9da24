// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Single-pass macro substitution over one physical line.

use crate::core::symbol_table::{DefineValue, SymbolTable};
use crate::core::text_utils::is_word_char;

/// Replace every defined word in `line` with its value.
///
/// Words are maximal runs of `[A-Za-z0-9_]`, scanned left to right.
/// Integer values are written in their canonical decimal form, text
/// values verbatim. The pass is non-recursive: substituted text is never
/// re-scanned, so a value naming another define stays as-is.
///
/// Returns `None` when no word matched; the caller keeps using the
/// original line, and nothing was copied.
pub fn expand_line(line: &str, symbols: &SymbolTable) -> Option<String> {
    let bytes = line.as_bytes();
    let mut out = String::new();
    // Prefix of `line` already materialized into `out`.
    let mut copied = 0usize;
    let mut found = false;

    let mut i = 0usize;
    while i < bytes.len() {
        if !is_word_char(bytes[i]) {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && is_word_char(bytes[i]) {
            i += 1;
        }
        let Some(value) = symbols.lookup(&line[start..i]) else {
            continue;
        };
        out.push_str(&line[copied..start]);
        match value {
            DefineValue::Number(number) => out.push_str(&number.to_string()),
            DefineValue::Text(text) => out.push_str(text),
        }
        copied = i;
        found = true;
    }

    if !found {
        return None;
    }
    out.push_str(&line[copied..]);
    Some(out)
}
