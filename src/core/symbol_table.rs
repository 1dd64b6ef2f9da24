// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Per-parse macro symbol table.

use std::collections::HashMap;

/// Value bound to a preprocessor define: an integer (substituted as its
/// decimal representation) or a literal text fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefineValue {
    Number(i32),
    Text(String),
}

/// Case-sensitive identifier → value map, built once per parse from the
/// caller's ordered define list and never mutated afterwards.
///
/// Duplicate names keep the first definition.
#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: HashMap<String, DefineValue>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_defines<'a>(defines: impl IntoIterator<Item = &'a (String, DefineValue)>) -> Self {
        let mut entries = HashMap::new();
        for (name, value) in defines {
            entries
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
        Self { entries }
    }

    pub fn lookup(&self, name: &str) -> Option<&DefineValue> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
